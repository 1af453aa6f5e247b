use axum::{
    debug_handler,
    extract::{Path, State},
    response::Redirect,
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::warn;

use crate::{
    actions::{submit_form, ActionRequest},
    chain::{ChainError, ObjectId, EVENT_PAGE_LIMIT},
    context::ChatContext,
    include_res,
    models::Message,
    poll::{Frame, MESSAGE_POLL},
    profiles::display_names,
    res, AppResult, AppState, GetField,
};

pub const MESSAGE_SENT: &str = "MessageSent";

#[derive(Debug, Deserialize)]
pub(crate) struct SendMessageForm {
    content: String,
}

/// Messages of `room` in the order they were sent.
pub async fn list_messages(ctx: &ChatContext, room: &ObjectId) -> Result<Vec<Message>, ChainError> {
    let Some(event_type) = ctx.chat_type(MESSAGE_SENT) else {
        return Ok(Vec::new());
    };

    let ids: Vec<ObjectId> = ctx
        .chain
        .query_events(&event_type, EVENT_PAGE_LIMIT, true)
        .await?
        .iter()
        .filter(|event| event.parsed_json.get_id_field("room_id").is_ok_and(|id| &id == room))
        .filter_map(|event| event.parsed_json.get_id_field("message_id").ok())
        .collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut messages: Vec<Message> = ctx
        .chain
        .multi_get_objects(&ids)
        .await?
        .iter()
        .filter_map(|object| {
            Message::try_from(object)
                .inspect_err(|e| warn!(message = %object.id, "undecodable message: {e}"))
                .ok()
        })
        .filter(|message| &message.room_id == room)
        .collect();
    messages.sort_by_key(|message| message.created_at);
    Ok(messages)
}

pub(crate) async fn render_messages(ctx: &ChatContext, room: &ObjectId) -> Frame {
    let messages = match list_messages(ctx, room).await {
        Ok(messages) => messages,
        Err(e) => {
            return Frame {
                html: format!(
                    r#"<p class="error">Error loading messages: {}</p>"#,
                    res::escape(&e.to_string())
                ),
                ok: false,
                every: MESSAGE_POLL,
            };
        }
    };
    if messages.is_empty() {
        return Frame {
            html: "<p>No messages yet. Be the first to send one!</p>".to_owned(),
            ok: true,
            every: MESSAGE_POLL,
        };
    }

    let names = display_names(ctx, messages.iter().map(|m| &m.author)).await;

    let mut html = format!("<h3>Messages ({})</h3>", messages.len());
    for message in &messages {
        let own = ctx.account.as_ref() == Some(&message.author);
        let author = names
            .get(&message.author)
            .cloned()
            .unwrap_or_else(|| message.author.short());

        html += &include_res!(str, "/pages/rooms/message.html")
            .replace("{own}", if own { " own" } else { "" })
            .replace("{id}", message.id.as_str())
            .replace("{author}", &res::escape(&author))
            .replace("{time}", &res::timestamp(message.created_at))
            .replace("{content}", &res::markdown(&message.content));
    }

    Frame { html, ok: true, every: MESSAGE_POLL }
}

#[debug_handler(state = AppState)]
pub(crate) async fn send_msg(
    State(state): State<AppState>,
    ctx: ChatContext,
    session: Session,
    Path(room): Path<ObjectId>,
    Form(SendMessageForm { content }): Form<SendMessageForm>,
) -> AppResult<Redirect> {
    submit_form(&state.refresh, &session, ctx, ActionRequest::SendMessage { room, content }).await?;
    Ok(Redirect::to("/?tab=chat"))
}
