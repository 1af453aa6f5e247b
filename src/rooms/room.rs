use axum::{
    debug_handler,
    extract::Path,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{
    actions::{form_name, Action},
    chain::ObjectId,
    context::ChatContext,
    forms::{FormPhase, FormState},
    include_res,
    membership::{is_member, MembershipEvents},
    models::Room,
    registry::{Registries, RegistryKind},
    res,
    view::ViewState,
    AppResult,
};

use super::{list::{get_room, list_rooms}, msg::render_messages};

fn blocked(form: &FormState, available: bool) -> &'static str {
    res::disabled(!available || form.phase == FormPhase::Submitting)
}

fn membership_button(room: &ObjectId, member: bool, form: &FormState, available: bool) -> String {
    let (verb, label) = if member { ("leave", "Leave Room") } else { ("join", "Join Room") };
    include_res!(str, "/pages/rooms/membership.html")
        .replace("{id}", room.as_str())
        .replace("{verb}", verb)
        .replace("{label}", label)
        .replace("{disabled}", blocked(form, available))
}

fn membership_action(member: bool) -> Action {
    if member { Action::LeaveRoom } else { Action::JoinRoom }
}

async fn membership_form(session: &Session, room: &ObjectId, member: bool) -> AppResult<FormState> {
    Ok(FormState::load(session, &form_name(membership_action(member), Some(room))).await?)
}

fn room_item(room: &Room, member: bool, form: &FormState, available: bool) -> String {
    let description = if room.description.is_empty() {
        String::new()
    } else {
        format!(r#"<p class="muted">{}</p>"#, res::escape(&room.description))
    };
    include_res!(str, "/pages/rooms/room_item.html")
        .replace("{membership}", &membership_button(&room.id, member, form, available))
        .replace("{description}", &description)
        .replace("{member_count}", &room.member_count.to_string())
        .replace("{creator}", &room.creator.short())
        .replace("{error}", &res::form_error(form.error.as_deref()))
        .replace("{id}", room.id.as_str())
        .replace("{name}", &res::escape(&room.name))
}

/// Room list with join/leave per room.
pub(crate) async fn render_room_list(ctx: &ChatContext, session: &Session) -> AppResult<String> {
    let rooms = match list_rooms(ctx).await {
        Ok(rooms) => rooms,
        Err(e) => {
            return Ok(format!(
                r#"<p class="error">Error loading rooms: {}</p>"#,
                res::escape(&e.to_string())
            ));
        }
    };
    if rooms.is_empty() {
        return Ok("<p>No rooms found. Create one to get started!</p>".to_owned());
    }

    let (registries, events) = tokio::join!(
        Registries::resolve(ctx, &[RegistryKind::Profile, RegistryKind::RoomMember]),
        MembershipEvents::load(ctx),
    );
    let events = events.unwrap_or_default();

    let mut html = format!("<h3>Chat Rooms ({})</h3>", rooms.len());
    for room in &rooms {
        let member = ctx.account.as_ref().is_some_and(|a| events.is_member(&room.id, a));
        let form = membership_form(session, &room.id, member).await?;
        html += &room_item(room, member, &form, registries.has_all(membership_action(member).registries()));
    }
    Ok(html)
}

/// Rooms tab: the create form above the list.
pub(crate) async fn rooms_tab(ctx: &ChatContext, session: &Session) -> AppResult<String> {
    let form = FormState::load(session, &form_name(Action::CreateRoom, None)).await?;
    let registries = Registries::resolve(ctx, Action::CreateRoom.registries()).await;

    let create = include_res!(str, "/pages/rooms/new_room.html")
        .replace("{name}", &res::escape(form.value("name")))
        .replace("{description}", &res::escape(form.value("description")))
        .replace("{error}", &res::form_error(form.error.as_deref()))
        .replace("{disabled}", blocked(&form, registries.has_all(Action::CreateRoom.registries())));

    Ok(format!(
        "{create}<h2>Available Rooms</h2>{}",
        render_room_list(ctx, session).await?
    ))
}

/// Chat tab for the selected room, or the room list when none is selected.
pub(crate) async fn chat_tab(ctx: &ChatContext, session: &Session, view: &ViewState) -> AppResult<String> {
    let Some(room_id) = view.selected_room.as_ref() else {
        return Ok(format!("<h2>Select a Room</h2>{}", render_room_list(ctx, session).await?));
    };

    let (room, member, registries, messages) = tokio::join!(
        get_room(ctx, room_id),
        is_member(ctx, room_id),
        Registries::resolve(ctx, Action::SendMessage.registries()),
        render_messages(ctx, room_id),
    );
    let room_name = match room {
        Ok(Some(room)) => res::escape(&room.name),
        _ => "Room Chat".to_owned(),
    };

    let membership = membership_form(session, room_id, member).await?;
    let available = registries.has_all(membership_action(member).registries());
    let button = membership_button(room_id, member, &membership, available);
    let (leave, join) = if member {
        (button + &res::form_error(membership.error.as_deref()), String::new())
    } else {
        let banner = include_res!(str, "/pages/rooms/join_banner.html").replace("{join}", &button);
        (String::new(), banner + &res::form_error(membership.error.as_deref()))
    };

    let send = if member {
        let form = FormState::load(session, &form_name(Action::SendMessage, Some(room_id))).await?;
        include_res!(str, "/pages/rooms/send.html")
            .replace("{content}", &res::escape(form.value("content")))
            .replace("{error}", &res::form_error(form.error.as_deref()))
            .replace("{disabled}", blocked(&form, registries.has_all(Action::SendMessage.registries())))
            .replace("{room_id}", room_id.as_str())
    } else {
        r#"<p class="muted center">Join the room to send messages</p>"#.to_owned()
    };

    Ok(include_res!(str, "/pages/rooms/chat.html")
        .replace("{leave}", &leave)
        .replace("{join}", &join)
        .replace("{send}", &send)
        .replace("{messages}", &messages.html)
        .replace("{room_id}", room_id.as_str())
        .replace("{room_name}", &room_name))
}

#[debug_handler]
pub(crate) async fn select_room(session: Session, Path(room): Path<ObjectId>) -> AppResult<Response> {
    let mut view = ViewState::load(&session).await?;
    view.select_room(room);
    view.save(&session).await?;
    Ok(Redirect::to("/").into_response())
}
