use axum::{
    debug_handler,
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::{context::ChatContext, poll, view::Refresh, AppState};

use super::page::render_profile;

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileWsQuery {
    /// Whether the page around the socket was rendered with a profile.
    profile: Option<bool>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn profile_ws(
    State(refresh): State<broadcast::Sender<Refresh>>,
    ctx: ChatContext,
    Query(ProfileWsQuery { profile }): Query<ProfileWsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let rx = refresh.subscribe();

    ws.on_upgrade(async move |socket| {
        let account = ctx.account.clone();
        poll::live(
            socket,
            rx,
            move |notice: &Refresh| account.as_ref().is_some_and(|a| notice.for_account(a)),
            || render_profile(&ctx, profile),
        )
        .await
    })
}
