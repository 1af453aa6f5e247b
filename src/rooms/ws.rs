use axum::{
    debug_handler,
    extract::{Path, State, WebSocketUpgrade},
    response::Response,
};
use tokio::sync::broadcast;

use crate::{chain::ObjectId, context::ChatContext, poll, view::Refresh, AppState};

use super::msg::render_messages;

/// Live message feed of one room.
#[debug_handler(state = AppState)]
pub(crate) async fn room_ws(
    Path(room): Path<ObjectId>,
    State(refresh): State<broadcast::Sender<Refresh>>,
    ctx: ChatContext,
    ws: WebSocketUpgrade,
) -> Response {
    let rx = refresh.subscribe();

    ws.on_upgrade(async move |socket| {
        let wake_on = room.clone();
        poll::live(
            socket,
            rx,
            move |notice: &Refresh| notice.for_room(&wake_on),
            || render_messages(&ctx, &room),
        )
        .await
    })
}
