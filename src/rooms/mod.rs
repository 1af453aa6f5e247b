mod list;
mod membership;
mod msg;
mod new;
mod room;
mod ws;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub(crate) use room::{chat_tab, rooms_tab};
pub use list::{get_room, list_rooms};
pub use msg::list_messages;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", post(new::new_room))
        .route("/{id}", get(room::select_room))
        .route("/{id}/join", post(membership::join_room))
        .route("/{id}/leave", post(membership::leave_room))
        .route("/{id}/send", post(msg::send_msg))
        .route("/{id}/ws", get(ws::room_ws))
}
