mod new;
mod page;
mod query;
mod update;
mod ws;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub(crate) use page::profile_tab;
pub use query::{display_name, display_names, owned_profile};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", post(new::new_profile))
        .route("/username", post(update::update_username))
        .route("/ws", get(ws::profile_ws))
}
