use axum::{debug_handler, extract::State, response::Redirect, Form};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    actions::{submit_form, ActionRequest},
    context::ChatContext,
    AppResult, AppState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct NewRoomForm {
    name: String,
    #[serde(default)]
    description: String,
}

/// On success the new room is selected, which opens the chat tab.
#[debug_handler(state = AppState)]
pub(crate) async fn new_room(
    State(state): State<AppState>,
    ctx: ChatContext,
    session: Session,
    Form(NewRoomForm { name, description }): Form<NewRoomForm>,
) -> AppResult<Redirect> {
    submit_form(&state.refresh, &session, ctx, ActionRequest::CreateRoom { name, description }).await?;
    Ok(Redirect::to("/"))
}
