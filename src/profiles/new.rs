use axum::{debug_handler, extract::State, response::Redirect, Form};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    actions::{submit_form, ActionRequest},
    context::ChatContext,
    AppResult, AppState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct NewProfileForm {
    username: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_profile(
    State(state): State<AppState>,
    ctx: ChatContext,
    session: Session,
    Form(NewProfileForm { username }): Form<NewProfileForm>,
) -> AppResult<Redirect> {
    submit_form(&state.refresh, &session, ctx, ActionRequest::CreateProfile { username }).await?;
    Ok(Redirect::to("/?tab=profile"))
}
