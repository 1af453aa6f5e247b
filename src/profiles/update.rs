use axum::{debug_handler, extract::State, response::Redirect, Form};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    actions::{submit_form, ActionRequest},
    chain::ObjectId,
    context::ChatContext,
    AppResult, AppState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateUsernameForm {
    profile: ObjectId,
    username: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_username(
    State(state): State<AppState>,
    ctx: ChatContext,
    session: Session,
    Form(UpdateUsernameForm { profile, username }): Form<UpdateUsernameForm>,
) -> AppResult<Redirect> {
    submit_form(&state.refresh, &session, ctx, ActionRequest::UpdateUsername { profile, username }).await?;
    Ok(Redirect::to("/?tab=profile"))
}
