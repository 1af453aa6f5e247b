use axum::{
    debug_handler,
    extract::{Path, State},
    response::Redirect,
};
use tower_sessions::Session;

use crate::{
    actions::{submit_form, ActionRequest},
    chain::ObjectId,
    context::ChatContext,
    AppResult, AppState,
};

#[debug_handler(state = AppState)]
pub(crate) async fn join_room(
    State(state): State<AppState>,
    ctx: ChatContext,
    session: Session,
    Path(room): Path<ObjectId>,
) -> AppResult<Redirect> {
    submit_form(&state.refresh, &session, ctx, ActionRequest::JoinRoom { room }).await?;
    Ok(Redirect::to("/"))
}

#[debug_handler(state = AppState)]
pub(crate) async fn leave_room(
    State(state): State<AppState>,
    ctx: ChatContext,
    session: Session,
    Path(room): Path<ObjectId>,
) -> AppResult<Redirect> {
    submit_form(&state.refresh, &session, ctx, ActionRequest::LeaveRoom { room }).await?;
    Ok(Redirect::to("/"))
}
