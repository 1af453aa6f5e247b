//! Contract calls behind the action forms.
//!
//! Every action runs the same pipeline: check the wallet, resolve the
//! registries it needs, validate input, build the move call, sign, execute,
//! wait for finalization. Nothing local changes until the chain confirms.

use thiserror::Error;
use tokio::sync::broadcast;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::{
    chain::{clock, CallArg, ChainError, MoveCall, ObjectId},
    context::{ChatContext, MODULE},
    forms::{
        validate_message, validate_room, validate_username, FormPhase, FormState, ValidationError,
    },
    registry::{Registries, RegistryKind},
    view::{Refresh, ViewState},
    wallet::WalletError,
    AppResult,
};

use RegistryKind::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateProfile,
    UpdateUsername,
    CreateRoom,
    JoinRoom,
    LeaveRoom,
    SendMessage,
}

impl Action {
    pub fn function(&self) -> &'static str {
        use Action::*;
        match self {
            CreateProfile => "create_profile",
            UpdateUsername => "update_username",
            CreateRoom => "create_room",
            JoinRoom => "join_room",
            LeaveRoom => "leave_room",
            SendMessage => "send_message",
        }
    }

    pub fn fallback(&self) -> &'static str {
        use Action::*;
        match self {
            CreateProfile => "Failed to create profile",
            UpdateUsername => "Failed to update username",
            CreateRoom => "Failed to create room",
            JoinRoom => "Failed to join room",
            LeaveRoom => "Failed to leave room",
            SendMessage => "Failed to send message",
        }
    }

    /// Registries the entry point takes, in argument order.
    pub fn registries(&self) -> &'static [RegistryKind] {
        use Action::*;
        match self {
            CreateProfile | UpdateUsername => &[Profile],
            CreateRoom => &[Profile, Room, RoomMember],
            JoinRoom => &[Profile, RoomMember],
            LeaveRoom => &[RoomMember],
            SendMessage => &[Profile, Room, Message, RoomMember],
        }
    }

    fn creates(&self) -> Option<&'static str> {
        match self {
            Action::CreateProfile => Some("UserProfile"),
            Action::CreateRoom => Some("Room"),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Please connect your wallet")]
    NotConnected,
    #[error("{0}")]
    Unavailable(&'static str),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

impl ActionError {
    /// The remote's own message when it has one, otherwise the action's
    /// generic failure text.
    pub fn user_message(&self, action: Action) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            action.fallback().to_owned()
        } else {
            message
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completed {
    pub digest: String,
    pub created: Option<ObjectId>,
}

#[derive(Debug, Clone)]
pub enum ActionRequest {
    CreateProfile { username: String },
    UpdateUsername { profile: ObjectId, username: String },
    CreateRoom { name: String, description: String },
    JoinRoom { room: ObjectId },
    LeaveRoom { room: ObjectId },
    SendMessage { room: ObjectId, content: String },
}

impl ActionRequest {
    pub fn action(&self) -> Action {
        use ActionRequest::*;
        match self {
            CreateProfile { .. } => Action::CreateProfile,
            UpdateUsername { .. } => Action::UpdateUsername,
            CreateRoom { .. } => Action::CreateRoom,
            JoinRoom { .. } => Action::JoinRoom,
            LeaveRoom { .. } => Action::LeaveRoom,
            SendMessage { .. } => Action::SendMessage,
        }
    }

    pub fn room(&self) -> Option<&ObjectId> {
        use ActionRequest::*;
        match self {
            JoinRoom { room } | LeaveRoom { room } | SendMessage { room, .. } => Some(room),
            _ => None,
        }
    }

    /// Session name of the form this request came from. Room-bound forms are
    /// kept apart per room.
    pub fn form(&self) -> String {
        form_name(self.action(), self.room())
    }

    fn values(&self) -> Vec<(&'static str, String)> {
        use ActionRequest::*;
        match self {
            CreateProfile { username } | UpdateUsername { username, .. } => {
                vec![("username", username.clone())]
            }
            CreateRoom { name, description } => {
                vec![("name", name.clone()), ("description", description.clone())]
            }
            SendMessage { content, .. } => vec![("content", content.clone())],
            JoinRoom { .. } | LeaveRoom { .. } => Vec::new(),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        use ActionRequest::*;
        match self {
            CreateProfile { username } | UpdateUsername { username, .. } => validate_username(username),
            CreateRoom { name, description } => validate_room(name, description),
            SendMessage { content, .. } => validate_message(content),
            JoinRoom { .. } | LeaveRoom { .. } => Ok(()),
        }
    }

    /// Entry point arguments, given the registries from [`Action::registries`]
    /// in order.
    fn arguments(&self, registries: &[ObjectId]) -> Option<Vec<CallArg>> {
        use ActionRequest::*;
        let obj = |id: &ObjectId| CallArg::Object(id.clone());
        let pure = |s: &String| CallArg::Pure(s.clone());

        Some(match (self, registries) {
            (CreateProfile { username }, [profiles]) => {
                vec![obj(profiles), pure(username), obj(&clock())]
            }
            (UpdateUsername { profile, username }, [profiles]) => {
                vec![obj(profiles), obj(profile), pure(username), obj(&clock())]
            }
            (CreateRoom { name, description }, [profiles, rooms, members]) => vec![
                obj(profiles),
                obj(rooms),
                obj(members),
                pure(name),
                pure(description),
                obj(&clock()),
            ],
            (JoinRoom { room }, [profiles, members]) => vec![obj(profiles), obj(room), obj(members)],
            (LeaveRoom { room }, [members]) => vec![obj(room), obj(members)],
            (SendMessage { room, content }, [profiles, rooms, messages, members]) => vec![
                obj(profiles),
                obj(rooms),
                obj(room),
                obj(messages),
                obj(members),
                pure(content),
                obj(&clock()),
            ],
            _ => return None,
        })
    }

    pub async fn execute(&self, ctx: &ChatContext) -> Result<Completed, ActionError> {
        let action = self.action();
        let (Some(sender), Some(signer)) = (ctx.account.as_ref(), ctx.signer.as_ref()) else {
            return Err(ActionError::NotConnected);
        };
        let package = ctx
            .package()
            .ok_or(ActionError::Unavailable("Chat package is not configured for this network"))?;

        let registries = Registries::resolve(ctx, action.registries())
            .await
            .require(action.registries())?;
        self.validate()?;

        let call = MoveCall {
            package: package.clone(),
            module: MODULE,
            function: action.function(),
            arguments: self
                .arguments(&registries)
                .ok_or(ActionError::Unavailable("Registries not found"))?,
        };
        info!(call = %call.target(), %sender, network = %ctx.network, "submitting transaction");

        let tx_bytes = ctx.chain.move_call(sender, &call, ctx.gas_budget).await?;
        let signature = signer.sign_transaction(&tx_bytes)?;
        let digest = ctx.chain.execute_transaction(&tx_bytes, &signature).await?;
        let tx = ctx.chain.wait_for_transaction(&digest).await?;

        let created = action.creates().and_then(|name| tx.created(name));
        info!(%digest, created = ?created, "transaction finalized");
        Ok(Completed { digest, created })
    }
}

pub fn form_name(action: Action, room: Option<&ObjectId>) -> String {
    match room {
        Some(room) => format!("{}:{room}", action.function()),
        None => action.function().to_owned(),
    }
}

/// Runs a submitted form to completion and records the outcome in the
/// session. The work is detached from the request so that a dropped
/// connection cannot leave the form stuck in `submitting`.
pub async fn submit_form(
    refresh: &broadcast::Sender<Refresh>,
    session: &Session,
    ctx: ChatContext,
    request: ActionRequest,
) -> AppResult<()> {
    let form_name = request.form();
    let action = request.action();
    let mut form = FormState::load(session, &form_name).await?;
    if !form.begin(request.values()) {
        info!(form = %form_name, "submission already in flight");
        return Ok(());
    }
    form.save(session, &form_name).await?;
    session.save().await?;

    let task = {
        let session = session.clone();
        let refresh = refresh.clone();
        tokio::spawn(async move {
            let result = request.execute(&ctx).await;
            finish(&session, &refresh, &ctx, &request, form, result).await
        })
    };
    let outcome = match task.await {
        Ok(outcome) => outcome,
        Err(e) => Err(e.into()),
    };
    if outcome.is_err() {
        release(session, &form_name, action).await;
    }
    outcome
}

async fn finish(
    session: &Session,
    refresh: &broadcast::Sender<Refresh>,
    ctx: &ChatContext,
    request: &ActionRequest,
    mut form: FormState,
    result: Result<Completed, ActionError>,
) -> AppResult<()> {
    let action = request.action();
    match result {
        Ok(done) => {
            form.succeed();
            let mut view = ViewState::load(session).await?;
            view.complete(action, &done);
            view.save(session).await?;
            // nobody listening is fine
            let _ = refresh.send(Refresh {
                account: ctx.account.clone(),
                room: request.room().cloned().or(done.created),
            });
        }
        Err(e) => {
            warn!(action = action.function(), "action failed: {e}");
            form.fail(e.user_message(action));
        }
    }
    form.save(session, &request.form()).await?;
    session.save().await?;
    Ok(())
}

/// Puts a form left in `submitting` back to idle after the submission task
/// failed without recording an outcome.
async fn release(session: &Session, form_name: &str, action: Action) {
    let released = async {
        let mut form = FormState::load(session, form_name).await?;
        if form.phase == FormPhase::Submitting {
            form.fail(action.fallback());
            form.save(session, form_name).await?;
            session.save().await?;
        }
        Ok::<_, tower_sessions::session::Error>(())
    };
    if let Err(e) = released.await {
        warn!(form = %form_name, "could not release form: {e}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::broadcast::error::TryRecvError;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::{
        chain::fake::{id, FakeChain},
        context::testing::{chat_type, context, key},
        view::Tab,
        wallet::Signer,
    };

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn registries(chain: FakeChain) -> FakeChain {
        chain
            .with_published(&chat_type("ProfileRegistry"), "0xa1")
            .with_published(&chat_type("RoomRegistry"), "0xa2")
            .with_published(&chat_type("MessageRegistry"), "0xa3")
            .with_published(&chat_type("RoomMemberRegistry"), "0xa4")
    }

    fn object_args(call: &MoveCall) -> Vec<String> {
        call.arguments
            .iter()
            .map(|arg| match arg {
                CallArg::Object(id) => id.short(),
                CallArg::Pure(s) => s.clone(),
            })
            .collect()
    }

    #[tokio::test]
    async fn create_room_returns_new_id() {
        let chain = Arc::new(registries(FakeChain::new()).with_created(&chat_type("Room"), "0xbeef"));
        let ctx = context(chain.clone(), Some(key(1)));

        let done = ActionRequest::CreateRoom {
            name: "lobby".to_owned(),
            description: String::new(),
        }
        .execute(&ctx)
        .await
        .unwrap();

        assert_eq!(done.created, Some(id("0xbeef")));
        let calls = chain.move_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function, "create_room");
        assert_eq!(
            object_args(&calls[0]),
            vec!["0x0000...00a1", "0x0000...00a2", "0x0000...00a4", "lobby", "", "0x0000...0006"]
        );
    }

    #[tokio::test]
    async fn send_message_argument_order() {
        let chain = Arc::new(registries(FakeChain::new()));
        let ctx = context(chain.clone(), Some(key(1)));

        ActionRequest::SendMessage {
            room: id("0x77"),
            content: "gm".to_owned(),
        }
        .execute(&ctx)
        .await
        .unwrap();

        assert_eq!(
            object_args(&chain.move_calls()[0]),
            vec![
                "0x0000...00a1",
                "0x0000...00a2",
                "0x0000...0077",
                "0x0000...00a3",
                "0x0000...00a4",
                "gm",
                "0x0000...0006"
            ]
        );
    }

    #[tokio::test]
    async fn invalid_input_is_never_submitted() {
        let chain = Arc::new(registries(FakeChain::new()));
        let ctx = context(chain.clone(), Some(key(1)));

        let err = ActionRequest::CreateProfile { username: "ab".to_owned() }
            .execute(&ctx)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(Action::CreateProfile), "Username must be between 3 and 50 characters");
        assert!(chain.move_calls().is_empty());
    }

    #[tokio::test]
    async fn missing_registry_blocks_submission() {
        let chain = Arc::new(FakeChain::new().with_published(&chat_type("ProfileRegistry"), "0xa1"));
        let ctx = context(chain.clone(), Some(key(1)));

        let err = ActionRequest::LeaveRoom { room: id("0x77") }.execute(&ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "Member registry not found");
        assert!(chain.move_calls().is_empty());
    }

    #[tokio::test]
    async fn wallet_required() {
        let chain = Arc::new(registries(FakeChain::new()));
        let ctx = context(chain.clone(), None);

        let err = ActionRequest::JoinRoom { room: id("0x77") }.execute(&ctx).await.unwrap_err();
        assert!(matches!(err, ActionError::NotConnected));
        assert!(chain.calls().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_is_surfaced_verbatim() {
        let chain = Arc::new(registries(FakeChain::new()).failing_execution("MoveAbort in join_room: 7"));
        let ctx = context(chain, Some(key(1)));

        let err = ActionRequest::JoinRoom { room: id("0x77") }.execute(&ctx).await.unwrap_err();
        assert_eq!(err.user_message(Action::JoinRoom), "MoveAbort in join_room: 7");
    }

    #[test]
    fn empty_remote_message_uses_fallback() {
        let err = ActionError::Chain(ChainError::Rpc {
            code: -1,
            message: String::new(),
        });
        assert_eq!(err.user_message(Action::SendMessage), "Failed to send message");
    }

    #[tokio::test]
    async fn success_refreshes_once_and_clears_the_form() {
        let me = key(1);
        let ctx = context(Arc::new(registries(FakeChain::new())), Some(me.clone()));
        let session = session();
        let (tx, mut rx) = broadcast::channel(4);
        let request = ActionRequest::SendMessage {
            room: id("0x77"),
            content: "gm".to_owned(),
        };
        let form = request.form();

        submit_form(&tx, &session, ctx, request).await.unwrap();

        assert_eq!(ViewState::load(&session).await.unwrap().refresh, 1);
        assert_eq!(FormState::load(&session, &form).await.unwrap(), FormState::default());

        let notice = rx.try_recv().unwrap();
        assert!(notice.for_room(&id("0x77")));
        assert!(notice.for_account(me.address()));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn created_room_is_selected_in_place() {
        let chain = registries(FakeChain::new()).with_created(&chat_type("Room"), "0xbeef");
        let ctx = context(Arc::new(chain), Some(key(1)));
        let session = session();
        let view = ViewState { tab: Tab::Rooms, ..ViewState::default() };
        view.save(&session).await.unwrap();
        let (tx, mut rx) = broadcast::channel(4);

        let request = ActionRequest::CreateRoom {
            name: "lobby".to_owned(),
            description: String::new(),
        };
        submit_form(&tx, &session, ctx, request).await.unwrap();

        let view = ViewState::load(&session).await.unwrap();
        assert_eq!(view.selected_room, Some(id("0xbeef")));
        assert_eq!(view.tab, Tab::Rooms);
        assert!(rx.try_recv().unwrap().for_room(&id("0xbeef")));
    }

    #[tokio::test]
    async fn failure_keeps_the_draft_and_skips_refresh() {
        let chain = registries(FakeChain::new()).failing_execution("MoveAbort in send_message: 3");
        let ctx = context(Arc::new(chain), Some(key(1)));
        let session = session();
        let (tx, mut rx) = broadcast::channel(4);
        let request = ActionRequest::SendMessage {
            room: id("0x77"),
            content: "gm".to_owned(),
        };
        let form = request.form();

        submit_form(&tx, &session, ctx, request).await.unwrap();

        let form = FormState::load(&session, &form).await.unwrap();
        assert_eq!(form.phase, FormPhase::Idle);
        assert_eq!(form.value("content"), "gm");
        assert_eq!(form.error.as_deref(), Some("MoveAbort in send_message: 3"));
        assert_eq!(ViewState::load(&session).await.unwrap().refresh, 0);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn crashed_submission_releases_the_form() {
        let chain = registries(FakeChain::new()).panicking_execution();
        let ctx = context(Arc::new(chain), Some(key(1)));
        let session = session();
        let (tx, _rx) = broadcast::channel(4);
        let request = ActionRequest::JoinRoom { room: id("0x77") };
        let form = request.form();

        assert!(submit_form(&tx, &session, ctx, request).await.is_err());

        let state = FormState::load(&session, &form).await.unwrap();
        assert_eq!(state.phase, FormPhase::Idle);
        assert_eq!(state.error.as_deref(), Some("Failed to join room"));

        // the next attempt goes through instead of being dropped as in flight
        let ctx = context(Arc::new(registries(FakeChain::new())), Some(key(1)));
        let request = ActionRequest::JoinRoom { room: id("0x77") };
        submit_form(&tx, &session, ctx, request).await.unwrap();
        assert_eq!(FormState::load(&session, &form).await.unwrap(), FormState::default());
    }

    #[test]
    fn room_forms_are_kept_apart() {
        let a = ActionRequest::JoinRoom { room: id("0x1") }.form();
        let b = ActionRequest::JoinRoom { room: id("0x2") }.form();
        assert_ne!(a, b);
        assert_eq!(ActionRequest::CreateRoom { name: String::new(), description: String::new() }.form(), "create_room");
    }
}
