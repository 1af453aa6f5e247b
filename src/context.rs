//! Per-request context handed to every query and action.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;

use crate::{
    chain::{Address, ChainApi, ObjectId},
    config::{Network, NetworkConfig},
    session::{ACCOUNT, NETWORK},
    wallet::Signer,
    AppError, AppResult, AppState,
};

pub const MODULE: &str = "chat";

#[derive(Clone)]
pub struct ChatContext {
    pub network: Network,
    pub config: NetworkConfig,
    pub chain: Arc<dyn ChainApi>,
    pub account: Option<Address>,
    pub signer: Option<Arc<dyn Signer>>,
    pub gas_budget: u64,
}

impl ChatContext {
    pub async fn load(state: &AppState, session: &Session) -> AppResult<ChatContext> {
        let network = session
            .get::<Network>(NETWORK)
            .await?
            .unwrap_or(state.config.default_network);
        let chain = state
            .chains
            .get(network)
            .ok_or(format!("no chain client for {network}"))?;

        let account = session.get::<Address>(ACCOUNT).await?;
        let signer = account.as_ref().and_then(|address| {
            state
                .keystore
                .get(address)
                .map(|key| key as Arc<dyn Signer>)
        });

        Ok(ChatContext {
            network,
            config: state.config.network(network).clone(),
            chain,
            account,
            signer,
            gas_budget: state.config.gas_budget,
        })
    }

    /// `None` while the chat package is unset for this network.
    pub fn package(&self) -> Option<&ObjectId> {
        self.config.chat_package_id.as_ref()
    }

    /// Fully qualified `<package>::chat::<name>`.
    pub fn chat_type(&self, name: &str) -> Option<String> {
        self.package().map(|package| format!("{package}::{MODULE}::{name}"))
    }
}

impl FromRequestParts<AppState> for ChatContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::from(msg))?;
        ChatContext::load(state, &session).await
    }
}
