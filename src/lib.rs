pub mod actions;
pub mod chain;
pub mod config;
pub mod context;
pub mod forms;
pub mod index;
pub mod membership;
pub mod models;
pub mod poll;
pub mod profiles;
pub mod registry;
pub mod res;
pub mod rooms;
pub mod session;
pub mod view;
pub mod wallet;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::Value;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use chain::{Address, ChainApi, ChainError, ObjectId, SuiRpc};
use config::{Config, Network};
use wallet::Keystore;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chains: Chains,
    pub keystore: Keystore,
    pub refresh: broadcast::Sender<view::Refresh>,
}

impl AppState {
    pub fn new(config: Config, chains: Chains, keystore: Keystore) -> AppState {
        AppState {
            config: Arc::new(config),
            chains,
            keystore,
            refresh: broadcast::channel(64).0,
        }
    }
}

/// One chain client per network.
#[derive(Clone)]
pub struct Chains(Arc<HashMap<Network, Arc<dyn ChainApi>>>);

impl Chains {
    pub fn new(chains: impl IntoIterator<Item = (Network, Arc<dyn ChainApi>)>) -> Chains {
        Chains(Arc::new(chains.into_iter().collect()))
    }

    pub fn from_config(config: &Config) -> Chains {
        Chains::new(config.networks().iter().map(|nc| {
            let chain: Arc<dyn ChainApi> = Arc::new(SuiRpc::new(nc.url.clone()));
            (nc.network, chain)
        }))
    }

    pub fn get(&self, network: Network) -> Option<Arc<dyn ChainApi>> {
        self.0.get(&network).cloned()
    }
}

pub fn router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(
            time::Duration::try_from(state.config.session_expiry).unwrap_or(time::Duration::minutes(30)),
        ));

    Router::new()
        .route("/", get(index::index))
        .route("/style.css", get(res::style))
        .merge(wallet::router())
        .nest("/r", rooms::router())
        .nest("/p", profiles::router())
        .fallback(not_found)
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> AppResult<Response> {
    res::sorry("page")
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> Result<String, ChainError>;
    fn get_obj_field(&self, field: &str) -> Result<&Value, ChainError>;
    fn get_u64_field(&self, field: &str) -> Result<u64, ChainError>;
    fn get_id_field(&self, field: &str) -> Result<ObjectId, ChainError>;
    fn get_address_field(&self, field: &str) -> Result<Address, ChainError>;
}

impl GetField for serde_json::Value {
    fn get_str_field(&self, field: &str) -> Result<String, ChainError> {
        Ok(
            self.get_obj_field(field)?
            .as_str()
            .ok_or_else(|| ChainError::Decode(format!("expected {field} in {self} to be string")))?
            .to_owned()
        )
    }

    fn get_obj_field(&self, field: &str) -> Result<&Value, ChainError> {
        self.get(field)
        .ok_or_else(|| ChainError::Decode(format!("expected {field} in {self}")))
    }

    // u64 travels as a decimal string
    fn get_u64_field(&self, field: &str) -> Result<u64, ChainError> {
        let value = self.get_obj_field(field)?;
        value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
            .ok_or_else(|| ChainError::Decode(format!("expected {field} in {self} to be u64")))
    }

    // ids show up either bare or wrapped as { "id": "0x.." }
    fn get_id_field(&self, field: &str) -> Result<ObjectId, ChainError> {
        let value = self.get_obj_field(field)?;
        let raw = match value.get("id") {
            Some(inner) => inner,
            None => value,
        };
        raw.as_str()
            .and_then(|s| ObjectId::parse(s).ok())
            .ok_or_else(|| ChainError::Decode(format!("expected {field} in {self} to be an id")))
    }

    fn get_address_field(&self, field: &str) -> Result<Address, ChainError> {
        self.get_str_field(field)?
            .parse()
            .map_err(|e| ChainError::Decode(format!("{field}: {e}")))
    }
}


pub type AppResult<T> = Result<T, AppError>;
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("{:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}\n\n{}", self.0, self.0.backtrace()),
        )
            .into_response()
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self(anyhow::Error::msg(err.to_owned()))
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(serde_json::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(axum::Error);
apperr_impl!(ChainError);
apperr_impl!(wallet::WalletError);
apperr_impl!(tokio::task::JoinError);
