mod connect;
mod disconnect;
mod keystore;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub(crate) use connect::network_options;
pub use keystore::{KeyPair, Keystore, Signer, WalletError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/connect", get(connect::connect_page).post(connect::connect))
        .route("/disconnect", get(disconnect::disconnect))
        .route("/network", post(connect::switch_network))
}
