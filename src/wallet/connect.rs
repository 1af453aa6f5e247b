use axum::{
    debug_handler,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::{
    chain::Address,
    config::Network,
    include_res, res,
    session::{ACCOUNT, NETWORK, RETURN_URL},
    AppResult, AppState,
};

use super::Keystore;

#[derive(Deserialize)]
pub(crate) struct ConnectQuery {
    pub(crate) return_url: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ConnectForm {
    address: String,
    network: Network,
}

#[derive(Deserialize)]
pub(crate) struct NetworkForm {
    network: Network,
}

pub(crate) fn network_options(selected: Network) -> String {
    Network::ALL
        .into_iter()
        .map(|network| {
            format!(
                r#"<option value="{network}"{}>{network}</option>"#,
                if network == selected { " selected" } else { "" }
            )
        })
        .collect()
}

#[debug_handler(state = AppState)]
pub(crate) async fn connect_page(
    Query(ConnectQuery { return_url }): Query<ConnectQuery>,
    State(state): State<AppState>,
    State(keystore): State<Keystore>,
    session: Session,
) -> AppResult<Response> {
    if let Some(return_url) = return_url {
        session.insert(RETURN_URL, return_url).await?;
    }
    let network = session
        .get::<Network>(NETWORK)
        .await?
        .unwrap_or(state.config.default_network);

    let mut accounts = String::new();
    for (i, address) in keystore.addresses().enumerate() {
        accounts += &include_res!(str, "/pages/account_option.html")
            .replace("{address}", address.as_str())
            .replace("{short}", &address.short())
            .replace("{checked}", if i == 0 { "checked" } else { "" });
    }
    if accounts.is_empty() {
        accounts = "<p>No accounts in the keystore. Set SUI_KEYSTORE and restart.</p>".to_owned();
    }

    Ok(Html(
        include_res!(str, "/pages/connect.html")
            .replace("{accounts}", &accounts)
            .replace("{networks}", &network_options(network))
            .replace("{disabled}", res::disabled(keystore.addresses().next().is_none()))
    ).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn connect(
    State(keystore): State<Keystore>,
    session: Session,
    Form(ConnectForm { address, network }): Form<ConnectForm>,
) -> AppResult<Response> {
    let address: Address = address.parse().map_err(|e| format!("{e}"))?;
    if keystore.get(&address).is_none() {
        return Err(format!("{address} is not in the keystore"))?;
    }

    session.insert(ACCOUNT, &address).await?;
    session.insert(NETWORK, network).await?;
    info!(%address, %network, "wallet connected");

    let return_url: String = session
        .remove::<String>(RETURN_URL)
        .await?
        .filter(|url| url.starts_with('/') && !url.starts_with("//"))
        .unwrap_or_else(|| "/".to_owned());
    Ok(Redirect::to(&return_url).into_response())
}

#[debug_handler]
pub(crate) async fn switch_network(
    session: Session,
    Form(NetworkForm { network }): Form<NetworkForm>,
) -> AppResult<Redirect> {
    session.insert(NETWORK, network).await?;
    info!(%network, "network switched");
    Ok(Redirect::to("/"))
}
