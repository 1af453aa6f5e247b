use axum::{
    debug_handler,
    extract::Query,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    context::ChatContext,
    include_res, profiles, rooms,
    view::{Tab, ViewState},
    wallet::network_options,
    AppResult, AppState,
};

#[derive(Deserialize)]
pub(crate) struct IndexQuery {
    tab: Option<Tab>,
}

fn tabs(active: Tab) -> String {
    Tab::ALL
        .into_iter()
        .map(|tab| {
            format!(
                r#"<a href="/?tab={tab}"{}>{}</a>"#,
                if tab == active { r#" class="active""# } else { "" },
                tab.label()
            )
        })
        .collect()
}

fn package_notice(ctx: &ChatContext) -> String {
    if ctx.package().is_some() {
        return String::new();
    }
    format!(
        r#"<p class="notice">No chat package is configured for {}. Set {}_CHAT_PACKAGE_ID to enable chatting.</p>"#,
        ctx.network,
        ctx.network.env_prefix()
    )
}

#[debug_handler(state = AppState)]
pub async fn index(
    Query(IndexQuery { tab }): Query<IndexQuery>,
    ctx: ChatContext,
    session: Session,
) -> AppResult<Response> {
    // an account whose key is gone from the keystore counts as disconnected
    let (Some(account), Some(_)) = (ctx.account.as_ref(), ctx.signer.as_ref()) else {
        return Ok(Redirect::to("/connect?return_url=/").into_response());
    };

    let mut view = ViewState::load(&session).await?;
    if let Some(tab) = tab.filter(|tab| *tab != view.tab) {
        view.tab = tab;
        view.save(&session).await?;
    }

    let content = match view.tab {
        Tab::Profile => profiles::profile_tab(&ctx, &session).await?,
        Tab::Rooms => rooms::rooms_tab(&ctx, &session).await?,
        Tab::Chat => rooms::chat_tab(&ctx, &session, &view).await?,
    };

    Ok(Html(
        include_res!(str, "/pages/index.html")
            .replace("{networks}", &network_options(ctx.network))
            .replace("{address}", account.as_str())
            .replace("{account}", &account.short())
            .replace("{notice}", &package_notice(&ctx))
            .replace("{tabs}", &tabs(view.tab))
            .replace("{content}", &content)
    ).into_response())
}
