use tower_sessions::Session;

use crate::{
    actions::{form_name, Action},
    chain::ChainError,
    context::ChatContext,
    forms::{FormPhase, FormState},
    include_res,
    models::UserProfile,
    poll::{Frame, PROFILE_CHECK_POLL, PROFILE_POLL},
    registry::{Registries, RegistryKind},
    res, AppResult,
};

use super::query::owned_profile;

/// Tells the browser the forms around the live card no longer fit.
pub(crate) const RELOAD: &str = "<p data-reload>Profile changed, reloading...</p>";

/// Drafts of the two profile forms.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProfileForms {
    pub(crate) create: FormState,
    pub(crate) update: FormState,
}

impl ProfileForms {
    pub(crate) async fn load(session: &Session) -> AppResult<ProfileForms> {
        Ok(ProfileForms {
            create: FormState::load(session, &form_name(Action::CreateProfile, None)).await?,
            update: FormState::load(session, &form_name(Action::UpdateUsername, None)).await?,
        })
    }
}

fn blocked(form: &FormState, available: bool) -> &'static str {
    res::disabled(!available || form.phase == FormPhase::Submitting)
}

/// Whether the profile registry can be found; the forms stay disabled until it can.
pub(crate) async fn profile_registry_available(ctx: &ChatContext) -> bool {
    Registries::resolve(ctx, &[RegistryKind::Profile])
        .await
        .has_all(&[RegistryKind::Profile])
}

fn profile_card(profile: &Result<Option<UserProfile>, ChainError>) -> Frame {
    match profile {
        Ok(None) => Frame {
            html: r#"<p class="muted">This account has no profile yet.</p>"#.to_owned(),
            ok: true,
            every: PROFILE_CHECK_POLL,
        },
        Ok(Some(profile)) => Frame {
            html: include_res!(str, "/pages/profiles/profile.html")
                .replace("{username}", &res::escape(&profile.username))
                .replace("{address}", profile.owner.as_str())
                .replace("{created}", &res::timestamp(profile.created_at))
                .replace("{updated}", &res::timestamp(profile.updated_at)),
            ok: true,
            every: PROFILE_POLL,
        },
        Err(e) => Frame {
            html: format!(
                r#"<p class="error">Error loading profile: {}</p>"#,
                res::escape(&e.to_string())
            ),
            ok: false,
            every: PROFILE_CHECK_POLL,
        },
    }
}

/// The create form while there is no profile, the rename form once there is.
fn profile_forms(profile: Option<&UserProfile>, forms: &ProfileForms, available: bool) -> String {
    match profile {
        None => include_res!(str, "/pages/profiles/create.html")
            .replace("{username}", &res::escape(forms.create.value("username")))
            .replace("{error}", &res::form_error(forms.create.error.as_deref()))
            .replace("{disabled}", blocked(&forms.create, available)),
        Some(profile) => include_res!(str, "/pages/profiles/update.html")
            .replace("{profile_id}", profile.id.as_str())
            .replace("{draft}", &res::escape(forms.update.value("username")))
            .replace("{error}", &res::form_error(forms.update.error.as_deref()))
            .replace("{disabled}", blocked(&forms.update, available)),
    }
}

/// The live profile card. `shown` is whether the page was rendered with a
/// profile, `None` when it couldn't tell; a different answer from the chain
/// asks the browser to reload so the right form comes up.
pub(crate) async fn render_profile(ctx: &ChatContext, shown: Option<bool>) -> Frame {
    let Some(account) = ctx.account.as_ref() else {
        return Frame {
            html: "<p>Please connect your wallet to view your profile</p>".to_owned(),
            ok: true,
            every: PROFILE_CHECK_POLL,
        };
    };

    let profile = owned_profile(ctx, account).await;
    match &profile {
        Ok(found) if shown != Some(found.is_some()) => Frame {
            html: RELOAD.to_owned(),
            ok: true,
            every: PROFILE_CHECK_POLL,
        },
        _ => profile_card(&profile),
    }
}

/// Profile tab: the live card, with the forms kept outside it so that a
/// re-render never touches a draft or its error.
pub(crate) async fn profile_tab(ctx: &ChatContext, session: &Session) -> AppResult<String> {
    let Some(account) = ctx.account.as_ref() else {
        return Ok("<p>Please connect your wallet to view your profile</p>".to_owned());
    };

    let (profile, available) = tokio::join!(owned_profile(ctx, account), profile_registry_available(ctx));
    let forms = ProfileForms::load(session).await?;

    let card = profile_card(&profile);
    let (live, forms) = match &profile {
        Ok(found) => (
            format!("/p/ws?profile={}", found.is_some()),
            profile_forms(found.as_ref(), &forms, available),
        ),
        Err(_) => ("/p/ws".to_owned(), String::new()),
    };
    Ok(format!(r#"<div id="live" data-live="{live}">{}</div>{forms}"#, card.html))
}
