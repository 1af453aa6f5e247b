use std::collections::HashMap;

use futures_util::future::join_all;
use tracing::warn;

use crate::{
    chain::{Address, ChainError},
    context::ChatContext,
    models::UserProfile,
};

pub const USER_PROFILE: &str = "UserProfile";

/// The first profile `owner` holds, if any.
pub async fn owned_profile(ctx: &ChatContext, owner: &Address) -> Result<Option<UserProfile>, ChainError> {
    let Some(struct_type) = ctx.chat_type(USER_PROFILE) else {
        return Ok(None);
    };
    ctx.chain
        .get_owned_objects(owner, &struct_type)
        .await?
        .first()
        .map(UserProfile::try_from)
        .transpose()
}

/// Username when the address has a profile, its shortened form otherwise.
pub async fn display_name(ctx: &ChatContext, address: &Address) -> String {
    match owned_profile(ctx, address).await {
        Ok(Some(profile)) => profile.username,
        Ok(None) => address.short(),
        Err(e) => {
            warn!(%address, "profile lookup failed: {e}");
            address.short()
        }
    }
}

/// Resolves each distinct address once.
pub async fn display_names<'a>(
    ctx: &ChatContext,
    addresses: impl IntoIterator<Item = &'a Address>,
) -> HashMap<Address, String> {
    let mut distinct: Vec<&Address> = addresses.into_iter().collect();
    distinct.sort();
    distinct.dedup();

    let names = join_all(distinct.iter().map(|address| display_name(ctx, address))).await;
    distinct.into_iter().cloned().zip(names).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        chain::fake::{addr, FakeChain},
        context::testing::{chat_type, context},
    };

    const ALICE: &str = "0x00000000000000000000000000000000000000000000000000000000000a11ce";
    const BOB: &str = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

    fn chain() -> FakeChain {
        FakeChain::new().with_owned(
            ALICE,
            "0x501",
            &chat_type(USER_PROFILE),
            json!({
                "owner": ALICE,
                "username": "alice",
                "created_at": "1",
                "updated_at": "2",
            }),
        )
    }

    #[tokio::test]
    async fn profile_name_or_short_address() {
        let ctx = context(Arc::new(chain()), None);

        assert_eq!(display_name(&ctx, &addr(ALICE)).await, "alice");
        assert_eq!(display_name(&ctx, &addr(BOB)).await, "0x1234...cdef");
    }

    #[tokio::test]
    async fn each_author_resolved_once() {
        let chain = Arc::new(chain());
        let ctx = context(chain.clone(), None);
        let (alice, bob) = (addr(ALICE), addr(BOB));

        let names = display_names(&ctx, [&alice, &bob, &alice, &alice]).await;

        assert_eq!(names.len(), 2);
        assert_eq!(names[&alice], "alice");
        assert_eq!(chain.calls(), vec!["get_owned_objects", "get_owned_objects"]);
    }

    #[tokio::test]
    async fn lookup_failure_falls_back_to_address() {
        let ctx = context(Arc::new(FakeChain::new().failing_queries("down")), None);
        assert_eq!(display_name(&ctx, &addr(BOB)).await, "0x1234...cdef");
    }

    #[tokio::test]
    async fn unset_package_skips_lookup() {
        let chain = Arc::new(chain());
        let mut ctx = context(chain.clone(), None);
        ctx.config.chat_package_id = None;

        assert_eq!(owned_profile(&ctx, &addr(ALICE)).await.unwrap(), None);
        assert!(chain.calls().is_empty());
    }
}
