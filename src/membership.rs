//! Room membership, derived by replaying join/leave events.
//!
//! The contract keeps the authoritative member table; this client only sees
//! the newest [`EVENT_PAGE_LIMIT`] events of each kind. Once a room/account
//! pair has more history than that, the count comparison can be wrong. Moving
//! to the contract's own membership lookup, or paging through the full
//! history, would remove that limit.

use tracing::warn;

use crate::{
    chain::{Address, ObjectId, SuiEvent, EVENT_PAGE_LIMIT},
    context::ChatContext,
    GetField,
};

pub const USER_JOINED_ROOM: &str = "UserJoinedRoom";
pub const USER_LEFT_ROOM: &str = "UserLeftRoom";

fn concerns(event: &SuiEvent, room: &ObjectId, user: &Address) -> bool {
    let json = &event.parsed_json;
    json.get_id_field("room_id").is_ok_and(|id| &id == room)
        && json.get_address_field("user").is_ok_and(|a| &a == user)
}

/// Member iff the pair has strictly more joins than leaves.
pub fn derive_membership(
    joined: &[SuiEvent],
    left: &[SuiEvent],
    room: &ObjectId,
    user: &Address,
) -> bool {
    let joins = joined.iter().filter(|e| concerns(e, room, user)).count();
    let leaves = left.iter().filter(|e| concerns(e, room, user)).count();
    joins > leaves
}

/// Both event pages, fetched once and checked against any number of rooms.
#[derive(Debug, Clone, Default)]
pub struct MembershipEvents {
    joined: Vec<SuiEvent>,
    left: Vec<SuiEvent>,
}

impl MembershipEvents {
    /// `None` when the package is unset or either query fails.
    pub async fn load(ctx: &ChatContext) -> Option<MembershipEvents> {
        let (joined_type, left_type) = (ctx.chat_type(USER_JOINED_ROOM)?, ctx.chat_type(USER_LEFT_ROOM)?);

        let (joined, left) = tokio::join!(
            ctx.chain.query_events(&joined_type, EVENT_PAGE_LIMIT, true),
            ctx.chain.query_events(&left_type, EVENT_PAGE_LIMIT, true),
        );
        match (joined, left) {
            (Ok(joined), Ok(left)) => Some(MembershipEvents { joined, left }),
            (Err(e), _) | (_, Err(e)) => {
                warn!(network = %ctx.network, "membership events unavailable: {e}");
                None
            }
        }
    }

    pub fn is_member(&self, room: &ObjectId, user: &Address) -> bool {
        derive_membership(&self.joined, &self.left, room, user)
    }
}

/// Whether the connected account is in `room`. Anything short of a full
/// answer (no account, no package, failed query) reads as "not a member".
pub async fn is_member(ctx: &ChatContext, room: &ObjectId) -> bool {
    let Some(account) = ctx.account.as_ref() else {
        return false;
    };
    MembershipEvents::load(ctx)
        .await
        .is_some_and(|events| events.is_member(room, account))
}
