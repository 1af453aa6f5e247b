//! Locates the shared registry objects every contract call references.

use std::collections::HashMap;

use futures_util::future::join_all;
use tracing::warn;

use crate::{
    actions::ActionError,
    chain::{ChainError, ObjectId},
    context::ChatContext,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    Profile,
    Room,
    Message,
    RoomMember,
}

impl RegistryKind {
    pub fn struct_name(&self) -> &'static str {
        use RegistryKind::*;
        match self {
            Profile => "ProfileRegistry",
            Room => "RoomRegistry",
            Message => "MessageRegistry",
            RoomMember => "RoomMemberRegistry",
        }
    }

    fn missing(&self) -> &'static str {
        use RegistryKind::*;
        match self {
            Profile => "Profile registry not found",
            Room => "Room registry not found",
            Message => "Message registry not found",
            RoomMember => "Member registry not found",
        }
    }
}

/// A configured id costs one point lookup; otherwise the registry is
/// discovered from the package's publish transaction.
pub async fn resolve(ctx: &ChatContext, kind: RegistryKind) -> Result<Option<ObjectId>, ChainError> {
    let Some(package) = ctx.package() else {
        return Ok(None);
    };

    if let Some(id) = ctx.config.registry_id(kind) {
        return Ok(ctx.chain.get_object(id).await?.map(|object| object.id));
    }

    let struct_type = format!("{package}::chat::{}", kind.struct_name());
    Ok(ctx
        .chain
        .find_created_objects(package, &struct_type)
        .await?
        .into_iter()
        .next())
}

/// Registries resolved for one request. Lookup failures count as "not found".
#[derive(Debug, Clone, Default)]
pub struct Registries(HashMap<RegistryKind, ObjectId>);

impl Registries {
    pub async fn resolve(ctx: &ChatContext, kinds: &[RegistryKind]) -> Registries {
        let lookups = kinds.iter().map(|&kind| async move { (kind, resolve(ctx, kind).await) });

        let mut found = HashMap::new();
        for (kind, result) in join_all(lookups).await {
            match result {
                Ok(Some(id)) => {
                    found.insert(kind, id);
                }
                Ok(None) => {}
                Err(e) => warn!(registry = kind.struct_name(), network = %ctx.network, "lookup failed: {e}"),
            }
        }
        Registries(found)
    }

    pub fn get(&self, kind: RegistryKind) -> Option<&ObjectId> {
        self.0.get(&kind)
    }

    pub fn has_all(&self, kinds: &[RegistryKind]) -> bool {
        kinds.iter().all(|kind| self.0.contains_key(kind))
    }

    /// Ids in the order asked for.
    pub fn require(&self, kinds: &[RegistryKind]) -> Result<Vec<ObjectId>, ActionError> {
        if let [kind] = kinds {
            return self
                .get(*kind)
                .cloned()
                .map(|id| vec![id])
                .ok_or(ActionError::Unavailable(kind.missing()));
        }
        kinds
            .iter()
            .map(|kind| self.get(*kind).cloned())
            .collect::<Option<Vec<_>>>()
            .ok_or(ActionError::Unavailable("Registries not found"))
    }
}
