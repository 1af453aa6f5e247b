//! Boundary to the chain full node.
//!
//! Everything the app knows about profiles, rooms and messages comes through
//! [`ChainApi`]. The node is a black box: objects by id, objects by owner,
//! events by type, and the build/submit/wait trio for transactions.

mod rpc;
mod types;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use thiserror::Error;

pub use rpc::SuiRpc;
pub use types::{
    clock, shorten, Address, CallArg, IdError, MoveCall, MoveObject, ObjectId, SuiEvent,
    TransactionBlock,
};

/// Largest page a single event query returns. Anything older is invisible to
/// the client.
pub const EVENT_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{error}")]
    Execution { digest: String, error: String },
    #[error("transaction {0} was not finalized in time")]
    Timeout(String),
}

#[async_trait]
pub trait ChainApi: Send + Sync {
    async fn get_object(&self, id: &ObjectId) -> Result<Option<MoveObject>, ChainError>;

    /// Objects that don't exist or aren't Move objects are left out.
    async fn multi_get_objects(&self, ids: &[ObjectId]) -> Result<Vec<MoveObject>, ChainError>;

    async fn get_owned_objects(
        &self,
        owner: &Address,
        struct_type: &str,
    ) -> Result<Vec<MoveObject>, ChainError>;

    async fn query_events(
        &self,
        event_type: &str,
        limit: usize,
        descending: bool,
    ) -> Result<Vec<SuiEvent>, ChainError>;

    /// Objects of `struct_type` created when `package` was published.
    async fn find_created_objects(
        &self,
        package: &ObjectId,
        struct_type: &str,
    ) -> Result<Vec<ObjectId>, ChainError>;

    /// Unsigned transaction bytes (base64) for a single move call.
    async fn move_call(
        &self,
        sender: &Address,
        call: &MoveCall,
        gas_budget: u64,
    ) -> Result<String, ChainError>;

    /// Submits signed bytes and returns the digest.
    async fn execute_transaction(
        &self,
        tx_bytes: &str,
        signature: &str,
    ) -> Result<String, ChainError>;

    async fn wait_for_transaction(&self, digest: &str) -> Result<TransactionBlock, ChainError>;
}
