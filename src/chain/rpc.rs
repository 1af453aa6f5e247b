use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::debug;

use super::{
    types::{ObjectResponse, TransactionBlock},
    Address, ChainApi, ChainError, MoveCall, MoveObject, ObjectId, SuiEvent,
};

const MULTI_GET_CHUNK: usize = 50;
const FINALITY_POLL: Duration = Duration::from_secs(2);
const FINALITY_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBytes {
    tx_bytes: String,
}

/// The node answers lookups of a digest it hasn't indexed yet with this error.
fn not_indexed_yet(e: &ChainError) -> bool {
    matches!(e, ChainError::Rpc { message, .. }
        if message.to_ascii_lowercase().contains("could not find the referenced transaction"))
}

/// JSON-RPC client for a Sui full node.
pub struct SuiRpc {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl SuiRpc {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, url = %self.url, "rpc call");

        let mut body: Value = self
            .http
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = body.get("error") {
            return Err(ChainError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("rpc error")
                    .to_owned(),
            });
        }

        let result = body.get_mut("result").map(Value::take).unwrap_or_default();
        serde_json::from_value(result).map_err(|e| ChainError::Decode(format!("{method}: {e}")))
    }

    async fn transaction_block(&self, digest: &str) -> Result<TransactionBlock, ChainError> {
        self.call(
            "sui_getTransactionBlock",
            json!([digest, { "showEffects": true, "showObjectChanges": true }]),
        )
        .await
    }
}

fn object_options() -> Value {
    json!({ "showContent": true, "showOwner": true })
}

#[async_trait]
impl ChainApi for SuiRpc {
    async fn get_object(&self, id: &ObjectId) -> Result<Option<MoveObject>, ChainError> {
        let response: ObjectResponse = self
            .call("sui_getObject", json!([id, object_options()]))
            .await?;
        Ok(response.into_move_object())
    }

    async fn multi_get_objects(&self, ids: &[ObjectId]) -> Result<Vec<MoveObject>, ChainError> {
        let chunks = ids.chunks(MULTI_GET_CHUNK).map(|chunk| {
            self.call::<Vec<ObjectResponse>>("sui_multiGetObjects", json!([chunk, object_options()]))
        });

        let mut objects = Vec::with_capacity(ids.len());
        for chunk in futures_util::future::try_join_all(chunks).await? {
            objects.extend(chunk.into_iter().filter_map(ObjectResponse::into_move_object));
        }
        Ok(objects)
    }

    async fn get_owned_objects(
        &self,
        owner: &Address,
        struct_type: &str,
    ) -> Result<Vec<MoveObject>, ChainError> {
        let page: Page<ObjectResponse> = self
            .call(
                "suix_getOwnedObjects",
                json!([
                    owner,
                    { "filter": { "StructType": struct_type }, "options": object_options() },
                    null,
                    null
                ]),
            )
            .await?;
        Ok(page.data.into_iter().filter_map(ObjectResponse::into_move_object).collect())
    }

    async fn query_events(
        &self,
        event_type: &str,
        limit: usize,
        descending: bool,
    ) -> Result<Vec<SuiEvent>, ChainError> {
        let page: Page<SuiEvent> = self
            .call(
                "suix_queryEvents",
                json!([{ "MoveEventType": event_type }, null, limit, descending]),
            )
            .await?;
        Ok(page.data)
    }

    async fn find_created_objects(
        &self,
        package: &ObjectId,
        struct_type: &str,
    ) -> Result<Vec<ObjectId>, ChainError> {
        let response: ObjectResponse = self
            .call(
                "sui_getObject",
                json!([package, { "showPreviousTransaction": true }]),
            )
            .await?;
        let Some(digest) = response.data.and_then(|data| data.previous_transaction) else {
            return Ok(Vec::new());
        };

        let publish = self.transaction_block(&digest).await?;
        Ok(publish
            .object_changes
            .into_iter()
            .filter(|change| change.kind == "created")
            .filter(|change| change.object_type.as_deref() == Some(struct_type))
            .filter_map(|change| change.object_id)
            .collect())
    }

    async fn move_call(
        &self,
        sender: &Address,
        call: &MoveCall,
        gas_budget: u64,
    ) -> Result<String, ChainError> {
        let arguments: Vec<Value> = call.arguments.iter().map(|arg| arg.to_json()).collect();
        let bytes: TransactionBytes = self
            .call(
                "unsafe_moveCall",
                json!([
                    sender,
                    call.package,
                    call.module,
                    call.function,
                    [],
                    arguments,
                    null,
                    gas_budget.to_string()
                ]),
            )
            .await?;
        Ok(bytes.tx_bytes)
    }

    async fn execute_transaction(
        &self,
        tx_bytes: &str,
        signature: &str,
    ) -> Result<String, ChainError> {
        let tx: TransactionBlock = self
            .call(
                "sui_executeTransactionBlock",
                json!([tx_bytes, [signature], { "showEffects": true }, "WaitForLocalExecution"]),
            )
            .await?;
        if let Some(error) = tx.failure() {
            return Err(ChainError::Execution { digest: tx.digest, error });
        }
        Ok(tx.digest)
    }

    async fn wait_for_transaction(&self, digest: &str) -> Result<TransactionBlock, ChainError> {
        let poll = async {
            loop {
                match self.transaction_block(digest).await {
                    Ok(tx) => return Ok(tx),
                    Err(e) if not_indexed_yet(&e) => tokio::time::sleep(FINALITY_POLL).await,
                    Err(e) => return Err(e),
                }
            }
        };

        let tx = tokio::time::timeout(FINALITY_TIMEOUT, poll)
            .await
            .map_err(|_| ChainError::Timeout(digest.to_owned()))??;
        if let Some(error) = tx.failure() {
            return Err(ChainError::Execution { digest: tx.digest, error });
        }
        Ok(tx)
    }
}
