//! In-memory node used by unit tests. Every call is recorded.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    types::{ObjectChange, TransactionBlock},
    Address, ChainApi, ChainError, MoveCall, MoveObject, ObjectId, SuiEvent,
};

#[derive(Default)]
pub(crate) struct FakeChain {
    objects: Mutex<HashMap<ObjectId, MoveObject>>,
    owned: Mutex<Vec<(Address, MoveObject)>>,
    events: Mutex<HashMap<String, Vec<SuiEvent>>>,
    published: Mutex<Vec<(String, ObjectId)>>,
    created: Mutex<Vec<(String, ObjectId)>>,
    execution_error: Mutex<Option<String>>,
    execution_panics: Mutex<bool>,
    query_error: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
    move_calls: Mutex<Vec<MoveCall>>,
}

pub(crate) fn id(raw: &str) -> ObjectId {
    ObjectId::parse(raw).unwrap()
}

pub(crate) fn addr(raw: &str) -> Address {
    Address::parse(raw).unwrap()
}

impl FakeChain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_object(self, object_id: &str, object_type: &str, fields: Value) -> Self {
        let object = MoveObject {
            id: id(object_id),
            object_type: object_type.to_owned(),
            fields,
        };
        self.objects.lock().unwrap().insert(object.id.clone(), object);
        self
    }

    pub(crate) fn with_owned(
        self,
        owner: &str,
        object_id: &str,
        object_type: &str,
        fields: Value,
    ) -> Self {
        let object = MoveObject {
            id: id(object_id),
            object_type: object_type.to_owned(),
            fields,
        };
        self.owned.lock().unwrap().push((addr(owner), object));
        self
    }

    /// Events are kept newest first, like a descending query returns them.
    pub(crate) fn with_event(self, event_type: &str, parsed_json: Value) -> Self {
        self.events
            .lock()
            .unwrap()
            .entry(event_type.to_owned())
            .or_default()
            .insert(
                0,
                SuiEvent {
                    event_type: event_type.to_owned(),
                    parsed_json,
                    ..Default::default()
                },
            );
        self
    }

    pub(crate) fn with_published(self, struct_type: &str, object_id: &str) -> Self {
        self.published
            .lock()
            .unwrap()
            .push((struct_type.to_owned(), id(object_id)));
        self
    }

    pub(crate) fn with_created(self, struct_type: &str, object_id: &str) -> Self {
        self.created
            .lock()
            .unwrap()
            .push((struct_type.to_owned(), id(object_id)));
        self
    }

    pub(crate) fn failing_execution(self, error: &str) -> Self {
        *self.execution_error.lock().unwrap() = Some(error.to_owned());
        self
    }

    pub(crate) fn panicking_execution(self) -> Self {
        *self.execution_panics.lock().unwrap() = true;
        self
    }

    pub(crate) fn failing_queries(self, error: &str) -> Self {
        *self.query_error.lock().unwrap() = Some(error.to_owned());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn move_calls(&self) -> Vec<MoveCall> {
        self.move_calls.lock().unwrap().clone()
    }

    fn record(&self, method: &str) -> Result<(), ChainError> {
        self.calls.lock().unwrap().push(method.to_owned());
        match self.query_error.lock().unwrap().as_ref() {
            Some(message) => Err(ChainError::Rpc {
                code: -32000,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChainApi for FakeChain {
    async fn get_object(&self, id: &ObjectId) -> Result<Option<MoveObject>, ChainError> {
        self.record("get_object")?;
        Ok(self.objects.lock().unwrap().get(id).cloned())
    }

    async fn multi_get_objects(&self, ids: &[ObjectId]) -> Result<Vec<MoveObject>, ChainError> {
        self.record("multi_get_objects")?;
        let objects = self.objects.lock().unwrap();
        Ok(ids.iter().filter_map(|id| objects.get(id).cloned()).collect())
    }

    async fn get_owned_objects(
        &self,
        owner: &Address,
        struct_type: &str,
    ) -> Result<Vec<MoveObject>, ChainError> {
        self.record("get_owned_objects")?;
        Ok(self
            .owned
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, object)| o == owner && object.object_type == struct_type)
            .map(|(_, object)| object.clone())
            .collect())
    }

    async fn query_events(
        &self,
        event_type: &str,
        limit: usize,
        descending: bool,
    ) -> Result<Vec<SuiEvent>, ChainError> {
        self.record("query_events")?;
        let mut events = self
            .events
            .lock()
            .unwrap()
            .get(event_type)
            .cloned()
            .unwrap_or_default();
        if !descending {
            events.reverse();
        }
        events.truncate(limit);
        Ok(events)
    }

    async fn find_created_objects(
        &self,
        _package: &ObjectId,
        struct_type: &str,
    ) -> Result<Vec<ObjectId>, ChainError> {
        self.record("find_created_objects")?;
        Ok(self
            .published
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == struct_type)
            .map(|(_, id)| id.clone())
            .collect())
    }

    async fn move_call(
        &self,
        _sender: &Address,
        call: &MoveCall,
        _gas_budget: u64,
    ) -> Result<String, ChainError> {
        self.record("move_call")?;
        self.move_calls.lock().unwrap().push(call.clone());
        Ok("AAEC".to_owned())
    }

    async fn execute_transaction(
        &self,
        _tx_bytes: &str,
        _signature: &str,
    ) -> Result<String, ChainError> {
        self.record("execute_transaction")?;
        let panics = *self.execution_panics.lock().unwrap();
        if panics {
            panic!("node went away mid-execution");
        }
        match self.execution_error.lock().unwrap().as_ref() {
            Some(error) => Err(ChainError::Execution {
                digest: "FAILED".to_owned(),
                error: error.clone(),
            }),
            None => Ok("DIGEST".to_owned()),
        }
    }

    async fn wait_for_transaction(&self, digest: &str) -> Result<TransactionBlock, ChainError> {
        self.record("wait_for_transaction")?;
        let object_changes = self
            .created
            .lock()
            .unwrap()
            .iter()
            .map(|(struct_type, id)| {
                serde_json::from_value::<ObjectChange>(json!({
                    "type": "created",
                    "objectId": id,
                    "objectType": struct_type,
                }))
                .unwrap()
            })
            .collect();
        Ok(TransactionBlock {
            digest: digest.to_owned(),
            effects: None,
            object_changes,
        })
    }
}
