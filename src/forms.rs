//! Input bounds and per-form state.
//!
//! The bounds mirror the ones the contract enforces, measured in bytes like
//! Move's `string::length`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;

use crate::session::form_key;

pub const USERNAME: (usize, usize) = (3, 50);
pub const ROOM_NAME: (usize, usize) = (1, 100);
pub const DESCRIPTION_MAX: usize = 500;
pub const MESSAGE: (usize, usize) = (1, 2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Username must be between 3 and 50 characters")]
    Username,
    #[error("Room name must be between 1 and 100 characters")]
    RoomName,
    #[error("Description must be less than 500 characters")]
    Description,
    #[error("Message must be between 1 and 2000 characters")]
    Message,
}

// whitespace-only input never counts as filled in
fn within(value: &str, (min, max): (usize, usize)) -> bool {
    !value.trim().is_empty() && (min..=max).contains(&value.len())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    within(username, USERNAME).then_some(()).ok_or(ValidationError::Username)
}

pub fn validate_room(name: &str, description: &str) -> Result<(), ValidationError> {
    if !within(name, ROOM_NAME) {
        return Err(ValidationError::RoomName);
    }
    if description.len() > DESCRIPTION_MAX {
        return Err(ValidationError::Description);
    }
    Ok(())
}

pub fn validate_message(content: &str) -> Result<(), ValidationError> {
    within(content, MESSAGE).then_some(()).ok_or(ValidationError::Message)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormPhase {
    #[default]
    Idle,
    Submitting,
}

/// Lifecycle of one action form:
/// `idle -> submitting -> idle`, clearing the fields on success and keeping
/// them (with the error) on failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub phase: FormPhase,
    pub values: BTreeMap<String, String>,
    pub error: Option<String>,
}

impl FormState {
    pub async fn load(session: &Session, form: &str) -> Result<FormState, tower_sessions::session::Error> {
        Ok(session.get(&form_key(form)).await?.unwrap_or_default())
    }

    pub async fn save(&self, session: &Session, form: &str) -> Result<(), tower_sessions::session::Error> {
        if *self == FormState::default() {
            session.remove_value(&form_key(form)).await?;
            return Ok(());
        }
        session.insert(&form_key(form), self).await
    }

    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }

    /// Returns `false` while a submission is already in flight.
    pub fn begin(&mut self, values: impl IntoIterator<Item = (&'static str, String)>) -> bool {
        if self.phase == FormPhase::Submitting {
            return false;
        }
        self.phase = FormPhase::Submitting;
        self.values = values.into_iter().map(|(k, v)| (k.to_owned(), v)).collect();
        self.error = None;
        true
    }

    pub fn succeed(&mut self) {
        *self = FormState::default();
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.phase = FormPhase::Idle;
        self.error = Some(message.into());
    }
}
