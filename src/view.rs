//! What the page shows: active tab, selected room and the refresh counter.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{
    actions::{Action, Completed},
    chain::{Address, ObjectId},
    session::VIEW,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Profile,
    Rooms,
    Chat,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Profile, Tab::Rooms, Tab::Chat];

    pub fn name(&self) -> &'static str {
        match self {
            Tab::Profile => "profile",
            Tab::Rooms => "rooms",
            Tab::Chat => "chat",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Profile => "Profile",
            Tab::Rooms => "Rooms",
            Tab::Chat => "Chat",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .into_iter()
            .find(|tab| tab.name() == s)
            .ok_or_else(|| format!("unknown tab {s}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub selected_room: Option<ObjectId>,
    pub refresh: u64,
    pub tab: Tab,
}

impl ViewState {
    pub async fn load(session: &Session) -> Result<ViewState, tower_sessions::session::Error> {
        Ok(session.get(VIEW).await?.unwrap_or_default())
    }

    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(VIEW, self).await
    }

    pub fn select_room(&mut self, room: ObjectId) {
        self.selected_room = Some(room);
        self.tab = Tab::Chat;
    }

    /// Records a confirmed action. A newly created room becomes the selected
    /// one without leaving the current tab.
    pub fn complete(&mut self, action: Action, done: &Completed) {
        self.refresh = self.refresh.wrapping_add(1);
        if let (Action::CreateRoom, Some(room)) = (action, &done.created) {
            self.selected_room = Some(room.clone());
        }
    }
}

/// Sent to live views after a confirmed action so they re-query right away.
#[derive(Debug, Clone)]
pub struct Refresh {
    pub account: Option<Address>,
    pub room: Option<ObjectId>,
}

impl Refresh {
    pub fn for_account(&self, account: &Address) -> bool {
        self.account.as_ref() == Some(account)
    }

    pub fn for_room(&self, room: &ObjectId) -> bool {
        self.room.as_ref() == Some(room)
    }
}
