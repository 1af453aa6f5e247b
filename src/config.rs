//! Per-network endpoints and contract identifiers.
//!
//! Every value can be overridden through the environment (or a `.env` file).
//! `0xTODO` and empty strings mean "unset" and turn the dependent features off.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{chain::ObjectId, registry::RegistryKind};

pub const UNSET: &str = "0xTODO";

const TESTNET_CHAT_PACKAGE_ID: &str =
    "0x4ce374f8a60cd6d6afa63acc3b59ed9dff1f2e14a79bc0df65c1dbff54e9c8d9";
const TESTNET_PROFILE_REGISTRY_ID: &str =
    "0x218fefe70414170f3d8ea33a6cedacb5d861de8496fdced59f2b8c3ffbd07236";
const TESTNET_ROOM_REGISTRY_ID: &str =
    "0x117df5628d31ec47588035e8705c085861a8c92c9fb6a31c3f610b5ad1b3f19d";
const TESTNET_MESSAGE_REGISTRY_ID: &str =
    "0x6ea6e8e638ac90c62e5c7e55aff7ff81d64f454826b4ebae0ffa1a08d697a05f";
const TESTNET_MEMBER_REGISTRY_ID: &str =
    "0xd0c59c2cb986f43e12e4115bc53c58fdd19c248d3fbdea658c9007e5fee9a3d5";

const DEFAULT_GAS_BUDGET: u64 = 50_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    Devnet,
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Devnet, Network::Testnet, Network::Mainnet];

    pub fn name(&self) -> &'static str {
        use Network::*;
        match self {
            Devnet => "devnet",
            Testnet => "testnet",
            Mainnet => "mainnet",
        }
    }

    pub fn env_prefix(&self) -> &'static str {
        use Network::*;
        match self {
            Devnet => "DEVNET",
            Testnet => "TESTNET",
            Mainnet => "MAINNET",
        }
    }

    fn default_url(&self) -> String {
        format!("https://fullnode.{}.sui.io:443", self.name())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .into_iter()
            .find(|n| n.name() == s)
            .ok_or_else(|| format!("unknown network {s:?}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub network: Network,
    pub url: String,
    pub chat_package_id: Option<ObjectId>,
    pub profile_registry_id: Option<ObjectId>,
    pub room_registry_id: Option<ObjectId>,
    pub message_registry_id: Option<ObjectId>,
    pub member_registry_id: Option<ObjectId>,
}

impl NetworkConfig {
    pub fn registry_id(&self, kind: RegistryKind) -> Option<&ObjectId> {
        use RegistryKind::*;
        match kind {
            Profile => self.profile_registry_id.as_ref(),
            Room => self.room_registry_id.as_ref(),
            Message => self.message_registry_id.as_ref(),
            RoomMember => self.member_registry_id.as_ref(),
        }
    }

    /// Named lookup for the active network's variables.
    pub fn variable(&self, name: &str) -> Option<String> {
        let id = match name {
            "url" => return Some(self.url.clone()),
            "chatPackageId" => &self.chat_package_id,
            "profileRegistryId" => &self.profile_registry_id,
            "roomRegistryId" => &self.room_registry_id,
            "messageRegistryId" => &self.message_registry_id,
            "memberRegistryId" => &self.member_registry_id,
            _ => return None,
        };
        id.as_ref().map(ObjectId::to_string)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub keystore: Option<String>,
    pub session_expiry: Duration,
    pub gas_budget: u64,
    pub default_network: Network,
    networks: Vec<NetworkConfig>,
}

impl Config {
    /// Reads `.env` and the process environment.
    pub fn from_env() -> Config {
        let _ = dotenv::dotenv();
        Config::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Config {
        let networks = Network::ALL
            .into_iter()
            .map(|network| network_config(network, &lookup))
            .collect();

        Config {
            bind: lookup("CHAT_BIND").unwrap_or_else(|| "0.0.0.0:8080".to_owned()),
            keystore: lookup("SUI_KEYSTORE").filter(|s| !s.is_empty()),
            session_expiry: Duration::from_secs(
                lookup("CHAT_SESSION_MINUTES")
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(30)
                    * 60,
            ),
            gas_budget: lookup("CHAT_GAS_BUDGET")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_GAS_BUDGET),
            default_network: lookup("CHAT_NETWORK")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            networks,
        }
    }

    pub fn network(&self, network: Network) -> &NetworkConfig {
        // `networks` is built from Network::ALL, in order
        &self.networks[network as usize]
    }

    pub fn networks(&self) -> &[NetworkConfig] {
        &self.networks
    }
}

fn network_config(network: Network, lookup: &impl Fn(&str) -> Option<String>) -> NetworkConfig {
    let prefix = network.env_prefix();
    let testnet = network == Network::Testnet;
    let var = |name: &str, default: Option<&str>| {
        lookup(&format!("{prefix}_{name}")).or_else(|| default.map(str::to_owned))
    };
    let id = |name: &str, default: &'static str| {
        resolve_id(var(name, testnet.then_some(default)).as_deref())
    };

    NetworkConfig {
        network,
        url: var("RPC_URL", None).unwrap_or_else(|| network.default_url()),
        chat_package_id: id("CHAT_PACKAGE_ID", TESTNET_CHAT_PACKAGE_ID),
        profile_registry_id: id("PROFILE_REGISTRY_ID", TESTNET_PROFILE_REGISTRY_ID),
        room_registry_id: id("ROOM_REGISTRY_ID", TESTNET_ROOM_REGISTRY_ID),
        message_registry_id: id("MESSAGE_REGISTRY_ID", TESTNET_MESSAGE_REGISTRY_ID),
        member_registry_id: id("MEMBER_REGISTRY_ID", TESTNET_MEMBER_REGISTRY_ID),
    }
}

fn resolve_id(value: Option<&str>) -> Option<ObjectId> {
    let value = value?.trim();
    if value.is_empty() || value == UNSET {
        return None;
    }
    match ObjectId::parse(value) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!("ignoring configured id: {e}");
            None
        }
    }
}
