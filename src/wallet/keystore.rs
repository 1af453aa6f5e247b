use std::{fmt, path::Path, sync::Arc};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use blake2::{digest::consts::U32, Blake2b, Digest};
use ed25519_dalek::{Signer as _, SigningKey};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::chain::Address;

type Blake2b256 = Blake2b<U32>;

const ED25519_FLAG: u8 = 0x00;
/// TransactionData intent: scope 0, version 0, app id 0.
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("could not read keystore: {0}")]
    Io(#[from] std::io::Error),
    #[error("keystore is not a JSON array of keys")]
    Format,
    #[error("not base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("unsupported key scheme flag {0:#04x}")]
    Scheme(u8),
    #[error("key has {0} bytes, expected 33")]
    Length(usize),
}

/// Something able to authorize transactions for one address.
pub trait Signer: Send + Sync {
    fn address(&self) -> &Address;

    /// Serialized signature (`flag || signature || public key`, base64) over
    /// base64 transaction bytes.
    fn sign_transaction(&self, tx_bytes: &str) -> Result<String, WalletError>;
}

pub struct KeyPair {
    key: SigningKey,
    address: Address,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("KeyPair").field("address", &self.address).finish_non_exhaustive()
    }
}

fn blake2b256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

impl KeyPair {
    pub fn from_secret(secret: [u8; 32]) -> KeyPair {
        let key = SigningKey::from_bytes(&secret);
        let address = Address::from_bytes(blake2b256(&[
            &[ED25519_FLAG],
            key.verifying_key().as_bytes(),
        ]));
        KeyPair { key, address }
    }

    /// One keystore entry: base64 of `flag || 32-byte secret`.
    pub fn from_keystore_entry(entry: &str) -> Result<KeyPair, WalletError> {
        let bytes = BASE64.decode(entry.trim())?;
        if bytes.len() != 33 {
            return Err(WalletError::Length(bytes.len()));
        }
        if bytes[0] != ED25519_FLAG {
            return Err(WalletError::Scheme(bytes[0]));
        }
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&bytes[1..]);
        Ok(KeyPair::from_secret(secret))
    }
}

impl Signer for KeyPair {
    fn address(&self) -> &Address {
        &self.address
    }

    fn sign_transaction(&self, tx_bytes: &str) -> Result<String, WalletError> {
        let tx_bytes = BASE64.decode(tx_bytes)?;
        let digest = blake2b256(&[&TRANSACTION_INTENT, &tx_bytes]);
        let signature = self.key.sign(&digest);

        let mut serialized = Vec::with_capacity(1 + 64 + 32);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(self.key.verifying_key().as_bytes());
        Ok(BASE64.encode(serialized))
    }
}

/// Accounts the server may sign for.
#[derive(Clone, Default)]
pub struct Keystore {
    keys: Arc<Vec<Arc<KeyPair>>>,
}

impl Keystore {
    pub fn new(keys: Vec<KeyPair>) -> Keystore {
        Keystore {
            keys: Arc::new(keys.into_iter().map(Arc::new).collect()),
        }
    }

    /// The standard keystore file: a JSON array of base64 entries.
    /// Entries using other schemes are skipped.
    pub fn from_json(json: Value) -> Result<Keystore, WalletError> {
        let entries = json.as_array().ok_or(WalletError::Format)?;
        let mut keys = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.as_str().ok_or(WalletError::Format)?;
            match KeyPair::from_keystore_entry(entry) {
                Ok(key) => keys.push(key),
                Err(e) => warn!("skipping keystore entry: {e}"),
            }
        }
        Ok(Keystore::new(keys))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Keystore, WalletError> {
        let text = std::fs::read_to_string(path)?;
        let json: Value = serde_json::from_str(&text).map_err(|_| WalletError::Format)?;
        Keystore::from_json(json)
    }

    pub fn get(&self, address: &Address) -> Option<Arc<KeyPair>> {
        self.keys.iter().find(|key| &key.address == address).cloned()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.keys.iter().map(|key| &key.address)
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signature, Verifier};
    use serde_json::json;

    use super::*;

    #[test]
    fn address_is_blake2b_of_flag_and_public_key() {
        let key = KeyPair::from_secret([1; 32]);
        let expected = blake2b256(&[&[0u8], key.key.verifying_key().as_bytes()]);
        assert_eq!(key.address(), &Address::from_bytes(expected));
        assert_eq!(KeyPair::from_secret([1; 32]).address(), key.address());
        assert_ne!(KeyPair::from_secret([2; 32]).address(), key.address());
    }

    #[test]
    fn signature_verifies_over_intent_digest() {
        let key = KeyPair::from_secret([9; 32]);
        let tx = BASE64.encode(b"transaction data");

        let serialized = BASE64.decode(key.sign_transaction(&tx).unwrap()).unwrap();
        assert_eq!(serialized.len(), 97);
        assert_eq!(serialized[0], ED25519_FLAG);
        assert_eq!(&serialized[65..], key.key.verifying_key().as_bytes());

        let signature = Signature::from_slice(&serialized[1..65]).unwrap();
        let digest = blake2b256(&[&[0, 0, 0], b"transaction data"]);
        assert!(key.key.verifying_key().verify(&digest, &signature).is_ok());
    }

    #[test]
    fn rejects_non_base64_transaction() {
        let key = KeyPair::from_secret([9; 32]);
        assert!(matches!(key.sign_transaction("***"), Err(WalletError::Encoding(_))));
    }

    #[test]
    fn keystore_skips_other_schemes() {
        let mut ed25519 = vec![0u8];
        ed25519.extend_from_slice(&[3; 32]);
        let mut secp256k1 = vec![1u8];
        secp256k1.extend_from_slice(&[3; 32]);

        let keystore = Keystore::from_json(json!([
            BASE64.encode(&ed25519),
            BASE64.encode(&secp256k1),
        ]))
        .unwrap();

        let addresses: Vec<_> = keystore.addresses().cloned().collect();
        assert_eq!(addresses, vec![KeyPair::from_secret([3; 32]).address().clone()]);
        assert!(keystore.get(&addresses[0]).is_some());
        assert!(Keystore::from_json(json!({ "keys": [] })).is_err());
    }
}
