//! In-memory key and redeem-script store used by the signer.

use std::collections::HashMap;

use bu_primitives::ec::{PrivateKey, PublicKey};
use bu_script::Script;

use crate::standard::ScriptId;

/// Source of signing keys and redeem scripts.
pub trait KeyStore {
    /// Private key whose public key hashes to `key_id`.
    fn get_key(&self, key_id: &[u8; 20]) -> Option<PrivateKey>;

    /// Public key that hashes to `key_id`.
    fn get_pub_key(&self, key_id: &[u8; 20]) -> Option<PublicKey> {
        self.get_key(key_id).map(|k| k.pub_key())
    }

    /// Redeem script with identifier `id`.
    fn get_script(&self, id: &ScriptId) -> Option<Script>;

    /// True if the store can sign for `key_id`.
    fn have_key(&self, key_id: &[u8; 20]) -> bool {
        self.get_key(key_id).is_some()
    }
}

/// A [`KeyStore`] backed by hash maps.
#[derive(Clone, Default)]
pub struct BasicKeyStore {
    keys: HashMap<[u8; 20], PrivateKey>,
    scripts: HashMap<ScriptId, Script>,
}

impl BasicKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a private key, indexed by the HASH160 of its public key.
    ///
    /// # Returns
    /// The key ID under which it was stored.
    pub fn add_key(&mut self, key: PrivateKey) -> [u8; 20] {
        let key_id = key.pub_key().hash160();
        self.keys.insert(key_id, key);
        key_id
    }

    /// Add a redeem script under both its 20-byte and 32-byte identifiers.
    pub fn add_script(&mut self, script: Script) {
        self.scripts.insert(ScriptId::of_32(&script), script.clone());
        self.scripts.insert(ScriptId::of(&script), script);
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

impl KeyStore for BasicKeyStore {
    fn get_key(&self, key_id: &[u8; 20]) -> Option<PrivateKey> {
        self.keys.get(key_id).cloned()
    }

    fn get_script(&self, id: &ScriptId) -> Option<Script> {
        self.scripts.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_and_scripts() {
        let mut store = BasicKeyStore::new();
        let key = PrivateKey::from_bytes(&[0x42; 32]).unwrap();
        let pub_key = key.pub_key();
        let key_id = store.add_key(key);

        assert_eq!(key_id, pub_key.hash160());
        assert!(store.have_key(&key_id));
        assert_eq!(store.get_pub_key(&key_id).unwrap().to_bytes(), pub_key.to_bytes());
        assert!(!store.have_key(&[0u8; 20]));
        assert_eq!(store.key_count(), 1);

        let script = Script::from_bytes(&[0x51]);
        store.add_script(script.clone());
        assert_eq!(store.get_script(&ScriptId::of(&script)), Some(script.clone()));
        assert_eq!(store.get_script(&ScriptId::of_32(&script)), Some(script));
        assert_eq!(store.get_script(&ScriptId::P2sh20([0u8; 20])), None);
    }
}
