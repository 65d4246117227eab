use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Error;
use crate::key::KeyMaterial;

// https://w3c-ccg.github.io/did-resolution/

/// Maps a DID to the key material used to verify its signatures.
///
/// DID method drivers (`did:key`, `did:ethr`, ...) live outside this
/// crate; verification only needs the resolved public key.
#[async_trait]
pub trait DIDResolver: Sync {
    async fn resolve(&self, did: &str) -> Result<KeyMaterial, Error>;
}

/// Resolver over a fixed set of keys, for tests and offline verification.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    keys: HashMap<String, KeyMaterial>,
}

impl StaticResolver {
    pub fn new<I: IntoIterator<Item = KeyMaterial>>(keys: I) -> Self {
        Self {
            keys: keys
                .into_iter()
                .map(|key| (key.did.clone(), key.to_public()))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: KeyMaterial) {
        self.keys.insert(key.did.clone(), key.to_public());
    }
}

#[async_trait]
impl DIDResolver for StaticResolver {
    async fn resolve(&self, did: &str) -> Result<KeyMaterial, Error> {
        self.keys
            .get(did)
            .cloned()
            .ok_or_else(|| Error::Resolution(format!("unknown DID: {}", did)))
    }
}
