use crate::*;
use rsa::RsaPublicKey;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A trusted source of voter verification keys.
///
/// Lookups are passive: the directory makes no trust decisions of its own.
pub trait IdentityDirectory {
    /// Get the verification key published for a voter, if any
    fn verification_key(&self, id: VoterId) -> Option<RsaPublicKey>;
}

/// A simple directory that uses an in-memory BTreeMap.
///
/// Clones share the same underlying map, so the election can publish keys
/// while the credential issuer holds its own handle.
#[derive(Default, Clone)]
pub struct MemDirectory {
    inner: Arc<RwLock<BTreeMap<VoterId, RsaPublicKey>>>,
}

impl MemDirectory {
    /// Publish a voter's key. A key, once published, is never replaced.
    pub fn publish(&self, id: VoterId, key: RsaPublicKey) -> Result<(), Error> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.contains_key(&id) {
            return Err(Error::DuplicateRequest(id));
        }
        inner.insert(id, key);
        Ok(())
    }
}

impl IdentityDirectory for MemDirectory {
    fn verification_key(&self, id: VoterId) -> Option<RsaPublicKey> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.get(&id).cloned()
    }
}

/// No directory at all: the issuer trusts whatever key the requester claims
impl IdentityDirectory for () {
    fn verification_key(&self, _id: VoterId) -> Option<RsaPublicKey> {
        None
    }
}

impl<D: IdentityDirectory> IdentityDirectory for Arc<D> {
    fn verification_key(&self, id: VoterId) -> Option<RsaPublicKey> {
        (**self).verification_key(id)
    }
}
