//! Real id ↔ public id mapping.
//!
//! Public ids are `hex(SHA-256(salt ‖ decimal(real_id)))`. The map is built
//! once from the canonical risk dataset and is read-only afterwards. A
//! collision, or a mismatch between the number of ids fed in and the number
//! of pairs produced, refuses to build.

use chainguard_core::{ConfigError, EntityId};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Secret used to key the pseudonym hash.
///
/// Never printed: its `Debug` output is redacted.
#[derive(Clone)]
pub struct Salt(String);

impl Salt {
    /// Wraps a configured salt. An empty value is a configuration error.
    pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ConfigError::MissingSalt);
        }
        Ok(Self(value))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Salt(<redacted>)")
    }
}

/// Derives the public id of `id` under `salt`.
pub fn pseudonymize(salt: &Salt, id: EntityId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(id.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Bijection between real ids and public ids over the loaded dataset.
#[derive(Debug)]
pub struct IdentifierMap {
    salt: Salt,
    to_public: HashMap<EntityId, String>,
    to_real: HashMap<String, EntityId>,
}

impl IdentifierMap {
    /// Builds the map for every id in `ids`.
    pub fn build(
        salt: Salt,
        ids: impl IntoIterator<Item = EntityId>,
    ) -> Result<Self, ConfigError> {
        let hash_salt = salt.clone();
        Self::build_with(salt, ids, move |id| pseudonymize(&hash_salt, id))
    }

    fn build_with<F>(
        salt: Salt,
        ids: impl IntoIterator<Item = EntityId>,
        hash: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(EntityId) -> String,
    {
        let mut to_public = HashMap::new();
        let mut to_real: HashMap<String, EntityId> = HashMap::new();
        let mut expected = 0usize;

        for id in ids {
            expected += 1;
            let public = hash(id);

            if let Some(&existing) = to_real.get(&public) {
                if existing != id {
                    return Err(ConfigError::IdentifierCollision {
                        first: existing,
                        second: id,
                    });
                }
                continue;
            }

            to_real.insert(public.clone(), id);
            to_public.insert(id, public);
        }

        if to_public.len() != expected {
            return Err(ConfigError::RowCountMismatch {
                expected,
                actual: to_public.len(),
            });
        }

        Ok(Self {
            salt,
            to_public,
            to_real,
        })
    }

    /// Resolves a public id back to its real id.
    pub fn to_real(&self, public_id: &str) -> Option<EntityId> {
        self.to_real.get(public_id).copied()
    }

    /// Returns the public id of a mapped real id.
    pub fn to_public(&self, real_id: EntityId) -> Option<&str> {
        self.to_public.get(&real_id).map(String::as_str)
    }

    /// Public form of any real id.
    ///
    /// Ids outside the map (edge endpoints without a risk record) get the
    /// same keyed hash but stay unresolvable through `to_real`.
    pub fn render(&self, real_id: EntityId) -> String {
        match self.to_public(real_id) {
            Some(public) => public.to_string(),
            None => pseudonymize(&self.salt, real_id),
        }
    }

    pub fn len(&self) -> usize {
        self.to_public.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_public.is_empty()
    }
}
