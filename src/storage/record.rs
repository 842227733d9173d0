//! Credential record
//!
//! One enrolled user. Records are built once per enrollment and never
//! modified afterwards.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::{HashParams, HashedPassword};

#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
    pub params: HashParams,
    /// Seconds since the Unix epoch
    pub created_at: u64,
}

impl CredentialRecord {
    /// Builds a record stamped with the current time.
    pub fn new(username: impl Into<String>, hashed: HashedPassword) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|dur| dur.as_secs())
            .unwrap_or(0);

        Self {
            username: username.into(),
            salt: hashed.salt,
            hash: hashed.hash,
            params: hashed.params,
            created_at,
        }
    }
}

// Salt and hash must never reach a log line.
impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("salt", &"<redacted>")
            .field("hash", &"<redacted>")
            .field("params", &self.params)
            .field("created_at", &self.created_at)
            .finish()
    }
}
