//! Password hashing built around Argon2id.
//!
//! Every call draws a fresh salt from the OS CSPRNG, so hashing the same
//! password twice never yields the same record. The time cost is the
//! configurable cost factor; it is what makes brute force expensive.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::HashError;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived hash length in bytes.
pub const HASH_LEN: usize = 32;

/// Argon2id parameters, stored with every record so the hash can be
/// recomputed after the configured cost changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashParams {
    #[serde(rename = "m")]
    pub memory_cost_kib: u32,
    #[serde(rename = "t")]
    pub time_cost: u32,
    #[serde(rename = "p")]
    pub parallelism: u32,
}

/// Salt and hash produced for one password.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
    pub params: HashParams,
}

impl std::fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashedPassword")
            .field("salt", &"<redacted>")
            .field("hash", &"<redacted>")
            .field("params", &self.params)
            .finish()
    }
}

/// Salted password hashing. Implementations must not keep shared mutable
/// state; the service calls them from many blocking workers at once.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<HashedPassword, HashError>;
}

/// Argon2id hasher with fixed parameters.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: HashParams,
}

impl Argon2Hasher {
    /// Builds a hasher, rejecting parameters Argon2 would refuse later.
    pub fn new(params: HashParams) -> Result<Self, HashError> {
        argon2_params(&params)?;
        Ok(Self { params })
    }

    pub fn params(&self) -> HashParams {
        self.params
    }

    /// Computes the hash for a known salt.
    pub fn hash_with_salt(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>, HashError> {
        let argon2 = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            argon2_params(&self.params)?,
        );

        let mut output = vec![0u8; HASH_LEN];
        if let Err(e) = argon2.hash_password_into(password.as_bytes(), salt, &mut output) {
            output.zeroize();
            return Err(HashError::Derivation(e));
        }
        Ok(output)
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<HashedPassword, HashError> {
        let mut salt = vec![0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let hash = self.hash_with_salt(password, &salt)?;
        Ok(HashedPassword {
            salt,
            hash,
            params: self.params,
        })
    }
}

fn argon2_params(params: &HashParams) -> Result<Params, HashError> {
    Params::new(
        params.memory_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(HASH_LEN),
    )
    .map_err(HashError::InvalidParams)
}
