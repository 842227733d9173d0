//! Error types
//!
//! Defines domain-specific error types for each module of the enrollment server.

use std::io;

use thiserror::Error;

/// Password hashing errors
#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(argon2::Error),
    #[error("argon2 derivation failed: {0}")]
    Derivation(argon2::Error),
    #[error("hashing worker failed: {0}")]
    WorkerFailed(String),
}

/// Credential record encoding and decoding errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("empty record line")]
    Empty,
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Credential store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("username already exists: {0}")]
    AlreadyExists(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("record encoding failed: {0}")]
    Codec(#[from] CodecError),
    #[error("credential store lock poisoned")]
    LockPoisoned,
    #[error("storage worker failed: {0}")]
    WorkerFailed(String),
}

/// Failures that are the server's fault rather than the client's
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("hashing failure: {0}")]
    Hash(#[from] HashError),
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Outcome of a rejected or failed enrollment
#[derive(Debug, Error)]
pub enum EnrollError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("username already taken: {0}")]
    UsernameTaken(String),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl From<HashError> for EnrollError {
    fn from(error: HashError) -> Self {
        EnrollError::Internal(InternalError::Hash(error))
    }
}

impl From<StorageError> for EnrollError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::AlreadyExists(username) => EnrollError::UsernameTaken(username),
            other => EnrollError::Internal(InternalError::Storage(other)),
        }
    }
}

/// Startup and runtime errors of the server process
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("hasher setup failed: {0}")]
    Hash(#[from] HashError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
