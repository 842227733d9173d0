//! Enrollment service
//!
//! Drives one enrollment through `received -> validated -> hashed ->
//! persisted -> acknowledged`. Validation failures stop before any hashing
//! work; hashing and storage failures are reported as internal errors whose
//! detail stays server-side.

use log::{debug, info};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task;
use zeroize::Zeroizing;

use crate::auth::{InputLimits, PasswordHasher, validate_password, validate_username};
use crate::enrollment::results::Enrolled;
use crate::error::{EnrollError, HashError, StorageError};
use crate::storage::{CredentialRecord, CredentialRepository};

pub struct EnrollmentService {
    store: Arc<dyn CredentialRepository>,
    hasher: Arc<dyn PasswordHasher>,
    limits: InputLimits,
    hash_slots: Arc<Semaphore>,
}

impl EnrollmentService {
    /// At most `max_concurrent_hashes` hashes run at once; further
    /// enrollments wait for a slot.
    pub fn new(
        store: Arc<dyn CredentialRepository>,
        hasher: Arc<dyn PasswordHasher>,
        limits: InputLimits,
        max_concurrent_hashes: usize,
    ) -> Self {
        Self {
            store,
            hasher,
            limits,
            hash_slots: Arc::new(Semaphore::new(max_concurrent_hashes.max(1))),
        }
    }

    /// Enrolls a username/password pair.
    ///
    /// The returned value carries the username only; salt and hash never
    /// leave the store.
    pub async fn enroll(&self, username: &str, password: String) -> Result<Enrolled, EnrollError> {
        let password = Zeroizing::new(password);

        let username = validate_username(username, &self.limits)?.to_string();
        validate_password(&password, &self.limits)?;
        debug!("Enrollment for {} validated", username);

        // Cheap early answer; the insert below is the authoritative check.
        let store = Arc::clone(&self.store);
        let candidate = username.clone();
        let taken = task::spawn_blocking(move || store.exists(&candidate))
            .await
            .map_err(|e| StorageError::WorkerFailed(e.to_string()))??;
        if taken {
            return Err(EnrollError::UsernameTaken(username));
        }

        // The permit moves into the worker so it is held until the hash
        // finishes, even if this request is dropped while waiting.
        let permit = Arc::clone(&self.hash_slots)
            .acquire_owned()
            .await
            .map_err(|e| HashError::WorkerFailed(e.to_string()))?;
        let hasher = Arc::clone(&self.hasher);
        let hashed = task::spawn_blocking(move || {
            let _permit = permit;
            hasher.hash(&password)
        })
        .await
        .map_err(|e| HashError::WorkerFailed(e.to_string()))??;
        debug!("Enrollment for {} hashed", username);

        let record = CredentialRecord::new(username.clone(), hashed);
        let store = Arc::clone(&self.store);
        task::spawn_blocking(move || store.insert(record))
            .await
            .map_err(|e| StorageError::WorkerFailed(e.to_string()))??;

        info!("Enrolled {}", username);
        Ok(Enrolled { username })
    }

    /// Number of enrolled usernames.
    pub async fn enrolled_count(&self) -> Result<usize, StorageError> {
        let store = Arc::clone(&self.store);
        task::spawn_blocking(move || store.len())
            .await
            .map_err(|e| StorageError::WorkerFailed(e.to_string()))?
    }
}
