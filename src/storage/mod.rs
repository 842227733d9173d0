//! Credential storage
//!
//! Record type, line codec, and the append-only file store.

pub mod codec;
pub mod record;
pub mod store;

pub use record::CredentialRecord;
pub use store::{CredentialRepository, FileCredentialStore, LoadReport};
