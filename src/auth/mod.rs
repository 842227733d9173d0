//! Credential primitives
//!
//! Password hashing and enrollment input validation.

pub mod hasher;
pub mod validator;

pub use hasher::{Argon2Hasher, HashParams, HashedPassword, PasswordHasher};
pub use validator::{InputLimits, validate_password, validate_username};
