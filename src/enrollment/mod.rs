//! Enrollment
//!
//! Validation, hashing and persistence of new credentials.

pub mod results;
pub mod service;

pub use results::Enrolled;
pub use service::EnrollmentService;
