//! HTTP protocol layer
//!
//! Request extraction, handlers, and response bodies.

pub mod handlers;
pub mod responses;

pub use handlers::{SharedService, enroll, health};
