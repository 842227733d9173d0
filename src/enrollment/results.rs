//! Enrollment result types

/// Successful enrollment. Deliberately carries nothing derived from the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrolled {
    pub username: String,
}
