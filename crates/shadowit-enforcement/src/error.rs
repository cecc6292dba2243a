//! Enforcement error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnforcementError {
    #[error("No async runtime available to schedule the countdown")]
    RuntimeUnavailable,
}
