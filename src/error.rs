//! Error types for the failover tool

use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// Failover result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort a failover run
///
/// None of these are retried internally. Every error aborts the run at the
/// first occurrence; the external health-monitoring layer is expected to
/// detect an incomplete transition and re-trigger.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration input
    #[error("configuration error: {0}")]
    Config(String),

    /// No elastic IP with the requested public address exists
    #[error("elastic ip {0} not found")]
    NotFound(IpAddr),

    /// No candidate satisfies the active selection policy
    #[error("no eligible failover target: {0}")]
    NoEligibleTarget(String),

    /// API-level failure reported by the provider, including malformed
    /// subnet data in a listing response
    #[error("provider error: {0}")]
    Provider(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The run exceeded its overall deadline
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a no-eligible-target error
    pub fn no_target(msg: impl Into<String>) -> Self {
        Self::NoEligibleTarget(msg.into())
    }
}
