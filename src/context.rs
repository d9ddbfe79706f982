use crate::constants::{AWS_DEFAULT_REGION, AWS_REGION};
use crate::time::{now, DateTime};
use std::env;

/// SigningContext carries the scope of a signature: which service and region
/// the request targets, and the timestamp the signature is computed for.
///
/// The timestamp is captured once at construction and used consistently for
/// the `x-amz-date` header, the credential scope and the string to sign.
/// Mixing timestamps between those steps invalidates the signature.
#[derive(Debug, Clone)]
pub struct SigningContext {
    /// Service name used in the credential scope, e.g. `execute-api`.
    pub service: String,
    /// Region used in the credential scope, e.g. `us-east-2`.
    pub region: String,
    /// Timestamp the signature is computed for, UTC second precision.
    pub time: DateTime,
}

impl SigningContext {
    /// Create a new signing context for the given service and region,
    /// stamped with the current time.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.to_string(),
            region: region.to_string(),
            time: now(),
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests. Only use this
    /// function for testing or when a caller needs reproducible signatures.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = time;
        self
    }

    /// Create a signing context with the region resolved from the process
    /// environment, `AWS_REGION` first and `AWS_DEFAULT_REGION` second.
    ///
    /// Returns `None` when neither variable is set. This is caller-side
    /// policy kept out of [`sign`](crate::sign()) itself, which only accepts
    /// already-resolved values.
    pub fn from_env(service: &str) -> Option<Self> {
        let region = env::var(AWS_REGION)
            .or_else(|_| env::var(AWS_DEFAULT_REGION))
            .ok()?;

        Some(Self::new(service, &region))
    }
}
