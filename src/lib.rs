//! AWS Signature Version 4 signing for HTTP health-check probes.
//!
//! Given a description of an outgoing HTTP request, a credential and a
//! signing context, [`sign`] produces the headers (`x-amz-date`,
//! `x-amz-content-sha256`, `Authorization` and, with a session token,
//! `x-amz-security-token`) that make the request verifiable by an
//! AWS-compatible service. The signer never sends anything and never
//! mutates the caller's request; the caller merges the result back with
//! [`SignatureResult::apply`].
//!
//! Resolving a region or service from the environment is the caller's job,
//! not the signer's. [`SigningContext::from_env`] and
//! [`Credential::from_env`] package the conventional lookups for callers
//! that want them; `sign` itself only accepts already-resolved values and
//! fails loudly when they are absent.
//!
//! ## Example
//!
//! ```no_run
//! use probe_sigv4::{sign, Credential, SigningContext, SigningRequest, DEFAULT_SERVICE};
//!
//! # fn main() -> anyhow::Result<()> {
//! let req = http::Request::builder()
//!     .method("GET")
//!     .uri("https://myapi.tacos/health?queryParam=true")
//!     .body(Vec::new())?;
//! let (mut parts, body) = req.into_parts();
//!
//! let cred = Credential::from_env().expect("credentials must be present");
//! let ctx = SigningContext::from_env(DEFAULT_SERVICE).expect("region must be present");
//!
//! let result = sign(&SigningRequest::build(&parts, body)?, &cred, &ctx)?;
//! result.apply(&mut parts.headers);
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod constants;
pub use constants::DEFAULT_SERVICE;

mod context;
pub use context::SigningContext;

mod credential;
pub use credential::Credential;

mod error;
pub use error::{Error, ErrorKind, Result};

mod request;
pub use request::SigningRequest;

mod sign;
pub use sign::{sign, SignatureResult};
