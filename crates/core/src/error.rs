//! Error type shared across the relay crates.

use thiserror::Error;

/// The primary error type for providers, routing and memory.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input: missing required argument, invalid schema, value out
    /// of range. Surfaced to the caller.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No providers have been registered with the router.
    #[error("no providers registered")]
    NoProviders,

    /// Providers exist but none is currently healthy.
    #[error("no healthy providers available")]
    NoHealthyProviders,

    /// Smart routing found no model satisfying the constraints.
    #[error("no candidate models satisfy the routing constraints")]
    NoCandidates,

    /// The provider could not be reached.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider returned a non-success response. The body is preserved.
    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The provider rejected the request due to rate limiting. Not retried.
    #[error("rate limited")]
    RateLimited,

    /// Authentication failed. Not retried.
    #[error("unauthorized")]
    Unauthorized,

    /// The operation exceeded its deadline.
    #[error("operation timed out")]
    Timeout,

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// A component was used without its required configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// An embedding call failed. Local to the vector subsystem.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// A summarization call failed. Local to the summary subsystem.
    #[error("summarization failed: {0}")]
    Summarize(String),

    /// An entity extraction call failed. Local to the entity subsystem.
    #[error("extraction failed: {0}")]
    Extraction(String),
}

/// Result alias used across all relay crates.
pub type Result<T> = std::result::Result<T, Error>;
