//! Shared error type.
//!
//! Sub-crates define their own error enums (history, jobs, broker, runtime)
//! and either convert into `ProxError` via `From` impls or wrap it as one
//! variant.  Both patterns are acceptable; prefer whichever keeps error
//! sites clean.

use thiserror::Error;

/// The top-level error type for `prox-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum ProxError {
    #[error("body '{0}' not found")]
    BodyNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `prox-*` crates.
pub type ProxResult<T> = Result<T, ProxError>;
