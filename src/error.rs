//! Custom error types for the journal engine.
//!
//! `JournalError` is the single error type crossing component boundaries.
//! Lower-level failures (HDF5 access, directory walks, XML parsing, remote
//! fetches) are converted into one of these variants at the component that
//! observed them; no raw I/O error ever reaches the transport shell.
//!
//! ## Error Hierarchy
//!
//! - **`Fetch`**: a remote journal document was unreachable or unreadable.
//! - **`NotFound`**: a data file, run, field or spectrum index is absent.
//! - **`SchemaMismatch`**: an expected sub-structure of the data file or
//!   document was missing after exhausting the fallback resolution order.
//! - **`DataCorruption`**: paired arrays (time/value, time-of-flight/counts)
//!   disagree in length. Never silently truncated.
//! - **`Timeout`**: a bounded fetch or file open did not complete in time.
//! - **`Config`** / **`Io`** / **`Xml`**: wrapped infrastructure errors, kept
//!   for `?`-propagation inside the crate.
//!
//! Whatever the variant, the transport-facing rendering is always the
//! structured payload produced by [`JournalError::to_response`].

use serde_json::json;
use thiserror::Error;

/// Convenience alias for results using the engine error type.
pub type Result<T> = std::result::Result<T, JournalError>;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed journal document: {0}")]
    Xml(#[from] roxmltree::Error),
}

impl JournalError {
    /// Render the structured error payload shown to clients.
    ///
    /// Every user-visible failure is this JSON object, never a raw error
    /// trace: `{"response": "ERR. <reason>"}`.
    pub fn to_response(&self) -> serde_json::Value {
        json!({ "response": format!("ERR. {self}") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_payload_is_structured() {
        let err = JournalError::NotFound("run 71158 in cycle_20_3".into());
        let payload = err.to_response();
        assert_eq!(
            payload["response"],
            "ERR. not found: run 71158 in cycle_20_3"
        );
    }

    #[test]
    fn fetch_error_renders_reason() {
        let err = JournalError::Fetch("journal_main.xml unreachable".into());
        assert!(err.to_response()["response"]
            .as_str()
            .is_some_and(|s| s.starts_with("ERR. fetch failed")));
    }
}
