//! pd_io: input formats and artifact plumbing for passdraw.
//!
//! - `user_lines`: line-oriented user definitions (`ID[:dep1,dep2,...]`)
//! - `config`: JSON run configuration (`Passes` + `Users`)
//! - `schema`: JSON Schema (2020-12) check of a run configuration
//! - `canonical_json`: sorted-key compact JSON and atomic writes
//! - `hasher`: SHA-256 digests over raw and canonical bytes
//!
//! Everything here is offline and synchronous. Errors from every module share
//! [`IoError`].

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for pd_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem errors (open, read, create_dir_all, rename, fsync).
    #[error("io error: {0}")]
    Path(String),

    /// JSON syntax or shape errors.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// A malformed user definition line (1-based line number).
    #[error("line {line}: {msg}")]
    Line { line: usize, msg: String },

    /// JSON Schema violations, one message per violation.
    #[error("schema error: {}", .0.join("; "))]
    Schema(Vec<String>),

    /// Semantic validation of an otherwise well-formed input.
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json reports line/column, not a pointer.
        IoError::Json {
            pointer: "/".to_string(),
            msg: e.to_string(),
        }
    }
}

pub(crate) fn read_file(path: &std::path::Path) -> IoResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| IoError::Path(format!("cannot read {}: {e}", path.display())))
}

pub mod canonical_json;
pub mod config;
#[cfg(feature = "hash")]
pub mod hasher;
pub mod schema;
pub mod user_lines;

pub use config::{load_run_config, RunConfig, UserEntry};
pub use user_lines::{load_user_lines, parse_user_line, parse_user_lines, UserLine};

pub mod prelude {
    pub use crate::canonical_json::{to_canonical_bytes, write_canonical_file};
    pub use crate::config::{load_run_config, RunConfig, UserEntry};
    #[cfg(feature = "hash")]
    pub use crate::hasher::{sha256_canonical, sha256_hex};
    pub use crate::user_lines::load_user_lines;
    pub use crate::{IoError, IoResult};
}
