//! pd_pipeline: orchestration surface for passdraw.
//!
//! load → draw → (result, run record) → artifacts, plus Monte-Carlo
//! simulation and synthetic event generation. File formats, hashing and
//! canonical JSON live in `pd_io`; the allocation itself lives in `pd_algo`.

#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod draw;
pub mod generate;
pub mod load;
pub mod simulate;

pub use draw::{draw, write_artifacts, DrawOutputs, DrawResult, PartitionOutcome, RunRecord};
pub use generate::{generate_event_config, GenerateParams};
pub use load::{load_inputs, parse_passes_arg, LoadRequest, LoadedInputs, SourceDigest};
pub use simulate::{demo_scenario, simulate, PartitionStats, SimulationStats, UserStats};

/// Single error surface for orchestration. The CLI maps each bucket to an
/// exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Reading or writing files.
    Io(String),
    /// Inputs that parse but cannot be used (bad config, bad flags, conflicts).
    Validate(String),
    /// The engine could not run (no random source, hashing failure).
    Engine(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Io(m) => write!(f, "io: {m}"),
            PipelineError::Validate(m) => write!(f, "invalid input: {m}"),
            PipelineError::Engine(m) => write!(f, "engine: {m}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<pd_io::IoError> for PipelineError {
    fn from(e: pd_io::IoError) -> Self {
        use pd_io::IoError;
        match e {
            IoError::Path(m) => PipelineError::Io(m),
            other @ (IoError::Json { .. } | IoError::Line { .. } | IoError::Schema(_) | IoError::Invalid(_)) => {
                PipelineError::Validate(other.to_string())
            }
        }
    }
}

impl From<pd_algo::AlgoError> for PipelineError {
    fn from(e: pd_algo::AlgoError) -> Self {
        match e {
            pd_algo::AlgoError::NoRandomSource(_) => PipelineError::Engine(e.to_string()),
            pd_algo::AlgoError::ConflictingAvailability { .. } => PipelineError::Validate(e.to_string()),
        }
    }
}

/// Engine identity recorded in every run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    /// Random stream algorithm; replaying a seed needs the same one.
    pub rng: String,
}

pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: "passdraw".to_string(),
        name: "refusal_engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rng: "chacha20-u64le".to_string(),
    }
}
