//! Gather users and availabilities from a run configuration and/or user
//! line files, plus availabilities given on the command line.
//!
//! Availabilities given on the command line replace the configuration's
//! entirely when at least one is present.

use std::path::{Path, PathBuf};

use pd_core::{Availability, Partition, User};
use pd_io::{hasher, load_run_config, load_user_lines};
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Where the inputs of a draw come from.
#[derive(Debug, Clone, Default)]
pub struct LoadRequest {
    pub config: Option<PathBuf>,
    pub user_files: Vec<(Partition, PathBuf)>,
    pub passes: Vec<Availability>,
}

/// Digest of one input file, echoed in the run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDigest {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub users: Vec<User>,
    pub availabilities: Vec<Availability>,
    pub sources: Vec<SourceDigest>,
}

impl LoadedInputs {
    /// Digest of the normalized inputs: users sorted by ID, availabilities
    /// sorted by partition. Independent of file layout and key order.
    pub fn digest(&self) -> Result<String, PipelineError> {
        #[derive(Serialize)]
        struct Normalized<'a> {
            users: Vec<&'a User>,
            availabilities: Vec<&'a Availability>,
        }
        let mut users: Vec<&User> = self.users.iter().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        let mut availabilities: Vec<&Availability> = self.availabilities.iter().collect();
        availabilities.sort_by(|a, b| a.partition.cmp(&b.partition).then(a.available.cmp(&b.available)));

        hasher::sha256_canonical(&Normalized { users, availabilities })
            .map_err(|e| PipelineError::Engine(format!("hash inputs: {e}")))
    }
}

pub fn load_inputs(req: &LoadRequest) -> Result<LoadedInputs, PipelineError> {
    let mut users = Vec::new();
    let mut availabilities = Vec::new();
    let mut sources = Vec::new();

    if let Some(path) = &req.config {
        let conf = load_run_config(path)?;
        users.extend(conf.users());
        availabilities = conf.availabilities();
        sources.push(source_digest(path)?);
        tracing::debug!(path = %path.display(), users = users.len(), "loaded run configuration");
    }

    for (partition, path) in &req.user_files {
        let loaded = load_user_lines(path, partition.clone())?;
        tracing::debug!(path = %path.display(), partition = %partition, users = loaded.len(), "loaded user lines");
        users.extend(loaded);
        sources.push(source_digest(path)?);
    }

    if !req.passes.is_empty() {
        if !availabilities.is_empty() {
            tracing::info!("--passes given; ignoring passes from the configuration");
        }
        availabilities = req.passes.clone();
    }

    if users.is_empty() {
        return Err(PipelineError::Validate(
            "no users given; pass --input and/or --users".into(),
        ));
    }

    Ok(LoadedInputs {
        users,
        availabilities,
        sources,
    })
}

fn source_digest(path: &Path) -> Result<SourceDigest, PipelineError> {
    Ok(SourceDigest {
        path: path.display().to_string(),
        sha256: hasher::sha256_file(path)?,
    })
}

const PASSES_FORMAT: &str = "format `partition:passes`, e.g. `leaders:33`";

/// Parse `partition:passes`.
pub fn parse_passes_arg(s: &str) -> Result<Availability, PipelineError> {
    let (partition, n) = s
        .split_once(':')
        .ok_or_else(|| PipelineError::Validate(format!("--passes must contain a `:`; {PASSES_FORMAT}")))?;
    let partition = partition.trim();
    if partition.is_empty() {
        return Err(PipelineError::Validate(format!("--passes needs a partition name; {PASSES_FORMAT}")));
    }
    let n: u32 = n.trim().parse().map_err(|_| {
        PipelineError::Validate(format!("--passes must contain a valid number; {PASSES_FORMAT}"))
    })?;
    Ok(Availability::new(partition, n))
}
