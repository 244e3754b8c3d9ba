//! One draw plus its audit artifacts.
//!
//! `result.json` holds the per-partition outcome; `run_record.json` holds
//! what is needed to replay it (engine identity, seed, input digest) and the
//! digest of the result. Both are written as canonical JSON. IDs are derived
//! from the canonical bytes of each document without its `id` field.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pd_algo::Runner;
use pd_core::{DrawRng, Partition, UserId};
use pd_io::{canonical_json, hasher};
use serde::{Deserialize, Serialize};

use crate::load::{LoadedInputs, SourceDigest};
use crate::{engine_identifiers, EngineMeta, PipelineError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionOutcome {
    pub partition: Partition,
    /// Availability the partition was drawn against.
    pub available: u32,
    pub members: usize,
    pub winners: Vec<UserId>,
    pub refused: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCounters {
    pub sweeps: u32,
    pub direct: u32,
    pub cascaded: u32,
    pub exhausted: Vec<Partition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawResult {
    /// `RES:<sha256>`
    pub id: String,
    pub partitions: Vec<PartitionOutcome>,
    pub counters: DrawCounters,
}

impl DrawResult {
    pub fn partition(&self, p: &str) -> Option<&PartitionOutcome> {
        self.partitions.iter().find(|o| o.partition.as_str() == p)
    }

    pub fn total_winners(&self) -> usize {
        self.partitions.iter().map(|o| o.winners.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInputsEcho {
    pub inputs_sha256: String,
    pub sources: Vec<SourceDigest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutputsEcho {
    pub result_id: String,
    pub result_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    /// `RUN:<sha256>`
    pub id: String,
    pub engine: EngineMeta,
    pub seed: u64,
    /// True when the seed came from OS entropy rather than the caller.
    pub seed_generated: bool,
    pub rng_words_consumed: u64,
    pub inputs: RunInputsEcho,
    pub outputs: RunOutputsEcho,
}

#[derive(Debug, Clone)]
pub struct DrawOutputs {
    pub result: DrawResult,
    pub run_record: RunRecord,
}

/// Run one allocation. Without a seed, one is taken from the OS and
/// recorded so the draw can be replayed.
pub fn draw(inputs: &LoadedInputs, seed: Option<u64>) -> Result<DrawOutputs, PipelineError> {
    let rng = match seed {
        Some(s) => DrawRng::from_seed_u64(s),
        None => DrawRng::from_os_entropy().map_err(|e| PipelineError::Engine(e.to_string()))?,
    };
    let seed_value = rng.seed();
    let mut runner = Runner::with_rng(inputs.users.iter().cloned(), rng);
    tracing::info!(seed = seed_value, users = runner.registry().len(), "starting draw");

    let outcome = runner.run_detailed(&inputs.availabilities)?;

    let requested: BTreeMap<&Partition, u32> = inputs
        .availabilities
        .iter()
        .map(|a| (&a.partition, a.available))
        .collect();

    let mut refused = outcome.refused;
    let partitions: Vec<PartitionOutcome> = outcome
        .solution
        .passes
        .into_iter()
        .map(|(partition, winners)| {
            let refused = refused.remove(&partition).unwrap_or_default();
            PartitionOutcome {
                available: requested.get(&partition).copied().unwrap_or(0),
                members: winners.len() + refused.len(),
                partition,
                winners,
                refused,
            }
        })
        .collect();

    let counters = DrawCounters {
        sweeps: outcome.stats.sweeps,
        direct: outcome.stats.direct,
        cascaded: outcome.stats.cascaded,
        exhausted: outcome.stats.exhausted,
    };

    #[derive(Serialize)]
    struct ResultNoId<'a> {
        partitions: &'a [PartitionOutcome],
        counters: &'a DrawCounters,
    }
    let result_sha = hash(&ResultNoId {
        partitions: &partitions,
        counters: &counters,
    })?;
    let result = DrawResult {
        id: format!("RES:{result_sha}"),
        partitions,
        counters,
    };

    let engine = engine_identifiers();
    let inputs_echo = RunInputsEcho {
        inputs_sha256: inputs.digest()?,
        sources: inputs.sources.clone(),
    };
    let outputs_echo = RunOutputsEcho {
        result_id: result.id.clone(),
        result_sha256: result_sha,
    };
    let words = u64::try_from(runner.rng().words_consumed()).unwrap_or(u64::MAX);

    #[derive(Serialize)]
    struct RunNoId<'a> {
        engine: &'a EngineMeta,
        seed: u64,
        seed_generated: bool,
        rng_words_consumed: u64,
        inputs: &'a RunInputsEcho,
        outputs: &'a RunOutputsEcho,
    }
    let run_sha = hash(&RunNoId {
        engine: &engine,
        seed: seed_value,
        seed_generated: seed.is_none(),
        rng_words_consumed: words,
        inputs: &inputs_echo,
        outputs: &outputs_echo,
    })?;

    tracing::info!(
        result = %result.id,
        winners = result.total_winners(),
        cascaded = result.counters.cascaded,
        "draw complete"
    );

    Ok(DrawOutputs {
        run_record: RunRecord {
            id: format!("RUN:{run_sha}"),
            engine,
            seed: seed_value,
            seed_generated: seed.is_none(),
            rng_words_consumed: words,
            inputs: inputs_echo,
            outputs: outputs_echo,
        },
        result,
    })
}

fn hash<T: Serialize>(value: &T) -> Result<String, PipelineError> {
    hasher::sha256_canonical(value).map_err(|e| PipelineError::Engine(format!("hash: {e}")))
}

/// Write `result.json` and `run_record.json` into `dir`.
pub fn write_artifacts(dir: &Path, outputs: &DrawOutputs) -> Result<(PathBuf, PathBuf), PipelineError> {
    let result_path = dir.join("result.json");
    let record_path = dir.join("run_record.json");
    canonical_json::write_canonical_file(&result_path, &outputs.result)?;
    canonical_json::write_canonical_file(&record_path, &outputs.run_record)?;
    tracing::debug!(dir = %dir.display(), "artifacts written");
    Ok((result_path, record_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::{Availability, User};

    fn inputs() -> LoadedInputs {
        LoadedInputs {
            users: vec![
                User::new("lead", "L1"),
                User::new("lead", "L2"),
                User::new("lead", "L3"),
                User::new("follow", "F1").with_deps(["L1"]),
                User::new("follow", "F2"),
            ],
            availabilities: vec![Availability::new("lead", 2), Availability::new("follow", 2)],
            sources: vec![],
        }
    }

    #[test]
    fn outcome_partitions_cover_every_member() {
        let out = draw(&inputs(), Some(17)).unwrap();
        let lead = out.result.partition("lead").unwrap();
        assert_eq!(lead.available, 2);
        assert_eq!(lead.members, 3);
        assert_eq!(lead.winners.len(), 2);
        assert_eq!(lead.refused.len(), 1);
        let follow = out.result.partition("follow").unwrap();
        assert_eq!(follow.winners.len() + follow.refused.len(), 2);
        assert!(out.result.id.starts_with("RES:"));
        assert_eq!(out.run_record.outputs.result_id, out.result.id);
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let a = draw(&inputs(), Some(99)).unwrap();
        let b = draw(&inputs(), Some(99)).unwrap();
        assert_eq!(a.result, b.result);
        assert_eq!(a.run_record, b.run_record);
        assert!(!a.run_record.seed_generated);
        assert_eq!(a.run_record.seed, 99);
    }

    #[test]
    fn generated_seed_replays() {
        let a = draw(&inputs(), None).unwrap();
        assert!(a.run_record.seed_generated);
        let b = draw(&inputs(), Some(a.run_record.seed)).unwrap();
        assert_eq!(a.result, b.result);
        assert_ne!(a.run_record.id, b.run_record.id);
    }

    #[test]
    fn conflicting_passes_are_validation_errors() {
        let mut i = inputs();
        i.availabilities.push(Availability::new("lead", 3));
        assert!(matches!(draw(&i, Some(1)), Err(PipelineError::Validate(_))));
    }

    #[test]
    fn artifacts_are_canonical_and_match_ids() {
        let dir = tempfile::tempdir().unwrap();
        let out = draw(&inputs(), Some(5)).unwrap();
        let (res, rec) = write_artifacts(dir.path(), &out).unwrap();

        let raw = std::fs::read(&res).unwrap();
        let back: DrawResult = serde_json::from_slice(&raw).unwrap();
        assert_eq!(back, out.result);
        assert!(!raw.ends_with(b"\n"));

        let rec: RunRecord = serde_json::from_slice(&std::fs::read(rec).unwrap()).unwrap();
        assert_eq!(rec.outputs.result_id, back.id);
    }
}
