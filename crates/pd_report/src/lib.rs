//! pd_report: report model and renderers for draws and simulations.
//!
//! Pure and offline: callers hand in the in-memory pipeline outputs, nothing is
//! recomputed here. Sections and rows keep a stable order (partitions and users
//! ascending) so two reports of the same draw are byte-identical.

#![deny(unsafe_code)]

use std::fmt;

use pd_pipeline::{DrawOutputs, SimulationStats};

pub mod render_text;
#[cfg(feature = "render_json")]
pub mod render_json;

pub use render_text::{render_draw_text, render_simulation_text};
#[cfg(feature = "render_json")]
pub use render_json::{render_draw_json, render_simulation_json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    Serialize(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Serialize(m) => write!(f, "cannot render report: {m}"),
        }
    }
}

impl std::error::Error for ReportError {}

// ===== Draw model =====

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionSection {
    pub partition: String,
    pub handed_out: usize,
    pub available: u32,
    pub winners: Vec<String>,
    pub refused: Vec<String>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegritySection {
    pub result_id: String,
    pub run_id: String,
    pub seed: u64,
    pub seed_generated: bool,
    pub engine: String,
    pub inputs_sha256: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawReport {
    pub partitions: Vec<PartitionSection>,
    pub cascaded_refusals: u32,
    /// Partitions that closed above their availability.
    pub exhausted: Vec<String>,
    pub integrity: IntegritySection,
}

pub fn build_draw_report(out: &DrawOutputs) -> DrawReport {
    let ids = |xs: &[pd_core::UserId]| xs.iter().map(|u| u.to_string()).collect::<Vec<_>>();
    let rec = &out.run_record;
    DrawReport {
        partitions: out
            .result
            .partitions
            .iter()
            .map(|p| PartitionSection {
                partition: p.partition.to_string(),
                handed_out: p.winners.len(),
                available: p.available,
                winners: ids(&p.winners),
                refused: ids(&p.refused),
            })
            .collect(),
        cascaded_refusals: out.result.counters.cascaded,
        exhausted: out.result.counters.exhausted.iter().map(|p| p.to_string()).collect(),
        integrity: IntegritySection {
            result_id: out.result.id.clone(),
            run_id: rec.id.clone(),
            seed: rec.seed,
            seed_generated: rec.seed_generated,
            engine: format!("{}/{} v{}", rec.engine.vendor, rec.engine.name, rec.engine.version),
            inputs_sha256: rec.inputs.inputs_sha256.clone(),
        },
    }
}

// ===== Simulation model =====

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct UserRow {
    pub id: String,
    pub passes: u64,
    /// Percent with one decimal, e.g. `"37.5"`.
    pub probability_pct: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationPartitionSection {
    pub partition: String,
    pub available: u32,
    pub members: usize,
    pub total_passes: u64,
    pub users: Vec<UserRow>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationReport {
    pub runs: u64,
    pub seed: u64,
    pub partitions: Vec<SimulationPartitionSection>,
}

pub fn build_simulation_report(stats: &SimulationStats) -> SimulationReport {
    SimulationReport {
        runs: stats.runs,
        seed: stats.seed,
        partitions: stats
            .partitions
            .iter()
            .map(|p| SimulationPartitionSection {
                partition: p.partition.to_string(),
                available: p.available,
                members: p.members,
                total_passes: p.total_passes,
                users: p
                    .users
                    .iter()
                    .map(|u| UserRow {
                        id: u.id.to_string(),
                        passes: u.passes,
                        probability_pct: percent_one_decimal(u.passes, stats.runs),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// `num / den` as a percentage with one decimal, rounded half up, using
/// integer arithmetic only.
pub fn percent_one_decimal(num: u64, den: u64) -> String {
    if den == 0 {
        return "0.0".to_string();
    }
    let tenths = (u128::from(num) * 1000 + u128::from(den) / 2) / u128::from(den);
    format!("{}.{}", tenths / 10, tenths % 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_one_decimal(1, 3), "33.3");
        assert_eq!(percent_one_decimal(2, 3), "66.7");
        assert_eq!(percent_one_decimal(1, 8), "12.5");
        assert_eq!(percent_one_decimal(1, 2000), "0.1");
        assert_eq!(percent_one_decimal(5, 5), "100.0");
        assert_eq!(percent_one_decimal(0, 7), "0.0");
        assert_eq!(percent_one_decimal(3, 0), "0.0");
    }
}
