//! Monte-Carlo simulation: run the same inputs many times on one continuing
//! random stream and count how often each user wins.

use std::collections::BTreeMap;

use pd_algo::Runner;
use pd_core::{Availability, DrawRng, Partition, User, UserId};
use serde::{Deserialize, Serialize};

use crate::PipelineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub id: UserId,
    pub passes: u64,
    /// passes / runs
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionStats {
    pub partition: Partition,
    pub available: u32,
    pub members: usize,
    /// Sum of passes over all runs.
    pub total_passes: u64,
    /// Every member, ascending by ID, including those who never won.
    pub users: Vec<UserStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub runs: u64,
    pub seed: u64,
    pub partitions: Vec<PartitionStats>,
}

impl SimulationStats {
    pub fn user(&self, id: &str) -> Option<&UserStats> {
        self.partitions
            .iter()
            .flat_map(|p| p.users.iter())
            .find(|u| u.id.as_str() == id)
    }
}

/// Draw `runs` times and aggregate per-user win counts.
pub fn simulate(
    users: Vec<User>,
    availabilities: &[Availability],
    runs: u64,
    seed: Option<u64>,
) -> Result<SimulationStats, PipelineError> {
    if runs == 0 {
        return Err(PipelineError::Validate("--runs must be at least 1".into()));
    }
    let rng = match seed {
        Some(s) => DrawRng::from_seed_u64(s),
        None => DrawRng::from_os_entropy().map_err(|e| PipelineError::Engine(e.to_string()))?,
    };
    let seed = rng.seed();
    let mut runner = Runner::with_rng(users, rng);

    let mut wins: BTreeMap<UserId, u64> = BTreeMap::new();
    for i in 0..runs {
        let solution = runner.run(availabilities)?;
        for id in solution.passes.into_values().flatten() {
            *wins.entry(id).or_default() += 1;
        }
        if (i + 1) % 100_000 == 0 {
            tracing::debug!(done = i + 1, runs, "simulation progress");
        }
    }

    let requested: BTreeMap<&Partition, u32> =
        availabilities.iter().map(|a| (&a.partition, a.available)).collect();
    let partitions = runner
        .registry()
        .partitions()
        .iter()
        .map(|pm| {
            let users: Vec<UserStats> = pm
                .members
                .iter()
                .map(|id| {
                    let passes = wins.get(id).copied().unwrap_or(0);
                    UserStats {
                        id: id.clone(),
                        passes,
                        probability: passes as f64 / runs as f64,
                    }
                })
                .collect();
            PartitionStats {
                partition: pm.partition.clone(),
                available: requested.get(&pm.partition).copied().unwrap_or(0),
                members: pm.members.len(),
                total_passes: users.iter().map(|u| u.passes).sum(),
                users,
            }
        })
        .collect();

    tracing::info!(runs, seed, "simulation complete");
    Ok(SimulationStats { runs, seed, partitions })
}

pub const DEMO_LEADERS: &str = "Leader";
pub const DEMO_FOLLOWERS: &str = "Follow";

/// Built-in leader/follower event: five free users per side, cross-partition
/// dependents, same-partition chains, a two-level chain and two couples.
/// `passes` is split with the odd pass going to the followers.
pub fn demo_scenario(passes: u32) -> Result<(Vec<User>, Vec<Availability>), PipelineError> {
    if passes == 0 {
        return Err(PipelineError::Validate("--passes cannot be 0".into()));
    }
    let (l, f) = (DEMO_LEADERS, DEMO_FOLLOWERS);
    let mut users: Vec<User> = Vec::new();
    users.extend((1..=5).map(|i| User::new(l, format!("L{i}"))));
    users.extend((1..=5).map(|i| User::new(f, format!("F{i}"))));

    let dependents: [(&str, &str, &[&str]); 12] = [
        (l, "La->F1", &["F1"]),
        (l, "Lb->F2", &["F2"]),
        (l, "Lc->F3", &["F3"]),
        (f, "Fa->L3", &["L3"]),
        (f, "Fb->L4", &["L4"]),
        (f, "Fc->L5", &["L5"]),
        (l, "Lx->L1", &["L1"]),
        (l, "Ly->L2", &["L2"]),
        (f, "Fx->F2", &["F2"]),
        (f, "Fy->F3", &["F3"]),
        (l, "Lp->Fx", &["Fx->F2"]),
        (l, "Lq->Fy,F3", &["Fy->F3", "F3"]),
    ];
    for (partition, id, deps) in dependents {
        users.push(User::new(partition, id).with_deps(deps.iter().copied()));
    }
    for n in 1..=2 {
        users.push(User::new(l, format!("LC{n}")).with_deps([format!("FC{n}")]));
        users.push(User::new(f, format!("FC{n}")).with_deps([format!("LC{n}")]));
    }

    let availabilities = vec![
        Availability::new(l, passes / 2),
        Availability::new(f, passes - passes / 2),
    ];
    Ok((users, availabilities))
}
