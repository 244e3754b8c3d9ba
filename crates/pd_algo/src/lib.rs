// crates/pd_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Allocation layer: registry, dependency index, candidate pools and the
//! weighted refusal engine.
//!
//! A [`Runner`] is built once from a user list and owns one random stream.
//! Every call to [`Runner::run`] builds a fresh [`Session`], refuses users
//! until each partition is at or below its availability, and returns the
//! surviving users as a [`Solution`]. Consecutive runs continue the same
//! random stream.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use pd_core::{Availability, CoreError, DrawRng, Partition, Solution, User, UserId};
use rand_core::RngCore;

pub mod deps;
pub mod pool;
pub mod refusal;
pub mod registry;
pub mod session;

pub use deps::DependencyIndex;
pub use pool::CandidatePool;
pub use refusal::{refuse_to_fixed_point, RefusalStats};
pub use registry::{refusal_weight, PartitionMembers, RegisteredUser, Slot, UserRegistry};
pub use session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlgoError {
    /// No random source could be established at construction.
    NoRandomSource(CoreError),
    /// The same partition was given two different availabilities in one run.
    ConflictingAvailability {
        partition: Partition,
        first: u32,
        second: u32,
    },
}

impl fmt::Display for AlgoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgoError::NoRandomSource(e) => write!(f, "cannot construct runner: {e}"),
            AlgoError::ConflictingAvailability { partition, first, second } => write!(
                f,
                "partition {partition} listed with conflicting availabilities {first} and {second}"
            ),
        }
    }
}

impl std::error::Error for AlgoError {}

impl From<CoreError> for AlgoError {
    fn from(e: CoreError) -> Self {
        AlgoError::NoRandomSource(e)
    }
}

/// Solution plus the engine counters of the run that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draw {
    pub solution: Solution,
    pub refused: BTreeMap<Partition, Vec<UserId>>,
    pub stats: RefusalStats,
}

/// Allocation component: immutable registry + one continuing random stream.
#[derive(Debug, Clone)]
pub struct Runner<R = DrawRng> {
    registry: UserRegistry,
    rng: R,
}

impl Runner<DrawRng> {
    /// Seed from the operating system. Fails if no entropy is available.
    pub fn new<I>(users: I) -> Result<Self, AlgoError>
    where
        I: IntoIterator<Item = User>,
    {
        let rng = DrawRng::from_os_entropy()?;
        Ok(Self::with_rng(users, rng))
    }

    /// Reproducible runner: same users + same seed ⇒ same sequence of solutions.
    pub fn seeded<I>(users: I, seed: u64) -> Self
    where
        I: IntoIterator<Item = User>,
    {
        Self::with_rng(users, DrawRng::from_seed_u64(seed))
    }
}

impl<R: RngCore> Runner<R> {
    /// Build with an injected random source.
    pub fn with_rng<I>(users: I, rng: R) -> Self
    where
        I: IntoIterator<Item = User>,
    {
        Self {
            registry: UserRegistry::from_users(users),
            rng,
        }
    }

    pub fn registry(&self) -> &UserRegistry {
        &self.registry
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }

    /// Ascending IDs of every member of `partition`.
    pub fn users(&self, partition: &Partition) -> &[UserId] {
        self.registry.users(partition)
    }

    pub fn user(&self, id: &str) -> Option<&RegisteredUser> {
        self.registry.user(id)
    }

    /// One allocation. Partitions missing from `availabilities` get 0 passes.
    pub fn run(&mut self, availabilities: &[Availability]) -> Result<Solution, AlgoError> {
        self.run_detailed(availabilities).map(|d| d.solution)
    }

    /// Like [`Runner::run`], also reporting refused users and engine counters.
    pub fn run_detailed(&mut self, availabilities: &[Availability]) -> Result<Draw, AlgoError> {
        // Validate before consuming any randomness.
        let targets = self.targets(availabilities)?;

        let mut session = Session::new(&self.registry);
        let stats = refuse_to_fixed_point(&mut session, &targets, &mut self.rng);

        let refused = self
            .registry
            .partitions()
            .iter()
            .map(|pm| (pm.partition.clone(), session.refused(&pm.partition)))
            .collect();

        Ok(Draw {
            solution: session.into_solution(),
            refused,
            stats,
        })
    }

    fn targets(&self, availabilities: &[Availability]) -> Result<Vec<u32>, AlgoError> {
        let mut by_partition: BTreeMap<&Partition, u32> = BTreeMap::new();
        for a in availabilities {
            match by_partition.entry(&a.partition) {
                Entry::Vacant(v) => {
                    v.insert(a.available);
                }
                Entry::Occupied(o) if *o.get() != a.available => {
                    return Err(AlgoError::ConflictingAvailability {
                        partition: a.partition.clone(),
                        first: *o.get(),
                        second: a.available,
                    });
                }
                Entry::Occupied(_) => {}
            }
            if self.registry.partition_index(&a.partition).is_none() {
                tracing::debug!(partition = %a.partition, "availability for partition without users ignored");
            }
        }

        Ok(self
            .registry
            .partitions()
            .iter()
            .map(|pm| by_partition.get(&pm.partition).copied().unwrap_or(0))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<User> {
        vec![
            User::new("lead", "L1"),
            User::new("lead", "L2"),
            User::new("lead", "L3"),
            User::new("follow", "F1").with_deps(["L1"]),
            User::new("follow", "F2"),
        ]
    }

    #[test]
    fn conflicting_availability_rejected_before_drawing() {
        let mut r = Runner::seeded(users(), 7);
        let err = r
            .run(&[Availability::new("lead", 1), Availability::new("lead", 2)])
            .unwrap_err();
        assert!(matches!(err, AlgoError::ConflictingAvailability { first: 1, second: 2, .. }));
        assert_eq!(r.rng().words_consumed(), 0);
    }

    #[test]
    fn repeated_identical_availability_is_accepted() {
        let mut r = Runner::seeded(users(), 7);
        let sol = r
            .run(&[Availability::new("lead", 3), Availability::new("lead", 3), Availability::new("follow", 2)])
            .unwrap();
        assert_eq!(sol.total_passes(), 5);
    }

    #[test]
    fn missing_partition_defaults_to_zero() {
        let mut r = Runner::seeded(users(), 7);
        let sol = r.run(&[Availability::new("lead", 3)]).unwrap();
        assert_eq!(sol.passes_for(&"lead".into()).len(), 3);
        assert!(sol.passes_for(&"follow".into()).is_empty());
        assert!(sol.passes.contains_key(&Partition::from("follow")));
    }

    #[test]
    fn unknown_partition_is_ignored() {
        let mut r = Runner::seeded(users(), 7);
        let sol = r
            .run(&[Availability::new("lead", 3), Availability::new("follow", 2), Availability::new("ghost", 4)])
            .unwrap();
        assert_eq!(sol.passes.len(), 2);
        assert_eq!(sol.total_passes(), 5);
    }

    #[test]
    fn detailed_run_partitions_users_into_winners_and_refused() {
        let mut r = Runner::seeded(users(), 11);
        let d = r
            .run_detailed(&[Availability::new("lead", 1), Availability::new("follow", 1)])
            .unwrap();
        for pm in r.registry().partitions() {
            let won = d.solution.passes_for(&pm.partition).len();
            let lost = d.refused[&pm.partition].len();
            assert_eq!(won + lost, pm.members.len());
        }
        assert!(d.stats.direct >= 2);
    }

    #[test]
    fn os_seeded_runner_constructs() {
        let mut r = Runner::new(users()).expect("entropy");
        let sol = r.run(&[Availability::new("lead", 2), Availability::new("follow", 2)]).unwrap();
        assert!(sol.total_passes() <= 4);
    }

    #[test]
    fn registry_lookups() {
        let r = Runner::seeded(users(), 1);
        assert_eq!(r.users(&"follow".into()).len(), 2);
        assert_eq!(r.user("F1").unwrap().deps, vec![UserId::from("L1")]);
        assert!(r.user("nobody").is_none());
    }
}
