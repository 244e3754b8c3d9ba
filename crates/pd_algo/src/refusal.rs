//! Refusal engine: weighted random elimination run to a fixed point.
//!
//! Contract:
//! - Partitions are swept in ascending order; within a partition candidates
//!   are walked ascending by ID. Given the same registry, targets and random
//!   stream, the outcome is identical on every platform.
//! - Each sweep refuses at most one directly selected user per open partition.
//!   Cascades may shrink any partition, which is why every open partition is
//!   re-checked on the next sweep.
//! - A partition closes once its target is ≥ its live candidate count, or when
//!   no candidate can be selected any more (logged, not an error).
//! - Terminates: every productive sweep removes at least one user and no user
//!   is removed twice.

use pd_core::rng::unit_interval;
use pd_core::Partition;
use rand_core::RngCore;

use crate::session::Session;

/// Counters for one run. Useful for logs and result documents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefusalStats {
    /// Full passes over the open partitions.
    pub sweeps: u32,
    /// Users picked by a weighted draw.
    pub direct: u32,
    /// Users refused only because something they depend on was refused.
    pub cascaded: u32,
    /// Partitions closed while still above their target.
    pub exhausted: Vec<Partition>,
}

/// Drive every pool down to `targets[i]` (indexed like the registry's
/// partitions).
pub fn refuse_to_fixed_point<R>(session: &mut Session<'_>, targets: &[u32], rng: &mut R) -> RefusalStats
where
    R: RngCore + ?Sized,
{
    let partitions = session.registry().partitions();
    debug_assert_eq!(partitions.len(), targets.len());

    let mut stats = RefusalStats::default();
    let mut open = vec![true; partitions.len()];
    let mut progress = true;

    while progress {
        progress = false;
        stats.sweeps += 1;

        for (pi, target) in targets.iter().enumerate() {
            if !open[pi] {
                continue;
            }

            let pool = session.pool(pi);
            if *target as usize >= pool.len() {
                open[pi] = false;
                continue;
            }

            let u = unit_interval(rng) * pool.weight_sum();
            let removed = match pool.select(u) {
                Some(pos) => session.refuse_at(pi, pos),
                None => 0,
            };

            if removed == 0 {
                let partition = &partitions[pi].partition;
                tracing::warn!(
                    partition = %partition,
                    members = partitions[pi].members.len(),
                    remaining = session.pool(pi).len(),
                    target = *target,
                    "no refusable candidate left; closing partition above its target"
                );
                stats.exhausted.push(partition.clone());
                open[pi] = false;
                continue;
            }

            stats.direct += 1;
            stats.cascaded += (removed - 1) as u32;
            progress = true;
        }
    }

    tracing::debug!(
        sweeps = stats.sweeps,
        direct = stats.direct,
        cascaded = stats.cascaded,
        "refusals reached fixed point"
    );
    stats
}
