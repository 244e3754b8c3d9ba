//! Per-run session: dependency index + one candidate pool per partition.
//!
//! Built fresh for every run and dropped once the solution is assembled.
//! Nothing here outlives a run except what the caller keeps from the solution.

use pd_core::{Partition, Solution, UserId};

use crate::deps::DependencyIndex;
use crate::pool::CandidatePool;
use crate::registry::{RegisteredUser, UserRegistry};

#[derive(Debug)]
pub struct Session<'r> {
    registry: &'r UserRegistry,
    deps: DependencyIndex<'r>,
    pools: Vec<CandidatePool>,
}

impl<'r> Session<'r> {
    pub fn new(registry: &'r UserRegistry) -> Self {
        let pools = registry
            .partitions()
            .iter()
            .map(|pm| {
                let weights = pm
                    .members
                    .iter()
                    .map(|id| registry.user(id.as_str()).map_or(1.0, |u| u.weight))
                    .collect();
                CandidatePool::new(weights)
            })
            .collect();

        let deps = DependencyIndex::build(registry);
        tracing::trace!(users = registry.len(), edges = deps.edge_count(), "session built");
        Self { registry, deps, pools }
    }

    pub fn registry(&self) -> &'r UserRegistry {
        self.registry
    }

    pub fn pool(&self, partition: usize) -> &CandidatePool {
        &self.pools[partition]
    }

    /// Unknown users count as refused.
    pub fn is_refused(&self, id: &str) -> bool {
        match self.registry.user(id) {
            Some(u) => !self.pools[u.slot.partition].contains(u.slot.position),
            None => true,
        }
    }

    /// Refuse `id` and everything that transitively depends on it.
    ///
    /// Returns the number of users newly refused (0 if `id` was already
    /// refused or is unknown).
    pub fn refuse(&mut self, id: &str) -> usize {
        match self.registry.user(id) {
            Some(u) => self.refuse_user(u),
            None => 0,
        }
    }

    /// Refuse the member at `position` of partition `partition`, with cascade.
    pub fn refuse_at(&mut self, partition: usize, position: usize) -> usize {
        let registry = self.registry;
        let member = registry
            .partitions()
            .get(partition)
            .and_then(|pm| pm.members.get(position));
        let Some(id) = member else {
            return 0;
        };
        match registry.user(id.as_str()) {
            Some(u) => self.refuse_user(u),
            None => 0,
        }
    }

    // Mark-then-visit over an explicit stack: a user is removed from its pool
    // before its dependents are queued, and a removed user is never expanded
    // again, so cycles terminate.
    fn refuse_user(&mut self, start: &'r RegisteredUser) -> usize {
        let mut removed = 0usize;
        let mut stack: Vec<&'r RegisteredUser> = vec![start];
        while let Some(user) = stack.pop() {
            if !self.pools[user.slot.partition].remove(user.slot.position) {
                continue;
            }
            removed += 1;
            for &dependent in self.deps.dependents(user.id.as_str()) {
                if self.pools[dependent.slot.partition].contains(dependent.slot.position) {
                    stack.push(dependent);
                }
            }
        }
        if removed > 1 {
            tracing::trace!(user = %start.id, cascaded = removed - 1, "refusal cascaded");
        }
        removed
    }

    /// Surviving users per partition, ascending by ID. Every partition with
    /// members appears, possibly with an empty list.
    pub fn into_solution(self) -> Solution {
        let mut solution = Solution::default();
        for (pm, pool) in self.registry.partitions().iter().zip(&self.pools) {
            let winners: Vec<UserId> = pool
                .live_positions()
                .map(|pos| pm.members[pos].clone())
                .collect();
            solution.passes.insert(pm.partition.clone(), winners);
        }
        solution
    }

    /// Refused users of `partition`, ascending.
    pub fn refused(&self, partition: &Partition) -> Vec<UserId> {
        let Some(pi) = self.registry.partition_index(partition) else {
            return Vec::new();
        };
        let pool = &self.pools[pi];
        self.registry.partitions()[pi]
            .members
            .iter()
            .enumerate()
            .filter(|&(pos, _)| !pool.contains(pos))
            .map(|(_, id)| id.clone())
            .collect()
    }
}
