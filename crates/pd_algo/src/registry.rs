//! User registry: the immutable catalogue a runner is built from.
//!
//! Contract:
//! - Duplicate IDs: the last record wins, including its partition.
//! - Weights are stored *internally* as refusal weights: `1 / external`.
//!   Any external weight that is not a positive finite number (the unset `0`,
//!   negatives, NaN, infinities) maps to the neutral refusal weight `1`.
//!   Positive weights below [`MIN_WEIGHT`] count as `MIN_WEIGHT`, so a
//!   refusal weight never exceeds `1 / MIN_WEIGHT`.
//! - Partitions are kept in ascending order and each partition's members are
//!   kept ascending by ID; this is the walk order of the refusal engine.

use std::collections::BTreeMap;

use pd_core::{Partition, User, UserId, MIN_WEIGHT};

/// Where a user lives inside the per-run pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    /// Index into [`UserRegistry::partitions`].
    pub partition: usize,
    /// Position inside that partition's ascending member list.
    pub position: usize,
}

/// A registered user with its normalized (internal) refusal weight.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisteredUser {
    pub id: UserId,
    pub partition: Partition,
    pub deps: Vec<UserId>,
    /// Refusal weight (reciprocal of the external weight).
    pub weight: f64,
    pub slot: Slot,
}

/// Ascending member list of one partition.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionMembers {
    pub partition: Partition,
    pub members: Vec<UserId>,
}

#[derive(Clone, Debug, Default)]
pub struct UserRegistry {
    users: BTreeMap<UserId, RegisteredUser>,
    partitions: Vec<PartitionMembers>,
}

/// Map an external "times more likely to win" weight to a refusal weight.
#[inline]
pub fn refusal_weight(external: f64) -> f64 {
    if external.is_finite() && external > 0.0 {
        1.0 / external.max(MIN_WEIGHT)
    } else {
        1.0
    }
}

impl UserRegistry {
    pub fn from_users<I>(users: I) -> Self
    where
        I: IntoIterator<Item = User>,
    {
        // Last write wins.
        let mut latest: BTreeMap<UserId, User> = BTreeMap::new();
        for u in users {
            latest.insert(u.id.clone(), u);
        }

        let mut grouped: BTreeMap<Partition, Vec<UserId>> = BTreeMap::new();
        for u in latest.values() {
            // `latest` iterates ascending, so every member list is ascending too.
            grouped.entry(u.partition.clone()).or_default().push(u.id.clone());
        }

        let partitions: Vec<PartitionMembers> = grouped
            .into_iter()
            .map(|(partition, members)| PartitionMembers { partition, members })
            .collect();

        let mut slots: BTreeMap<&UserId, Slot> = BTreeMap::new();
        for (pi, pm) in partitions.iter().enumerate() {
            for (pos, id) in pm.members.iter().enumerate() {
                slots.insert(id, Slot { partition: pi, position: pos });
            }
        }

        let mut registered = BTreeMap::new();
        for (id, u) in &latest {
            let Some(&slot) = slots.get(id) else { continue };
            registered.insert(
                id.clone(),
                RegisteredUser {
                    id: u.id.clone(),
                    partition: u.partition.clone(),
                    deps: u.deps.clone(),
                    weight: refusal_weight(u.weight),
                    slot,
                },
            );
        }

        Self { users: registered, partitions }
    }

    pub fn user(&self, id: &str) -> Option<&RegisteredUser> {
        self.users.get(id)
    }

    /// Ascending IDs of `partition`; empty for unknown partitions.
    pub fn users(&self, partition: &Partition) -> &[UserId] {
        self.partition_index(partition)
            .map(|i| self.partitions[i].members.as_slice())
            .unwrap_or(&[])
    }

    pub fn partition_index(&self, partition: &Partition) -> Option<usize> {
        self.partitions
            .binary_search_by(|pm| pm.partition.cmp(partition))
            .ok()
    }

    pub fn partitions(&self) -> &[PartitionMembers] {
        &self.partitions
    }

    /// All users ascending by ID.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredUser> {
        self.users.values()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
