//! Reverse dependency edges.
//!
//! "A depends on B" is stored as `B -> [A, ...]`: refusing B must refuse A.
//! Targets are keyed by ID as written, so a dangling reference simply becomes
//! a key that no refusal ever visits. Dependents are always registered users.

use std::collections::BTreeMap;

use crate::registry::{RegisteredUser, UserRegistry};

#[derive(Debug, Default)]
pub struct DependencyIndex<'r> {
    dependents: BTreeMap<&'r str, Vec<&'r RegisteredUser>>,
}

impl<'r> DependencyIndex<'r> {
    /// Scan every dependency list once: O(total edges).
    pub fn build(registry: &'r UserRegistry) -> Self {
        let mut dependents: BTreeMap<&'r str, Vec<&'r RegisteredUser>> = BTreeMap::new();
        for user in registry.iter() {
            for dep in &user.deps {
                if registry.user(dep.as_str()).is_none() {
                    tracing::debug!(user = %user.id, dep = %dep, "dependency on unknown user ignored");
                }
                dependents.entry(dep.as_str()).or_default().push(user);
            }
        }
        Self { dependents }
    }

    /// Users that must be refused when `id` is refused.
    pub fn dependents(&self, id: &str) -> &[&'r RegisteredUser] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.dependents.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::User;

    #[test]
    fn records_reverse_edges_across_partitions() {
        let reg = UserRegistry::from_users([
            User::new("lead", "L1"),
            User::new("follow", "F1").with_deps(["L1"]),
            User::new("follow", "F2").with_deps(["L1", "F1"]),
        ]);
        let idx = DependencyIndex::build(&reg);

        let on_l1: Vec<&str> = idx.dependents("L1").iter().map(|u| u.id.as_str()).collect();
        assert_eq!(on_l1, ["F1", "F2"]);
        let on_f1: Vec<&str> = idx.dependents("F1").iter().map(|u| u.id.as_str()).collect();
        assert_eq!(on_f1, ["F2"]);
        assert!(idx.dependents("F2").is_empty());
        assert_eq!(idx.edge_count(), 3);
    }

    #[test]
    fn dangling_targets_are_tolerated() {
        let reg = UserRegistry::from_users([User::new("p", "A").with_deps(["ghost"])]);
        let idx = DependencyIndex::build(&reg);
        assert_eq!(idx.dependents("ghost").len(), 1);
        assert!(idx.dependents("A").is_empty());
    }
}
