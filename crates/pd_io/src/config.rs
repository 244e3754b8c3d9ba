//! JSON run configuration.
//!
//! ```json
//! {
//!   "Passes": { "leaders": 2, "follows": 2 },
//!   "Users": {
//!     "leaders": [ { "ID": "L1" }, { "ID": "L2", "Deps": ["F2"], "Weight": 2 } ],
//!     "follows": [ { "ID": "F1" }, { "ID": "F2", "Deps": ["L2"] } ]
//!   }
//! }
//! ```
//!
//! Lower-case keys (`passes`, `users`, `id`, `deps`, `weight`) are accepted.
//! Serialization always writes the capitalized form.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use pd_core::{Availability, Partition, User, UserId, MIN_WEIGHT};
use serde::{Deserialize, Serialize};

use crate::{read_file, IoError, IoResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    #[serde(rename = "ID", alias = "id")]
    pub id: UserId,
    #[serde(rename = "Deps", alias = "deps", default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<UserId>,
    /// External weight; absent or 0 means neutral.
    #[serde(rename = "Weight", alias = "weight", default, skip_serializing_if = "is_neutral")]
    pub weight: f64,
}

fn is_neutral(w: &f64) -> bool {
    *w == 0.0
}

impl UserEntry {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(rename = "Passes", alias = "passes", default)]
    pub passes: BTreeMap<Partition, u32>,
    #[serde(rename = "Users", alias = "users", default)]
    pub users: BTreeMap<Partition, Vec<UserEntry>>,
}

impl RunConfig {
    /// Parse, schema-check (feature `schemaval`) and validate.
    pub fn from_json_bytes(bytes: &[u8]) -> IoResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        #[cfg(feature = "schemaval")]
        crate::schema::validate_run_config(&value)?;
        let conf: RunConfig = serde_json::from_value(value)?;
        conf.validate()?;
        Ok(conf)
    }

    /// Semantic checks the engine relies on:
    /// - every partition with users has a passes entry and vice versa
    /// - user IDs are non-empty
    /// - weights are 0 (neutral) or finite and at least `MIN_WEIGHT`
    pub fn validate(&self) -> IoResult<()> {
        for part in self.passes.keys() {
            if !self.users.contains_key(part) {
                return Err(IoError::Invalid(format!(
                    "partition {part} has passes but no users"
                )));
            }
        }
        for part in self.users.keys() {
            if !self.passes.contains_key(part) {
                return Err(IoError::Invalid(format!(
                    "partition {part} has users but no passes"
                )));
            }
        }

        for (part, entries) in &self.users {
            for (i, u) in entries.iter().enumerate() {
                if u.id.is_empty() {
                    return Err(IoError::Invalid(format!(
                        "partition {part}: user #{} has an empty ID",
                        i + 1
                    )));
                }
                let too_small = u.weight > 0.0 && u.weight < MIN_WEIGHT;
                if !u.weight.is_finite() || u.weight < 0.0 || too_small {
                    return Err(IoError::Invalid(format!(
                        "partition {part}: user {} has invalid weight {}",
                        u.id, u.weight
                    )));
                }
                if u.deps.iter().any(UserId::is_empty) {
                    return Err(IoError::Invalid(format!(
                        "partition {part}: user {} has an empty dependency",
                        u.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Flatten into engine users, partitions ascending, entries in file order.
    pub fn users(&self) -> Vec<User> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(self.users.values().map(Vec::len).sum());
        for (part, entries) in &self.users {
            for e in entries {
                if !seen.insert(e.id.clone()) {
                    tracing::warn!(user = %e.id, partition = %part, "duplicate user ID; the later entry wins");
                }
                out.push(User {
                    id: e.id.clone(),
                    partition: part.clone(),
                    deps: e.deps.clone(),
                    weight: e.weight,
                });
            }
        }
        out
    }

    pub fn availabilities(&self) -> Vec<Availability> {
        self.passes
            .iter()
            .map(|(p, &n)| Availability::new(p.clone(), n))
            .collect()
    }

    /// Pretty JSON in the capitalized form.
    pub fn to_json_pretty(&self) -> IoResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read, parse and validate a run configuration file.
pub fn load_run_config(path: &Path) -> IoResult<RunConfig> {
    let bytes = read_file(path)?;
    RunConfig::from_json_bytes(&bytes).map_err(|e| match e {
        IoError::Json { pointer, msg } => IoError::Json {
            pointer,
            msg: format!("{}: {msg}", path.display()),
        },
        other => other,
    })
}
