//! pd_core: Core types and deterministic RNG for passdraw.
//!
//! This crate is **I/O-free**. It defines the stable types shared across the
//! workspace (`pd_io`, `pd_algo`, `pd_pipeline`, `pd_report`, `pd_cli`).
//!
//! - Identity tokens: `UserId`, `Partition`
//! - Input records: `User`, `Availability`
//! - Output record: `Solution`
//! - Seedable RNG (ChaCha20) for draws, see [`rng`]
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod rng;

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain construction.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum CoreError {
        /// The operating system could not provide entropy to seed a draw RNG.
        NoRandomSource(String),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::NoRandomSource(e) => write!(f, "no random source available: {e}"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod ids {
    //! String newtypes for users and partitions.
    //!
    //! Both order lexicographically by their UTF-8 bytes; this is the order in
    //! which the refusal walk visits candidates and in which solutions list them.

    use core::borrow::Borrow;
    use core::fmt;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    macro_rules! string_token {
        ($(#[$meta:meta])* $name:ident) => {
            $(#[$meta])*
            #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
            #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
            #[cfg_attr(feature = "serde", serde(transparent))]
            pub struct $name(String);

            impl $name {
                pub fn new(s: impl Into<String>) -> Self { Self(s.into()) }
                pub fn as_str(&self) -> &str { &self.0 }
                pub fn is_empty(&self) -> bool { self.0.is_empty() }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(s: &str) -> Self { Self(s.to_string()) }
            }

            impl From<String> for $name {
                fn from(s: String) -> Self { Self(s) }
            }

            impl Borrow<str> for $name {
                fn borrow(&self) -> &str { &self.0 }
            }

            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str { &self.0 }
            }
        };
    }

    string_token! {
        /// Unique identity of a candidate.
        UserId
    }

    string_token! {
        /// Grouping key for an independent pool of candidates.
        Partition
    }
}

pub mod entities {
    //! Records exchanged between the loaders, the engine and the renderers.

    use std::collections::BTreeMap;

    use crate::ids::{Partition, UserId};

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    /// Smallest non-zero external weight accepted. Anything smaller is
    /// treated as this value so that reciprocal weights and their sums stay
    /// finite.
    pub const MIN_WEIGHT: f64 = 1e-9;

    /// One candidate as supplied by the caller.
    ///
    /// `weight` is the *external* weight: how many times more likely than a
    /// baseline user this user is to win a pass. `0.0` means unset (neutral).
    #[derive(Clone, Debug, PartialEq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct User {
        pub id: UserId,
        pub partition: Partition,
        #[cfg_attr(feature = "serde", serde(default))]
        pub deps: Vec<UserId>,
        #[cfg_attr(feature = "serde", serde(default))]
        pub weight: f64,
    }

    impl User {
        /// A user with no dependencies and the neutral weight.
        pub fn new(partition: impl Into<Partition>, id: impl Into<UserId>) -> Self {
            Self {
                id: id.into(),
                partition: partition.into(),
                deps: Vec::new(),
                weight: 0.0,
            }
        }

        pub fn with_deps<I, D>(mut self, deps: I) -> Self
        where
            I: IntoIterator<Item = D>,
            D: Into<UserId>,
        {
            self.deps = deps.into_iter().map(Into::into).collect();
            self
        }

        pub fn with_weight(mut self, weight: f64) -> Self {
            self.weight = weight;
            self
        }
    }

    /// Number of passes a partition should retain.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct Availability {
        pub partition: Partition,
        pub available: u32,
    }

    impl Availability {
        pub fn new(partition: impl Into<Partition>, available: u32) -> Self {
            Self { partition: partition.into(), available }
        }
    }

    /// Outcome of one draw: surviving users per partition, each list ascending.
    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct Solution {
        pub passes: BTreeMap<Partition, Vec<UserId>>,
    }

    impl Solution {
        /// Winners of `partition`; empty for unknown partitions.
        pub fn passes_for(&self, partition: &Partition) -> &[UserId] {
            self.passes.get(partition).map(Vec::as_slice).unwrap_or(&[])
        }

        /// True iff `user` holds a pass in any partition.
        pub fn has_pass(&self, user: &UserId) -> bool {
            self.passes.values().any(|ids| ids.binary_search(user).is_ok())
        }

        pub fn total_passes(&self) -> usize {
            self.passes.values().map(Vec::len).sum()
        }
    }
}

pub use entities::{Availability, Solution, User, MIN_WEIGHT};
pub use errors::CoreError;
pub use ids::{Partition, UserId};
pub use rng::DrawRng;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_order_lexicographically() {
        let mut ids = vec![UserId::from("b"), UserId::from("a10"), UserId::from("a2")];
        ids.sort();
        let got: Vec<&str> = ids.iter().map(UserId::as_str).collect();
        assert_eq!(got, ["a10", "a2", "b"]);
    }

    #[test]
    fn solution_lookup_helpers() {
        let mut s = Solution::default();
        s.passes.insert(Partition::from("leaders"), vec!["L1".into(), "L3".into()]);
        s.passes.insert(Partition::from("follows"), vec![]);

        assert_eq!(s.passes_for(&"leaders".into()).len(), 2);
        assert!(s.passes_for(&"nobody".into()).is_empty());
        assert!(s.has_pass(&"L3".into()));
        assert!(!s.has_pass(&"L2".into()));
        assert_eq!(s.total_passes(), 2);
    }

    #[test]
    fn user_builder_defaults_to_neutral_weight() {
        let u = User::new("p", "u1").with_deps(["a", "b"]);
        assert_eq!(u.weight, 0.0);
        assert_eq!(u.deps, vec![UserId::from("a"), UserId::from("b")]);
    }
}
