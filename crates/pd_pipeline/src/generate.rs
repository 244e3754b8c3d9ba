//! Synthetic dance-event configurations for load testing.
//!
//! Four partitions: full and party passes for leaders and followers. Each
//! partition is overbooked by `overbook_ratio`; a fixed number of its users
//! are couples whose partner sits in the mirrored partition
//! (`leader_full` ↔ `follow_full`, `leader_part` ↔ `follow_part`).

use pd_core::{Partition, UserId};
use pd_io::{RunConfig, UserEntry};

use crate::PipelineError;

pub const LEADER_FULL: &str = "leader_full";
pub const LEADER_PART: &str = "leader_part";
pub const FOLLOW_FULL: &str = "follow_full";
pub const FOLLOW_PART: &str = "follow_part";

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateParams {
    pub leader_full_passes: u32,
    pub leader_party_passes: u32,
    pub follower_full_passes: u32,
    pub follower_party_passes: u32,
    pub overbook_ratio: f64,
    pub full_couples: u32,
    pub party_couples: u32,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            leader_full_passes: 150,
            leader_party_passes: 85,
            follower_full_passes: 170,
            follower_party_passes: 85,
            overbook_ratio: 1.5,
            full_couples: 30,
            party_couples: 10,
        }
    }
}

/// Build the configuration. Every partition gets floor(passes × ratio)
/// users; the last `couples` of them depend on their partner.
pub fn generate_event_config(p: &GenerateParams) -> Result<RunConfig, PipelineError> {
    if !p.overbook_ratio.is_finite() || p.overbook_ratio <= 0.0 {
        return Err(PipelineError::Validate(format!(
            "overbook ratio must be a positive number, got {}",
            p.overbook_ratio
        )));
    }

    let layout = [
        (LEADER_FULL, p.leader_full_passes, p.full_couples, FOLLOW_FULL),
        (LEADER_PART, p.leader_party_passes, p.party_couples, FOLLOW_PART),
        (FOLLOW_FULL, p.follower_full_passes, p.full_couples, LEADER_FULL),
        (FOLLOW_PART, p.follower_party_passes, p.party_couples, LEADER_PART),
    ];

    let mut conf = RunConfig::default();
    for (partition, passes, couples, partner) in layout {
        let total = (f64::from(passes) * p.overbook_ratio).floor() as u64;
        let couples = u64::from(couples);
        if couples > total {
            return Err(PipelineError::Validate(format!(
                "{partition}: {couples} couples do not fit into {total} users"
            )));
        }

        let mut users: Vec<UserEntry> = (1..=total - couples)
            .map(|n| UserEntry::new(format!("{partition}-{n:03}")))
            .collect();
        users.extend((1..=couples).map(|n| UserEntry {
            deps: vec![UserId::new(format!("{partner}-couple-{n:02}"))],
            ..UserEntry::new(format!("{partition}-couple-{n:02}"))
        }));

        conf.passes.insert(Partition::from(partition), passes);
        conf.users.insert(Partition::from(partition), users);
    }

    conf.validate()?;
    tracing::debug!(users = conf.users.values().map(Vec::len).sum::<usize>(), "generated event configuration");
    Ok(conf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_algo::Runner;

    #[test]
    fn default_event_is_overbooked() {
        let conf = generate_event_config(&GenerateParams::default()).unwrap();
        assert_eq!(conf.passes.len(), 4);
        assert_eq!(conf.users[LEADER_FULL].len(), 225);
        assert_eq!(conf.users[FOLLOW_FULL].len(), 255);
        assert_eq!(conf.users[LEADER_PART].len(), 127);
        assert_eq!(conf.users[LEADER_FULL][0].id.as_str(), "leader_full-001");
    }

    #[test]
    fn couples_point_at_each_other() {
        let conf = generate_event_config(&GenerateParams::default()).unwrap();
        let lead = conf.users[LEADER_FULL].iter().find(|u| u.id.as_str() == "leader_full-couple-07").unwrap();
        assert_eq!(lead.deps, vec![UserId::from("follow_full-couple-07")]);
        let follow = conf.users[FOLLOW_FULL].iter().find(|u| u.id.as_str() == "follow_full-couple-07").unwrap();
        assert_eq!(follow.deps, vec![UserId::from("leader_full-couple-07")]);
    }

    #[test]
    fn generated_event_draws_within_limits() {
        let conf = generate_event_config(&GenerateParams::default()).unwrap();
        let mut runner = Runner::seeded(conf.users(), 2024);
        let solution = runner.run(&conf.availabilities()).unwrap();
        for (p, n) in &conf.passes {
            assert!(solution.passes_for(p).len() <= *n as usize);
        }
        for i in 1..=30 {
            let l = solution.has_pass(&UserId::new(format!("leader_full-couple-{i:02}")));
            let f = solution.has_pass(&UserId::new(format!("follow_full-couple-{i:02}")));
            assert_eq!(l, f);
        }
    }

    #[test]
    fn bad_parameters_are_rejected() {
        let p = GenerateParams { overbook_ratio: 0.0, ..GenerateParams::default() };
        assert!(generate_event_config(&p).is_err());
        let p = GenerateParams { full_couples: 1_000, ..GenerateParams::default() };
        assert!(generate_event_config(&p).is_err());
    }

    #[test]
    fn serializes_in_capitalized_form() {
        let p = GenerateParams {
            leader_full_passes: 1,
            leader_party_passes: 0,
            follower_full_passes: 1,
            follower_party_passes: 0,
            overbook_ratio: 2.0,
            full_couples: 1,
            party_couples: 0,
        };
        let json = generate_event_config(&p).unwrap().to_json_pretty().unwrap();
        assert!(json.contains("\"Passes\""));
        assert!(json.contains("\"ID\": \"leader_full-couple-01\""));
        assert!(json.contains("\"Deps\""));
    }
}
