//! JSON renderers. Field order follows the model structs.

use pd_pipeline::{DrawOutputs, SimulationStats};

use crate::{build_draw_report, build_simulation_report, ReportError};

pub fn render_draw_json(out: &DrawOutputs) -> Result<String, ReportError> {
    serde_json::to_string_pretty(&build_draw_report(out)).map_err(|e| ReportError::Serialize(e.to_string()))
}

pub fn render_simulation_json(stats: &SimulationStats) -> Result<String, ReportError> {
    serde_json::to_string_pretty(&build_simulation_report(stats))
        .map_err(|e| ReportError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::{Availability, User};
    use pd_pipeline::{draw, simulate, LoadedInputs};
    use serde_json::Value;

    #[test]
    fn draw_json_shape() {
        let inputs = LoadedInputs {
            users: vec![User::new("p", "a"), User::new("p", "b"), User::new("q", "c").with_deps(["a"])],
            availabilities: vec![Availability::new("p", 1), Availability::new("q", 1)],
            sources: vec![],
        };
        let out = draw(&inputs, Some(3)).unwrap();
        let v: Value = serde_json::from_str(&render_draw_json(&out).unwrap()).unwrap();

        assert_eq!(v["partitions"].as_array().unwrap().len(), 2);
        assert_eq!(v["partitions"][0]["partition"], "p");
        assert_eq!(v["partitions"][0]["handed_out"], 1);
        assert_eq!(v["integrity"]["seed"], 3);
        assert_eq!(v["integrity"]["result_id"], out.result.id.as_str());
    }

    #[test]
    fn simulation_json_carries_percent_strings() {
        let users = vec![User::new("p", "a"), User::new("p", "b")];
        let stats = simulate(users, &[Availability::new("p", 2)], 10, Some(1)).unwrap();
        let v: Value = serde_json::from_str(&render_simulation_json(&stats).unwrap()).unwrap();
        assert_eq!(v["runs"], 10);
        assert_eq!(v["partitions"][0]["users"][0]["probability_pct"], "100.0");
        assert_eq!(v["partitions"][0]["total_passes"], 20);
    }
}
