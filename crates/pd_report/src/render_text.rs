//! Plain-text renderers, one line per user.

use std::fmt::Write as _;

use pd_pipeline::{DrawOutputs, SimulationStats};

use crate::{build_draw_report, build_simulation_report, DrawReport, SimulationReport};

pub fn render_draw_text(out: &DrawOutputs) -> String {
    draw_text(&build_draw_report(out))
}

pub fn render_simulation_text(stats: &SimulationStats) -> String {
    simulation_text(&build_simulation_report(stats))
}

// `write!` into a String cannot fail.
fn draw_text(r: &DrawReport) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "Executed run for the following availabilities:");
    for p in &r.partitions {
        let _ = writeln!(
            s,
            "{} - Handed out {} out of {} passes for partition:",
            p.partition, p.handed_out, p.available
        );
        for id in &p.winners {
            let _ = writeln!(s, " O {id}");
        }
        let _ = writeln!(
            s,
            "{} - The following {} users did not get a pass:",
            p.partition,
            p.refused.len()
        );
        for id in &p.refused {
            let _ = writeln!(s, " x {id}");
        }
    }
    if r.cascaded_refusals > 0 {
        let _ = writeln!(s, "{} refusals followed from dependencies.", r.cascaded_refusals);
    }
    for p in &r.exhausted {
        let _ = writeln!(s, "warning: partition {p} ran out of refusable users above its availability");
    }
    let i = &r.integrity;
    let origin = if i.seed_generated { "generated" } else { "given" };
    let _ = writeln!(s, "Seed {} ({origin}); replay with --seed {}", i.seed, i.seed);
    let _ = writeln!(s, "{} / {} / {}", i.engine, i.result_id, i.run_id);
    s
}

fn simulation_text(r: &SimulationReport) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "Performed {} runs (seed {}); here are the statistics:", r.runs, r.seed);
    for p in &r.partitions {
        let _ = writeln!(
            s,
            "Handed out {} passes to {} users in partition {}",
            p.available, p.members, p.partition
        );
        for u in &p.users {
            let _ = writeln!(
                s,
                "User {:<10} got a total of {:>6} passes; probability of {:>5}%",
                u.id, u.passes, u.probability_pct
            );
        }
        let _ = writeln!(s, "Handed out a total of {} passes for partition {}", p.total_passes, p.partition);
    }
    s
}
