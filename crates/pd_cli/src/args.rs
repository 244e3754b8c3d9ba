// crates/pd_cli/src/args.rs
//
// Command-line surface. Value parsers live here so that malformed flags fail
// during parsing (exit code 2) before any file is touched.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pd_core::{Availability, Partition};

#[derive(Debug, Parser)]
#[command(
    name = "passdraw",
    version,
    disable_help_subcommand = true,
    about = "Weighted random pass allocation that keeps dependent registrations together"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log filter when RUST_LOG is unset, e.g. "info" or "warn,pd_algo=debug".
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Only log errors and skip status messages on stderr.
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Assign passes to users.
    Run(RunArgs),
    /// Do many runs and print per-user statistics.
    Simulate(SimulateArgs),
    /// Generate a synthetic event configuration.
    Gen(GenArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// JSON run configuration ({"Passes": {...}, "Users": {...}}).
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Line-oriented user file for a partition, as PARTITION=PATH. Repeatable.
    #[arg(long = "users", value_name = "PARTITION=PATH", value_parser = parse_users_arg)]
    pub users: Vec<(Partition, PathBuf)>,

    /// Passes for a partition, as PARTITION:N. Repeatable or comma-separated.
    /// Replaces every passes entry of --input when given.
    #[arg(long = "passes", value_name = "PARTITION:N", value_delimiter = ',', value_parser = parse_passes)]
    pub passes: Vec<Availability>,

    /// Seed for a reproducible draw (decimal u64 or 0x-hex). Random if omitted.
    #[arg(long, value_parser = parse_seed)]
    pub seed: Option<u64>,

    /// Directory to write result.json and run_record.json into.
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Load and validate the inputs, then stop.
    #[arg(long)]
    pub validate_only: bool,
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// JSON run configuration; the built-in demo event is used if omitted.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Passes to hand out in the demo event, split between leaders and followers.
    #[arg(long, conflicts_with = "input")]
    pub passes: Option<u32>,

    #[arg(long, default_value_t = 1_000_000)]
    pub runs: u64,

    #[arg(long, value_parser = parse_seed)]
    pub seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

#[derive(Debug, Args)]
pub struct GenArgs {
    #[arg(long, default_value_t = 150)]
    pub leader_full_passes: u32,
    #[arg(long, default_value_t = 85)]
    pub leader_party_passes: u32,
    #[arg(long, default_value_t = 170)]
    pub follower_full_passes: u32,
    #[arg(long, default_value_t = 85)]
    pub follower_party_passes: u32,
    /// Registered users per pass in every partition.
    #[arg(long, default_value_t = 1.5)]
    pub overbook_ratio: f64,
    #[arg(long, default_value_t = 30)]
    pub full_couples: u32,
    #[arg(long, default_value_t = 10)]
    pub party_couples: u32,
    /// Write to this file instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Decimal u64 or 0x-hex (1..=16 digits).
pub fn parse_seed(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty seed".into());
    }
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if rest.is_empty() || rest.len() > 16 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("hex seed must be 1..16 hex digits".into());
        }
        u64::from_str_radix(rest, 16).map_err(|_| "hex seed out of range".into())
    } else {
        s.parse::<u64>().map_err(|_| "decimal seed must be a valid u64".into())
    }
}

pub fn parse_passes(s: &str) -> Result<Availability, String> {
    pd_pipeline::parse_passes_arg(s).map_err(|e| e.to_string())
}

/// `PARTITION=PATH`
pub fn parse_users_arg(s: &str) -> Result<(Partition, PathBuf), String> {
    match s.split_once('=') {
        Some((p, path)) if !p.trim().is_empty() && !path.trim().is_empty() => {
            Ok((Partition::from(p.trim()), PathBuf::from(path.trim())))
        }
        _ => Err("expected PARTITION=PATH, e.g. leaders=leaders.txt".into()),
    }
}
