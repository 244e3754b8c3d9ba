// crates/pd_cli/src/main.rs
//
// Exit codes: 0 ok, 2 validation/usage, 4 I/O, 5 engine.
// Reports go to stdout; logs and status messages go to stderr.

mod args;

mod exitcodes {
    pub const OK: u8 = 0;
    pub const VALIDATION: u8 = 2;
    pub const IO: u8 = 4;
    pub const ENGINE: u8 = 5;
}

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::filter::EnvFilter;

use args::{Cli, Command, Format, GenArgs, RunArgs, SimulateArgs};
use pd_pipeline::{GenerateParams, LoadRequest, PipelineError};

/// Central error type for exit-code mapping.
#[derive(Debug)]
enum MainError {
    Validation(String),
    Io(String),
    Engine(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) | MainError::Io(m) | MainError::Engine(m) => f.write_str(m),
        }
    }
}

impl From<PipelineError> for MainError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Validate(_) => MainError::Validation(e.to_string()),
            PipelineError::Io(_) => MainError::Io(e.to_string()),
            PipelineError::Engine(_) => MainError::Engine(e.to_string()),
        }
    }
}

impl From<pd_report::ReportError> for MainError {
    fn from(e: pd_report::ReportError) -> Self {
        MainError::Engine(e.to_string())
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(exitcodes::VALIDATION)
            } else {
                ExitCode::from(exitcodes::OK)
            };
        }
    };
    init_log(&cli);

    let res = match &cli.command {
        Command::Run(a) => run(a, cli.quiet),
        Command::Simulate(a) => simulate(a),
        Command::Gen(a) => generate(a, cli.quiet),
    };

    match res {
        Ok(()) => ExitCode::from(exitcodes::OK),
        Err(e) => {
            eprintln!("passdraw: error: {e}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(e: &MainError) -> u8 {
    match e {
        MainError::Validation(_) => exitcodes::VALIDATION,
        MainError::Io(_) => exitcodes::IO,
        MainError::Engine(_) => exitcodes::ENGINE,
    }
}

fn init_log(cli: &Cli) {
    let level = if cli.quiet { "error" } else { cli.log_level.as_str() };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| match EnvFilter::try_new(level) {
            Ok(filter) => Ok(filter),
            Err(e) => {
                eprintln!("invalid log level: {level}, using warn, err is: {e}");
                EnvFilter::try_new("warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
    {
        eprintln!("failed to init logger: {e}");
    }
}

fn run(a: &RunArgs, quiet: bool) -> Result<(), MainError> {
    if a.input.is_none() && a.users.is_empty() {
        return Err(MainError::Validation("run needs --input and/or --users".into()));
    }
    let req = LoadRequest {
        config: a.input.clone(),
        user_files: a.users.clone(),
        passes: a.passes.clone(),
    };
    let inputs = pd_pipeline::load_inputs(&req)?;

    if a.validate_only {
        if !quiet {
            let partitions: std::collections::BTreeSet<_> = inputs.users.iter().map(|u| &u.partition).collect();
            eprintln!(
                "validate-only: {} users in {} partitions OK",
                inputs.users.len(),
                partitions.len()
            );
        }
        return Ok(());
    }

    let out = pd_pipeline::draw(&inputs, a.seed)?;

    if let Some(dir) = &a.out {
        let (result, record) = pd_pipeline::write_artifacts(dir, &out)?;
        if !quiet {
            eprintln!("wrote {} and {}", result.display(), record.display());
        }
    }

    let report = match a.format {
        Format::Text => pd_report::render_draw_text(&out),
        Format::Json => draw_json(&out)?,
    };
    print!("{report}");
    Ok(())
}

#[cfg(feature = "report-json")]
fn draw_json(out: &pd_pipeline::DrawOutputs) -> Result<String, MainError> {
    Ok(pd_report::render_draw_json(out)? + "\n")
}

#[cfg(not(feature = "report-json"))]
fn draw_json(_out: &pd_pipeline::DrawOutputs) -> Result<String, MainError> {
    Err(MainError::Validation("built without JSON reports".into()))
}

#[cfg(feature = "report-json")]
fn simulation_json(stats: &pd_pipeline::SimulationStats) -> Result<String, MainError> {
    Ok(pd_report::render_simulation_json(stats)? + "\n")
}

#[cfg(not(feature = "report-json"))]
fn simulation_json(_stats: &pd_pipeline::SimulationStats) -> Result<String, MainError> {
    Err(MainError::Validation("built without JSON reports".into()))
}

fn simulate(a: &SimulateArgs) -> Result<(), MainError> {
    let (users, availabilities) = match &a.input {
        Some(path) => {
            let conf = pd_io::load_run_config(path).map_err(PipelineError::from)?;
            (conf.users(), conf.availabilities())
        }
        None => pd_pipeline::demo_scenario(a.passes.unwrap_or(10))?,
    };

    let stats = pd_pipeline::simulate(users, &availabilities, a.runs, a.seed)?;
    let report = match a.format {
        Format::Text => pd_report::render_simulation_text(&stats),
        Format::Json => simulation_json(&stats)?,
    };
    print!("{report}");
    Ok(())
}

fn generate(a: &GenArgs, quiet: bool) -> Result<(), MainError> {
    let params = GenerateParams {
        leader_full_passes: a.leader_full_passes,
        leader_party_passes: a.leader_party_passes,
        follower_full_passes: a.follower_full_passes,
        follower_party_passes: a.follower_party_passes,
        overbook_ratio: a.overbook_ratio,
        full_couples: a.full_couples,
        party_couples: a.party_couples,
    };
    let conf = pd_pipeline::generate_event_config(&params)?;
    let json = conf.to_json_pretty().map_err(PipelineError::from)?;

    match &a.out {
        Some(path) => {
            fs::write(path, json + "\n")
                .map_err(|e| MainError::Io(format!("cannot write {}: {e}", path.display())))?;
            if !quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        None => println!("{json}"),
    }
    Ok(())
}
