use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use sparring_config::{write_default, ConfigFile, ScenarioSource, Settings};
use sparring_engine::{
    CaseOutcome, ModePolicy, ScenarioRunner, StdinLines, SuiteReport, TestSuiteDriver,
};
use sparring_telemetry::{EventLogger, FileSink, LogSink, MetricsRecorder, TeeSink, TracingSink};

const DEFAULT_CONFIG: &str = "config.json";

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute every test case of a scenario file against the target server
    Run(RunArgs),
    /// Write the stock scenario file
    Init(InitArgs),
    /// Load a scenario file and report which test cases are valid
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Scenario file (YAML, or JSON with a .json extension). Created with the
    /// stock cases when missing.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
    /// How each case is executed: auto, manual, or ask before every case
    #[arg(short, long, default_value = "ask")]
    pub mode: ModePolicy,
    /// Override the target host
    #[arg(long)]
    pub host: Option<String>,
    /// Override the target port
    #[arg(long)]
    pub port: Option<u16>,
    /// Override the log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// Print Prometheus metrics when the suite is done
    #[arg(long)]
    pub print_metrics: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_suite(args).await,
        Commands::Init(args) => {
            EventLogger::init("info");
            init_config(&args.config, args.force)
        }
        Commands::Validate(args) => {
            EventLogger::init("info");
            validate_config(&args.config)
        }
    }
}

async fn run_suite(args: RunArgs) -> anyhow::Result<()> {
    let created = !args.config.exists();
    if created {
        write_default(&args.config)
            .with_context(|| format!("writing default config to {}", args.config.display()))?;
    }

    let file = ConfigFile::open(&args.config)?;
    let mut settings = file.settings()?;
    settings.override_target(args.host, args.port)?;
    if let Some(path) = args.log_file {
        settings.log.file = Some(path);
    }

    EventLogger::init(&settings.log.level);
    let sink = build_sink(&settings)?;
    if created {
        sink.log(&format!(
            "Configuration file not found. Created default config file at {}",
            args.config.display()
        ));
    }
    info!(target_addr = %settings.target(), config = %file.path().display(), "Starting test suite");

    let metrics = MetricsRecorder::new();
    let runner = ScenarioRunner::from_settings(&settings, sink, metrics.clone());
    let input = StdinLines::new().context("starting the input reader")?;
    let mut driver = TestSuiteDriver::new(runner, args.mode, Box::new(input));
    let report = driver.run(&file).await?;

    print_summary(&report);
    if args.print_metrics {
        println!("{}", metrics.gather_metrics()?);
    }
    if !report.passed() {
        bail!("test suite finished with failures");
    }
    Ok(())
}

fn build_sink(settings: &Settings) -> anyhow::Result<Arc<dyn LogSink>> {
    let mut sink = TeeSink::new().with(Arc::new(TracingSink));
    if let Some(path) = &settings.log.file {
        let file = FileSink::create(path, settings.log.clear_on_start)
            .with_context(|| format!("opening log file {}", path.display()))?;
        sink = sink.with(Arc::new(file));
    }
    Ok(Arc::new(sink))
}

fn print_summary(report: &SuiteReport) {
    for outcome in &report.outcomes {
        match outcome {
            CaseOutcome::Completed { mode, result } => {
                let status = if result.passed() { "ok" } else { "FAILED" };
                println!(
                    "{status:>7}  {} ({mode}, {:.2}s)",
                    result.name,
                    result.elapsed.as_secs_f64()
                );
                for error in &result.errors {
                    println!("         {error}");
                }
            }
            CaseOutcome::Skipped { index, name, error } => {
                println!("skipped  #{index} {name}");
                println!("         {error}");
            }
        }
    }
    println!(
        "{} case(s), {} skipped, {:.2}s",
        report.outcomes.len(),
        report.skipped(),
        report.elapsed.as_secs_f64()
    );
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists, pass --force to overwrite it", path.display());
    }
    write_default(path)?;
    info!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn validate_config(path: &Path) -> anyhow::Result<()> {
    let file = ConfigFile::open(path)?;
    let settings = file.settings()?;
    println!("target: {}", settings.target());

    let mut invalid = 0;
    for (index, entry) in file.load_scenarios()?.iter().enumerate() {
        match entry {
            Ok(case) => println!("  ok  #{index} {} ({} clients)", case.name, case.clients.len()),
            Err(e) => {
                invalid += 1;
                warn!("Invalid test case: {e}");
                println!("  bad #{index} {e}");
            }
        }
    }
    if invalid > 0 {
        bail!("{invalid} invalid test case(s) in {}", file.path().display());
    }
    Ok(())
}
