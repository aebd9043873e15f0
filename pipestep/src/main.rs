//! pipestep - CLI entry point for running transformation steps

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::info;

use pipestep::cli::{Cli, Command, OutputFormat};
use pipestep::config::Config;
use pipestep::models::{TransformationConfig, unstructure};
use pipestep::runner::{RunReport, Runner};
use pipestep::transformation::{CliOption, TransformationRegistry};

fn setup_logging(verbose: bool) -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        "pipestep loaded config: engine={:?}, default-fs={}",
        config.engine.kind, config.engine.default_fs
    );

    let registry = TransformationRegistry::standard();

    match cli.command {
        Command::List => cmd_list(&registry),
        Command::Validate { pipeline, format } => cmd_validate(&pipeline, format),
        Command::Run {
            pipeline,
            name,
            info_date,
            options,
            step_args,
        } => cmd_run(&config, registry, &pipeline, &name, info_date, options, &step_args).await,
        Command::RunAll { pipeline } => cmd_run_all(&config, registry, &pipeline).await,
    }
}

/// List registered transformations with their flags
fn cmd_list(registry: &TransformationRegistry) -> Result<()> {
    for info in registry.infos() {
        println!("{}", info.name.cyan().bold());
        println!("  {}", info.description);
        for option in &info.cli_options {
            let flag = if option.is_flag {
                format!("--{}", option.name)
            } else {
                format!("--{} <VALUE>", option.name)
            };
            println!("    {:<24} {}", flag, option.help.dimmed());
        }
    }
    Ok(())
}

/// Structure a pipeline file and print the normalized mapping
fn cmd_validate(pipeline: &Path, format: OutputFormat) -> Result<()> {
    let config = load_pipeline(pipeline)?;
    let value = unstructure(&config);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&value)?),
    }

    eprintln!(
        "{} {} transformers, {} tables",
        "✓".green(),
        config.run_transformers.len(),
        config.metastore_tables.len()
    );
    Ok(())
}

/// Run a single declared transformation
async fn cmd_run(
    config: &Config,
    registry: TransformationRegistry,
    pipeline: &Path,
    name: &str,
    info_date: Option<NaiveDate>,
    options: Vec<(String, String)>,
    step_args: &[String],
) -> Result<()> {
    let info = registry
        .get(name)
        .ok_or_else(|| eyre::eyre!("Unknown transformation: {}", name))?;

    let extra = match CliOption::parse(info.name, info.description, &info.cli_options, step_args) {
        Ok(extra) => extra,
        Err(e) => e.exit(),
    };

    let runner = build_runner(config, registry, pipeline)?;
    let options: BTreeMap<String, String> = options.into_iter().collect();
    let report = runner.run_one(name, info_date, &options, &extra).await?;

    print_report(&report);
    Ok(())
}

/// Run every declared transformation in order
async fn cmd_run_all(config: &Config, registry: TransformationRegistry, pipeline: &Path) -> Result<()> {
    let runner = build_runner(config, registry, pipeline)?;
    let reports = runner.run_all().await?;

    for report in &reports {
        print_report(report);
    }
    println!("{} transformations complete", reports.len());
    Ok(())
}

fn load_pipeline(pipeline: &Path) -> Result<TransformationConfig> {
    TransformationConfig::load(pipeline).context(format!("Failed to load pipeline {}", pipeline.display()))
}

fn build_runner(config: &Config, registry: TransformationRegistry, pipeline: &Path) -> Result<Runner> {
    let pipeline_config = load_pipeline(pipeline)?;
    let session = config.create_session().context("Failed to create compute session")?;
    info!("Using {} session", session.name());
    Ok(Runner::new(registry, session, pipeline_config))
}

fn print_report(report: &RunReport) {
    println!(
        "{} {} [{}] -> {} ({} rows, {}ms)",
        "✓".green(),
        report.name.cyan(),
        report.info_date,
        report.output_table,
        report.rows_written,
        report.duration_ms
    );
}
