//! CLI command definitions and subcommands

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// pipestep - run metastore transformation steps
#[derive(Parser, Debug)]
#[command(
    name = "pstep",
    author,
    version,
    about = "Run metastore transformation steps of a batch data pipeline",
    after_help = "Logs are written to stderr; use -v for debug output or RUST_LOG for fine-grained filters"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available transformations
    List,

    /// Structure a pipeline file and print it back
    Validate {
        /// Pipeline YAML file
        pipeline: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Run one declared transformation
    Run {
        /// Pipeline YAML file
        pipeline: PathBuf,

        /// Transformation name
        name: String,

        /// Info date (YYYY-MM-DD), overrides the declared one
        #[arg(short = 'd', long, value_parser = parse_date)]
        info_date: Option<NaiveDate>,

        /// Extra transformation option (key=value), repeatable
        #[arg(short = 'o', long = "option", value_parser = parse_key_value)]
        options: Vec<(String, String)>,

        /// Transformation-specific flags, after `--`
        #[arg(last = true)]
        step_args: Vec<String>,
    },

    /// Run every declared transformation in order
    RunAll {
        /// Pipeline YAML file
        pipeline: PathBuf,
    },
}

/// Output format for validate
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(format!("Unknown format: {}. Use: json or yaml", s)),
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "pstep",
            "run",
            "pipeline.yaml",
            "Identity",
            "--info-date",
            "2022-02-14",
            "-o",
            "table=src",
            "--",
            "--limit",
            "5",
        ])
        .unwrap();

        match cli.command {
            Command::Run {
                name,
                info_date,
                options,
                step_args,
                ..
            } => {
                assert_eq!(name, "Identity");
                assert_eq!(info_date, NaiveDate::from_ymd_opt(2022, 2, 14));
                assert_eq!(options, vec![("table".to_string(), "src".to_string())]);
                assert_eq!(step_args, vec!["--limit".to_string(), "5".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(Cli::try_parse_from(["pstep", "run", "p.yaml", "X", "-d", "14.02.2022"]).is_err());
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("a=b=c").unwrap(), ("a".to_string(), "b=c".to_string()));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_output_format() {
        assert!(matches!("YAML".parse::<OutputFormat>(), Ok(OutputFormat::Yaml)));
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
