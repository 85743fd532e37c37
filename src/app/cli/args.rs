//! Core CLI arguments structure and basic functionality
//!
//! This module contains the main Args struct definition. Configuration file
//! loading and value merging live in the config module.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

// Global arguments structure with all command-line options
#[derive(Parser, Debug, Clone)]
#[command(name = "breachscan")]
#[command(about = "Batch email breach exposure scanner")]
#[command(version)]
#[command(after_help = " * can be specified multiple times")]
pub struct Args {
    /// Email addresses to scan*
    #[arg(short = 'e', long = "email", value_name = "ADDRESS", action = ArgAction::Append)]
    pub emails: Vec<String>,

    /// File with one email address per line
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// API key for the lookup service (overrides config file and environment)
    #[arg(short = 'k', long = "api-key", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Lookups per minute
    #[arg(long = "rate-limit", value_name = "N")]
    pub rate_limit: Option<u32>,

    /// Skip paste lookups (halves the request volume)
    #[arg(long = "no-pastes", action = ArgAction::SetTrue)]
    pub no_pastes: bool,

    /// Export results when the scan ends
    #[arg(short = 'x', long = "export", value_name = "FORMAT", value_parser = ["json", "csv"])]
    pub export: Option<String>,

    /// Directory for export files
    #[arg(short = 'O', long = "export-dir", value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Exclude clean results from the export
    #[arg(long = "exclude-clean", action = ArgAction::SetTrue)]
    pub exclude_clean: bool,

    /// Export only high and critical severity results
    #[arg(long = "only-high-severity", action = ArgAction::SetTrue)]
    pub only_high_severity: bool,

    /// Color output control:
    /// --color=true forces color, --color=false disables it, unspecified = auto/TTY
    #[arg(short = 'g', long = "color")]
    pub color: Option<bool>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,
}
