use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Conflict detection and impact analysis for firewall, IDS and access-control rules"
)]
pub struct Args {
    /// Path to the rule set file (TOML, one [[rule]] table per rule)
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: PathBuf,

    /// Path to configuration file (TOML)
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Check only this rule against the rest of the rule set
    #[arg(long = "candidate", value_name = "ID")]
    pub candidate: Option<String>,

    /// Run impact analysis on the checked rules
    #[arg(long = "analyze")]
    pub analyze: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
