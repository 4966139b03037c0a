//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::export::{ExportFormat, Rendered};

/// Trip planner - day trip itineraries from a hosted model
#[derive(Parser)]
#[command(
    name = "tp",
    about = "Generate a day trip itinerary from a city and your interests",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to the interactive session)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prompt for a city and interests, repeatedly
    Interactive,

    /// Generate one itinerary and print it
    Plan {
        /// City for the day trip
        #[arg(long)]
        city: String,

        /// Interests, separated by ", "
        #[arg(long)]
        interests: String,

        /// Also write the itinerary as a PDF
        #[arg(long, value_name = "PATH")]
        pdf: Option<PathBuf>,

        /// Also write the itinerary as a Word document
        #[arg(long, value_name = "PATH")]
        docx: Option<PathBuf>,

        /// Do not record this request in the history log
        #[arg(long)]
        no_history: bool,
    },

    /// Show past requests
    History {
        /// Only show the most recent N entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Export a past itinerary to a document
    Export {
        /// Entry number as shown by `tp history` (1 = oldest)
        index: usize,

        /// Document format (pdf, docx)
        #[arg(short, long, default_value = "pdf")]
        format: ExportFormat,

        /// Output file (default: ./itinerary.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplanner")
        .join("logs")
        .join("tripplanner.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with config and log locations
pub fn generate_after_help() -> String {
    let mut help = String::new();

    help.push_str("Config is read from (first found):\n");
    help.push_str("  --config PATH\n");
    help.push_str("  ./tripplanner.yml\n");
    if let Some(config_dir) = dirs::config_dir() {
        help.push_str(&format!(
            "  {}\n",
            config_dir.join("tripplanner").join("tripplanner.yml").display()
        ));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

/// Lines confirming a written export, then one per thing it left out
pub fn written_report(path: &Path, rendered: &Rendered) -> Vec<String> {
    let mut lines = vec![format!("{} Wrote {}", "✓".green(), path.display())];
    lines.extend(
        rendered
            .warnings()
            .into_iter()
            .map(|w| format!("{} {}", "!".yellow(), w.yellow())),
    );
    lines
}

/// Output format for listing commands
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text, json", s)),
        }
    }
}
