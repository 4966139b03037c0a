//! Trip Planner - day trip itinerary generator
//!
//! CLI entry point for the interactive session and one-shot commands.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use tripplanner::cli::{Cli, Command, OutputFormat, generate_after_help, written_report};
use tripplanner::config::Config;
use tripplanner::export::{ExportFormat, Exporter};
use tripplanner::history::{self, HistoryEntry, HistoryLog};
use tripplanner::llm::create_client;
use tripplanner::planner::{self, Planner, TRUNCATED_NOTE};
use tripplanner::prompts::PromptLoader;
use tripplanner::session::InteractiveSession;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = tripplanner::cli::get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(model = %config.llm.model, "Trip planner loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None | Some(Command::Interactive) => {
            debug!("main: matched Interactive command");
            cmd_interactive(&config).await
        }
        Some(Command::Plan {
            city,
            interests,
            pdf,
            docx,
            no_history,
        }) => {
            debug!(%city, %interests, ?pdf, ?docx, no_history, "main: matched Plan command");
            cmd_plan(&config, &city, &interests, pdf, docx, !no_history).await
        }
        Some(Command::History { limit, format }) => {
            debug!(?limit, ?format, "main: matched History command");
            cmd_history(&config, limit, format)
        }
        Some(Command::Export { index, format, output }) => {
            debug!(index, %format, ?output, "main: matched Export command");
            cmd_export(&config, index, format, output)
        }
    }
}

/// Wire the completion client, prompts and history into a planner
fn build_planner(config: &Config, record_history: bool) -> Result<Arc<Planner>> {
    config.validate()?;
    let resolved = config.llm.resolve()?;
    let client = create_client(&resolved).context("Failed to create LLM client")?;
    let prompts = PromptLoader::from_dir(config.prompts.dir.as_deref());

    let mut planner = Planner::new(client, prompts)
        .with_timeout(resolved.timeout)
        .with_max_tokens(resolved.max_tokens);

    if record_history && config.history.enabled {
        let log = HistoryLog::open(&config.history.dir).context("Failed to open history log")?;
        debug!(path = %log.path().display(), "build_planner: history enabled");
        planner = planner.with_history(log);
    }

    Ok(Arc::new(planner))
}

fn build_exporter(config: &Config) -> Result<Exporter> {
    Exporter::new(config.export.pdf_font.as_deref()).context("Failed to load export fonts")
}

async fn cmd_interactive(config: &Config) -> Result<()> {
    let planner = build_planner(config, true)?;
    let exporter = build_exporter(config)?;
    InteractiveSession::new(planner, exporter).run().await
}

async fn cmd_plan(
    config: &Config,
    city: &str,
    interests: &str,
    pdf: Option<PathBuf>,
    docx: Option<PathBuf>,
    record_history: bool,
) -> Result<()> {
    // Bad input is reported before the API key or fonts are looked at
    planner::validate(city, interests)?;
    let planner = build_planner(config, record_history)?;
    let exporter = if pdf.is_some() || docx.is_some() {
        Some(build_exporter(config)?)
    } else {
        None
    };

    let record = match planner.plan(city, interests).await {
        Ok(record) => record,
        Err(e) => {
            if let Some(hint) = e.hint() {
                eprintln!("{}", hint.yellow());
            }
            return Err(e.into());
        }
    };

    println!("{}", record.itinerary());
    if record.is_truncated() {
        eprintln!("{} {}", "!".yellow(), TRUNCATED_NOTE.yellow());
    }

    if let Some(exporter) = exporter {
        for (path, format) in [(pdf, ExportFormat::Pdf), (docx, ExportFormat::Docx)] {
            if let Some(path) = path {
                let rendered = exporter
                    .write(record.itinerary(), format, &path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                for line in written_report(&path, &rendered) {
                    eprintln!("{}", line);
                }
            }
        }
    }

    Ok(())
}

fn cmd_history(config: &Config, limit: Option<usize>, format: OutputFormat) -> Result<()> {
    let log = HistoryLog::open(&config.history.dir).context("Failed to open history log")?;
    let entries = log.load()?;

    // Keep 1-based numbering relative to the whole log so `tp export N` matches
    let skip = limit.map(|n| entries.len().saturating_sub(n)).unwrap_or(0);

    match format {
        OutputFormat::Json => {
            println!("{}", history::to_json_array(&entries[skip..])?);
        }
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No history yet.");
                return Ok(());
            }
            for (i, entry) in entries.iter().enumerate().skip(skip) {
                print_entry(i + 1, entry);
            }
        }
    }

    Ok(())
}

fn print_entry(number: usize, entry: &HistoryEntry) {
    println!(
        "{} {} {} {}",
        format!("{:>3}.", number).bold(),
        entry.city.cyan(),
        format!("({})", entry.interests).dimmed(),
        entry.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
    );
    for line in entry.itinerary.lines() {
        println!("     {}", line);
    }
    println!();
}

fn cmd_export(config: &Config, index: usize, format: ExportFormat, output: Option<PathBuf>) -> Result<()> {
    let log = HistoryLog::open(&config.history.dir).context("Failed to open history log")?;
    let entry = log
        .get(index)?
        .ok_or_else(|| eyre::eyre!("No history entry #{} (see `tp history`)", index))?;

    let path = output.unwrap_or_else(|| format.default_path("."));
    let rendered = build_exporter(config)?
        .write(&entry.itinerary, format, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    for line in written_report(&path, &rendered) {
        println!("{}", line);
    }
    Ok(())
}
