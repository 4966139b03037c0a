//! Interactive session: prompt for a city and interests, show the itinerary

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use spinners::{Spinner, Spinners};
use tracing::{debug, warn};

use crate::cli::written_report;
use crate::export::{ExportFormat, Exporter};
use crate::planner::{Planner, PlannerError, TRUNCATED_NOTE, validate};

const CITY_PROMPT: &str = "Enter the city for your day trip";
const INTERESTS_PROMPT: &str = "Enter your interests (comma-separated)";

/// Number of entries `/history` shows
const HISTORY_PREVIEW: usize = 5;

/// One line of user input
enum Input {
    Line(String),
    /// Ctrl+C at a prompt: start over
    Restart,
    /// Ctrl+D: leave the session
    Quit,
}

/// Interactive itinerary session
pub struct InteractiveSession {
    planner: Arc<Planner>,
    exporter: Exporter,
    last_itinerary: Option<String>,
}

impl InteractiveSession {
    pub fn new(planner: Arc<Planner>, exporter: Exporter) -> Self {
        Self {
            planner,
            exporter,
            last_itinerary: None,
        }
    }

    /// Run until EOF or `/quit`
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let city = match read_input(&mut rl, CITY_PROMPT)? {
                Input::Line(line) => line,
                Input::Restart => continue,
                Input::Quit => break,
            };

            if city.starts_with('/') {
                match self.handle_slash_command(&city) {
                    SlashResult::Continue => continue,
                    SlashResult::Quit => break,
                }
            }

            let interests = match read_input(&mut rl, INTERESTS_PROMPT)? {
                Input::Line(line) => line,
                Input::Restart => continue,
                Input::Quit => break,
            };

            self.submit(&city, &interests).await;
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Generate one itinerary; Ctrl+C while waiting cancels it
    async fn submit(&mut self, city: &str, interests: &str) {
        debug!(%city, %interests, "InteractiveSession::submit: called");
        if let Err(e) = validate(city, interests) {
            println!("{}", e.to_string().yellow());
            return;
        }

        let mut spinner = Spinner::new(Spinners::Dots12, "Generating itinerary...".dimmed().to_string());
        let mut pending = self.planner.spawn(city, interests);

        let outcome = tokio::select! {
            result = pending.wait() => result,
            _ = tokio::signal::ctrl_c() => {
                pending.cancel();
                Err(PlannerError::Cancelled)
            }
        };
        spinner.stop_with_newline();

        match outcome {
            Ok(record) => {
                println!();
                println!("{}", "Generated Itinerary".bright_cyan().bold());
                println!("{}", record.itinerary());
                println!();
                if record.is_truncated() {
                    println!("{} {}", "!".yellow(), TRUNCATED_NOTE.yellow());
                    println!();
                }
                self.last_itinerary = Some(record.into_itinerary());
            }
            Err(PlannerError::Cancelled) => {
                println!("{}", "Request cancelled.".dimmed());
            }
            Err(e) if e.is_validation() => {
                println!("{}", e.to_string().yellow());
            }
            Err(e) => {
                warn!(error = %e, "InteractiveSession::submit: request failed");
                println!("{} {}", "Request failed:".red(), e);
                if let Some(hint) = e.hint() {
                    println!("{}", hint.yellow());
                }
            }
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Travel Itinerary Planner".bright_cyan().bold());
        println!("Enter a city and your interests to generate a personalized day trip itinerary.");
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/history" => {
                self.print_history();
                SlashResult::Continue
            }
            "/export" => {
                self.export_last(parts.get(1).copied(), parts.get(2).copied());
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Commands:".bold());
        println!("  {}                  Show this help", "/help".yellow());
        println!("  {}               Show recent itineraries", "/history".yellow());
        println!(
            "  {} Export the last itinerary (default: pdf)",
            "/export [pdf|docx] [path]".yellow()
        );
        println!("  {}                  Leave", "/quit".yellow());
        println!();
        println!("Press Ctrl+C while generating to cancel the request.");
        println!();
    }

    fn print_history(&self) {
        let Some(history) = self.planner.history() else {
            println!("{}", "History is disabled.".dimmed());
            return;
        };

        match history.recent(HISTORY_PREVIEW) {
            Ok(entries) if entries.is_empty() => println!("{}", "No history yet.".dimmed()),
            Ok(entries) => {
                for entry in entries {
                    println!(
                        "{} {} {}",
                        entry.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                        entry.city.cyan(),
                        format!("({})", entry.interests).dimmed()
                    );
                }
            }
            Err(e) => println!("{} {}", "Failed to read history:".red(), e),
        }
    }

    /// Write the last itinerary; returns the path written, if any
    fn export_last(&self, format: Option<&str>, path: Option<&str>) -> Option<PathBuf> {
        let Some(itinerary) = &self.last_itinerary else {
            println!("{}", "Nothing to export yet.".dimmed());
            return None;
        };

        let format = match format.map(str::parse::<ExportFormat>).unwrap_or(Ok(ExportFormat::Pdf)) {
            Ok(format) => format,
            Err(e) => {
                println!("{} {}", "?".yellow(), e);
                return None;
            }
        };
        let path = path.map(PathBuf::from).unwrap_or_else(|| format.default_path("."));

        match self.exporter.write(itinerary, format, &path) {
            Ok(rendered) => {
                for line in written_report(&path, &rendered) {
                    println!("{}", line);
                }
                Some(path)
            }
            Err(e) => {
                println!("{} {}", "Export failed:".red(), e);
                None
            }
        }
    }
}

/// Read one trimmed line
fn read_input(rl: &mut DefaultEditor, prompt: &str) -> Result<Input> {
    match rl.readline(&format!("{} {} ", prompt, ">".bright_green())) {
        Ok(line) => {
            let line = line.trim().to_string();
            if !line.is_empty() {
                let _ = rl.add_history_entry(line.as_str());
            }
            Ok(Input::Line(line))
        }
        Err(ReadlineError::Interrupted) => {
            println!("^C");
            Ok(Input::Restart)
        }
        Err(ReadlineError::Eof) => {
            println!();
            Ok(Input::Quit)
        }
        Err(err) => Err(eyre::eyre!("Readline error: {}", err)),
    }
}

/// Result of handling a slash command
#[derive(Debug, PartialEq, Eq)]
enum SlashResult {
    Continue,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::docx_text;
    use crate::llm::CompletionResponse;
    use crate::llm::client::mock::MockLlmClient;
    use crate::prompts::PromptLoader;
    use std::fs;
    use tempfile::TempDir;

    fn session() -> InteractiveSession {
        let client = Arc::new(MockLlmClient::new(vec![CompletionResponse::text("unused")]));
        let planner = Arc::new(Planner::new(client, PromptLoader::embedded_only()));
        InteractiveSession::new(planner, Exporter::new(None).unwrap())
    }

    #[test]
    fn test_export_docx_to_given_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("trip.docx");
        let mut session = session();
        session.last_itinerary = Some("- 9am: Alfama\n- 1pm: Pasteis de Belem".to_string());

        let command = format!("/export docx {}", path.display());
        assert_eq!(session.handle_slash_command(&command), SlashResult::Continue);

        let paragraphs = docx_text(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(paragraphs[1], "- 9am: Alfama\n- 1pm: Pasteis de Belem");
    }

    #[test]
    fn test_export_defaults_to_pdf() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("trip.pdf");
        let mut session = session();
        session.last_itinerary = Some("- Tram 28".to_string());

        let written = session.export_last(None, path.to_str());
        assert_eq!(written, Some(path.clone()));
        assert!(fs::read(&path).unwrap().starts_with(b"%PDF-"));
    }

    #[test]
    fn test_export_unknown_format_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("trip.odt");
        let mut session = session();
        session.last_itinerary = Some("- Tram 28".to_string());

        assert_eq!(session.export_last(Some("odt"), path.to_str()), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_export_without_itinerary_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("trip.docx");
        let mut session = session();

        let command = format!("/export docx {}", path.display());
        assert_eq!(session.handle_slash_command(&command), SlashResult::Continue);
        assert!(!path.exists());
    }

    #[test]
    fn test_slash_commands() {
        let mut session = session();
        assert_eq!(session.handle_slash_command("/quit"), SlashResult::Quit);
        assert_eq!(session.handle_slash_command("/q"), SlashResult::Quit);
        assert_eq!(session.handle_slash_command("/help"), SlashResult::Continue);
        assert_eq!(session.handle_slash_command("/history"), SlashResult::Continue);
        assert_eq!(session.handle_slash_command("/bogus"), SlashResult::Continue);
    }
}
