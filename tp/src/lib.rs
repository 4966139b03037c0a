//! Trip Planner - day trip itineraries from a hosted language model
//!
//! A city and a comma-separated list of interests go in; one chat-completion
//! call is made; the model's text comes back unchanged as the itinerary.
//!
//! # Modules
//!
//! - [`planner`] - Validation, request building and the cancellable request task
//! - [`prompts`] - Handlebars prompt templates with embedded defaults
//! - [`llm`] - LLM client trait and OpenAI-compatible implementation
//! - [`history`] - Append-only log of past itineraries
//! - [`export`] - PDF and Word rendering of an itinerary
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//! - [`session`] - Interactive prompt loop

pub mod cli;
pub mod config;
pub mod export;
pub mod history;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod session;

// Re-export commonly used types
pub use config::{Config, HistoryConfig, LlmConfig, PromptsConfig, ResolvedLlmConfig};
pub use export::{ExportError, ExportFormat, Exporter, Rendered, to_docx, to_pdf};
pub use history::{HistoryEntry, HistoryError, HistoryLog};
pub use llm::{
    CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, OpenAIClient, Role, StopReason, TokenUsage,
    create_client,
};
pub use planner::{
    InterestList, PendingItinerary, PlanRecord, Planner, PlannerError, TRUNCATED_NOTE, VALIDATION_MESSAGE, validate,
};
pub use prompts::{PromptContext, PromptLoader, RenderedPrompt};
pub use session::InteractiveSession;
