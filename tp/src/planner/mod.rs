//! Itinerary request pipeline
//!
//! Turns a city and a raw interest string into one model call and hands back
//! the model's text untouched:
//!
//! 1. validate both inputs are non-empty
//! 2. split the interests on `", "`
//! 3. render the system + human prompt
//! 4. call the model under a timeout
//! 5. return the raw response text as the itinerary
//!
//! Successful requests are appended to the history log when one is attached.

mod interests;
mod record;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use interests::{INTEREST_DELIMITER, InterestList};
pub use record::PlanRecord;

use crate::history::{HistoryEntry, HistoryError, HistoryLog};
use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, StopReason};
use crate::prompts::{PromptContext, PromptLoader};

/// Shown to the user when either input is missing
pub const VALIDATION_MESSAGE: &str = "Please enter both a city and your interests.";

/// Shown with an itinerary the model stopped writing at its token limit
pub const TRUNCATED_NOTE: &str = "The model hit its token limit, so the itinerary may be cut off; raise llm.max-tokens";

/// Default cap on response length
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Default bound on a single model call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from one pipeline invocation
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("{}", VALIDATION_MESSAGE)]
    MissingInput,

    #[error("Failed to render prompt: {0}")]
    Prompt(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Request task failed: {0}")]
    Task(String),

    #[error("Failed to record history: {0}")]
    History(#[from] HistoryError),
}

impl PlannerError {
    /// True for errors the user fixes by changing their input
    pub fn is_validation(&self) -> bool {
        matches!(self, PlannerError::MissingInput)
    }

    /// What the user can do about this error, when there is something
    pub fn hint(&self) -> Option<String> {
        match self {
            PlannerError::Llm(e) if e.is_auth() => {
                Some("The API key was rejected; check the key in the configured environment variable".to_string())
            }
            PlannerError::Llm(e) => e
                .retry_after()
                .map(|wait| format!("The model is rate limited; try again in {}s", wait.as_secs())),
            PlannerError::Timeout(_) => Some("Raise llm.timeout-ms to wait longer for the model".to_string()),
            _ => None,
        }
    }
}

/// Reject blank inputs before anything else happens
pub fn validate(city: &str, interests_raw: &str) -> Result<(), PlannerError> {
    if city.trim().is_empty() || InterestList::parse(interests_raw).is_blank() {
        debug!(city_len = city.len(), interests_len = interests_raw.len(), "validate: missing input");
        return Err(PlannerError::MissingInput);
    }
    Ok(())
}

/// The itinerary pipeline with its injected collaborators
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    history: Option<HistoryLog>,
    max_tokens: u32,
    timeout: Duration,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader) -> Self {
        Self {
            llm,
            prompts,
            history: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append every successful request to `history`
    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn history(&self) -> Option<&HistoryLog> {
        self.history.as_ref()
    }

    /// Build the two-message request for a record holding city and interests
    pub fn build_request(&self, record: &PlanRecord) -> Result<CompletionRequest, PlannerError> {
        let context = PromptContext {
            city: record.city().to_string(),
            interests: record.interests().joined(),
        };
        let prompt = self
            .prompts
            .itinerary(&context)
            .map_err(|e| PlannerError::Prompt(e.to_string()))?;

        Ok(CompletionRequest {
            system_prompt: prompt.system,
            messages: vec![Message::human(prompt.human)],
            max_tokens: self.max_tokens,
        })
    }

    /// Run the whole pipeline once
    pub async fn plan(&self, city: &str, interests_raw: &str) -> Result<PlanRecord, PlannerError> {
        debug!(%city, %interests_raw, "Planner::plan: called");
        validate(city, interests_raw)?;

        let record = PlanRecord::new().with_city(city).with_interests(interests_raw);
        let request = self.build_request(&record)?;

        let response = tokio::time::timeout(self.timeout, self.llm.complete(request))
            .await
            .map_err(|_| {
                warn!(timeout = ?self.timeout, "Planner::plan: model call timed out");
                PlannerError::Timeout(self.timeout)
            })??;

        let CompletionResponse {
            content,
            stop_reason,
            usage,
        } = response;
        let itinerary = content.ok_or_else(|| LlmError::InvalidResponse("response contained no text".to_string()))?;

        let truncated = stop_reason == StopReason::MaxTokens;
        if truncated {
            warn!(max_tokens = self.max_tokens, "Planner::plan: itinerary cut off at the token limit");
        }
        let record = record.with_itinerary(itinerary).with_truncation(truncated);
        info!(
            city = %record.city(),
            interest_count = record.interests().len(),
            chars = record.itinerary().len(),
            tokens = usage.total(),
            "Itinerary generated"
        );

        if let Some(history) = &self.history {
            // File lock and write happen off the async worker threads
            let history = history.clone();
            let entry = HistoryEntry::from_record(&record);
            tokio::task::spawn_blocking(move || history.append(&entry))
                .await
                .map_err(|e| PlannerError::Task(e.to_string()))??;
        }

        Ok(record)
    }

    /// Run the pipeline on a background task
    ///
    /// The returned handle can be awaited or cancelled; the caller never
    /// blocks on the remote call.
    pub fn spawn(self: &Arc<Self>, city: impl Into<String>, interests_raw: impl Into<String>) -> PendingItinerary {
        let planner = Arc::clone(self);
        let city = city.into();
        let interests_raw = interests_raw.into();
        debug!(%city, "Planner::spawn: called");

        PendingItinerary {
            handle: tokio::spawn(async move { planner.plan(&city, &interests_raw).await }),
        }
    }
}

/// Handle to an in-flight itinerary request
pub struct PendingItinerary {
    handle: JoinHandle<Result<PlanRecord, PlannerError>>,
}

impl PendingItinerary {
    /// Abort the request; a later `wait` yields `Cancelled`
    pub fn cancel(&self) {
        debug!("PendingItinerary::cancel: called");
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the request to finish
    pub async fn wait(&mut self) -> Result<PlanRecord, PlannerError> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(PlannerError::Cancelled),
            Err(e) => Err(PlannerError::Task(e.to_string())),
        }
    }
}
