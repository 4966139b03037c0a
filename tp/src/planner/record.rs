//! Per-request record with its conversational transcript

use serde::Serialize;

use super::interests::InterestList;
use crate::llm::Message;

/// Everything one itinerary request accumulated
///
/// Each `with_*` step consumes the record and returns the next one, adding
/// the step's message to the transcript.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanRecord {
    city: String,
    interests_raw: String,
    interests: InterestList,
    itinerary: String,
    /// The model stopped at its token limit
    truncated: bool,
    transcript: Vec<Message>,
}

impl PlanRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(self, city: impl Into<String>) -> Self {
        let city = city.into();
        let mut transcript = self.transcript;
        transcript.push(Message::human(format!("I want to plan a trip to {}.", city)));
        Self {
            city,
            transcript,
            ..self
        }
    }

    pub fn with_interests(self, interests_raw: impl Into<String>) -> Self {
        let interests_raw = interests_raw.into();
        let mut transcript = self.transcript;
        transcript.push(Message::human(format!("My interests are: {}.", interests_raw)));
        Self {
            interests: InterestList::parse(&interests_raw),
            interests_raw,
            transcript,
            ..self
        }
    }

    pub fn with_itinerary(self, itinerary: impl Into<String>) -> Self {
        let itinerary = itinerary.into();
        let mut transcript = self.transcript;
        transcript.push(Message::assistant(itinerary.clone()));
        Self {
            itinerary,
            transcript,
            ..self
        }
    }

    /// Mark whether the itinerary was cut off by the token limit
    pub fn with_truncation(self, truncated: bool) -> Self {
        Self { truncated, ..self }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Interests exactly as the user typed them
    pub fn interests_raw(&self) -> &str {
        &self.interests_raw
    }

    pub fn interests(&self) -> &InterestList {
        &self.interests
    }

    /// The canonical artifact; empty until the model has answered
    pub fn itinerary(&self) -> &str {
        &self.itinerary
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn into_itinerary(self) -> String {
        self.itinerary
    }
}
