//! Interest list normalization

use serde::{Deserialize, Serialize};

/// Delimiter between interests in the raw input
pub const INTEREST_DELIMITER: &str = ", ";

/// Ordered interest tokens parsed from a comma-space separated string
///
/// Order is kept; duplicates and case are left alone. Splitting an empty
/// string yields a single empty token, which input validation rejects
/// before a prompt is ever rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestList(Vec<String>);

impl InterestList {
    /// Split `raw` on `", "` and trim each token
    pub fn parse(raw: &str) -> Self {
        Self(raw.split(INTEREST_DELIMITER).map(|t| t.trim().to_string()).collect())
    }

    /// Re-join the tokens with `", "` for the prompt
    pub fn joined(&self) -> String {
        self.0.join(INTEREST_DELIMITER)
    }

    /// True when every token is empty
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|t| t.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
