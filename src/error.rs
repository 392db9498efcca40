//! Error taxonomy for the resolution pipeline (§7).
//!
//! These are tags recorded into the evidence trail, not the `Result` error
//! type used for `?` — internal plumbing still threads `anyhow::Result` the
//! way the rest of the crate does. Only a programming invariant violation
//! (an unhandled canonical key escaping the normalizer, for instance) is
//! fatal; everything below accumulates into `evidence.errors[]` /
//! `evidence.warnings[]` and a partial result is always returned.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ProviderSkipped,
    ProviderFailure,
    CircuitOpen,
    ClassificationFailure,
    InsufficientConsensus,
    LlmMismatch,
    LlmFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ProviderSkipped => "provider not configured",
            ErrorKind::ProviderFailure => "provider request failed",
            ErrorKind::CircuitOpen => "circuit breaker open for host",
            ErrorKind::ClassificationFailure => "neither pipeline classified the query",
            ErrorKind::InsufficientConsensus => "consensus rejected for lack of corroboration",
            ErrorKind::LlmMismatch => "advisor resolution differed from deterministic answer",
            ErrorKind::LlmFailure => "advisor call failed",
        };
        write!(f, "{s}")
    }
}

/// One entry in `evidence.errors[]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceError {
    pub kind: ErrorKind,
    pub provider: Option<String>,
    pub message: String,
}

impl EvidenceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            provider: None,
            message: message.into(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// One entry in `evidence.warnings[]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceWarning {
    pub provider: Option<String>,
    pub message: String,
}

impl EvidenceWarning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            provider: None,
            message: message.into(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            ErrorKind::CircuitOpen.to_string(),
            "circuit breaker open for host"
        );
    }
}
