//! LLM Advisor (§4.9): optional, invoked only after a deterministic
//! resolution exists. Asymmetric trust — `reasoning`/`sources`/`confidence`
//! can be merged in, a differing `resolution` is recorded as an error and
//! never adopted. The HTTP/model call itself is out of scope (§1); this
//! module defines the contract and the merge policy around it.

use crate::error::{ErrorKind, EvidenceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct AdvisorRequest {
    pub query_raw: String,
    pub structured_request: serde_json::Value,
    pub accepted_group_key: Option<String>,
    pub candidate_resolution: String,
    pub candidate_confidence: f64,
    pub supporting_providers: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdvisorReply {
    pub reasoning: Option<String>,
    pub sources: Option<Vec<String>>,
    pub confidence: Option<f64>,
    pub resolution: Option<String>,
}

/// Thin seam over the out-of-scope model call; production wiring supplies a
/// concrete implementation (HTTP client to the summarization service).
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, request: &AdvisorRequest) -> anyhow::Result<AdvisorReply>;
}

/// A no-op advisor used when no model endpoint is configured.
pub struct NullAdvisor;

#[async_trait]
impl Advisor for NullAdvisor {
    async fn advise(&self, _request: &AdvisorRequest) -> anyhow::Result<AdvisorReply> {
        Ok(AdvisorReply::default())
    }
}

pub struct MergedAdvice {
    pub reasoning: String,
    pub sources: Vec<String>,
    pub confidence: Option<f64>,
    pub error: Option<EvidenceError>,
}

/// Apply §4.9's merge policy. `default_reasoning`/`default_sources` are what
/// the deterministic pipeline would have emitted on its own.
pub fn merge_advice(
    reply: AdvisorReply,
    default_reasoning: String,
    default_sources: Vec<String>,
    candidate_resolution: &str,
) -> MergedAdvice {
    let reasoning = reply.reasoning.unwrap_or(default_reasoning);

    let mut sources = default_sources;
    if let Some(extra) = reply.sources {
        for s in extra {
            if !sources.contains(&s) {
                sources.push(s);
            }
        }
    }
    sources.truncate(8);

    let error = reply
        .resolution
        .as_deref()
        .filter(|r| *r != candidate_resolution)
        .map(|r| {
            EvidenceError::new(
                ErrorKind::LlmMismatch,
                format!("advisor proposed \"{r}\" but deterministic resolution \"{candidate_resolution}\" stands"),
            )
        });

    MergedAdvice {
        reasoning,
        sources,
        confidence: reply.confidence,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differing_resolution_is_recorded_but_not_adopted() {
        let reply = AdvisorReply {
            resolution: Some("no".to_string()),
            ..Default::default()
        };
        let merged = merge_advice(reply, "det reasoning".to_string(), vec!["A".to_string()], "yes");
        assert!(merged.error.is_some());
        // The candidate resolution itself is never present in MergedAdvice —
        // callers keep using their own `candidate_resolution` value.
    }

    #[test]
    fn sources_are_unioned_and_capped_at_eight() {
        let reply = AdvisorReply {
            sources: Some((0..10).map(|i| format!("S{i}")).collect()),
            ..Default::default()
        };
        let merged = merge_advice(reply, String::new(), vec!["A".to_string()], "yes");
        assert_eq!(merged.sources.len(), 8);
        assert_eq!(merged.sources[0], "A");
    }

    #[test]
    fn matching_resolution_yields_no_error() {
        let reply = AdvisorReply {
            resolution: Some("yes".to_string()),
            ..Default::default()
        };
        let merged = merge_advice(reply, String::new(), Vec::new(), "yes");
        assert!(merged.error.is_none());
    }
}
