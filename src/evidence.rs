//! Evidence Assembler (§6): the stable payload shape persisted for audit.

use crate::consensus::outcome::OutcomeConsensus;
use crate::domain::{EvidenceGroup, NormalizedFact, NormalizedStatistic, StatisticConsensus};
use crate::error::{EvidenceError, EvidenceWarning};
use crate::validation::ValidationReport;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceMetadata {
    pub query_raw: String,
    pub pipeline: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsEvidence {
    pub providers: Vec<String>,
    pub normalized_statistics: Vec<NormalizedStatistic>,
    pub validation_warnings: Vec<String>,
    pub validation_within_range: bool,
    pub validation_logically_consistent: bool,
    pub consensus: Option<StatisticConsensus>,
    pub confidence_adjustments: Vec<String>,
    pub errors: Vec<EvidenceError>,
    pub warnings: Vec<EvidenceWarning>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceData {
    pub agent_summary: Option<String>,
    pub agent_artifacts: Vec<Value>,
    pub normalized_facts: Vec<NormalizedFact>,
    pub groups: Vec<EvidenceGroup>,
    pub accepted_group_key: Option<String>,
    pub statistics: Option<StatisticsEvidence>,
    pub model_summary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidencePayload {
    pub metadata: EvidenceMetadata,
    pub data: EvidenceData,
    pub errors: Vec<EvidenceError>,
    pub warnings: Vec<EvidenceWarning>,
    pub model_output_raw: Option<String>,
}

pub fn assemble_outcome_evidence(
    query_raw: &str,
    facts: Vec<NormalizedFact>,
    consensus: &OutcomeConsensus,
    errors: Vec<EvidenceError>,
    warnings: Vec<EvidenceWarning>,
) -> EvidencePayload {
    EvidencePayload {
        metadata: EvidenceMetadata {
            query_raw: query_raw.to_string(),
            pipeline: "outcome".to_string(),
            generated_at: chrono::Utc::now(),
        },
        data: EvidenceData {
            agent_summary: None,
            agent_artifacts: Vec::new(),
            normalized_facts: facts,
            groups: consensus.groups.clone(),
            accepted_group_key: consensus.accepted_key.clone(),
            statistics: None,
            model_summary: None,
        },
        errors,
        warnings,
        model_output_raw: None,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn assemble_statistic_evidence(
    query_raw: &str,
    providers: Vec<String>,
    normalized_statistics: Vec<NormalizedStatistic>,
    validation: &ValidationReport,
    consensus: Option<StatisticConsensus>,
    confidence_adjustments: Vec<String>,
    errors: Vec<EvidenceError>,
    warnings: Vec<EvidenceWarning>,
) -> EvidencePayload {
    EvidencePayload {
        metadata: EvidenceMetadata {
            query_raw: query_raw.to_string(),
            pipeline: "statistic".to_string(),
            generated_at: chrono::Utc::now(),
        },
        data: EvidenceData {
            agent_summary: None,
            agent_artifacts: Vec::new(),
            normalized_facts: Vec::new(),
            groups: Vec::new(),
            accepted_group_key: None,
            statistics: Some(StatisticsEvidence {
                providers,
                normalized_statistics,
                validation_warnings: validation.warnings.clone(),
                validation_within_range: validation.within_range,
                validation_logically_consistent: validation.logically_consistent,
                consensus,
                confidence_adjustments,
                errors: errors.clone(),
                warnings: warnings.clone(),
            }),
            model_summary: None,
        },
        errors,
        warnings,
        model_output_raw: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_evidence_carries_pipeline_tag() {
        let consensus = OutcomeConsensus {
            groups: Vec::new(),
            accepted_key: None,
            conflicts: 0,
        };
        let payload = assemble_outcome_evidence("did lakers win", Vec::new(), &consensus, Vec::new(), Vec::new());
        assert_eq!(payload.metadata.pipeline, "outcome");
    }
}
