//! Confidence scoring (§4.7): additive terms for the outcome path, a
//! weighted sum with multiplicative penalties for the statistic path.
//! Every applied adjustment is recorded with its multiplier and reason so the
//! evidence trail can explain the final number.

use crate::consensus::outcome::OutcomeConsensus;
use crate::domain::{EvidenceGroup, NormalizedFact, StatisticConsensus};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Adjustment {
    pub reason: String,
    pub delta_or_multiplier: f64,
}

#[derive(Debug, Clone)]
pub struct ScoredConfidence {
    pub value: f64,
    pub adjustments: Vec<Adjustment>,
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

fn outcome_base(provider_count: usize) -> f64 {
    match provider_count {
        0..=2 => 0.3,
        3 => 0.6,
        4 => 0.75,
        _ => 0.9,
    }
}

fn freshness_bonus(facts: &[NormalizedFact], now: DateTime<Utc>) -> f64 {
    let with_timestamps: Vec<DateTime<Utc>> = facts.iter().filter_map(|f| f.end_timestamp).collect();
    if with_timestamps.is_empty() {
        return 0.0;
    }
    let within_72h = with_timestamps
        .iter()
        .filter(|t| now.signed_duration_since(**t).num_hours() <= 72)
        .count();
    if within_72h == with_timestamps.len() {
        0.05
    } else if within_72h * 2 >= with_timestamps.len() {
        0.02
    } else {
        0.0
    }
}

/// Outcome-path score per §4.7. `now` is injected so tests stay deterministic.
pub fn score_outcome_confidence(
    accepted_group: Option<&EvidenceGroup>,
    consensus: &OutcomeConsensus,
    now: DateTime<Utc>,
) -> ScoredConfidence {
    let mut adjustments = Vec::new();

    let Some(group) = accepted_group else {
        return ScoredConfidence {
            value: 0.30,
            adjustments: vec![Adjustment {
                reason: "insufficient consensus".to_string(),
                delta_or_multiplier: 0.30,
            }],
        };
    };

    let base = outcome_base(group.providers.len());
    adjustments.push(Adjustment {
        reason: format!("base for {} providers", group.providers.len()),
        delta_or_multiplier: base,
    });

    let conflict_penalty = (consensus.conflicts as f64 * 0.1).min(0.25);
    adjustments.push(Adjustment {
        reason: format!("conflict penalty for {} conflicting groups", consensus.conflicts),
        delta_or_multiplier: -conflict_penalty,
    });

    let reliability_adj = (group.reliability_average - 0.7) * 0.15;
    adjustments.push(Adjustment {
        reason: format!("reliability adjustment at avg {:.2}", group.reliability_average),
        delta_or_multiplier: reliability_adj,
    });

    let freshness = freshness_bonus(&group.facts, now);
    adjustments.push(Adjustment {
        reason: "freshness bonus".to_string(),
        delta_or_multiplier: freshness,
    });

    let value = clamp01(base - conflict_penalty + reliability_adj + freshness);
    ScoredConfidence { value, adjustments }
}

/// Merge a deterministic score with the advisor's numeric confidence, if any:
/// `clamp((deterministic + llm) / 2)`.
pub fn merge_with_advisor_confidence(deterministic: f64, advisor: Option<f64>) -> f64 {
    match advisor {
        Some(llm) => clamp01((deterministic + llm) / 2.0),
        None => deterministic,
    }
}

fn data_freshness_score(avg_age_minutes: f64) -> f64 {
    if avg_age_minutes <= 15.0 {
        1.0
    } else if avg_age_minutes <= 60.0 {
        0.8
    } else if avg_age_minutes <= 180.0 {
        0.6
    } else if avg_age_minutes <= 720.0 {
        0.4
    } else {
        0.2
    }
}

/// Statistic-path score per §4.7.
pub fn score_statistic_confidence(consensus: &StatisticConsensus, avg_source_age_minutes: f64) -> ScoredConfidence {
    let mut adjustments = Vec::new();

    let stats_provider_agreement = if consensus.stats_provider_count >= 1 { 1.0 } else { 0.0 };
    let tier1_agreement = if consensus.tier1_count >= 1 { 1.0 } else { 0.0 };
    let source_count = consensus.supporting_sources.len().max(consensus.outliers.len());
    let agreement_ratio = (consensus.agreement_count as f64 / (source_count.max(3)) as f64).min(1.0);
    let betting_alignment = if consensus.betting_market_alignment { 1.0 } else { 0.0 };
    let low_variance = clamp01(1.0 - consensus.variance / consensus.unit.tolerance());
    let freshness = data_freshness_score(avg_source_age_minutes);

    let mut value = stats_provider_agreement * 0.40
        + tier1_agreement * 0.25
        + agreement_ratio * 0.15
        + betting_alignment * 0.10
        + low_variance * 0.05
        + freshness * 0.05;

    adjustments.push(Adjustment {
        reason: format!("stats provider agreement = {stats_provider_agreement}"),
        delta_or_multiplier: stats_provider_agreement * 0.40,
    });
    adjustments.push(Adjustment {
        reason: format!("tier1 agreement = {tier1_agreement}"),
        delta_or_multiplier: tier1_agreement * 0.25,
    });
    adjustments.push(Adjustment {
        reason: format!("agreement ratio = {agreement_ratio:.2}"),
        delta_or_multiplier: agreement_ratio * 0.15,
    });
    adjustments.push(Adjustment {
        reason: format!("betting market alignment = {betting_alignment}"),
        delta_or_multiplier: betting_alignment * 0.10,
    });
    adjustments.push(Adjustment {
        reason: format!("low variance factor = {low_variance:.2}"),
        delta_or_multiplier: low_variance * 0.05,
    });
    adjustments.push(Adjustment {
        reason: format!("data freshness = {freshness:.2}"),
        delta_or_multiplier: freshness * 0.05,
    });

    if consensus.variance > 2.0 {
        value *= 0.8;
        adjustments.push(Adjustment {
            reason: "variance > 2".to_string(),
            delta_or_multiplier: 0.8,
        });
    }
    if consensus.outliers.len() >= 2 {
        value *= 0.9;
        adjustments.push(Adjustment {
            reason: ">=2 outliers".to_string(),
            delta_or_multiplier: 0.9,
        });
    }

    ScoredConfidence {
        value: clamp01(value),
        adjustments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FactCategory, StatisticType, Unit};
    use serde_json::json;

    fn fact(provider: &str, reliability: f64) -> NormalizedFact {
        NormalizedFact {
            provider: provider.to_string(),
            canonical_key: "k".to_string(),
            display: String::new(),
            category: FactCategory::Result,
            home_team: None,
            away_team: None,
            winner: Some("Lakers".to_string()),
            home_score: None,
            away_score: None,
            award: None,
            player: None,
            status: Some("finished".to_string()),
            end_timestamp: Some(Utc::now()),
            source_url: None,
            reliability,
            raw: json!({}),
        }
    }

    #[test]
    fn four_provider_agreement_meets_scenario_one_floor() {
        let facts: Vec<NormalizedFact> = (0..4).map(|i| fact(&format!("P{i}"), 0.8)).collect();
        let group = EvidenceGroup {
            key: "k".to_string(),
            facts: facts.clone(),
            providers: vec!["P0".into(), "P1".into(), "P2".into(), "P3".into()],
            reliability_average: 0.8,
        };
        let consensus = OutcomeConsensus {
            groups: vec![],
            accepted_key: Some("k".to_string()),
            conflicts: 0,
        };
        let scored = score_outcome_confidence(Some(&group), &consensus, Utc::now());
        assert!(scored.value >= 0.75);
    }

    #[test]
    fn insufficient_consensus_floors_at_point_three() {
        let consensus = OutcomeConsensus {
            groups: vec![],
            accepted_key: None,
            conflicts: 0,
        };
        let scored = score_outcome_confidence(None, &consensus, Utc::now());
        assert_eq!(scored.value, 0.30);
    }

    #[test]
    fn statistic_confidence_clamped_to_unit_interval() {
        let consensus = StatisticConsensus {
            statistic_type: StatisticType::YellowCards,
            agreed: true,
            agreed_value: Some(4.0),
            unit: Unit::Count,
            agreement_count: 3,
            variance: 0.25,
            outliers: vec![],
            tier1_count: 2,
            stats_provider_count: 2,
            official_source_present: true,
            betting_market_alignment: true,
            supporting_sources: vec![],
        };
        let scored = score_statistic_confidence(&consensus, 10.0);
        assert!(scored.value >= 0.0 && scored.value <= 1.0);
    }
}
