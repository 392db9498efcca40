//! Statistic consensus (§4.6): peer-counting within `tol(unit)`, population
//! variance, outlier detection.

use crate::domain::{StatisticConsensus, StatisticSource, StatisticType, Unit, STATS_PROVIDERS};

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// Distinct observed values, in first-seen order.
fn distinct_values(values: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::new();
    for &v in values {
        if !out.iter().any(|u: &f64| (*u - v).abs() < f64::EPSILON) {
            out.push(v);
        }
    }
    out
}

/// Assign each source value to its single nearest candidate (ties broken
/// toward the smaller candidate) rather than counting it toward every
/// candidate within `tol` — a raw per-candidate window double-counts
/// boundary values and can produce a tie that resolves to an outlier's
/// value instead of the majority's. The candidate whose assigned cluster is
/// largest wins; ties broken by the smaller value.
fn best_consensus_value(values: &[f64], tol: f64) -> (f64, usize) {
    if values.is_empty() {
        return (0.0, 0);
    }
    let candidates = distinct_values(values);
    let mut counts: Vec<(f64, usize)> = candidates.iter().map(|&c| (c, 0usize)).collect();

    for &v in values {
        let nearest = candidates
            .iter()
            .copied()
            .min_by(|a, b| {
                let da = (v - a).abs();
                let db = (v - b).abs();
                da.partial_cmp(&db).unwrap().then(a.partial_cmp(b).unwrap())
            })
            .unwrap();
        if (v - nearest).abs() <= tol {
            if let Some(entry) = counts.iter_mut().find(|(c, _)| (*c - nearest).abs() < f64::EPSILON) {
                entry.1 += 1;
            }
        }
    }

    let mut best_value = values[0];
    let mut best_count = 0usize;
    for (candidate, count) in counts {
        if count > best_count || (count == best_count && candidate < best_value) {
            best_count = count;
            best_value = candidate;
        }
    }
    (best_value, best_count)
}

pub fn resolve_statistic_consensus(
    statistic_type: StatisticType,
    unit: Unit,
    sources: &[StatisticSource],
    betting_market_alignment: bool,
) -> StatisticConsensus {
    let values: Vec<f64> = sources.iter().map(|s| s.parsed_value).collect();
    let tol = unit.tolerance();

    if values.is_empty() {
        return StatisticConsensus {
            statistic_type,
            agreed: false,
            agreed_value: None,
            unit,
            agreement_count: 0,
            variance: 0.0,
            outliers: Vec::new(),
            tier1_count: 0,
            stats_provider_count: 0,
            official_source_present: false,
            betting_market_alignment,
            supporting_sources: Vec::new(),
        };
    }

    let (agreed_value, agreement_count) = best_consensus_value(&values, tol);
    let variance = population_variance(&values);

    // A source exactly `tol` away from the agreed value is still distinct
    // enough from it to be flagged, not folded silently into the agreeing
    // set — so the outlier/supporting split is at `>= tol`, not `> tol`.
    let outliers: Vec<StatisticSource> = sources
        .iter()
        .filter(|s| (s.parsed_value - agreed_value).abs() >= tol)
        .cloned()
        .collect();
    let supporting_sources: Vec<StatisticSource> = sources
        .iter()
        .filter(|s| (s.parsed_value - agreed_value).abs() < tol)
        .cloned()
        .collect();

    let tier1_count = sources.iter().filter(|s| s.tier == crate::domain::Tier::One).count();
    let stats_provider_count = sources
        .iter()
        .filter(|s| STATS_PROVIDERS.contains(&s.source.as_str()))
        .count();
    let official_source_present = sources.iter().any(|s| s.source == "OPTA_STATS" || s.source == "SPORTSRADAR");

    let agreed = agreement_count >= 3 && stats_provider_count >= 1 && variance <= tol;

    StatisticConsensus {
        statistic_type,
        agreed,
        agreed_value: if agreed { Some(agreed_value) } else { None },
        unit,
        agreement_count,
        variance,
        outliers,
        tier1_count,
        stats_provider_count,
        official_source_present,
        betting_market_alignment,
        supporting_sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tier;
    use chrono::Utc;
    use std::collections::HashMap;

    fn source(name: &str, tier: Tier, value: f64) -> StatisticSource {
        StatisticSource {
            source: name.to_string(),
            tier,
            weight: tier.default_weight(),
            raw_value: value.to_string(),
            parsed_value: value,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn scenario_four_yellow_cards_agree_with_one_outlier() {
        let sources = vec![
            source("OFFICIAL", Tier::One, 4.0),
            source("OPTA_STATS", Tier::One, 4.0),
            source("API_FOOTBALL", Tier::Two, 4.0),
            source("FLASHSCORE", Tier::Four, 3.0),
        ];
        let consensus = resolve_statistic_consensus(StatisticType::YellowCards, Unit::Count, &sources, false);
        assert!(consensus.agreed);
        assert_eq!(consensus.agreed_value, Some(4.0));
        assert_eq!(consensus.outliers.len(), 1);
        assert_eq!(consensus.outliers[0].source, "FLASHSCORE");
    }

    #[test]
    fn insufficient_stats_provider_count_rejects_agreement() {
        let sources = vec![
            source("API_FOOTBALL", Tier::Two, 4.0),
            source("THE_ODDS_API", Tier::Three, 4.0),
            source("FLASHSCORE", Tier::Four, 4.0),
        ];
        let consensus = resolve_statistic_consensus(StatisticType::YellowCards, Unit::Count, &sources, false);
        assert!(!consensus.agreed);
    }

    #[test]
    fn invariant_agreed_implies_bounds() {
        let sources = vec![
            source("OPTA_STATS", Tier::One, 9.0),
            source("STATSBOMB", Tier::One, 9.0),
            source("SPORTSRADAR", Tier::One, 9.0),
        ];
        let consensus = resolve_statistic_consensus(StatisticType::Corners, Unit::Count, &sources, false);
        assert!(consensus.is_internally_consistent());
    }
}
