//! Resolution Orchestrator (§4.8): drives classification → fan-out →
//! normalization → validation → consensus → confidence → (optional)
//! advisor → evidence assembly, and maps the consensus result onto one of
//! the five resolution shapes named in §4.8.

use crate::advisor::{Advisor, AdvisorRequest};
use crate::classifier;
use crate::config::Config;
use crate::confidence::{merge_with_advisor_confidence, score_outcome_confidence, score_statistic_confidence};
use crate::consensus::outcome::resolve_outcome_consensus;
use crate::consensus::statistic::resolve_statistic_consensus;
use crate::domain::*;
use crate::error::{ErrorKind, EvidenceError, EvidenceWarning};
use crate::evidence::{assemble_outcome_evidence, assemble_statistic_evidence};
use crate::fetcher::Fetcher;
use crate::normalize::outcome::normalize_outcome_response;
use crate::normalize::statistic::{build_normalized_statistic, cross_check_siblings, normalize_statistic_response};
use crate::registry::{self, ProviderOutcome, QueryParams};
use crate::text::normalize_name;
use crate::validation::validate;
use chrono::Utc;

/// §4.8: `who_won` → winner name; `did_result_happen` → yes/no against
/// `teams[0]`; `scoreline` → `"<home> <hs>-<as> <away>"`; `player_award` →
/// the award-category player; otherwise the winner name.
fn resolve_outcome_text(query: &OutcomeQuery, group: &EvidenceGroup) -> String {
    let winner_fact = group.facts.iter().find(|f| f.winner.is_some());
    let award_fact = group.facts.iter().find(|f| f.award.is_some() && f.player.is_some());
    let scoreline_fact = group
        .facts
        .iter()
        .find(|f| f.home_score.is_some() && f.away_score.is_some());

    match query.question_type {
        QuestionType::WhoWon => winner_fact
            .and_then(|f| f.winner.clone())
            .unwrap_or_else(|| INSUFFICIENT_DATA.to_string()),
        QuestionType::DidResultHappen => match winner_fact.and_then(|f| f.winner.as_deref()) {
            Some(winner) => {
                if query.teams.first().map(|t| normalize_name(t)) == Some(normalize_name(winner)) {
                    "yes".to_string()
                } else {
                    "no".to_string()
                }
            }
            None => INSUFFICIENT_DATA.to_string(),
        },
        QuestionType::Scoreline => scoreline_fact
            .map(|f| {
                format!(
                    "{} {}-{} {}",
                    f.home_team.clone().unwrap_or_default(),
                    f.home_score.unwrap_or_default(),
                    f.away_score.unwrap_or_default(),
                    f.away_team.clone().unwrap_or_default()
                )
            })
            .unwrap_or_else(|| INSUFFICIENT_DATA.to_string()),
        QuestionType::PlayerAward => award_fact
            .and_then(|f| f.player.clone())
            .unwrap_or_else(|| INSUFFICIENT_DATA.to_string()),
        QuestionType::Other => winner_fact
            .and_then(|f| f.winner.clone())
            .unwrap_or_else(|| INSUFFICIENT_DATA.to_string()),
    }
}

async fn run_outcome_pipeline(
    fetcher: &Fetcher,
    concurrency: usize,
    advisor: &dyn Advisor,
    query: OutcomeQuery,
) -> ResolutionResult {
    let mut errors: Vec<EvidenceError> = Vec::new();
    let mut warnings: Vec<EvidenceWarning> = Vec::new();

    let params = QueryParams {
        home_team: query.teams.first().cloned(),
        away_team: query.teams.get(1).cloned(),
        date: query.date.clone(),
        competition: query.competition.clone(),
        player: query.player.clone(),
        ..Default::default()
    };

    let outcomes = registry::fetch_all(fetcher, &params, concurrency).await;

    let mut facts = Vec::new();
    for outcome in outcomes {
        match outcome {
            ProviderOutcome::Fetched {
                provider,
                tier,
                weight,
                payload,
            } => {
                let response = ProviderResponse {
                    provider: provider.to_string(),
                    tier,
                    weight,
                    collected_at: Utc::now(),
                    payload,
                    meta: Default::default(),
                };
                facts.extend(normalize_outcome_response(&query, &response));
            }
            ProviderOutcome::Skipped { provider, reason } => {
                warnings.push(EvidenceWarning::new(reason).with_provider(provider));
            }
            ProviderOutcome::Failed { provider, failure } => {
                errors.push(EvidenceError::new(failure.kind, failure.message).with_provider(provider));
            }
        }
    }

    let consensus = resolve_outcome_consensus(&facts);
    let accepted_group = consensus
        .accepted_key
        .as_ref()
        .and_then(|key| consensus.groups.iter().find(|g| &g.key == key));

    if accepted_group.is_none() {
        errors.push(EvidenceError::new(
            ErrorKind::InsufficientConsensus,
            "accepted group has fewer than the minimum corroborating providers",
        ));
    }

    let scored = score_outcome_confidence(accepted_group, &consensus, Utc::now());

    let candidate_resolution = accepted_group
        .map(|g| resolve_outcome_text(&query, g))
        .unwrap_or_else(|| INSUFFICIENT_DATA.to_string());

    let mut sources: Vec<String> = accepted_group.map(|g| g.providers.clone()).unwrap_or_default();
    sources.sort();
    sources.dedup();
    sources.truncate(8);

    let default_reasoning = match accepted_group {
        Some(g) => format!(
            "{} of {} distinct providers agree on canonical key {}",
            g.providers.len(),
            consensus.groups.iter().map(|grp| grp.providers.len()).sum::<usize>(),
            g.key
        ),
        None => "no candidate group reached the corroboration threshold".to_string(),
    };

    let advisor_request = AdvisorRequest {
        query_raw: query.raw_text.clone(),
        structured_request: serde_json::to_value(&query).unwrap_or_default(),
        accepted_group_key: consensus.accepted_key.clone(),
        candidate_resolution: candidate_resolution.clone(),
        candidate_confidence: scored.value,
        supporting_providers: sources.clone(),
    };

    let (reasoning, sources, confidence) = match advisor.advise(&advisor_request).await {
        Ok(reply) => {
            let merged = crate::advisor::merge_advice(reply, default_reasoning, sources, &candidate_resolution);
            if let Some(err) = merged.error {
                errors.push(err);
            }
            let confidence = merge_with_advisor_confidence(scored.value, merged.confidence);
            (merged.reasoning, merged.sources, confidence)
        }
        Err(e) => {
            warnings.push(EvidenceWarning::new(format!("advisor call failed: {e}")));
            (default_reasoning, sources, scored.value)
        }
    };

    let evidence = assemble_outcome_evidence(&query.raw_text, facts, &consensus, errors, warnings);

    ResolutionResult {
        resolution: candidate_resolution,
        confidence,
        reasoning,
        sources,
        evidence,
    }
}

async fn run_statistic_pipeline(
    fetcher: &Fetcher,
    concurrency: usize,
    advisor: &dyn Advisor,
    query: StatisticQuery,
) -> ResolutionResult {
    let mut errors: Vec<EvidenceError> = Vec::new();
    let mut warnings: Vec<EvidenceWarning> = Vec::new();

    let statistic_label = format!("{:?}", query.statistic_type).to_lowercase();
    let match_entity = query.entities.r#match.clone();
    let params = QueryParams {
        statistic: Some(statistic_label),
        home_team: match_entity.as_ref().and_then(|m| m.home.clone()),
        away_team: match_entity.as_ref().and_then(|m| m.away.clone()),
        date: match_entity.as_ref().and_then(|m| m.date.clone()),
        competition: match_entity.as_ref().and_then(|m| m.competition.clone()),
        team: query.entities.team.clone(),
        player: query.entities.player.clone(),
        period: Some(format!("{:?}", query.period).to_lowercase()),
        ..Default::default()
    };

    let outcomes = registry::fetch_all(fetcher, &params, concurrency).await;

    let mut providers_used = Vec::new();
    let mut sources = Vec::new();
    let mut responses: Vec<ProviderResponse> = Vec::new();
    for outcome in outcomes {
        match outcome {
            ProviderOutcome::Fetched {
                provider,
                tier,
                weight,
                payload,
            } => {
                providers_used.push(provider.to_string());
                let response = ProviderResponse {
                    provider: provider.to_string(),
                    tier,
                    weight,
                    collected_at: Utc::now(),
                    payload,
                    meta: Default::default(),
                };
                sources.extend(normalize_statistic_response(&query, &response));
                responses.push(response);
            }
            ProviderOutcome::Skipped { provider, reason } => {
                warnings.push(EvidenceWarning::new(reason).with_provider(provider));
            }
            ProviderOutcome::Failed { provider, failure } => {
                errors.push(EvidenceError::new(failure.kind, failure.message).with_provider(provider));
            }
        }
    }

    // Every provider's raw payload was already fetched for the query's own
    // statistic type; the cross-statistic logical rules in `validate` only
    // have something to compare if a sibling type's value is normalized from
    // those same payloads too, so re-walk them per sibling rather than
    // issuing a second fan-out.
    let mut normalized_statistics = vec![build_normalized_statistic(&query, sources.clone())];
    for &sibling_type in cross_check_siblings(query.statistic_type) {
        let mut sibling_query = query.clone();
        sibling_query.statistic_type = sibling_type;
        let sibling_sources: Vec<StatisticSource> = responses
            .iter()
            .flat_map(|response| normalize_statistic_response(&sibling_query, response))
            .collect();
        if !sibling_sources.is_empty() {
            normalized_statistics.push(build_normalized_statistic(&sibling_query, sibling_sources));
        }
    }

    let validation = validate(&normalized_statistics);
    for source in &validation.invalid_sources {
        warnings.push(EvidenceWarning::new(format!("{source} value out of valid range")).with_provider(source.clone()));
    }

    let unit = normalized_statistics[0].unit;
    let betting_market_alignment = false;
    let consensus = resolve_statistic_consensus(query.statistic_type, unit, &sources, betting_market_alignment);

    if !consensus.agreed {
        errors.push(EvidenceError::new(
            ErrorKind::InsufficientConsensus,
            "statistic consensus did not reach agreement",
        ));
    }

    let avg_age_minutes = if sources.is_empty() {
        1440.0
    } else {
        let now = Utc::now();
        sources
            .iter()
            .map(|s| now.signed_duration_since(s.timestamp).num_minutes() as f64)
            .sum::<f64>()
            / sources.len() as f64
    };

    let scored = score_statistic_confidence(&consensus, avg_age_minutes);

    let candidate_resolution = if !consensus.agreed {
        INSUFFICIENT_DATA.to_string()
    } else {
        let agreed_value = consensus.agreed_value.unwrap_or_default();
        match query.query_type {
            StatisticQueryType::Threshold => {
                let comparator = query.comparator.unwrap_or(Comparator::GreaterThan);
                let threshold = query.threshold.unwrap_or_default();
                if comparator.evaluate(agreed_value, threshold) {
                    "yes".to_string()
                } else {
                    "no".to_string()
                }
            }
            _ => format!("{:?}:{}{}", query.statistic_type, agreed_value, unit.suffix()).to_lowercase(),
        }
    };

    let confidence = if !consensus.agreed {
        0.30f64.max(scored.value.min(0.30))
    } else {
        scored.value
    };

    let mut sources_list: Vec<String> = providers_used;
    sources_list.sort();
    sources_list.dedup();
    sources_list.truncate(8);

    let default_reasoning = if consensus.agreed {
        format!(
            "{} of {} sources agree within tolerance ({} stats providers)",
            consensus.agreement_count,
            sources.len(),
            consensus.stats_provider_count
        )
    } else {
        "statistic sources did not reach the agreement threshold".to_string()
    };

    let advisor_request = AdvisorRequest {
        query_raw: query.raw_text.clone(),
        structured_request: serde_json::to_value(&query).unwrap_or_default(),
        accepted_group_key: None,
        candidate_resolution: candidate_resolution.clone(),
        candidate_confidence: confidence,
        supporting_providers: sources_list.clone(),
    };

    let (reasoning, sources_list, confidence) = match advisor.advise(&advisor_request).await {
        Ok(reply) => {
            let merged = crate::advisor::merge_advice(reply, default_reasoning, sources_list, &candidate_resolution);
            if let Some(err) = merged.error {
                errors.push(err);
            }
            let confidence = merge_with_advisor_confidence(confidence, merged.confidence);
            (merged.reasoning, merged.sources, confidence)
        }
        Err(e) => {
            warnings.push(EvidenceWarning::new(format!("advisor call failed: {e}")));
            (default_reasoning, sources_list, confidence)
        }
    };

    let confidence_adjustments: Vec<String> = scored
        .adjustments
        .iter()
        .map(|a| format!("{}: {:+.3}", a.reason, a.delta_or_multiplier))
        .collect();

    let evidence = assemble_statistic_evidence(
        &query.raw_text,
        sources_list.clone(),
        normalized_statistics,
        &validation,
        Some(consensus),
        confidence_adjustments,
        errors,
        warnings,
    );

    ResolutionResult {
        resolution: candidate_resolution,
        confidence,
        reasoning,
        sources: sources_list,
        evidence,
    }
}

/// Single inbound call (§6): `resolve(query) → ResolutionResult`. Concurrency
/// caps come from `Config` (§5's 3/4 defaults, overridable via
/// `OUTCOME_CONCURRENCY`/`STATISTIC_CONCURRENCY`) rather than being
/// hardcoded here.
pub async fn resolve(fetcher: &Fetcher, advisor: &dyn Advisor, config: &Config, raw_query: &str) -> ResolutionResult {
    match classifier::classify(raw_query) {
        ClassifiedQuery::Outcome(query) => {
            run_outcome_pipeline(fetcher, config.outcome_concurrency, advisor, query).await
        }
        ClassifiedQuery::Statistic(query) => {
            run_statistic_pipeline(fetcher, config.statistic_concurrency, advisor, query).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::NullAdvisor;
    use crate::fetcher::breaker::BreakerPolicy;

    #[tokio::test]
    async fn unconfigured_providers_yield_insufficient_data() {
        for key in registry::providers() {
            std::env::remove_var(key.base_url_env);
        }
        let fetcher = Fetcher::new(BreakerPolicy::default()).unwrap();
        let config = Config::from_env();
        let result = resolve(&fetcher, &NullAdvisor, &config, "Did Lakers beat Suns on 2025-01-15?").await;
        assert_eq!(result.resolution, INSUFFICIENT_DATA);
        assert!(result.confidence >= 0.0 && result.confidence <= 1.0);
    }
}
