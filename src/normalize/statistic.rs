//! Statistic-path normalization (§4.4): recursive JSON walk → `StatisticSource`
//! candidates, folded into a `NormalizedStatistic`.
//!
//! The walker has no schema for any individual provider — it only knows a
//! handful of shape aliases (`statistics|data|items`, `text`, `value` +
//! disambiguating sibling, bare key/value pairs matching a synonym table) and
//! falls back to recursing into nested objects. This mirrors §9's guidance to
//! prefer an alias-table walker over per-provider reflection.

use crate::domain::{NormalizedStatistic, Period, ProviderResponse, StatisticQuery, StatisticSource, StatisticType, Unit};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;

fn unit_for(stat: StatisticType) -> Unit {
    match stat {
        StatisticType::Possession
        | StatisticType::PassAccuracy
        | StatisticType::RedZoneEfficiency
        | StatisticType::TimeOfPossession => Unit::Percentage,
        StatisticType::MinutesPlayed => Unit::Minutes,
        StatisticType::PenaltyYards => Unit::Yards,
        _ => Unit::Count,
    }
}

/// Synonym table used to disambiguate bare object keys and `type`/`statType`
/// sibling fields against the closed `StatisticType` set.
fn type_synonym(label: &str) -> Option<StatisticType> {
    let l = label.to_lowercase();
    let table: &[(&str, StatisticType)] = &[
        ("yellow_card", StatisticType::YellowCards),
        ("yellow card", StatisticType::YellowCards),
        ("red_card", StatisticType::RedCards),
        ("red card", StatisticType::RedCards),
        ("total_card", StatisticType::TotalCards),
        ("corner", StatisticType::Corners),
        ("shots_on_target", StatisticType::ShotsOnTarget),
        ("shots on target", StatisticType::ShotsOnTarget),
        ("shots_total", StatisticType::ShotsTotal),
        ("total_shots", StatisticType::ShotsTotal),
        ("foul", StatisticType::Fouls),
        ("possession", StatisticType::Possession),
        ("pass_accuracy", StatisticType::PassAccuracy),
        ("key_pass", StatisticType::KeyPasses),
        ("pass", StatisticType::Passes),
        ("save", StatisticType::Saves),
        ("tackle", StatisticType::Tackles),
        ("interception", StatisticType::Interceptions),
        ("free_kick", StatisticType::FreeKicks),
        ("penalties_awarded", StatisticType::PenaltiesAwarded),
        ("penalties_scored", StatisticType::PenaltiesScored),
        ("technical_foul", StatisticType::TechnicalFouls),
        ("flagrant_foul", StatisticType::FlagrantFouls),
        ("turnover", StatisticType::Turnovers),
        ("offensive_rebound", StatisticType::ReboundsOffensive),
        ("defensive_rebound", StatisticType::ReboundsDefensive),
        ("rebound", StatisticType::ReboundsTotal),
        ("block", StatisticType::Blocks),
        ("steal", StatisticType::Steals),
        ("three_pointers_made", StatisticType::ThreePointersMade),
        ("three_pointers_attempted", StatisticType::ThreePointersAttempted),
        ("free_throws_made", StatisticType::FreeThrowsMade),
        ("free_throws_attempted", StatisticType::FreeThrowsAttempted),
        ("minutes_played", StatisticType::MinutesPlayed),
        ("penalty_yards", StatisticType::PenaltyYards),
        ("fumble", StatisticType::Fumbles),
        ("sack", StatisticType::Sacks),
        ("time_of_possession", StatisticType::TimeOfPossession),
        ("third_down", StatisticType::ThirdDownConversions),
        ("red_zone", StatisticType::RedZoneEfficiency),
        ("penalty", StatisticType::Penalties),
        ("goal", StatisticType::Goals),
        ("assist", StatisticType::Assists),
    ];
    table
        .iter()
        .find(|(needle, _)| l.contains(needle))
        .map(|(_, t)| *t)
}

fn first_numeric_token(s: &str) -> Option<f64> {
    let mut start = None;
    for (i, c) in s.char_indices() {
        let is_num_char = c.is_ascii_digit() || c == '.' || c == '-';
        match (is_num_char, start) {
            (true, None) => start = Some(i),
            (false, Some(st)) => {
                if let Ok(v) = s[st..i].parse::<f64>() {
                    return Some(v);
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(st) = start {
        if let Ok(v) = s[st..].parse::<f64>() {
            return Some(v);
        }
    }
    None
}

struct Candidate {
    inferred_type: Option<StatisticType>,
    value: f64,
}

fn walk(value: &Value, sink: &mut Vec<Candidate>) {
    match value {
        Value::Array(items) => {
            for item in items {
                walk(item, sink);
            }
        }
        Value::String(s) => {
            if let Some(v) = first_numeric_token(s) {
                sink.push(Candidate {
                    inferred_type: type_synonym(s),
                    value: v,
                });
            }
        }
        Value::Number(n) => {
            if let Some(v) = n.as_f64() {
                sink.push(Candidate {
                    inferred_type: None,
                    value: v,
                });
            }
        }
        Value::Object(map) => {
            for key in ["statistics", "data", "items"] {
                if let Some(nested) = map.get(key) {
                    walk(nested, sink);
                    return;
                }
            }
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                if let Some(v) = first_numeric_token(text) {
                    sink.push(Candidate {
                        inferred_type: type_synonym(text),
                        value: v,
                    });
                    return;
                }
            }
            if let Some(v) = map.get("value") {
                let label = ["type", "statType", "label", "name"]
                    .iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_str));
                let numeric = match v {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => first_numeric_token(s),
                    _ => None,
                };
                if let Some(numeric) = numeric {
                    sink.push(Candidate {
                        inferred_type: label.and_then(type_synonym),
                        value: numeric,
                    });
                    return;
                }
            }
            let mut matched_kv = false;
            for (key, v) in map {
                if let Some(inferred) = type_synonym(key) {
                    let numeric = match v {
                        Value::Number(n) => n.as_f64(),
                        Value::String(s) => first_numeric_token(s),
                        _ => None,
                    };
                    if let Some(numeric) = numeric {
                        sink.push(Candidate {
                            inferred_type: Some(inferred),
                            value: numeric,
                        });
                        matched_kv = true;
                    }
                }
            }
            if !matched_kv {
                for v in map.values() {
                    walk(v, sink);
                }
            }
        }
        _ => {}
    }
}

/// Walk one provider's payload and emit the `StatisticSource`s that match the
/// query's statistic type (a candidate with no inferred type falls back to
/// the query's type and inherits its aggregation/period).
pub fn normalize_statistic_response(
    query: &StatisticQuery,
    response: &ProviderResponse,
) -> Vec<StatisticSource> {
    let mut candidates = Vec::new();
    walk(&response.payload, &mut candidates);

    candidates
        .into_iter()
        .filter(|c| c.inferred_type.unwrap_or(query.statistic_type) == query.statistic_type)
        .map(|c| StatisticSource {
            source: response.provider.clone(),
            tier: response.tier,
            weight: response.weight,
            raw_value: c.value.to_string(),
            parsed_value: c.value,
            timestamp: response.collected_at,
            metadata: HashMap::new(),
        })
        .collect()
}

/// Statistic types whose cross-statistic logical rules (§4.5) need a sibling
/// type fetched alongside the query's own type so `validate` can actually
/// compare them. Returns an empty slice for types with no cross-check rule.
pub fn cross_check_siblings(stat: StatisticType) -> &'static [StatisticType] {
    match stat {
        StatisticType::ShotsOnTarget => &[StatisticType::ShotsTotal, StatisticType::Goals],
        StatisticType::ShotsTotal => &[StatisticType::ShotsOnTarget],
        StatisticType::Goals => &[StatisticType::ShotsOnTarget],
        StatisticType::YellowCards => &[StatisticType::RedCards, StatisticType::TotalCards],
        StatisticType::RedCards => &[StatisticType::YellowCards, StatisticType::TotalCards],
        StatisticType::TotalCards => &[StatisticType::YellowCards, StatisticType::RedCards],
        _ => &[],
    }
}

/// Fold every provider's matching sources into one `NormalizedStatistic`.
pub fn build_normalized_statistic(query: &StatisticQuery, sources: Vec<StatisticSource>) -> NormalizedStatistic {
    let unit = unit_for(query.statistic_type);
    let value = sources.first().map(|s| s.parsed_value).unwrap_or(0.0);
    NormalizedStatistic {
        r#type: query.statistic_type,
        team: query.entities.team.clone(),
        player: query.entities.player.clone(),
        r#match: query.entities.r#match.clone(),
        value,
        unit,
        period: query.period,
        aggregation: query.aggregation,
        sources,
    }
}

pub fn now() -> chrono::DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Aggregation, StatisticEntities, StatisticQueryType, Tier};
    use serde_json::json;

    fn query() -> StatisticQuery {
        StatisticQuery {
            query_type: StatisticQueryType::TeamAggregate,
            statistic_type: StatisticType::YellowCards,
            entities: StatisticEntities::default(),
            aggregation: Aggregation::Total,
            period: Period::FullTime,
            threshold: None,
            comparator: None,
            event_end_time: None,
            can_resolve_now: true,
            raw_text: String::new(),
        }
    }

    fn response(payload: Value, provider: &str) -> ProviderResponse {
        ProviderResponse {
            provider: provider.to_string(),
            tier: Tier::One,
            weight: 0.45,
            collected_at: Utc::now(),
            payload,
            meta: HashMap::new(),
        }
    }

    #[test]
    fn bare_key_value_pair_matches_synonym() {
        let payload = json!({"yellow_cards": 4});
        let sources = normalize_statistic_response(&query(), &response(payload, "OPTA_STATS"));
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].parsed_value, 4.0);
    }

    #[test]
    fn value_field_with_type_sibling() {
        let payload = json!({"statistics": [{"type": "yellow_cards", "value": 4}]});
        let sources = normalize_statistic_response(&query(), &response(payload, "STATSBOMB"));
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].parsed_value, 4.0);
    }

    #[test]
    fn embedded_text_field_extracts_numeric_token() {
        let payload = json!({"data": [{"text": "4 yellow cards shown"}]});
        let sources = normalize_statistic_response(&query(), &response(payload, "FLASHSCORE"));
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].parsed_value, 4.0);
    }

    #[test]
    fn goals_cross_checks_against_shots_on_target_only() {
        assert_eq!(cross_check_siblings(StatisticType::Goals), &[StatisticType::ShotsOnTarget]);
        assert_eq!(cross_check_siblings(StatisticType::Other), &[] as &[StatisticType]);
    }

    #[test]
    fn unit_table_marks_possession_as_percentage() {
        assert_eq!(unit_for(StatisticType::Possession), Unit::Percentage);
        assert_eq!(unit_for(StatisticType::MinutesPlayed), Unit::Minutes);
        assert_eq!(unit_for(StatisticType::PenaltyYards), Unit::Yards);
        assert_eq!(unit_for(StatisticType::Goals), Unit::Count);
    }
}
