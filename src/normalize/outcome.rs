//! Outcome-path normalization (§4.4): provider payload → `NormalizedFact`.
//!
//! One function per provider shape, dispatched on `ProviderResponse.provider`
//! in `normalize_outcome_response`. Each adapter is defensive by construction:
//! a field it cannot find is `None`, never a fabricated default, and a row
//! that cannot produce a `canonicalKey` is silently dropped rather than
//! emitted half-built.

use crate::domain::{FactCategory, NormalizedFact, OutcomeQuery, ProviderResponse};
use crate::text::{normalize_name, teams_key};
use chrono::{DateTime, Utc};
use serde_json::Value;

const RESULT_VERBS: &[&str] = &["defeat", "beat", "tops", "edges", "wins", "past", "overcome"];

fn provider_reliability(provider: &str) -> f64 {
    match provider {
        "OPTA_STATS" | "STATSBOMB" | "SPORTSRADAR" => 0.9,
        "API_FOOTBALL" | "API_BASKETBALL" => 0.8,
        "THE_ODDS_API" => 0.75,
        "THESPORTSDB" => 0.65,
        "FLASHSCORE" => 0.6,
        p if p.starts_with("rss") || p.starts_with("RSS") => 0.58,
        _ => 0.5,
    }
}

fn canonical_key(
    award: &Option<String>,
    player: &Option<String>,
    winner: &Option<String>,
    home_score: &Option<i64>,
    away_score: &Option<i64>,
    teams: &str,
    date: &str,
) -> Option<String> {
    if let (Some(award), Some(player)) = (award, player) {
        return Some(format!("award:{award}:{}:{teams}:{date}", normalize_name(player)));
    }
    if let Some(winner) = winner {
        return Some(format!("winner:{}:{teams}:{date}", normalize_name(winner)));
    }
    if let (Some(h), Some(a)) = (home_score, away_score) {
        return Some(format!("score:{teams}:{h}-{a}:{date}"));
    }
    None
}

fn date_prefix_matches(query_date: &Option<String>, candidate: &str) -> bool {
    match query_date {
        None => true,
        Some(d) => candidate.starts_with(d.as_str()),
    }
}

fn teams_intersect(query_teams: &[String], home: &Option<String>, away: &Option<String>) -> bool {
    if query_teams.is_empty() {
        return true;
    }
    let normalized_query: Vec<String> = query_teams.iter().map(|t| normalize_name(t)).collect();
    [home, away].into_iter().flatten().any(|candidate| {
        let normalized = normalize_name(candidate);
        normalized_query
            .iter()
            .any(|q| normalized.contains(q.as_str()) || q.contains(normalized.as_str()))
    })
}

fn make_fact(
    provider: &str,
    category: FactCategory,
    home_team: Option<String>,
    away_team: Option<String>,
    winner: Option<String>,
    home_score: Option<i64>,
    away_score: Option<i64>,
    award: Option<String>,
    player: Option<String>,
    status: Option<String>,
    end_timestamp: Option<DateTime<Utc>>,
    source_url: Option<String>,
    date: &str,
    query_teams: &[String],
    raw: Value,
) -> Option<NormalizedFact> {
    let teams = if query_teams.is_empty() {
        teams_key(&[home_team.clone(), away_team.clone()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>())
    } else {
        teams_key(query_teams)
    };
    let key = canonical_key(&award, &player, &winner, &home_score, &away_score, &teams, date)?;
    Some(NormalizedFact {
        provider: provider.to_string(),
        canonical_key: key,
        display: winner.clone().unwrap_or_else(|| award.clone().unwrap_or_default()),
        category,
        home_team,
        away_team,
        winner,
        home_score,
        away_score,
        award,
        player,
        status,
        end_timestamp,
        source_url,
        reliability: if provider.starts_with("rss") || provider.starts_with("RSS") {
            0.6
        } else {
            provider_reliability(provider)
        },
        raw,
    })
}

fn thesportsdb(query: &OutcomeQuery, payload: &Value, provider: &str) -> Vec<NormalizedFact> {
    let mut rows: Vec<&Value> = Vec::new();
    if let Some(events) = payload.get("events").and_then(Value::as_array) {
        rows.extend(events);
    }
    if let Some(results) = payload.get("results").and_then(Value::as_array) {
        rows.extend(results);
    }
    let date = query.date.clone().unwrap_or_default();

    rows.into_iter()
        .filter_map(|row| {
            let home = row.get("strHomeTeam").and_then(Value::as_str).map(String::from);
            let away = row.get("strAwayTeam").and_then(Value::as_str).map(String::from);
            let event_date = row.get("dateEvent").and_then(Value::as_str).unwrap_or("");

            if !teams_intersect(&query.teams, &home, &away) || !date_prefix_matches(&query.date, event_date) {
                return None;
            }

            let home_score = row
                .get("intHomeScore")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<i64>().ok());
            let away_score = row
                .get("intAwayScore")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<i64>().ok());

            let winner = row
                .get("strResult")
                .and_then(Value::as_str)
                .map(String::from)
                .or_else(|| match (home_score, away_score, &home, &away) {
                    (Some(h), Some(a), Some(home), Some(away)) if h > a => Some(home.clone()),
                    (Some(h), Some(a), Some(home), Some(away)) if a > h => Some(away.clone()),
                    _ => None,
                });

            make_fact(
                provider,
                FactCategory::Result,
                home,
                away,
                winner,
                home_score,
                away_score,
                None,
                None,
                row.get("strStatus").and_then(Value::as_str).map(String::from),
                None,
                row.get("strVideo").and_then(Value::as_str).map(String::from),
                if date.is_empty() { event_date } else { &date },
                &query.teams,
                row.clone(),
            )
        })
        .collect()
}

fn api_sports(query: &OutcomeQuery, payload: &Value, provider: &str) -> Vec<NormalizedFact> {
    let date = query.date.clone().unwrap_or_default();
    payload
        .get("response")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|row| {
            let home = row
                .pointer("/teams/home/name")
                .and_then(Value::as_str)
                .map(String::from);
            let away = row
                .pointer("/teams/away/name")
                .and_then(Value::as_str)
                .map(String::from);
            let fixture_date = row
                .pointer("/fixture/date")
                .and_then(Value::as_str)
                .unwrap_or("");

            if !teams_intersect(&query.teams, &home, &away) || !date_prefix_matches(&query.date, fixture_date) {
                return None;
            }

            let (home_score, away_score) = ["/score/fulltime", "/score/final", "/goals"]
                .iter()
                .find_map(|path| {
                    let h = row.pointer(&format!("{path}/home")).and_then(Value::as_i64);
                    let a = row.pointer(&format!("{path}/away")).and_then(Value::as_i64);
                    match (h, a) {
                        (Some(h), Some(a)) => Some((Some(h), Some(a))),
                        _ => None,
                    }
                })
                .unwrap_or((None, None));

            let home_winner_flag = row.pointer("/teams/home/winner").and_then(Value::as_bool);
            let away_winner_flag = row.pointer("/teams/away/winner").and_then(Value::as_bool);

            let winner = match (home_winner_flag, away_winner_flag, &home, &away) {
                (Some(true), _, Some(home), _) => Some(home.clone()),
                (_, Some(true), _, Some(away)) => Some(away.clone()),
                _ => match (home_score, away_score, &home, &away) {
                    (Some(h), Some(a), Some(home), _) if h > a => Some(home.clone()),
                    (Some(h), Some(a), _, Some(away)) if a > h => Some(away.clone()),
                    _ => None,
                },
            };

            make_fact(
                provider,
                FactCategory::Result,
                home,
                away,
                winner,
                home_score,
                away_score,
                None,
                None,
                row.pointer("/fixture/status/long").and_then(Value::as_str).map(String::from),
                None,
                None,
                if date.is_empty() { fixture_date } else { &date },
                &query.teams,
                row.clone(),
            )
        })
        .collect()
}

fn the_odds_api(query: &OutcomeQuery, payload: &Value, provider: &str) -> Vec<NormalizedFact> {
    let date = query.date.clone().unwrap_or_default();
    let rows = payload.as_array().cloned().unwrap_or_default();

    rows.into_iter()
        .filter_map(|row| {
            let home = row.get("home_team").and_then(Value::as_str).map(String::from);
            let away = row.get("away_team").and_then(Value::as_str).map(String::from);
            if !teams_intersect(&query.teams, &home, &away) {
                return None;
            }

            let scores: Vec<(String, i64)> = row
                .get("scores")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(|s| {
                            let name = s.get("name").and_then(Value::as_str)?.to_string();
                            let score = s
                                .get("score")
                                .and_then(Value::as_str)
                                .and_then(|v| v.parse::<i64>().ok())
                                .or_else(|| s.get("score").and_then(Value::as_i64))?;
                            Some((name, score))
                        })
                        .collect()
                })
                .unwrap_or_default();

            let home_score = home.as_ref().and_then(|h| {
                scores
                    .iter()
                    .find(|(n, _)| normalize_name(n) == normalize_name(h))
                    .map(|(_, s)| *s)
            });
            let away_score = away.as_ref().and_then(|a| {
                scores
                    .iter()
                    .find(|(n, _)| normalize_name(n) == normalize_name(a))
                    .map(|(_, s)| *s)
            });

            let winner = match (home_score, away_score, &home, &away) {
                (Some(h), Some(a), Some(home), _) if h > a => Some(home.clone()),
                (Some(h), Some(a), _, Some(away)) if a > h => Some(away.clone()),
                _ => None,
            };

            let completed = row.get("completed").and_then(Value::as_bool).unwrap_or(false);

            make_fact(
                provider,
                FactCategory::Result,
                home,
                away,
                winner,
                home_score,
                away_score,
                None,
                None,
                Some(if completed { "finished".to_string() } else { "pending".to_string() }),
                None,
                None,
                if date.is_empty() { "" } else { &date },
                &query.teams,
                row.clone(),
            )
        })
        .collect()
}

fn extract_title_winner(title: &str, query_teams: &[String]) -> Option<(String, String)> {
    let lower = title.to_lowercase();
    let present: Vec<&String> = query_teams
        .iter()
        .filter(|t| lower.contains(&t.to_lowercase()))
        .collect();
    let min_required = std::cmp::min(2, query_teams.len());
    if present.len() < min_required {
        return None;
    }
    for verb in RESULT_VERBS {
        if let Some(idx) = lower.find(verb) {
            let before = title[..idx].trim();
            let after = title[idx + verb.len()..].trim();
            let winner = present.iter().find(|t| before.to_lowercase().contains(&t.to_lowercase()));
            let loser = present.iter().find(|t| after.to_lowercase().contains(&t.to_lowercase()));
            if let (Some(winner), Some(loser)) = (winner, loser) {
                return Some(((*winner).clone(), (*loser).clone()));
            }
        }
    }
    None
}

fn rss(query: &OutcomeQuery, payload: &Value, provider: &str) -> Vec<NormalizedFact> {
    let date = query.date.clone().unwrap_or_default();
    payload
        .get("items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| {
            let title = item.get("title").and_then(Value::as_str)?;
            let (winner, loser) = extract_title_winner(title, &query.teams)?;
            make_fact(
                provider,
                FactCategory::News,
                Some(winner.clone()),
                Some(loser),
                Some(winner),
                None,
                None,
                None,
                None,
                None,
                None,
                item.get("link").and_then(Value::as_str).map(String::from),
                &date,
                &query.teams,
                item.clone(),
            )
        })
        .collect()
}

/// Dispatch on `provider` per §4.4. Unknown providers yield no facts rather
/// than a guessed shape.
pub fn normalize_outcome_response(
    query: &OutcomeQuery,
    response: &ProviderResponse,
) -> Vec<NormalizedFact> {
    match response.provider.as_str() {
        "THESPORTSDB" => thesportsdb(query, &response.payload, &response.provider),
        "API_FOOTBALL" | "API_BASKETBALL" => api_sports(query, &response.payload, &response.provider),
        "THE_ODDS_API" => the_odds_api(query, &response.payload, &response.provider),
        p if p.starts_with("rss") || p.starts_with("RSS") => rss(query, &response.payload, &response.provider),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QuestionType, Sport, Tier};
    use serde_json::json;
    use std::collections::HashMap;

    fn query() -> OutcomeQuery {
        OutcomeQuery {
            sport: Sport::Basketball,
            date: Some("2025-01-15".to_string()),
            teams: vec!["Lakers".to_string(), "Suns".to_string()],
            player: None,
            competition: None,
            matchday: None,
            question_type: QuestionType::DidResultHappen,
            raw_text: "Did Lakers beat Suns on 2025-01-15?".to_string(),
        }
    }

    #[test]
    fn thesportsdb_event_produces_winner_fact() {
        let payload = json!({
            "events": [{
                "strHomeTeam": "Lakers",
                "strAwayTeam": "Suns",
                "dateEvent": "2025-01-15",
                "intHomeScore": "112",
                "intAwayScore": "108"
            }]
        });
        let response = ProviderResponse {
            provider: "THESPORTSDB".to_string(),
            tier: Tier::Four,
            weight: 0.15,
            collected_at: Utc::now(),
            payload,
            meta: HashMap::new(),
        };
        let facts = normalize_outcome_response(&query(), &response);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].winner.as_deref(), Some("Lakers"));
        assert!(facts[0].canonical_key.starts_with("winner:lakers:"));
    }

    #[test]
    fn rss_title_scan_requires_result_verb_and_two_teams() {
        let payload = json!({"items": [{"title": "Lakers beat Suns in overtime thriller", "link": "https://x"}]});
        let response = ProviderResponse {
            provider: "rss:espn".to_string(),
            tier: Tier::Three,
            weight: 0.25,
            collected_at: Utc::now(),
            payload,
            meta: HashMap::new(),
        };
        let facts = normalize_outcome_response(&query(), &response);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].reliability, 0.6);
        assert_eq!(facts[0].category, FactCategory::News);
    }

    #[test]
    fn no_match_is_dropped_not_fabricated() {
        let payload = json!({"items": [{"title": "Heat host Bulls tonight", "link": "https://x"}]});
        let response = ProviderResponse {
            provider: "rss:espn".to_string(),
            tier: Tier::Three,
            weight: 0.25,
            collected_at: Utc::now(),
            payload,
            meta: HashMap::new(),
        };
        assert!(normalize_outcome_response(&query(), &response).is_empty());
    }
}
