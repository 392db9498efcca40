//! Text → `ClassifiedQuery` (§4.3).
//!
//! Produces at most one structured shape per raw query: statistic
//! classification is attempted first; if no statistic synonym matches, the
//! text is classified as an outcome query. Every keyword scan is
//! case-insensitive and the first matching rule in declared order wins —
//! unmatched optional fields are left absent, never defaulted to empty
//! strings.

use crate::domain::*;
use crate::text::{
    find_all_case_insensitive, normalize_whitespace, BASKETBALL_KEYWORDS, KNOWN_TEAMS,
};
use chrono::{DateTime, Utc};

/// Closed statistic synonym table (§Glossary), checked in order so that
/// more specific phrases (`"yellow card"`) are matched before generic ones
/// (`"card"`).
const STATISTIC_SYNONYMS: &[(&str, StatisticType)] = &[
    ("yellow card", StatisticType::YellowCards),
    ("red card", StatisticType::RedCards),
    ("total card", StatisticType::TotalCards),
    ("card", StatisticType::TotalCards),
    ("corner", StatisticType::Corners),
    ("shot on target", StatisticType::ShotsOnTarget),
    ("shots on target", StatisticType::ShotsOnTarget),
    ("total shot", StatisticType::ShotsTotal),
    ("shot", StatisticType::ShotsTotal),
    ("foul", StatisticType::Fouls),
    ("pass accuracy", StatisticType::PassAccuracy),
    ("key pass", StatisticType::KeyPasses),
    ("possession", StatisticType::Possession),
    ("pass", StatisticType::Passes),
    ("save", StatisticType::Saves),
    ("tackle", StatisticType::Tackles),
    ("interception", StatisticType::Interceptions),
    ("free kick", StatisticType::FreeKicks),
    ("penalty awarded", StatisticType::PenaltiesAwarded),
    ("penalties awarded", StatisticType::PenaltiesAwarded),
    ("penalty scored", StatisticType::PenaltiesScored),
    ("penalties scored", StatisticType::PenaltiesScored),
    ("technical foul", StatisticType::TechnicalFouls),
    ("flagrant foul", StatisticType::FlagrantFouls),
    ("turnover", StatisticType::Turnovers),
    ("offensive rebound", StatisticType::ReboundsOffensive),
    ("defensive rebound", StatisticType::ReboundsDefensive),
    ("rebound", StatisticType::ReboundsTotal),
    ("block", StatisticType::Blocks),
    ("steal", StatisticType::Steals),
    ("three pointer made", StatisticType::ThreePointersMade),
    ("three-pointer made", StatisticType::ThreePointersMade),
    (
        "three pointer attempted",
        StatisticType::ThreePointersAttempted,
    ),
    ("free throw made", StatisticType::FreeThrowsMade),
    ("free throw attempted", StatisticType::FreeThrowsAttempted),
    ("minutes played", StatisticType::MinutesPlayed),
    ("penalty yard", StatisticType::PenaltyYards),
    ("fumble", StatisticType::Fumbles),
    ("sack", StatisticType::Sacks),
    ("time of possession", StatisticType::TimeOfPossession),
    (
        "third down conversion",
        StatisticType::ThirdDownConversions,
    ),
    ("red zone efficiency", StatisticType::RedZoneEfficiency),
    ("penalty", StatisticType::Penalties),
    ("goal", StatisticType::Goals),
    ("assist", StatisticType::Assists),
];

pub fn classify(raw: &str) -> ClassifiedQuery {
    let text = normalize_whitespace(raw);
    let sport = detect_sport(&text);
    let date = detect_date(&text);
    let teams = detect_teams(&text);

    match classify_statistic(&text, &date) {
        Some(stat) => ClassifiedQuery::Statistic(stat),
        None => ClassifiedQuery::Outcome(classify_outcome(&text, sport, teams, date)),
    }
}

fn detect_sport(text: &str) -> Sport {
    let lower = text.to_lowercase();
    if BASKETBALL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Sport::Basketball
    } else if crate::text::SOCCER_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Sport::Soccer
    } else {
        Sport::General
    }
}

fn detect_teams(text: &str) -> Vec<String> {
    find_all_case_insensitive(text, KNOWN_TEAMS)
        .into_iter()
        .map(|s| s.to_string())
        .take(4)
        .collect()
}

/// ISO date detection by priority: `YYYY-MM-DD` > `Month D, YYYY` > numeric
/// `M/D/YY(YY)` (month-first preferred, day-first fallback).
fn detect_date(text: &str) -> Option<String> {
    detect_iso_literal(text)
        .or_else(|| detect_month_name_date(text))
        .or_else(|| detect_numeric_date(text))
}

fn detect_iso_literal(text: &str) -> Option<String> {
    let bytes: Vec<char> = text.chars().collect();
    let is_digit = |c: char| c.is_ascii_digit();
    for start in 0..bytes.len() {
        if start + 10 > bytes.len() {
            break;
        }
        let window: String = bytes[start..start + 10].iter().collect();
        let chars: Vec<char> = window.chars().collect();
        let matches = chars[0..4].iter().all(|c| is_digit(*c))
            && chars[4] == '-'
            && chars[5..7].iter().all(|c| is_digit(*c))
            && chars[7] == '-'
            && chars[8..10].iter().all(|c| is_digit(*c));
        if matches {
            return Some(window);
        }
    }
    None
}

const MONTHS: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn detect_month_name_date(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();
    for (i, token) in tokens.iter().enumerate() {
        if let Some(month_idx) = MONTHS.iter().position(|m| m == token) {
            let day = tokens.get(i + 1).and_then(|t| t.parse::<u32>().ok());
            let year = tokens.get(i + 2).and_then(|t| t.parse::<i32>().ok());
            if let (Some(day), Some(year)) = (day, year) {
                if (1..=31).contains(&day) && year > 1900 {
                    return Some(format!("{year:04}-{:02}-{day:02}", month_idx + 1));
                }
            }
        }
    }
    None
}

fn detect_numeric_date(text: &str) -> Option<String> {
    for token in text.split(|c: char| c.is_whitespace()) {
        let cleaned = token.trim_matches(|c: char| !c.is_ascii_digit() && c != '/');
        let parts: Vec<&str> = cleaned.split('/').collect();
        if parts.len() != 3 {
            continue;
        }
        let nums: Vec<Option<u32>> = parts.iter().map(|p| p.parse::<u32>().ok()).collect();
        if let [Some(a), Some(b), Some(y)] = nums[..] {
            let year = if y < 100 { 2000 + y } else { y };
            // Month-first preferred: a=month, b=day.
            if a <= 12 && b <= 31 {
                return Some(format!("{year:04}-{a:02}-{b:02}"));
            }
            // Day-first fallback.
            if b <= 12 && a <= 31 {
                return Some(format!("{year:04}-{b:02}-{a:02}"));
            }
        }
    }
    None
}

fn known_team_nearest_end(segment: &str) -> Option<String> {
    let lower = segment.to_lowercase();
    KNOWN_TEAMS
        .iter()
        .filter_map(|team| lower.rfind(&team.to_lowercase()).map(|pos| (pos, *team)))
        .max_by_key(|(pos, _)| *pos)
        .map(|(_, team)| team.to_string())
}

fn known_team_nearest_start(segment: &str) -> Option<String> {
    let lower = segment.to_lowercase();
    KNOWN_TEAMS
        .iter()
        .filter_map(|team| lower.find(&team.to_lowercase()).map(|pos| (pos, *team)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, team)| team.to_string())
}

/// Split on a match separator (`vs|versus|against`) and resolve each side to
/// a known team name when one is present, falling back to the raw trimmed
/// half otherwise.
fn split_on_match_separator(text: &str) -> Option<(String, String)> {
    let lower = text.to_lowercase();
    for sep in ["versus", " vs ", " vs. ", " against "] {
        if let Some(idx) = lower.find(sep) {
            let before = text[..idx].trim();
            let after = text[idx + sep.len()..].trim();
            if before.is_empty() || after.is_empty() {
                continue;
            }
            let home = known_team_nearest_end(before).unwrap_or_else(|| before.to_string());
            let away = known_team_nearest_start(after).unwrap_or_else(|| after.to_string());
            return Some((home, away));
        }
    }
    None
}

fn extract_player(text: &str) -> Option<String> {
    let markers = [" did ", " by ", " from ", " for "];
    let lower = text.to_lowercase();
    for marker in markers {
        if let Some(idx) = lower.find(marker) {
            let after = &text[idx + marker.len()..];
            let candidate: String = after
                .split(|c: char| c == '?' || c == '.' || c == ',')
                .next()
                .unwrap_or("")
                .split_whitespace()
                .take_while(|w| w.chars().next().map(|c| c.is_uppercase()).unwrap_or(false))
                .collect::<Vec<_>>()
                .join(" ");
            if !candidate.is_empty() {
                return Some(candidate);
            }
        }
    }
    None
}

fn detect_aggregation(lower: &str) -> Aggregation {
    if lower.contains("per team") {
        Aggregation::PerTeam
    } else if lower.contains("per player") {
        Aggregation::PerPlayer
    } else if lower.contains("average") {
        Aggregation::Average
    } else if lower.contains("difference") {
        Aggregation::Difference
    } else {
        Aggregation::Total
    }
}

fn detect_period(lower: &str) -> Period {
    if lower.contains("first half") {
        Period::FirstHalf
    } else if lower.contains("second half") {
        Period::SecondHalf
    } else if lower.contains("extra time") {
        Period::ExtraTime
    } else if lower.contains("overtime") {
        Period::Overtime
    } else if lower.contains("quarter") {
        Period::Quarter
    } else {
        Period::FullTime
    }
}

fn first_number_after(lower: &str, marker: &str) -> Option<f64> {
    let idx = lower.find(marker)?;
    let after = &lower[idx + marker.len()..];
    let token: String = after
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    token.parse::<f64>().ok()
}

fn detect_threshold(lower: &str) -> Option<(f64, Comparator)> {
    let patterns: &[(&str, Comparator)] = &[
        ("over ", Comparator::GreaterThan),
        ("under ", Comparator::LessThan),
        ("more than ", Comparator::GreaterThan),
        ("less than ", Comparator::LessThan),
        ("at least ", Comparator::GreaterThanOrEqual),
        ("at most ", Comparator::LessThanOrEqual),
        ("\u{2265} ", Comparator::GreaterThanOrEqual),
        (">= ", Comparator::GreaterThanOrEqual),
        ("\u{2264} ", Comparator::LessThanOrEqual),
        ("<= ", Comparator::LessThanOrEqual),
    ];
    for (marker, comparator) in patterns {
        if let Some(value) = first_number_after(lower, marker) {
            return Some((value, *comparator));
        }
    }
    // "N+ (line|cards|corners)" form.
    for (i, c) in lower.char_indices() {
        if c == '+' {
            let before: String = lower[..i]
                .chars()
                .rev()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect::<String>()
                .chars()
                .rev()
                .collect();
            if before.is_empty() {
                continue;
            }
            let after = &lower[i + 1..];
            if after.trim_start().starts_with("line")
                || after.trim_start().starts_with(" card")
                || after.trim_start().starts_with("cards")
                || after.trim_start().starts_with(" corner")
                || after.trim_start().starts_with("corners")
            {
                if let Ok(value) = before.parse::<f64>() {
                    return Some((value, Comparator::GreaterThanOrEqual));
                }
            }
        }
    }
    None
}

fn classify_statistic(text: &str, date: &Option<String>) -> Option<StatisticQuery> {
    let lower = text.to_lowercase();
    let (_, statistic_type) = STATISTIC_SYNONYMS
        .iter()
        .find(|(synonym, _)| lower.contains(synonym))?;

    let match_entity = split_on_match_separator(text).map(|(home, away)| MatchEntity {
        home: Some(home),
        away: Some(away),
        date: date.clone(),
        competition: None,
        id: None,
    });
    let player = extract_player(text);
    let single_team = if match_entity.is_none() {
        find_all_case_insensitive(text, KNOWN_TEAMS)
            .into_iter()
            .next()
            .map(str::to_string)
    } else {
        None
    };

    let aggregation = detect_aggregation(&lower);
    let period = detect_period(&lower);
    let threshold = detect_threshold(&lower);

    let query_type = if threshold.is_some() {
        StatisticQueryType::Threshold
    } else if player.is_some() {
        StatisticQueryType::PlayerStatistic
    } else if single_team.is_some() || *statistic_type == StatisticType::TotalCards {
        StatisticQueryType::TeamAggregate
    } else {
        StatisticQueryType::MatchStatistic
    };

    Some(StatisticQuery {
        query_type,
        statistic_type: *statistic_type,
        entities: StatisticEntities {
            r#match: match_entity,
            team: single_team,
            player: player.clone(),
        },
        aggregation,
        period,
        threshold: threshold.map(|(v, _)| v),
        comparator: threshold.map(|(_, c)| c),
        event_end_time: None,
        can_resolve_now: false,
        raw_text: text.to_string(),
    })
}

fn classify_outcome(text: &str, sport: Sport, teams: Vec<String>, date: Option<String>) -> OutcomeQuery {
    let lower = text.to_lowercase();

    let question_type = if contains_did_result(&lower) {
        QuestionType::DidResultHappen
    } else if lower.contains("who won") || lower.contains("winner") || lower.contains("victor") {
        QuestionType::WhoWon
    } else if lower.contains("score") || lower.contains("scoreline") || lower.contains("points") {
        QuestionType::Scoreline
    } else if lower.contains("mvp")
        || lower.contains("award")
        || lower.contains("player of the match")
        || lower.contains("golden boot")
        || lower.contains("top scorer")
    {
        QuestionType::PlayerAward
    } else {
        QuestionType::Other
    };

    let (home, away) = split_on_match_separator(text).unwrap_or((String::new(), String::new()));
    let teams = if !home.is_empty() && !away.is_empty() {
        vec![home, away]
    } else {
        teams
    };

    OutcomeQuery {
        sport,
        date,
        teams,
        player: extract_player(text),
        competition: None,
        matchday: None,
        question_type,
        raw_text: text.to_string(),
    }
}

fn contains_did_result(lower: &str) -> bool {
    if !lower.starts_with("did ") && !lower.contains(" did ") {
        return false;
    }
    ["win", "lose", "draw", "tie", "happen"]
        .iter()
        .any(|verb| lower.contains(verb))
}

/// §8 invariant 6: the classifier is idempotent over the text it itself
/// produces (`classify(classify(raw).rawText) == classify(raw)`).
pub fn resolvability(event_end_time: Option<DateTime<Utc>>) -> bool {
    event_end_time
        .map(|t| Utc::now() - t >= chrono::Duration::minutes(15))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_query_with_explicit_teams_and_date() {
        match classify("Did Lakers beat Suns on 2025-01-15?") {
            ClassifiedQuery::Outcome(q) => {
                assert_eq!(q.date.as_deref(), Some("2025-01-15"));
                assert!(q.teams.iter().any(|t| t == "Lakers"));
                assert!(q.teams.iter().any(|t| t == "Suns"));
                assert_eq!(q.question_type, QuestionType::DidResultHappen);
                assert!(q.is_valid());
            }
            other => panic!("expected outcome query, got {other:?}"),
        }
    }

    #[test]
    fn who_won_question_type() {
        match classify("Who won the Lakers vs Suns game?") {
            ClassifiedQuery::Outcome(q) => assert_eq!(q.question_type, QuestionType::WhoWon),
            other => panic!("expected outcome query, got {other:?}"),
        }
    }

    #[test]
    fn threshold_statistic_classification() {
        match classify("Over 8 total cards in Real Madrid vs Barcelona 2024-10-26") {
            ClassifiedQuery::Statistic(q) => {
                assert_eq!(q.query_type, StatisticQueryType::Threshold);
                assert_eq!(q.threshold, Some(8.0));
                assert_eq!(q.comparator, Some(Comparator::GreaterThan));
            }
            other => panic!("expected statistic query, got {other:?}"),
        }
    }

    #[test]
    fn team_aggregate_statistic_classification() {
        match classify("Total yellow cards Arsenal vs Chelsea 2024-11-05") {
            ClassifiedQuery::Statistic(q) => {
                assert_eq!(q.statistic_type, StatisticType::YellowCards);
                assert_eq!(q.entities.r#match.as_ref().unwrap().date.as_deref(), Some("2024-11-05"));
            }
            other => panic!("expected statistic query, got {other:?}"),
        }
    }

    #[test]
    fn classification_is_idempotent_over_its_own_raw_text() {
        let raw = "Did Lakers beat Suns on 2025-01-15?";
        let first = classify(raw);
        let raw_text = match &first {
            ClassifiedQuery::Outcome(q) => q.raw_text.clone(),
            ClassifiedQuery::Statistic(q) => q.raw_text.clone(),
        };
        let second = classify(&raw_text);
        match (first, second) {
            (ClassifiedQuery::Outcome(a), ClassifiedQuery::Outcome(b)) => {
                assert_eq!(a.question_type, b.question_type);
                assert_eq!(a.teams, b.teams);
                assert_eq!(a.date, b.date);
            }
            _ => panic!("classification shape changed across idempotent re-run"),
        }
    }
}
