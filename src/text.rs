//! Small text utilities shared by the classifier and the outcome
//! normalizer: whitespace normalization, name normalization, and the fixed
//! keyword tables the classifier scans against. Kept deliberately simple —
//! the spec's Non-goals rule out entity resolution beyond name
//! normalization, so there is no NLP dependency here, matching the
//! teacher's own preference for hand-rolled string scanning over pulling in
//! a parser crate for a bounded keyword set.

/// Collapse runs of whitespace to a single space and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `normalize(name)`: strip to `[a-z0-9]+` segments joined without separators.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Deterministic, delimiter-joined key for a set of team names: lowercase,
/// normalized, sorted, joined with `-`.
pub fn teams_key(teams: &[String]) -> String {
    let mut normalized: Vec<String> = teams.iter().map(|t| normalize_name(t)).collect();
    normalized.sort();
    normalized.join("-")
}

/// Fixed keyword set the classifier detects team candidates from. Real
/// deployments would back this with a reference table; this spec's scope
/// stops at simple name normalization, so the set below covers the sports
/// the classifier distinguishes (basketball, soccer) broadly enough for
/// deterministic behavior on well-known clubs and franchises.
pub const KNOWN_TEAMS: &[&str] = &[
    "Lakers",
    "Suns",
    "Celtics",
    "Warriors",
    "Heat",
    "Bulls",
    "Knicks",
    "Nets",
    "Real Madrid",
    "Barcelona",
    "Arsenal",
    "Chelsea",
    "Liverpool",
    "Manchester United",
    "Manchester City",
    "Tottenham",
    "Bayern Munich",
    "Juventus",
    "PSG",
];

pub const BASKETBALL_KEYWORDS: &[&str] = &[
    "nba", "basketball", "lakers", "celtics", "warriors", "bulls", "knicks", "nets", "heat",
    "suns", "points", "rebounds", "three-pointer", "three pointer", "quarter",
];

pub const SOCCER_KEYWORDS: &[&str] = &[
    "soccer",
    "football",
    "fifa",
    "uefa",
    "premier league",
    "la liga",
    "goal",
    "goals",
    "corner",
    "corners",
    "offside",
    "penalty kick",
];

/// Scan `text` for every entry of `table` (case-insensitive) and return the
/// ones found, in table order (deterministic, not text order).
pub fn find_all_case_insensitive<'a>(text: &str, table: &'a [&'a str]) -> Vec<&'a str> {
    let lower = text.to_lowercase();
    table
        .iter()
        .copied()
        .filter(|needle| lower.contains(&needle.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_name_strips_non_alphanumerics() {
        assert_eq!(normalize_name("Real Madrid C.F."), "realmadridcf");
    }

    #[test]
    fn teams_key_is_order_independent() {
        let a = teams_key(&["Lakers".to_string(), "Suns".to_string()]);
        let b = teams_key(&["Suns".to_string(), "Lakers".to_string()]);
        assert_eq!(a, b);
    }
}
