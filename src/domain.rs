//! Core value types shared across the resolution pipeline.
//!
//! Everything here is a plain value object: nothing is mutated after
//! construction except the per-host circuit breaker state in
//! `crate::fetcher::breaker`, which lives outside this module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sport bucket used by the classifier and a handful of normalization rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Basketball,
    Soccer,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    DidResultHappen,
    WhoWon,
    PlayerAward,
    Scoreline,
    Other,
}

/// Structured shape produced by the classifier for "who won" style questions.
///
/// Invariant: if `question_type == DidResultHappen`, `teams` is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeQuery {
    pub sport: Sport,
    pub date: Option<String>,
    pub teams: Vec<String>,
    pub player: Option<String>,
    pub competition: Option<String>,
    pub matchday: Option<String>,
    pub question_type: QuestionType,
    pub raw_text: String,
}

impl OutcomeQuery {
    pub fn is_valid(&self) -> bool {
        self.question_type != QuestionType::DidResultHappen || !self.teams.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticQueryType {
    MatchStatistic,
    PlayerStatistic,
    TeamAggregate,
    Threshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticType {
    YellowCards,
    RedCards,
    TotalCards,
    Corners,
    ShotsOnTarget,
    ShotsTotal,
    Fouls,
    Possession,
    Passes,
    PassAccuracy,
    KeyPasses,
    Saves,
    Tackles,
    Interceptions,
    FreeKicks,
    PenaltiesAwarded,
    PenaltiesScored,
    TechnicalFouls,
    FlagrantFouls,
    Turnovers,
    ReboundsOffensive,
    ReboundsDefensive,
    ReboundsTotal,
    Blocks,
    Steals,
    ThreePointersMade,
    ThreePointersAttempted,
    FreeThrowsMade,
    FreeThrowsAttempted,
    MinutesPlayed,
    Penalties,
    PenaltyYards,
    Fumbles,
    Sacks,
    TimeOfPossession,
    ThirdDownConversions,
    RedZoneEfficiency,
    Goals,
    Assists,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Total,
    PerTeam,
    PerPlayer,
    Average,
    Difference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    FullTime,
    FirstHalf,
    SecondHalf,
    ExtraTime,
    Overtime,
    Quarter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Equal,
}

impl Comparator {
    /// Evaluate `lhs <op> rhs` per §8 invariant 8 — comparator semantics are exact.
    pub fn evaluate(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::GreaterThan => lhs > rhs,
            Comparator::GreaterThanOrEqual => lhs >= rhs,
            Comparator::LessThan => lhs < rhs,
            Comparator::LessThanOrEqual => lhs <= rhs,
            Comparator::Equal => (lhs - rhs).abs() < f64::EPSILON,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchEntity {
    pub home: Option<String>,
    pub away: Option<String>,
    pub date: Option<String>,
    pub competition: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticEntities {
    pub r#match: Option<MatchEntity>,
    pub team: Option<String>,
    pub player: Option<String>,
}

/// Structured shape produced by the classifier for statistic questions.
///
/// Invariant: `threshold` and `comparator` are both present iff
/// `query_type == Threshold`. `can_resolve_now` is true iff `event_end_time`
/// exists and is at least 15 minutes in the past.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticQuery {
    pub query_type: StatisticQueryType,
    pub statistic_type: StatisticType,
    pub entities: StatisticEntities,
    pub aggregation: Aggregation,
    pub period: Period,
    pub threshold: Option<f64>,
    pub comparator: Option<Comparator>,
    pub event_end_time: Option<DateTime<Utc>>,
    pub can_resolve_now: bool,
    pub raw_text: String,
}

impl StatisticQuery {
    pub fn is_valid(&self) -> bool {
        let threshold_pair_ok = matches!(self.query_type, StatisticQueryType::Threshold)
            == (self.threshold.is_some() && self.comparator.is_some());
        let resolvability_ok = self.can_resolve_now
            == self
                .event_end_time
                .map(|t| Utc::now() - t >= chrono::Duration::minutes(15))
                .unwrap_or(false);
        threshold_pair_ok && resolvability_ok
    }
}

/// Either structured shape the classifier can produce for one raw query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassifiedQuery {
    Outcome(OutcomeQuery),
    Statistic(StatisticQuery),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl Tier {
    /// Default weight per §3: 0.45/0.30/0.25/0.15 by tier. Advisory metadata
    /// only — consensus selection never reads this.
    pub fn default_weight(&self) -> f64 {
        match self {
            Tier::One => 0.45,
            Tier::Two => 0.30,
            Tier::Three => 0.25,
            Tier::Four => 0.15,
        }
    }
}

/// Raw envelope returned by a single provider fan-out call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub provider: String,
    pub tier: Tier,
    pub weight: f64,
    pub collected_at: DateTime<Utc>,
    pub payload: serde_json::Value,
    pub meta: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCategory {
    Result,
    Scoreline,
    Award,
    News,
    Other,
}

/// Outcome-path normalized record. Carries only the fields a given provider
/// payload could actually populate; absent optional fields mean "unknown",
/// never an empty string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedFact {
    pub provider: String,
    pub canonical_key: String,
    pub display: String,
    pub category: FactCategory,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub winner: Option<String>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub award: Option<String>,
    pub player: Option<String>,
    pub status: Option<String>,
    pub end_timestamp: Option<DateTime<Utc>>,
    pub source_url: Option<String>,
    pub reliability: f64,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Count,
    Percentage,
    Minutes,
    Yards,
    Other,
}

impl Unit {
    /// `tol(unit)`: 4 for percentage, 1 otherwise (glossary).
    pub fn tolerance(&self) -> f64 {
        match self {
            Unit::Percentage => 4.0,
            _ => 1.0,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::Percentage => "%",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticSource {
    pub source: String,
    pub tier: Tier,
    pub weight: f64,
    pub raw_value: String,
    pub parsed_value: f64,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

/// Statistic-path normalized record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedStatistic {
    pub r#type: StatisticType,
    pub team: Option<String>,
    pub player: Option<String>,
    pub r#match: Option<MatchEntity>,
    pub value: f64,
    pub unit: Unit,
    pub period: Period,
    pub aggregation: Aggregation,
    pub sources: Vec<StatisticSource>,
}

/// Group of outcome facts that share a canonical key.
///
/// Invariant: all facts in a group share `canonical_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceGroup {
    pub key: String,
    pub facts: Vec<NormalizedFact>,
    pub providers: Vec<String>,
    pub reliability_average: f64,
}

/// Stats providers per the glossary — used by consensus's `statsProviderCount`.
pub const STATS_PROVIDERS: [&str; 3] = ["OPTA_STATS", "STATSBOMB", "SPORTSRADAR"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticConsensus {
    pub statistic_type: StatisticType,
    pub agreed: bool,
    pub agreed_value: Option<f64>,
    pub unit: Unit,
    pub agreement_count: usize,
    pub variance: f64,
    pub outliers: Vec<StatisticSource>,
    pub tier1_count: usize,
    pub stats_provider_count: usize,
    pub official_source_present: bool,
    pub betting_market_alignment: bool,
    pub supporting_sources: Vec<StatisticSource>,
}

impl StatisticConsensus {
    /// §3 invariant: `agreed ⇒ agreementCount ≥ 3 ∧ statsProviderCount ≥ 1 ∧ variance ≤ tol(unit)`.
    pub fn is_internally_consistent(&self) -> bool {
        if !self.agreed {
            return true;
        }
        self.agreement_count >= 3
            && self.stats_provider_count >= 1
            && self.variance <= self.unit.tolerance()
    }
}

/// Final result returned across the `resolve()` boundary (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub resolution: String,
    pub confidence: f64,
    pub reasoning: String,
    pub sources: Vec<String>,
    pub evidence: crate::evidence::EvidencePayload,
}

pub const INSUFFICIENT_DATA: &str = "insufficient_data";
pub const MIN_CORROBORATING_PROVIDERS: usize = 3;
