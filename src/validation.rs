//! Validation (§4.5): range rules and cross-statistic logical rules over a
//! list of `NormalizedStatistic`.

use crate::domain::{NormalizedStatistic, StatisticType};

struct Range {
    min: f64,
    max: f64,
    typical: (f64, f64),
}

fn range_for(stat: StatisticType) -> Range {
    match stat {
        StatisticType::YellowCards | StatisticType::RedCards => Range { min: 0.0, max: 12.0, typical: (0.0, 6.0) },
        StatisticType::TotalCards => Range { min: 0.0, max: 16.0, typical: (0.0, 8.0) },
        StatisticType::Corners => Range { min: 0.0, max: 25.0, typical: (3.0, 14.0) },
        StatisticType::ShotsOnTarget => Range { min: 0.0, max: 30.0, typical: (1.0, 12.0) },
        StatisticType::ShotsTotal => Range { min: 0.0, max: 45.0, typical: (5.0, 25.0) },
        StatisticType::Fouls => Range { min: 0.0, max: 40.0, typical: (5.0, 20.0) },
        StatisticType::Possession | StatisticType::PassAccuracy | StatisticType::RedZoneEfficiency | StatisticType::TimeOfPossession => {
            Range { min: 0.0, max: 100.0, typical: (20.0, 80.0) }
        }
        StatisticType::Passes => Range { min: 0.0, max: 1000.0, typical: (200.0, 700.0) },
        StatisticType::KeyPasses => Range { min: 0.0, max: 30.0, typical: (0.0, 10.0) },
        StatisticType::Saves => Range { min: 0.0, max: 20.0, typical: (0.0, 8.0) },
        StatisticType::Tackles => Range { min: 0.0, max: 60.0, typical: (5.0, 25.0) },
        StatisticType::Interceptions => Range { min: 0.0, max: 40.0, typical: (2.0, 15.0) },
        StatisticType::FreeKicks => Range { min: 0.0, max: 30.0, typical: (3.0, 15.0) },
        StatisticType::PenaltiesAwarded | StatisticType::PenaltiesScored | StatisticType::Penalties => {
            Range { min: 0.0, max: 4.0, typical: (0.0, 2.0) }
        }
        StatisticType::TechnicalFouls | StatisticType::FlagrantFouls => Range { min: 0.0, max: 8.0, typical: (0.0, 3.0) },
        StatisticType::Turnovers => Range { min: 0.0, max: 35.0, typical: (8.0, 20.0) },
        StatisticType::ReboundsOffensive | StatisticType::ReboundsDefensive => Range { min: 0.0, max: 40.0, typical: (5.0, 20.0) },
        StatisticType::ReboundsTotal => Range { min: 0.0, max: 80.0, typical: (30.0, 55.0) },
        StatisticType::Blocks => Range { min: 0.0, max: 20.0, typical: (0.0, 10.0) },
        StatisticType::Steals => Range { min: 0.0, max: 25.0, typical: (2.0, 12.0) },
        StatisticType::ThreePointersMade => Range { min: 0.0, max: 30.0, typical: (3.0, 18.0) },
        StatisticType::ThreePointersAttempted => Range { min: 0.0, max: 60.0, typical: (10.0, 40.0) },
        StatisticType::FreeThrowsMade | StatisticType::FreeThrowsAttempted => Range { min: 0.0, max: 60.0, typical: (5.0, 30.0) },
        StatisticType::MinutesPlayed => Range { min: 0.0, max: 48.0, typical: (5.0, 42.0) },
        StatisticType::PenaltyYards => Range { min: 0.0, max: 150.0, typical: (20.0, 90.0) },
        StatisticType::Fumbles => Range { min: 0.0, max: 10.0, typical: (0.0, 4.0) },
        StatisticType::Sacks => Range { min: 0.0, max: 12.0, typical: (0.0, 6.0) },
        StatisticType::ThirdDownConversions => Range { min: 0.0, max: 20.0, typical: (3.0, 12.0) },
        StatisticType::Goals => Range { min: 0.0, max: 15.0, typical: (0.0, 6.0) },
        StatisticType::Assists => Range { min: 0.0, max: 15.0, typical: (0.0, 8.0) },
        StatisticType::Other => Range { min: f64::MIN, max: f64::MAX, typical: (f64::MIN, f64::MAX) },
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub within_range: bool,
    pub logically_consistent: bool,
    pub warnings: Vec<String>,
    pub invalid_sources: Vec<String>,
}

fn validate_ranges(stats: &[NormalizedStatistic], report: &mut ValidationReport) {
    for stat in stats {
        let range = range_for(stat.r#type);
        for source in &stat.sources {
            let v = source.parsed_value;
            if v < range.min || v > range.max {
                report.within_range = false;
                report.invalid_sources.push(source.source.clone());
            } else if v < range.typical.0 || v > range.typical.1 {
                report.warnings.push(format!(
                    "Unusual value: {} reported {} for {:?}",
                    source.source, v, stat.r#type
                ));
            }
        }
    }
}

fn find_value(stats: &[NormalizedStatistic], stat_type: StatisticType) -> Option<f64> {
    stats.iter().find(|s| s.r#type == stat_type).map(|s| s.value)
}

fn validate_logic(stats: &[NormalizedStatistic], report: &mut ValidationReport) {
    if let (Some(sot), Some(total)) = (
        find_value(stats, StatisticType::ShotsOnTarget),
        find_value(stats, StatisticType::ShotsTotal),
    ) {
        if sot > total {
            report.logically_consistent = false;
            report.warnings.push("shots_on_target exceeds shots_total".to_string());
        }
    }
    if let (Some(goals), Some(sot)) = (
        find_value(stats, StatisticType::Goals),
        find_value(stats, StatisticType::ShotsOnTarget),
    ) {
        if goals > sot {
            report.logically_consistent = false;
            report.warnings.push("goals exceed shots_on_target".to_string());
        }
    }
    if let (Some(yellow), Some(red), Some(total)) = (
        find_value(stats, StatisticType::YellowCards),
        find_value(stats, StatisticType::RedCards),
        find_value(stats, StatisticType::TotalCards),
    ) {
        if (yellow + red - total).abs() > f64::EPSILON {
            report.logically_consistent = false;
            report.warnings.push("yellow_cards + red_cards != total_cards".to_string());
        }
    }

    let possession_rows: Vec<&NormalizedStatistic> = stats
        .iter()
        .filter(|s| s.r#type == StatisticType::Possession)
        .collect();
    if possession_rows.len() == 2 {
        let sum: f64 = possession_rows.iter().map(|s| s.value).sum();
        if (sum - 100.0).abs() > 2.0 {
            report.logically_consistent = false;
            report.warnings.push(format!("possession rows sum to {sum}, expected ~100"));
        }
    }
}

/// `{withinRange, logicallyConsistent, warnings, invalidSources}` (§4.5).
pub fn validate(stats: &[NormalizedStatistic]) -> ValidationReport {
    let mut report = ValidationReport {
        within_range: true,
        logically_consistent: true,
        warnings: Vec::new(),
        invalid_sources: Vec::new(),
    };
    validate_ranges(stats, &mut report);
    validate_logic(stats, &mut report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Aggregation, MatchEntity, Period, StatisticSource, Unit};
    use chrono::Utc;
    use std::collections::HashMap;

    fn stat(stat_type: StatisticType, value: f64) -> NormalizedStatistic {
        NormalizedStatistic {
            r#type: stat_type,
            team: None,
            player: None,
            r#match: None::<MatchEntity>,
            value,
            unit: Unit::Count,
            period: Period::FullTime,
            aggregation: Aggregation::Total,
            sources: vec![StatisticSource {
                source: "OPTA_STATS".to_string(),
                tier: crate::domain::Tier::One,
                weight: 0.45,
                raw_value: value.to_string(),
                parsed_value: value,
                timestamp: Utc::now(),
                metadata: HashMap::new(),
            }],
        }
    }

    #[test]
    fn shots_on_target_exceeding_total_is_inconsistent() {
        let stats = vec![stat(StatisticType::ShotsOnTarget, 10.0), stat(StatisticType::ShotsTotal, 6.0)];
        let report = validate(&stats);
        assert!(!report.logically_consistent);
    }

    #[test]
    fn card_sum_rule_holds() {
        let stats = vec![
            stat(StatisticType::YellowCards, 3.0),
            stat(StatisticType::RedCards, 1.0),
            stat(StatisticType::TotalCards, 4.0),
        ];
        let report = validate(&stats);
        assert!(report.logically_consistent);
    }

    #[test]
    fn out_of_range_value_marks_source_invalid() {
        let stats = vec![stat(StatisticType::YellowCards, 99.0)];
        let report = validate(&stats);
        assert!(!report.within_range);
        assert_eq!(report.invalid_sources, vec!["OPTA_STATS".to_string()]);
    }
}
