//! Outcome consensus (§4.6): group by `canonicalKey`, pick the largest
//! provider-count group, tie-break by reliability.

use crate::domain::{EvidenceGroup, NormalizedFact, MIN_CORROBORATING_PROVIDERS};
use std::collections::BTreeMap;

const FINAL_STATUS_MARKERS: &[&str] = &[
    "ft", "fulltime", "finished", "final", "completed", "after overtime", "aet", "ended", "finale",
];

fn is_final_fact(fact: &NormalizedFact) -> bool {
    if fact.category == crate::domain::FactCategory::News {
        return true;
    }
    fact.status
        .as_deref()
        .map(|s| {
            let lower = s.to_lowercase();
            FINAL_STATUS_MARKERS.iter().any(|m| lower.contains(m))
        })
        .unwrap_or(false)
}

/// `groups, acceptedKey?, conflicts` — deterministic over input permutation:
/// grouping by a `BTreeMap` keyed on `canonical_key` makes ordering
/// independent of fact arrival order (§8 invariant 5).
pub struct OutcomeConsensus {
    pub groups: Vec<EvidenceGroup>,
    pub accepted_key: Option<String>,
    pub conflicts: usize,
}

pub fn resolve_outcome_consensus(facts: &[NormalizedFact]) -> OutcomeConsensus {
    let final_facts: Vec<&NormalizedFact> = facts.iter().filter(|f| is_final_fact(f)).collect();
    let pool: Vec<&NormalizedFact> = if final_facts.is_empty() {
        facts.iter().collect()
    } else {
        final_facts
    };

    let mut by_key: BTreeMap<String, Vec<&NormalizedFact>> = BTreeMap::new();
    for fact in &pool {
        by_key.entry(fact.canonical_key.clone()).or_default().push(fact);
    }

    let mut groups: Vec<EvidenceGroup> = by_key
        .into_iter()
        .map(|(key, facts)| {
            let mut providers: Vec<String> = facts.iter().map(|f| f.provider.clone()).collect();
            providers.sort();
            providers.dedup();
            let reliability_average = facts.iter().map(|f| f.reliability).sum::<f64>() / facts.len() as f64;
            EvidenceGroup {
                key,
                facts: facts.into_iter().cloned().collect(),
                providers,
                reliability_average,
            }
        })
        .collect();

    groups.sort_by(|a, b| a.key.cmp(&b.key));

    let accepted = groups
        .iter()
        .max_by(|a, b| {
            a.providers
                .len()
                .cmp(&b.providers.len())
                .then(a.reliability_average.partial_cmp(&b.reliability_average).unwrap_or(std::cmp::Ordering::Equal))
        })
        .cloned();

    let accepted_key = accepted
        .as_ref()
        .filter(|g| g.providers.len() >= MIN_CORROBORATING_PROVIDERS)
        .map(|g| g.key.clone());

    let conflicts = groups
        .iter()
        .filter(|g| Some(&g.key) != accepted.as_ref().map(|a| &a.key) && !g.providers.is_empty())
        .count();

    OutcomeConsensus {
        groups,
        accepted_key,
        conflicts,
    }
}
