//! Process-wide per-host circuit breaker map (§3 `CircuitBreaker`, §5).
//!
//! Modeled as a concurrent map keyed by hostname with a small critical
//! section per entry, mirroring the teacher's own note that shared mutable
//! state ("per-host kill switch" in the original `DataSourceKillSwitch`)
//! should use one lock per affected resource rather than a single global
//! lock. The host set is small and bounded, so entries are never evicted.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

/// `{failures, openedAt}` per §3. `opened_at` is `None` while closed.
#[derive(Debug, Clone, Copy)]
struct BreakerState {
    failures: u32,
    opened_at: Option<Instant>,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            failures: 0,
            opened_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BreakerPolicy {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_millis(15_000),
        }
    }
}

/// Shared table of per-host breakers. Cheap to clone (wrap in `Arc` at the
/// call site); internal state is behind `RwLock`/`Mutex`.
pub struct HostBreakers {
    policy: BreakerPolicy,
    table: RwLock<HashMap<String, Mutex<BreakerState>>>,
}

impl HostBreakers {
    pub fn new(policy: BreakerPolicy) -> Self {
        Self {
            policy,
            table: RwLock::new(HashMap::new()),
        }
    }

    fn with_entry<R>(&self, host: &str, f: impl FnOnce(&mut BreakerState) -> R) -> R {
        if let Some(entry) = self.table.read().unwrap().get(host) {
            return f(&mut entry.lock().unwrap());
        }
        let mut table = self.table.write().unwrap();
        let entry = table
            .entry(host.to_string())
            .or_insert_with(|| Mutex::new(BreakerState::closed()));
        f(&mut entry.lock().unwrap())
    }

    /// Closed → (failures ≥ threshold) → open → (cooldown elapsed) → closed.
    /// Once `opened_at` is set, reads of `is_open` stay monotone until the
    /// cooldown elapses (failure counts may briefly overshoot the threshold
    /// under contention; that is benign).
    pub fn is_open(&self, host: &str) -> bool {
        self.with_entry(host, |state| match state.opened_at {
            Some(opened_at) => opened_at.elapsed() <= self.policy.cooldown,
            None => false,
        })
    }

    pub fn record_success(&self, host: &str) {
        self.with_entry(host, |state| {
            state.failures = 0;
            state.opened_at = None;
        });
    }

    pub fn record_failure(&self, host: &str) {
        self.with_entry(host, |state| {
            state.failures += 1;
            if state.failures >= self.policy.failure_threshold && state.opened_at.is_none() {
                state.opened_at = Some(Instant::now());
            }
        });
    }
}

impl Default for HostBreakers {
    fn default() -> Self {
        Self::new(BreakerPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let breakers = HostBreakers::new(BreakerPolicy {
            failure_threshold: 3,
            cooldown: Duration::from_millis(50),
        });

        assert!(!breakers.is_open("api.example.com"));
        breakers.record_failure("api.example.com");
        breakers.record_failure("api.example.com");
        assert!(!breakers.is_open("api.example.com"));
        breakers.record_failure("api.example.com");
        assert!(breakers.is_open("api.example.com"));
    }

    #[test]
    fn closes_after_cooldown_elapses() {
        let breakers = HostBreakers::new(BreakerPolicy {
            failure_threshold: 1,
            cooldown: Duration::from_millis(20),
        });
        breakers.record_failure("flaky.example.com");
        assert!(breakers.is_open("flaky.example.com"));
        sleep(Duration::from_millis(30));
        assert!(!breakers.is_open("flaky.example.com"));
    }

    #[test]
    fn success_resets_failure_count() {
        let breakers = HostBreakers::new(BreakerPolicy::default());
        breakers.record_failure("api.example.com");
        breakers.record_failure("api.example.com");
        breakers.record_success("api.example.com");
        breakers.record_failure("api.example.com");
        assert!(!breakers.is_open("api.example.com"));
    }

    #[test]
    fn hosts_are_independent() {
        let breakers = HostBreakers::new(BreakerPolicy {
            failure_threshold: 1,
            cooldown: Duration::from_secs(60),
        });
        breakers.record_failure("a.example.com");
        assert!(breakers.is_open("a.example.com"));
        assert!(!breakers.is_open("b.example.com"));
    }
}
