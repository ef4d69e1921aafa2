//! Backoff policy and per-event deferral budgets.

use std::collections::HashMap;

use crate::types::config::{BackoffStrategy, RetrySettings};

/// How often a deferred event may come back, and how long it waits each time.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub strategy: BackoffStrategy,
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, strategy: BackoffStrategy, base_delay_ms: u64) -> Self {
        RetryPolicy {
            max_retries,
            strategy,
            base_delay_ms,
        }
    }

    /// Delay before re-delivery number `redelivery` (1-based), or `None` once
    /// the budget is spent.
    pub fn backoff(&self, redelivery: u32) -> Option<u64> {
        if redelivery == 0 || redelivery > self.max_retries {
            return None;
        }
        let step = u64::from(redelivery - 1);
        let delay = match self.strategy {
            BackoffStrategy::Fixed => self.base_delay_ms,
            BackoffStrategy::Linear => self.base_delay_ms.saturating_mul(step + 1),
            BackoffStrategy::Exponential => {
                let factor = 2u64.checked_pow(step as u32).unwrap_or(u64::MAX);
                self.base_delay_ms.saturating_mul(factor)
            }
        };
        Some(delay)
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy::new(
            settings.max_retries,
            settings.backoff_strategy,
            settings.base_delay_ms,
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetrySettings::default())
    }
}

/// Consecutive deferrals per event key.
#[derive(Debug, Clone)]
pub struct DeferralBudget {
    policy: RetryPolicy,
    deferrals: HashMap<String, u32>,
}

impl DeferralBudget {
    pub fn new(policy: RetryPolicy) -> Self {
        DeferralBudget {
            policy,
            deferrals: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Count one more deferral of `key`. Returns the delay before the event
    /// should be re-delivered, or `None` when it has used up its retries; in
    /// that case the count is reset so a later delivery starts fresh.
    pub fn defer(&mut self, key: &str) -> Option<u64> {
        let count = self.deferrals.entry(key.to_string()).or_insert(0);
        *count += 1;
        let delay = self.policy.backoff(*count);
        if delay.is_none() {
            self.deferrals.remove(key);
        }
        delay
    }

    /// The event went through without deferring.
    pub fn settle(&mut self, key: &str) {
        self.deferrals.remove(key);
    }

    pub fn deferrals(&self, key: &str) -> u32 {
        self.deferrals.get(key).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_comes_from_settings() {
        let p = RetryPolicy::default();
        assert_eq!(p, RetryPolicy::new(10, BackoffStrategy::Exponential, 1000));
    }

    #[test]
    fn backoff_per_strategy() {
        let fixed = RetryPolicy::new(4, BackoffStrategy::Fixed, 250);
        let linear = RetryPolicy::new(4, BackoffStrategy::Linear, 250);
        let exp = RetryPolicy::new(4, BackoffStrategy::Exponential, 250);
        let delays = |p: &RetryPolicy| (1..=4).map(|n| p.backoff(n)).collect::<Vec<_>>();
        assert_eq!(delays(&fixed), vec![Some(250); 4]);
        assert_eq!(delays(&linear), vec![Some(250), Some(500), Some(750), Some(1000)]);
        assert_eq!(delays(&exp), vec![Some(250), Some(500), Some(1000), Some(2000)]);
    }

    #[test]
    fn backoff_outside_budget() {
        let p = RetryPolicy::new(2, BackoffStrategy::Fixed, 10);
        assert_eq!(p.backoff(0), None);
        assert_eq!(p.backoff(3), None);
        assert_eq!(RetryPolicy::new(0, BackoffStrategy::Fixed, 10).backoff(1), None);
    }

    #[test]
    fn exponential_backoff_saturates() {
        let p = RetryPolicy::new(200, BackoffStrategy::Exponential, 1000);
        assert_eq!(p.backoff(100), Some(u64::MAX));
    }

    #[test]
    fn budget_runs_out_then_resets() {
        let mut budget = DeferralBudget::new(RetryPolicy::new(2, BackoffStrategy::Linear, 100));
        assert_eq!(budget.defer("workload_ready"), Some(100));
        assert_eq!(budget.defer("workload_ready"), Some(200));
        assert_eq!(budget.deferrals("workload_ready"), 2);
        assert_eq!(budget.defer("workload_ready"), None);
        assert_eq!(budget.deferrals("workload_ready"), 0);
    }

    #[test]
    fn settle_clears_one_key() {
        let mut budget = DeferralBudget::new(RetryPolicy::default());
        budget.defer("install");
        budget.defer("url_available:nrf");
        budget.settle("install");
        assert_eq!(budget.deferrals("install"), 0);
        assert_eq!(budget.deferrals("url_available:nrf"), 1);
    }
}
