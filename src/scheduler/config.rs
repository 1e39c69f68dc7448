//! Scheduler configuration

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which processes request entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// Only processes at an even position in the view
    #[default]
    EvenIndex,

    /// Every process
    Always,
}

impl Eligibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Eligibility::EvenIndex => "even_index",
            Eligibility::Always => "always",
        }
    }

    pub fn admits(&self, index: usize) -> bool {
        match self {
            Eligibility::EvenIndex => index % 2 == 0,
            Eligibility::Always => true,
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between ticks
    pub interval: Duration,

    /// Upper bound of the random delay added to every tick and backoff
    pub jitter: Duration,

    pub eligibility: Eligibility,

    /// No requests while the group is smaller than this
    pub min_group_size: usize,

    /// Pause after an abandoned attempt before the next tick
    pub retry_backoff: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            jitter: Duration::ZERO,
            eligibility: Eligibility::EvenIndex,
            min_group_size: 4,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_eligibility(mut self, eligibility: Eligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    pub fn with_min_group_size(mut self, min_group_size: usize) -> Self {
        self.min_group_size = min_group_size;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    /// Whether the process at `index` of a group of `group_size` may request.
    pub fn is_eligible(&self, index: usize, group_size: usize) -> bool {
        group_size >= self.min_group_size && self.eligibility.admits(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.eligibility, Eligibility::EvenIndex);
        assert_eq!(config.min_group_size, 4);
    }

    #[test]
    fn test_even_index_policy() {
        let config = SchedulerConfig::default();

        assert!(config.is_eligible(0, 4));
        assert!(config.is_eligible(2, 4));
        assert!(!config.is_eligible(1, 4));
        assert!(!config.is_eligible(3, 5));
    }

    #[test]
    fn test_small_group_never_eligible() {
        let config = SchedulerConfig::default();
        assert!(!config.is_eligible(0, 3));

        let config = config.with_min_group_size(1);
        assert!(config.is_eligible(0, 1));
    }

    #[test]
    fn test_always_policy() {
        let config = SchedulerConfig::default().with_eligibility(Eligibility::Always);
        assert!(config.is_eligible(1, 4));
        assert!(config.is_eligible(3, 4));
    }

    #[test]
    fn test_eligibility_serde() {
        let parsed: Eligibility = serde_json::from_str("\"always\"").unwrap();
        assert_eq!(parsed, Eligibility::Always);
        assert_eq!(serde_json::to_string(&Eligibility::EvenIndex).unwrap(), "\"even_index\"");
    }
}
