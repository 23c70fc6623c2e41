//! Service configuration.

use std::time::Duration;

use serde::Deserialize;

/// Tunables for the things service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Lifetime of a group invite, in seconds (default: 7 days).
    pub invite_lifetime_secs: u64,
    /// Deadline [`DeadlineService`](crate::DeadlineService) applies to each
    /// operation, in seconds.
    pub operation_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            invite_lifetime_secs: 7 * 24 * 60 * 60,
            operation_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    pub fn invite_lifetime(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.invite_lifetime_secs).unwrap_or(i64::MAX))
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}
