//! Per-operation timeout budgets, independent of the retry engine's own
//! backoff schedule.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub server_create: Duration,
    pub image_available: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            server_create: Duration::from_secs(10 * 60),
            image_available: Duration::from_secs(20 * 60),
            delete: Duration::from_secs(5 * 60),
        }
    }
}
