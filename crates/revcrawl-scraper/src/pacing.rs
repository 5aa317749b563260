//! Waits between browser actions and the operator interrupt flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use revcrawl_core::AppConfig;

/// Fixed settle delays plus a randomized pause before each product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After navigations and clicks.
    pub settle: Duration,
    /// After applying a star filter.
    pub filter_settle: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Pacing {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            settle: Duration::from_millis(config.page_settle_ms),
            filter_settle: Duration::from_millis(config.filter_settle_ms),
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// No waiting at all.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            settle: Duration::ZERO,
            filter_settle: Duration::ZERO,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub async fn settle(&self) {
        sleep_if_positive(self.settle).await;
    }

    pub async fn settle_filter(&self) {
        sleep_if_positive(self.filter_settle).await;
    }

    /// Sleep for a uniformly random duration in `[min_delay, max_delay]`.
    pub async fn random_delay(&self) {
        sleep_if_positive(self.pick_delay()).await;
    }

    #[must_use]
    pub fn pick_delay(&self) -> Duration {
        let min = u64::try_from(self.min_delay.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        if max <= min {
            return self.min_delay;
        }
        Duration::from_millis(rand::random_range(min..=max))
    }
}

async fn sleep_if_positive(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Shared flag set when the operator asks the run to stop.
///
/// Checked between products, facets and pages; never mid-extraction.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
