//! Campaign dispatch. Turns an audience size into delivery stats.
//!
//! Nothing is actually sent: [`SimulatedDispatcher`] applies fixed delivery,
//! open and click rates and reports when the run should be marked complete.

use std::time::Duration;

use crm_core::CampaignConfig;

use crate::models::CampaignStats;

/// Outcome of dispatching a campaign to its audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub stats: CampaignStats,
    /// How long after the start the run should transition to completed.
    pub completes_after: Duration,
}

pub trait CampaignDispatcher: Send + Sync {
    fn dispatch(&self, audience_size: u64) -> Dispatch;
}

#[derive(Debug, Clone)]
pub struct SimulatedDispatcher {
    pub delivery_rate: f64,
    pub open_rate: f64,
    pub click_rate: f64,
    pub completion_delay: Duration,
}

impl SimulatedDispatcher {
    pub fn from_config(config: &CampaignConfig) -> Self {
        Self {
            delivery_rate: config.delivery_rate,
            open_rate: config.open_rate,
            click_rate: config.click_rate,
            completion_delay: Duration::from_millis(config.completion_delay_ms),
        }
    }

    /// Deterministic funnel: each stage is the floor of the previous one
    /// times its rate.
    pub fn simulate(&self, audience_size: u64) -> CampaignStats {
        let sent = audience_size;
        let delivered = apply_rate(sent, self.delivery_rate);
        let opened = apply_rate(delivered, self.open_rate);
        let clicked = apply_rate(opened, self.click_rate);
        CampaignStats {
            sent,
            delivered,
            opened,
            clicked,
            failed: sent - delivered,
            unsubscribed: 0,
        }
    }
}

impl Default for SimulatedDispatcher {
    fn default() -> Self {
        Self::from_config(&CampaignConfig::default())
    }
}

impl CampaignDispatcher for SimulatedDispatcher {
    fn dispatch(&self, audience_size: u64) -> Dispatch {
        Dispatch {
            stats: self.simulate(audience_size),
            completes_after: self.completion_delay,
        }
    }
}

// Clamped so a misconfigured rate can never make a stage exceed the one before.
fn apply_rate(count: u64, rate: f64) -> u64 {
    let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
    ((count as f64 * rate).floor() as u64).min(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundred_recipients() {
        let stats = SimulatedDispatcher::default().simulate(100);
        assert_eq!(stats.sent, 100);
        assert_eq!(stats.delivered, 95);
        assert_eq!(stats.failed, 5);
        assert_eq!(stats.opened, 23);
        assert_eq!(stats.clicked, 1);
        assert_eq!(stats.unsubscribed, 0);
    }

    #[test]
    fn test_empty_audience() {
        let stats = SimulatedDispatcher::default().simulate(0);
        assert_eq!(stats, CampaignStats::default());
    }

    #[test]
    fn test_small_audiences_floor_each_stage() {
        let stats = SimulatedDispatcher::default().simulate(7);
        // 7 * 0.95 = 6.65, 6 * 0.25 = 1.5, 1 * 0.05 = 0.05
        assert_eq!((stats.delivered, stats.failed, stats.opened, stats.clicked), (6, 1, 1, 0));
    }

    #[test]
    fn test_dispatch_reports_configured_delay() {
        let config = CampaignConfig {
            completion_delay_ms: 250,
            ..CampaignConfig::default()
        };
        let dispatch = SimulatedDispatcher::from_config(&config).dispatch(20);
        assert_eq!(dispatch.completes_after, Duration::from_millis(250));
        assert_eq!(dispatch.stats.delivered, 19);
    }

    #[test]
    fn test_out_of_range_rates_are_clamped() {
        let dispatcher = SimulatedDispatcher {
            delivery_rate: 1.5,
            open_rate: -0.2,
            click_rate: f64::NAN,
            completion_delay: Duration::ZERO,
        };
        let stats = dispatcher.simulate(10);
        assert_eq!((stats.delivered, stats.opened, stats.clicked, stats.failed), (10, 0, 0, 0));
    }
}
