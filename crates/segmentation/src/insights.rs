//! Segment statistics and the tiered text insights shown next to a preview.

use crm_core::{Customer, CustomerSummary};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentStatistics {
    pub total_spending: f64,
    pub average_spending: f64,
    pub total_visits: u64,
    pub average_visits: f64,
}

impl SegmentStatistics {
    /// Unrounded aggregates over a segment.
    pub fn from_customers(customers: &[Customer]) -> Self {
        if customers.is_empty() {
            return Self::default();
        }
        let count = customers.len() as f64;
        let total_spending: f64 = customers.iter().map(|c| c.total_spending).sum();
        let total_visits: u64 = customers.iter().map(|c| c.visits).sum();
        Self {
            total_spending,
            average_spending: total_spending / count,
            total_visits,
            average_visits: total_visits as f64 / count,
        }
    }

    /// Spending rounded to whole units, average visits to two decimals.
    pub fn rounded(&self) -> Self {
        Self {
            total_spending: self.total_spending.round(),
            average_spending: self.average_spending.round(),
            total_visits: self.total_visits,
            average_visits: round2(self.average_visits),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentInsights {
    pub segment_size: usize,
    /// Size of the whole active customer base.
    pub total_customers: usize,
    pub percentage: f64,
    pub statistics: SegmentStatistics,
    pub insights: Vec<String>,
    pub sample_customers: Vec<CustomerSummary>,
}

const REACH_TIERS: &[(f64, &str)] = &[
    (50.0, "This segment represents a large portion of your customer base"),
    (20.0, "This is a moderately sized segment with good reach potential"),
    (5.0, "This is a focused segment ideal for targeted campaigns"),
];
const REACH_FLOOR: &str = "This is a highly specific segment with limited reach";

const SPEND_TIERS: &[(f64, &str)] = &[
    (10000.0, "High-value customers with strong purchasing power"),
    (5000.0, "Medium-value customers with moderate spending"),
];
const SPEND_FLOOR: &str = "Budget-conscious customers with lower spending";

const VISIT_TIERS: &[(f64, &str)] = &[
    (10.0, "Highly engaged customers with frequent visits"),
    (5.0, "Moderately engaged customers"),
];
const VISIT_FLOOR: &str = "Low engagement customers who may need re-activation";

/// First tier whose threshold is strictly exceeded, else the floor.
fn tier(value: f64, tiers: &[(f64, &'static str)], floor: &'static str) -> &'static str {
    tiers
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .map(|(_, text)| *text)
        .unwrap_or(floor)
}

pub fn reach_insight(percentage: f64) -> &'static str {
    tier(percentage, REACH_TIERS, REACH_FLOOR)
}

pub fn spend_insight(average_spending: f64) -> &'static str {
    tier(average_spending, SPEND_TIERS, SPEND_FLOOR)
}

pub fn visit_insight(average_visits: f64) -> &'static str {
    tier(average_visits, VISIT_TIERS, VISIT_FLOOR)
}

/// Reach, spend and engagement insights, in that order. Thresholds apply to
/// the unrounded figures.
pub fn generate_insights(percentage: f64, stats: &SegmentStatistics) -> Vec<String> {
    vec![
        reach_insight(percentage).to_string(),
        spend_insight(stats.average_spending).to_string(),
        visit_insight(stats.average_visits).to_string(),
    ]
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reach_tiers_are_strict() {
        assert_eq!(reach_insight(75.0), REACH_TIERS[0].1);
        assert_eq!(reach_insight(50.0), REACH_TIERS[1].1);
        assert_eq!(reach_insight(20.5), REACH_TIERS[1].1);
        assert_eq!(reach_insight(20.0), REACH_TIERS[2].1);
        assert_eq!(reach_insight(5.0), REACH_FLOOR);
        assert_eq!(reach_insight(0.0), REACH_FLOOR);
    }

    #[test]
    fn test_spend_and_visit_tiers() {
        assert_eq!(spend_insight(10000.01), "High-value customers with strong purchasing power");
        assert_eq!(spend_insight(10000.0), "Medium-value customers with moderate spending");
        assert_eq!(spend_insight(4999.0), SPEND_FLOOR);
        assert_eq!(visit_insight(11.0), "Highly engaged customers with frequent visits");
        assert_eq!(visit_insight(5.5), "Moderately engaged customers");
        assert_eq!(visit_insight(5.0), VISIT_FLOOR);
    }

    #[test]
    fn test_empty_segment_statistics() {
        let stats = SegmentStatistics::from_customers(&[]);
        assert_eq!(stats, SegmentStatistics::default());
        let insights = generate_insights(0.0, &stats);
        assert_eq!(insights, vec![REACH_FLOOR, SPEND_FLOOR, VISIT_FLOOR]);
    }

    #[test]
    fn test_rounding() {
        let stats = SegmentStatistics {
            total_spending: 10001.6,
            average_spending: 3333.87,
            total_visits: 10,
            average_visits: 3.33333,
        };
        let rounded = stats.rounded();
        assert_eq!(rounded.total_spending, 10002.0);
        assert_eq!(rounded.average_spending, 3334.0);
        assert_eq!(rounded.average_visits, 3.33);
        assert_eq!(round2(33.3333), 33.33);
    }
}
