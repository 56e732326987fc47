//! Audience evaluator. Applies a rule list to the customer store.

use crm_core::{Customer, CustomerSummary};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grouping::{group_conditions, AudienceFilter};
use crate::insights::{generate_insights, round2, SegmentInsights, SegmentStatistics};
use crate::predicates::Rule;

/// Read access to the customer collection. Implementations return every
/// customer the predicate accepts and must not mutate anything.
pub trait CustomerSource: Send + Sync {
    fn find_customers(&self, predicate: &dyn Fn(&Customer) -> bool) -> Vec<Customer>;

    fn count_customers(&self, predicate: &dyn Fn(&Customer) -> bool) -> usize {
        self.find_customers(predicate).len()
    }
}

impl CustomerSource for Vec<Customer> {
    fn find_customers(&self, predicate: &dyn Fn(&Customer) -> bool) -> Vec<Customer> {
        self.iter().filter(|c| predicate(c)).cloned().collect()
    }

    fn count_customers(&self, predicate: &dyn Fn(&Customer) -> bool) -> usize {
        self.iter().filter(|c| predicate(c)).count()
    }
}

/// The customers a rule list resolves to, oldest record first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Audience {
    pub customers: Vec<Customer>,
}

impl Audience {
    pub fn size(&self) -> usize {
        self.customers.len()
    }

    pub fn sample(&self, n: usize) -> Vec<CustomerSummary> {
        self.customers.iter().take(n).map(CustomerSummary::from).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudiencePreview {
    pub audience_size: usize,
    pub sample_customers: Vec<CustomerSummary>,
}

pub struct AudienceEvaluator {
    preview_sample_size: usize,
    insights_sample_size: usize,
}

impl AudienceEvaluator {
    pub fn new(preview_sample_size: usize, insights_sample_size: usize) -> Self {
        Self {
            preview_sample_size,
            insights_sample_size,
        }
    }

    /// Active customers matching the rules. Inactive and blocked customers
    /// are excluded whatever the rules say.
    pub fn evaluate(&self, source: &dyn CustomerSource, rules: &[Rule]) -> Audience {
        let filter = group_conditions(rules);
        let mut customers = source.find_customers(&|c: &Customer| c.is_active() && filter.matches(c));
        customers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        metrics::counter!("crm.audience.evaluations").increment(1);
        debug!(rules = rules.len(), matched = customers.len(), "Evaluated audience");
        Audience { customers }
    }

    /// Size of the audience without materializing it.
    pub fn audience_size(&self, source: &dyn CustomerSource, rules: &[Rule]) -> usize {
        let filter: AudienceFilter = group_conditions(rules);
        metrics::counter!("crm.audience.evaluations").increment(1);
        source.count_customers(&|c: &Customer| c.is_active() && filter.matches(c))
    }

    pub fn preview(&self, source: &dyn CustomerSource, rules: &[Rule]) -> AudiencePreview {
        let audience = self.evaluate(source, rules);
        AudiencePreview {
            audience_size: audience.size(),
            sample_customers: audience.sample(self.preview_sample_size),
        }
    }

    pub fn insights(&self, source: &dyn CustomerSource, rules: &[Rule]) -> SegmentInsights {
        let total_customers = source.count_customers(&|c: &Customer| c.is_active());
        let audience = self.evaluate(source, rules);
        let segment_size = audience.size();

        let stats = SegmentStatistics::from_customers(&audience.customers);
        let percentage = if total_customers > 0 {
            segment_size as f64 / total_customers as f64 * 100.0
        } else {
            0.0
        };

        SegmentInsights {
            segment_size,
            total_customers,
            percentage: round2(percentage),
            insights: generate_insights(percentage, &stats),
            statistics: stats.rounded(),
            sample_customers: audience.sample(self.insights_sample_size),
        }
    }
}

impl Default for AudienceEvaluator {
    fn default() -> Self {
        Self::new(10, 5)
    }
}
