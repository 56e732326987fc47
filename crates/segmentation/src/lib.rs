//! Audience segmentation: rule compilation, AND/OR grouping, audience
//! evaluation and segment insights.

pub mod builder;
pub mod engine;
pub mod grouping;
pub mod insights;
pub mod predicates;

pub use builder::RuleSetBuilder;
pub use engine::{Audience, AudienceEvaluator, AudiencePreview, CustomerSource};
pub use grouping::{group_conditions, AudienceFilter};
pub use insights::{SegmentInsights, SegmentStatistics};
pub use predicates::{compile_rule, Condition, CustomerField, Rule, RuleLogic, RuleOperator, RuleValue};
