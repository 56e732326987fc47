//! Logic grouper. Folds compiled conditions into one audience filter.
//!
//! The policy is flat: every contributing rule lands either in a
//! single AND-bucket or a single OR-bucket, and the two buckets are ANDed.
//! There is no precedence and no nesting, so `(A OR B) AND (C OR D)` cannot
//! be expressed. The first contributing rule always goes to the AND-bucket
//! because there is nothing before it to combine with.

use crm_core::Customer;

use crate::predicates::{compile_rule, Condition, Rule, RuleLogic};

#[derive(Debug, Clone, PartialEq)]
pub enum AudienceFilter {
    /// No rule produced a condition.
    MatchAll,
    All(Vec<Condition>),
    Any(Vec<Condition>),
    /// `AND(all..., OR(any...))`
    AllWithAny {
        all: Vec<Condition>,
        any: Vec<Condition>,
    },
}

impl AudienceFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        match self {
            AudienceFilter::MatchAll => true,
            AudienceFilter::All(all) => all.iter().all(|c| c.matches(customer)),
            AudienceFilter::Any(any) => any.iter().any(|c| c.matches(customer)),
            AudienceFilter::AllWithAny { all, any } => {
                all.iter().all(|c| c.matches(customer)) && any.iter().any(|c| c.matches(customer))
            }
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, AudienceFilter::MatchAll)
    }
}

/// Compile each rule and bucket its condition by the rule's logic tag.
pub fn group_conditions(rules: &[Rule]) -> AudienceFilter {
    let compiled = rules
        .iter()
        .filter_map(|rule| compile_rule(rule).map(|condition| (rule.logic, condition)));

    let mut all = Vec::new();
    let mut any = Vec::new();
    for (index, (logic, condition)) in compiled.enumerate() {
        if index > 0 && logic == RuleLogic::Or {
            any.push(condition);
        } else {
            all.push(condition);
        }
    }

    match (all.is_empty(), any.is_empty()) {
        (true, true) => AudienceFilter::MatchAll,
        (false, true) => AudienceFilter::All(all),
        (true, false) => AudienceFilter::Any(any),
        (false, false) => AudienceFilter::AllWithAny { all, any },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::RuleOperator;

    fn r(field: &str, op: RuleOperator, value: f64, logic: RuleLogic) -> Rule {
        Rule::new(field, op, value, logic)
    }

    #[test]
    fn test_no_rules_is_identity() {
        assert!(group_conditions(&[]).is_match_all());
    }

    #[test]
    fn test_only_skipped_rules_is_identity() {
        let rules = vec![Rule::new(
            "visits",
            RuleOperator::Unrecognized("between".into()),
            3.0,
            RuleLogic::And,
        )];
        assert!(group_conditions(&rules).is_match_all());
    }

    #[test]
    fn test_first_rule_logic_is_ignored() {
        let rules = vec![r("visits", RuleOperator::GreaterThan, 5.0, RuleLogic::Or)];
        match group_conditions(&rules) {
            AudienceFilter::All(all) => assert_eq!(all.len(), 1),
            other => panic!("expected AND bucket, got {other:?}"),
        }
    }

    #[test]
    fn test_or_rules_are_bucketed_regardless_of_position() {
        let rules = vec![
            r("totalSpending", RuleOperator::GreaterThan, 1000.0, RuleLogic::And),
            r("visits", RuleOperator::GreaterThan, 5.0, RuleLogic::Or),
            r("visits", RuleOperator::LessThan, 50.0, RuleLogic::And),
            r("totalSpending", RuleOperator::LessThan, 100.0, RuleLogic::Or),
        ];
        match group_conditions(&rules) {
            AudienceFilter::AllWithAny { all, any } => {
                assert_eq!(all.len(), 2);
                assert_eq!(any.len(), 2);
            }
            other => panic!("expected AND + OR buckets, got {other:?}"),
        }
    }

    #[test]
    fn test_skipped_first_rule_promotes_next_to_and_bucket() {
        let rules = vec![
            Rule::new("visits", RuleOperator::Unrecognized("~".into()), 1.0, RuleLogic::And),
            r("visits", RuleOperator::GreaterThan, 5.0, RuleLogic::Or),
            r("totalSpending", RuleOperator::GreaterThan, 10.0, RuleLogic::Or),
        ];
        match group_conditions(&rules) {
            AudienceFilter::AllWithAny { all, any } => {
                assert_eq!(all.len(), 1);
                assert_eq!(any.len(), 1);
            }
            other => panic!("expected AND + OR buckets, got {other:?}"),
        }
    }
}
