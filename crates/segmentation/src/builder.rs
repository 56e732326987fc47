//! Rule-set builder. Fluent API for constructing audience rule lists.

use crate::predicates::{Rule, RuleLogic, RuleOperator, RuleValue};

#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<Rule>,
}

impl RuleSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule tagged `AND`.
    pub fn rule(self, field: impl Into<String>, operator: &str, value: impl Into<RuleValue>) -> Self {
        self.push(field, operator, value, RuleLogic::And)
    }

    /// Append a rule tagged `OR`. It joins the OR-bucket unless it ends up
    /// being the first rule that compiles.
    pub fn or_rule(self, field: impl Into<String>, operator: &str, value: impl Into<RuleValue>) -> Self {
        self.push(field, operator, value, RuleLogic::Or)
    }

    pub fn spending_above(self, amount: f64) -> Self {
        self.rule("totalSpending", ">", amount)
    }

    pub fn visits_at_least(self, visits: u64) -> Self {
        self.rule("visits", ">=", visits as i64)
    }

    pub fn in_city(self, city: impl Into<String>) -> Self {
        self.rule("address.city", "=", city.into())
    }

    pub fn tagged(self, tag: impl Into<String>) -> Self {
        self.rule("tags", "contains", tag.into())
    }

    fn push(
        mut self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<RuleValue>,
        logic: RuleLogic,
    ) -> Self {
        self.rules.push(Rule::new(
            field,
            RuleOperator::from(operator.to_string()),
            value,
            logic,
        ));
        self
    }

    pub fn build(self) -> Vec<Rule> {
        self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_preserves_order_and_logic() {
        let rules = RuleSetBuilder::new()
            .spending_above(5000.0)
            .or_rule("visits", ">", 10.0)
            .in_city("Mumbai")
            .build();

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].operator, RuleOperator::GreaterThan);
        assert_eq!(rules[1].logic, RuleLogic::Or);
        assert_eq!(rules[2].field, "address.city");
        assert_eq!(rules[2].value, RuleValue::Text("Mumbai".into()));
    }

    #[test]
    fn test_unknown_operator_string_is_kept() {
        let rules = RuleSetBuilder::new().rule("visits", "~=", 1.0).build();
        assert!(!rules[0].operator.is_recognized());
    }
}
