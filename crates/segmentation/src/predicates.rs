//! Audience rules and the predicate compiler that turns one rule into a
//! single-field condition over a [`Customer`].

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use crm_core::Customer;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ─── Rule model ─────────────────────────────────────────────────────────────

/// One declarative comparison, as posted by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub field: String,
    pub operator: RuleOperator,
    pub value: RuleValue,
    #[serde(default)]
    pub logic: RuleLogic,
}

impl Rule {
    pub fn new(
        field: impl Into<String>,
        operator: RuleOperator,
        value: impl Into<RuleValue>,
        logic: RuleLogic,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            logic,
        }
    }
}

/// Comparison operator. Strings outside the recognized set deserialize into
/// [`RuleOperator::Unrecognized`] so the compiler can skip the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleOperator {
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Equals,
    NotEquals,
    Contains,
    NotContains,
    Unrecognized(String),
}

impl RuleOperator {
    pub fn as_str(&self) -> &str {
        match self {
            RuleOperator::GreaterThan => ">",
            RuleOperator::LessThan => "<",
            RuleOperator::GreaterThanOrEqual => ">=",
            RuleOperator::LessThanOrEqual => "<=",
            RuleOperator::Equals => "=",
            RuleOperator::NotEquals => "!=",
            RuleOperator::Contains => "contains",
            RuleOperator::NotContains => "not_contains",
            RuleOperator::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, RuleOperator::Unrecognized(_))
    }
}

impl From<String> for RuleOperator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            ">" => RuleOperator::GreaterThan,
            "<" => RuleOperator::LessThan,
            ">=" => RuleOperator::GreaterThanOrEqual,
            "<=" => RuleOperator::LessThanOrEqual,
            "=" => RuleOperator::Equals,
            "!=" => RuleOperator::NotEquals,
            "contains" => RuleOperator::Contains,
            "not_contains" => RuleOperator::NotContains,
            _ => RuleOperator::Unrecognized(raw),
        }
    }
}

impl From<RuleOperator> for String {
    fn from(op: RuleOperator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for RuleOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule combines with the rules before it. Anything other than `"OR"`
/// is treated as `AND`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleLogic {
    #[default]
    And,
    Or,
}

impl From<String> for RuleLogic {
    fn from(raw: String) -> Self {
        if raw == "OR" {
            RuleLogic::Or
        } else {
            RuleLogic::And
        }
    }
}

impl From<RuleLogic> for String {
    fn from(logic: RuleLogic) -> Self {
        match logic {
            RuleLogic::And => "AND".to_string(),
            RuleLogic::Or => "OR".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Number(f64),
    Text(String),
}

impl RuleValue {
    /// Numeric coercion: numbers as-is, numeric strings parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RuleValue::Number(n) if n.is_finite() => Some(*n),
            RuleValue::Number(_) => None,
            RuleValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// Instant coercion: epoch milliseconds, RFC 3339, `YYYY-MM-DDTHH:MM:SS`
    /// (read as UTC) or a bare `YYYY-MM-DD` (UTC midnight).
    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            RuleValue::Number(n) if n.is_finite() => DateTime::from_timestamp_millis(*n as i64),
            RuleValue::Number(_) => None,
            RuleValue::Text(s) => parse_instant(s.trim()),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            RuleValue::Number(n) => number_text(*n),
            RuleValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for RuleValue {
    fn from(n: f64) -> Self {
        RuleValue::Number(n)
    }
}

impl From<i64> for RuleValue {
    fn from(n: i64) -> Self {
        RuleValue::Number(n as f64)
    }
}

impl From<&str> for RuleValue {
    fn from(s: &str) -> Self {
        RuleValue::Text(s.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(s: String) -> Self {
        RuleValue::Text(s)
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render a number the way the dashboard shows it (`1000`, not `1000.0`).
fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ─── Customer fields ────────────────────────────────────────────────────────

/// Customer attributes a rule may reference. Names follow the JSON shape of
/// a customer record; anything else lands in `Unknown` and never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CustomerField {
    Name,
    Email,
    Phone,
    TotalSpending,
    Visits,
    LastPurchaseDate,
    RegistrationDate,
    Status,
    Tags,
    City,
    State,
    Country,
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Instant,
    Text,
    TextList,
}

/// The value of a field read off one customer.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Instant(Option<DateTime<Utc>>),
    Text(Option<&'a str>),
    TextList(&'a [String]),
}

impl CustomerField {
    pub fn parse(name: &str) -> Self {
        match name {
            "name" => CustomerField::Name,
            "email" => CustomerField::Email,
            "phone" => CustomerField::Phone,
            "totalSpending" => CustomerField::TotalSpending,
            "visits" => CustomerField::Visits,
            "lastPurchaseDate" => CustomerField::LastPurchaseDate,
            "registrationDate" => CustomerField::RegistrationDate,
            "status" => CustomerField::Status,
            "tags" => CustomerField::Tags,
            "address.city" => CustomerField::City,
            "address.state" => CustomerField::State,
            "address.country" => CustomerField::Country,
            other => CustomerField::Unknown(other.to_string()),
        }
    }

    /// `None` for unknown fields.
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            CustomerField::TotalSpending | CustomerField::Visits => Some(FieldKind::Number),
            CustomerField::LastPurchaseDate | CustomerField::RegistrationDate => {
                Some(FieldKind::Instant)
            }
            CustomerField::Tags => Some(FieldKind::TextList),
            CustomerField::Unknown(_) => None,
            _ => Some(FieldKind::Text),
        }
    }

    pub fn read<'a>(&self, customer: &'a Customer) -> Option<FieldValue<'a>> {
        let value = match self {
            CustomerField::Name => FieldValue::Text(Some(&customer.name)),
            CustomerField::Email => FieldValue::Text(Some(&customer.email)),
            CustomerField::Phone => FieldValue::Text(customer.phone.as_deref()),
            CustomerField::TotalSpending => FieldValue::Number(customer.total_spending),
            CustomerField::Visits => FieldValue::Number(customer.visits as f64),
            CustomerField::LastPurchaseDate => FieldValue::Instant(customer.last_purchase_date),
            CustomerField::RegistrationDate => {
                FieldValue::Instant(Some(customer.registration_date))
            }
            CustomerField::Status => FieldValue::Text(Some(customer.status.as_str())),
            CustomerField::Tags => FieldValue::TextList(&customer.tags),
            CustomerField::City => FieldValue::Text(customer.address.city.as_deref()),
            CustomerField::State => FieldValue::Text(customer.address.state.as_deref()),
            CustomerField::Country => FieldValue::Text(customer.address.country.as_deref()),
            CustomerField::Unknown(_) => return None,
        };
        Some(value)
    }
}

// ─── Conditions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

impl Comparison {
    fn holds<T: PartialOrd>(&self, actual: T, expected: T) -> bool {
        match self {
            Comparison::Greater => actual > expected,
            Comparison::Less => actual < expected,
            Comparison::GreaterOrEqual => actual >= expected,
            Comparison::LessOrEqual => actual <= expected,
        }
    }
}

/// A typed operand, already coerced to the field's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Instant(DateTime<Utc>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Test {
    Compare(Comparison, Operand),
    Equals(Operand),
    NotEquals(Operand),
    /// Half-open `[start, end)` window.
    Within {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Lowercased needle.
    Contains(String),
    NotContains(String),
    /// Unknown field, or a value that could not be coerced.
    Never,
    /// `!=` against a value no stored field value can equal.
    Always,
}

/// A compiled single-field predicate over a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: CustomerField,
    pub test: Test,
}

impl Condition {
    fn never(field: CustomerField) -> Self {
        Self {
            field,
            test: Test::Never,
        }
    }

    pub fn matches(&self, customer: &Customer) -> bool {
        match self.test {
            Test::Never => return false,
            Test::Always => return true,
            _ => {}
        }
        let Some(value) = self.field.read(customer) else {
            return false;
        };
        match value {
            FieldValue::Number(n) => self.test_number(n),
            FieldValue::Instant(at) => self.test_instant(at),
            FieldValue::Text(text) => self.test_text(text),
            FieldValue::TextList(items) => self.test_list(items),
        }
    }

    fn test_number(&self, actual: f64) -> bool {
        match &self.test {
            Test::Compare(ord, Operand::Number(expected)) => ord.holds(actual, *expected),
            Test::Equals(Operand::Number(expected)) => actual == *expected,
            Test::NotEquals(Operand::Number(expected)) => actual != *expected,
            Test::Contains(needle) => contains_ci(&number_text(actual), needle),
            Test::NotContains(needle) => !contains_ci(&number_text(actual), needle),
            _ => false,
        }
    }

    fn test_instant(&self, actual: Option<DateTime<Utc>>) -> bool {
        match (&self.test, actual) {
            (Test::Compare(ord, Operand::Instant(expected)), Some(at)) => ord.holds(at, *expected),
            (Test::Equals(Operand::Instant(expected)), Some(at)) => at == *expected,
            (Test::NotEquals(Operand::Instant(_)), None) => true,
            (Test::NotEquals(Operand::Instant(expected)), Some(at)) => at != *expected,
            (Test::Within { start, end }, Some(at)) => at >= *start && at < *end,
            (Test::Contains(needle), Some(at)) => contains_ci(&instant_text(at), needle),
            (Test::NotContains(_), None) => true,
            (Test::NotContains(needle), Some(at)) => !contains_ci(&instant_text(at), needle),
            _ => false,
        }
    }

    fn test_text(&self, actual: Option<&str>) -> bool {
        match (&self.test, actual) {
            (Test::Equals(Operand::Text(expected)), Some(text)) => text == expected,
            (Test::NotEquals(Operand::Text(_)), None) => true,
            (Test::NotEquals(Operand::Text(expected)), Some(text)) => text != expected,
            (Test::Contains(needle), Some(text)) => contains_ci(text, needle),
            (Test::NotContains(_), None) => true,
            (Test::NotContains(needle), Some(text)) => !contains_ci(text, needle),
            _ => false,
        }
    }

    // Array semantics: positive tests match if any element does, negated
    // tests only if no element does.
    fn test_list(&self, items: &[String]) -> bool {
        match &self.test {
            Test::Equals(Operand::Text(expected)) => items.iter().any(|t| t == expected),
            Test::NotEquals(Operand::Text(expected)) => items.iter().all(|t| t != expected),
            Test::Contains(needle) => items.iter().any(|t| contains_ci(t, needle)),
            Test::NotContains(needle) => !items.iter().any(|t| contains_ci(t, needle)),
            _ => false,
        }
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn instant_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ─── Compiler ───────────────────────────────────────────────────────────────

/// Compile one rule into a condition.
///
/// Returns `None` when the operator is not recognized; such rules contribute
/// nothing to the audience filter. Unknown fields and values that cannot be
/// coerced to the field's type compile to a condition that matches nobody,
/// except under `!=`, where such a value differs from every customer.
pub fn compile_rule(rule: &Rule) -> Option<Condition> {
    if !rule.operator.is_recognized() {
        debug!(field = %rule.field, operator = %rule.operator, "Skipping rule with unrecognized operator");
        return None;
    }

    let field = CustomerField::parse(&rule.field);
    let Some(kind) = field.kind() else {
        debug!(field = %rule.field, "Rule references unknown customer field");
        return Some(Condition::never(field));
    };

    let test = match &rule.operator {
        RuleOperator::GreaterThan => compare(kind, Comparison::Greater, &rule.value),
        RuleOperator::LessThan => compare(kind, Comparison::Less, &rule.value),
        RuleOperator::GreaterThanOrEqual => compare(kind, Comparison::GreaterOrEqual, &rule.value),
        RuleOperator::LessThanOrEqual => compare(kind, Comparison::LessOrEqual, &rule.value),
        RuleOperator::Equals if field == CustomerField::LastPurchaseDate => {
            same_day(&rule.value)
        }
        RuleOperator::Equals => operand(kind, &rule.value).map(Test::Equals),
        RuleOperator::NotEquals => Some(operand(kind, &rule.value).map_or(Test::Always, Test::NotEquals)),
        RuleOperator::Contains => Some(Test::Contains(rule.value.as_text().to_lowercase())),
        RuleOperator::NotContains => Some(Test::NotContains(rule.value.as_text().to_lowercase())),
        RuleOperator::Unrecognized(_) => return None,
    };

    Some(Condition {
        field,
        test: test.unwrap_or(Test::Never),
    })
}

fn compare(kind: FieldKind, ord: Comparison, value: &RuleValue) -> Option<Test> {
    let operand = match kind {
        FieldKind::Number => Operand::Number(value.as_number()?),
        FieldKind::Instant => Operand::Instant(value.as_instant()?),
        FieldKind::Text | FieldKind::TextList => return None,
    };
    Some(Test::Compare(ord, operand))
}

fn operand(kind: FieldKind, value: &RuleValue) -> Option<Operand> {
    match kind {
        FieldKind::Number => value.as_number().map(Operand::Number),
        FieldKind::Instant => value.as_instant().map(Operand::Instant),
        FieldKind::Text | FieldKind::TextList => Some(Operand::Text(value.as_text())),
    }
}

/// Day-granularity equality: `[value 00:00, value + 1 day 00:00)` in UTC.
fn same_day(value: &RuleValue) -> Option<Test> {
    let start = value
        .as_instant()?
        .date_naive()
        .and_hms_opt(0, 0, 0)?
        .and_utc();
    let end = start.checked_add_signed(Duration::days(1))?;
    Some(Test::Within { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crm_core::CustomerStatus;
    use uuid::Uuid;

    fn customer(spending: f64, visits: u64) -> Customer {
        let now = Utc::now();
        Customer {
            id: Uuid::new_v4(),
            name: "Priya Sharma".to_string(),
            email: "priya.sharma@example.com".to_string(),
            phone: None,
            total_spending: spending,
            visits,
            last_purchase_date: None,
            registration_date: now,
            status: CustomerStatus::Active,
            tags: vec!["customer".to_string(), "Premium".to_string()],
            address: Default::default(),
            preferences: Default::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn rule(field: &str, op: &str, value: RuleValue) -> Rule {
        Rule {
            field: field.to_string(),
            operator: RuleOperator::from(op.to_string()),
            value,
            logic: RuleLogic::And,
        }
    }

    #[test]
    fn test_rule_deserializes_from_dashboard_json() {
        let rule: Rule = serde_json::from_value(serde_json::json!({
            "field": "totalSpending",
            "operator": ">=",
            "value": 5000
        }))
        .unwrap();
        assert_eq!(rule.operator, RuleOperator::GreaterThanOrEqual);
        assert_eq!(rule.value, RuleValue::Number(5000.0));
        assert_eq!(rule.logic, RuleLogic::And);

        let odd: Rule = serde_json::from_value(serde_json::json!({
            "field": "visits",
            "operator": "between",
            "value": "3",
            "logic": "OR"
        }))
        .unwrap();
        assert_eq!(odd.operator, RuleOperator::Unrecognized("between".to_string()));
        assert_eq!(odd.logic, RuleLogic::Or);
    }

    #[test]
    fn test_numeric_operators() {
        let c = customer(1500.0, 5);
        let gt = compile_rule(&rule("totalSpending", ">", 1000.0.into())).unwrap();
        let lt = compile_rule(&rule("totalSpending", "<", 1500.0.into())).unwrap();
        let gte = compile_rule(&rule("visits", ">=", "5".into())).unwrap();
        let lte = compile_rule(&rule("visits", "<=", 4.0.into())).unwrap();
        assert!(gt.matches(&c));
        assert!(!lt.matches(&c));
        assert!(gte.matches(&c));
        assert!(!lte.matches(&c));
    }

    #[test]
    fn test_non_numeric_value_matches_nothing() {
        let cond = compile_rule(&rule("totalSpending", ">", "lots".into())).unwrap();
        assert_eq!(cond.test, Test::Never);
        assert!(!cond.matches(&customer(1_000_000.0, 1)));
    }

    #[test]
    fn test_unrecognized_operator_is_skipped() {
        assert!(compile_rule(&rule("totalSpending", "between", 10.0.into())).is_none());
        assert!(compile_rule(&rule("name", "startsWith", "Pr".into())).is_none());
    }

    #[test]
    fn test_unknown_field_never_matches() {
        let c = customer(100.0, 1);
        for op in [">", "=", "!=", "contains", "not_contains"] {
            let cond = compile_rule(&rule("age", op, 30.0.into())).unwrap();
            assert!(!cond.matches(&c), "operator {op} on unknown field matched");
        }
    }

    #[test]
    fn test_last_purchase_date_equality_covers_whole_day() {
        let cond = compile_rule(&rule("lastPurchaseDate", "=", "2024-01-15".into())).unwrap();
        let mut c = customer(0.0, 0);

        c.last_purchase_date = Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
        assert!(cond.matches(&c));
        c.last_purchase_date = Some(Utc.with_ymd_and_hms(2024, 1, 15, 13, 45, 10).unwrap());
        assert!(cond.matches(&c));
        c.last_purchase_date =
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 59).unwrap() + Duration::milliseconds(999));
        assert!(cond.matches(&c));
        c.last_purchase_date = Some(Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap());
        assert!(!cond.matches(&c));
        c.last_purchase_date = Some(Utc.with_ymd_and_hms(2024, 1, 14, 23, 59, 59).unwrap());
        assert!(!cond.matches(&c));
        c.last_purchase_date = None;
        assert!(!cond.matches(&c));
    }

    #[test]
    fn test_registration_date_equality_is_exact() {
        let mut c = customer(0.0, 0);
        c.registration_date = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        let day = compile_rule(&rule("registrationDate", "=", "2024-01-15".into())).unwrap();
        assert!(!day.matches(&c));
        let exact =
            compile_rule(&rule("registrationDate", "=", "2024-01-15T09:30:00Z".into())).unwrap();
        assert!(exact.matches(&c));
    }

    #[test]
    fn test_date_ordering_accepts_iso_dates() {
        let mut c = customer(0.0, 0);
        c.last_purchase_date = Some(Utc.with_ymd_and_hms(2023, 11, 2, 8, 0, 0).unwrap());
        let before = compile_rule(&rule("lastPurchaseDate", "<", "2024-01-01".into())).unwrap();
        assert!(before.matches(&c));
        c.last_purchase_date = None;
        assert!(!before.matches(&c));
    }

    #[test]
    fn test_literal_equality_and_inequality() {
        let c = customer(250.0, 3);
        assert!(compile_rule(&rule("visits", "=", 3.0.into())).unwrap().matches(&c));
        assert!(compile_rule(&rule("visits", "=", "3".into())).unwrap().matches(&c));
        assert!(compile_rule(&rule("name", "=", "Priya Sharma".into())).unwrap().matches(&c));
        assert!(!compile_rule(&rule("name", "=", "priya sharma".into())).unwrap().matches(&c));
        assert!(compile_rule(&rule("status", "!=", "blocked".into())).unwrap().matches(&c));
        // A missing phone is "not equal" to anything.
        assert!(compile_rule(&rule("phone", "!=", "+911234".into())).unwrap().matches(&c));
        // No number equals "lots", so everyone is unequal to it.
        let unequal = compile_rule(&rule("totalSpending", "!=", "lots".into())).unwrap();
        assert_eq!(unequal.test, Test::Always);
        assert!(unequal.matches(&customer(1500.0, 2)));
        assert!(compile_rule(&rule("lastPurchaseDate", "!=", "someday".into())).unwrap().matches(&c));
        assert!(!compile_rule(&rule("totalSpending", ">", "lots".into())).unwrap().matches(&c));
    }

    #[test]
    fn test_same_day_on_last_representable_day() {
        let millis = DateTime::<Utc>::MAX_UTC.timestamp_millis();
        let cond = compile_rule(&rule("lastPurchaseDate", "=", RuleValue::Number(millis as f64))).unwrap();
        assert_eq!(cond.test, Test::Never);
        assert!(!cond.matches(&customer(0.0, 0)));
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let c = customer(1000.0, 1);
        assert!(compile_rule(&rule("email", "contains", "SHARMA".into())).unwrap().matches(&c));
        assert!(!compile_rule(&rule("email", "not_contains", "Example".into())).unwrap().matches(&c));
        assert!(compile_rule(&rule("totalSpending", "contains", 100.0.into())).unwrap().matches(&c));
        // Missing text never contains; it always "does not contain".
        assert!(!compile_rule(&rule("address.city", "contains", "mum".into())).unwrap().matches(&c));
        assert!(compile_rule(&rule("address.city", "not_contains", "mum".into())).unwrap().matches(&c));
    }

    #[test]
    fn test_tags_use_array_semantics() {
        let c = customer(0.0, 0);
        assert!(compile_rule(&rule("tags", "contains", "premium".into())).unwrap().matches(&c));
        assert!(!compile_rule(&rule("tags", "not_contains", "prem".into())).unwrap().matches(&c));
        assert!(compile_rule(&rule("tags", "=", "customer".into())).unwrap().matches(&c));
        assert!(!compile_rule(&rule("tags", "!=", "customer".into())).unwrap().matches(&c));
    }
}
