//! Policies and the policy registry.
//!
//! A policy is an ordered list of rules. Executing it stops after the
//! first rule that errors, or the first condition rule (anything other
//! than `SET` / `IF`) that does not pass. Every attempted rule is recorded.
//!
//! Rules are parsed once when the policy is built. A rule that fails to
//! parse is kept and reports its parse error when executed.

use std::collections::BTreeMap;

use praxis_core::{parse_rule, ParseError, Rule, Value};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::{LoadError, PolicyError, RuleError};
use crate::evaluate::{evaluate, RuleOutcome};

/// One rule as written, plus its parse.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub text: String,
    parsed: Result<Rule, ParseError>,
}

impl CompiledRule {
    pub fn compile(text: impl Into<String>) -> Self {
        let text = text.into();
        let parsed = parse_rule(text.trim());
        CompiledRule { text, parsed }
    }

    pub fn rule(&self) -> Result<&Rule, &ParseError> {
        self.parsed.as_ref()
    }

    /// `SET` and `IF` rules never halt a policy by evaluating false.
    pub fn is_action(&self) -> bool {
        matches!(&self.parsed, Ok(rule) if rule.is_action())
    }

    pub fn evaluate(&self, doc: &mut Value) -> RuleOutcome {
        match &self.parsed {
            Ok(rule) => evaluate(rule, doc),
            Err(e) => RuleOutcome::failed(
                RuleError::Parse(e.clone()),
                format!("invalid rule: {}", e),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Policy {
    pub name: String,
    pub rules: Vec<CompiledRule>,
}

// ──────────────────────────────────────────────
// Results
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    Ok,
    ConditionFailed,
    ExecutionError,
}

impl RuleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleStatus::Ok => "OK",
            RuleStatus::ConditionFailed => "CONDITION_FAILED",
            RuleStatus::ExecutionError => "EXECUTION_ERROR",
        }
    }
}

fn error_text<E: std::fmt::Display, S: Serializer>(
    error: &Option<E>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleExecutionResult {
    pub rule: String,
    pub executed: bool,
    pub passed: bool,
    pub status: RuleStatus,
    pub details: String,
    #[serde(serialize_with = "error_text")]
    pub error: Option<RuleError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyExecutionResult {
    pub policy_name: String,
    pub passed: bool,
    #[serde(serialize_with = "error_text")]
    pub error: Option<PolicyError>,
    pub rule_results: Vec<RuleExecutionResult>,
}

// ──────────────────────────────────────────────
// Execution
// ──────────────────────────────────────────────

impl Policy {
    pub fn new<I, S>(name: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Policy {
            name: name.into(),
            rules: rules.into_iter().map(CompiledRule::compile).collect(),
        }
    }

    pub fn execute(&self, doc: &mut Value) -> PolicyExecutionResult {
        let mut rule_results = Vec::new();
        let mut error = None;

        for rule in &self.rules {
            let outcome = rule.evaluate(doc);
            let action = rule.is_action();
            debug!(
                policy = %self.name,
                rule = %rule.text,
                passed = outcome.passed,
                "rule evaluated"
            );

            let status = match (&outcome.error, action, outcome.passed) {
                (Some(_), _, _) => RuleStatus::ExecutionError,
                (None, false, false) => RuleStatus::ConditionFailed,
                _ => RuleStatus::Ok,
            };
            let details = match &outcome.error {
                Some(e) => format!("{} (Error: {})", outcome.details, e),
                None => outcome.details.clone(),
            };
            rule_results.push(RuleExecutionResult {
                rule: rule.text.clone(),
                executed: true,
                passed: outcome.passed,
                status,
                details,
                error: outcome.error.clone(),
            });

            if let Some(source) = outcome.error {
                error = Some(PolicyError::RuleFailed {
                    rule: rule.text.clone(),
                    source,
                    details: outcome.details,
                });
                break;
            }
            if !action && !outcome.passed {
                error = Some(PolicyError::ConditionNotMet {
                    rule: rule.text.clone(),
                    details: outcome.details,
                });
                break;
            }
        }

        let passed = error.is_none();
        if let Some(e) = &error {
            warn!(policy = %self.name, error = %e, "policy failed");
        } else {
            debug!(policy = %self.name, rules = rule_results.len(), "policy passed");
        }
        PolicyExecutionResult {
            policy_name: self.name.clone(),
            passed,
            error,
            rule_results,
        }
    }
}

// ──────────────────────────────────────────────
// Registry
// ──────────────────────────────────────────────

/// Named policies, immutable once the engine is built.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<String, Policy>,
}

/// Source format: policy name to ordered rule list.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct PolicySource(BTreeMap<String, Vec<String>>);

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(src: &str) -> Result<Self, LoadError> {
        let source: PolicySource = serde_yaml::from_str(src)?;
        Ok(Self::from_source(source))
    }

    pub fn from_json_str(src: &str) -> Result<Self, LoadError> {
        let source: PolicySource = serde_json::from_str(src)?;
        Ok(Self::from_source(source))
    }

    fn from_source(source: PolicySource) -> Self {
        let mut registry = Self::new();
        for (name, rules) in source.0 {
            registry.insert(Policy::new(name, rules));
        }
        registry
    }

    /// Add or replace a policy.
    pub fn insert(&mut self, policy: Policy) {
        self.policies.insert(policy.name.clone(), policy);
    }

    /// Fold `other` in; its definitions replace same-named ones here.
    pub fn merge(&mut self, other: PolicyRegistry) {
        self.policies.extend(other.policies);
    }

    pub fn get(&self, name: &str) -> Option<&Policy> {
        self.policies.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Policy> {
        self.policies.values()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Run the named policies in order against `doc`.
    ///
    /// Every name is attempted; an unknown name yields a failed entry and
    /// the batch continues. The flag is true only if every policy passed.
    pub fn execute(&self, doc: &mut Value, names: &[String]) -> (Vec<PolicyExecutionResult>, bool) {
        let mut results = Vec::with_capacity(names.len());
        let mut all_passed = true;
        for name in names {
            let result = match self.get(name) {
                Some(policy) => policy.execute(doc),
                None => {
                    warn!(policy = %name, "policy not defined");
                    PolicyExecutionResult {
                        policy_name: name.clone(),
                        passed: false,
                        error: Some(PolicyError::NotDefined { name: name.clone() }),
                        rule_results: Vec::new(),
                    }
                }
            };
            all_passed &= result.passed;
            results.push(result);
        }
        (results, all_passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn stops_at_first_failed_condition() {
        let policy = Policy::new("p", ["$.a > 10", "SET $.b = 1"]);
        let mut doc = Value::from(json!({"a": 5}));
        let result = policy.execute(&mut doc);
        assert!(!result.passed);
        assert_eq!(result.rule_results.len(), 1);
        assert_eq!(result.rule_results[0].status, RuleStatus::ConditionFailed);
        assert!(matches!(
            result.error,
            Some(PolicyError::ConditionNotMet { .. })
        ));
        assert_eq!(doc.get("b"), None);
    }

    #[test]
    fn stops_at_first_error() {
        let policy = Policy::new("p", ["SET $.a.b = 1", "$.x == null", "SET $.c = 2"]);
        let mut doc = Value::from(json!({"a": 5}));
        let result = policy.execute(&mut doc);
        assert!(!result.passed);
        assert_eq!(result.rule_results.len(), 1);
        let rr = &result.rule_results[0];
        assert_eq!(rr.status, RuleStatus::ExecutionError);
        assert!(rr.details.contains("(Error: "));
        let message = result.error.unwrap().to_string();
        assert!(message.starts_with("error executing rule 'SET $.a.b = 1': "));
        assert!(message.contains(". Details: "));
    }

    #[test]
    fn false_if_and_set_count_as_passed() {
        let policy = Policy::new(
            "p",
            [
                "IF $.valor > 1000 THEN SET $.revisao = true",
                "SET $.ok = true",
                "$.ok == true",
            ],
        );
        let mut doc = Value::from(json!({"valor": 10}));
        let result = policy.execute(&mut doc);
        assert!(result.passed, "{:?}", result);
        assert_eq!(result.rule_results.len(), 3);
        assert!(result
            .rule_results
            .iter()
            .all(|r| r.status == RuleStatus::Ok));
    }

    #[test]
    fn top_level_or_makes_an_if_rule_a_condition() {
        let policy = Policy::new(
            "p",
            ["IF $.a > 1 THEN $.b > 5 OR $.c > 5", "SET $.depois = true"],
        );
        assert!(!policy.rules[0].is_action());
        let mut doc = Value::from(json!({"a": 2, "b": 0, "c": 0}));
        let result = policy.execute(&mut doc);
        assert!(!result.passed);
        assert_eq!(result.rule_results.len(), 1);
        assert_eq!(result.rule_results[0].status, RuleStatus::ConditionFailed);
        assert_eq!(doc.get("depois"), None);
    }

    #[test]
    fn unparseable_rule_is_reported_on_execution() {
        let policy = Policy::new("p", ["$.a >"]);
        assert!(policy.rules[0].rule().is_err());
        let result = policy.execute(&mut Value::object());
        assert_eq!(result.rule_results[0].status, RuleStatus::ExecutionError);
        assert!(matches!(
            result.rule_results[0].error,
            Some(RuleError::Parse(_))
        ));
    }

    #[test]
    fn unknown_policy_does_not_abort_batch() {
        let mut registry = PolicyRegistry::new();
        registry.insert(Policy::new("marca", ["SET $.visto = true"]));
        let mut doc = Value::object();
        let (results, all) = registry.execute(&mut doc, &names(&["fantasma", "marca"]));
        assert!(!all);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].error.as_ref().map(ToString::to_string).as_deref(),
            Some("policy 'fantasma' is not defined")
        );
        assert!(results[1].passed);
        assert_eq!(doc.get("visto"), Some(&Value::Bool(true)));
    }

    #[test]
    fn loads_yaml_and_json_sources() {
        let yaml = "validacao:\n  - \"$.valor > 0\"\n  - \"$.moeda IN [BRL, USD]\"\ndesconto:\n  - SET $.desconto = 15.0\n";
        let registry = PolicyRegistry::from_yaml_str(yaml).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("validacao").unwrap().rules.len(), 2);
        assert!(registry.get("desconto").unwrap().rules[0].is_action());

        let json = r#"{"validacao": ["$.valor > 100"]}"#;
        let mut merged = registry.clone();
        merged.merge(PolicyRegistry::from_json_str(json).unwrap());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("validacao").unwrap().rules[0].text, "$.valor > 100");

        assert!(PolicyRegistry::from_yaml_str("- just\n- a list\n").is_err());
        assert!(PolicyRegistry::from_json_str("{").is_err());
    }

    #[test]
    fn results_serialize_with_error_text() {
        let policy = Policy::new("p", ["$.a > 1"]);
        let result = policy.execute(&mut Value::from(json!({"a": "x"})));
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["policyName"], "p");
        assert_eq!(v["ruleResults"][0]["status"], "EXECUTION_ERROR");
        assert!(v["ruleResults"][0]["error"]
            .as_str()
            .unwrap()
            .starts_with("coercion error"));
        assert!(v["error"].as_str().unwrap().starts_with("error executing rule"));
    }
}
