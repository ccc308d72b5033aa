//! Human-readable failure report for a batch of policies.

use std::fmt;

use serde::Serialize;

use crate::policy::PolicyExecutionResult;

/// Every policy result from a batch that did not fully pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    pub results: Vec<PolicyExecutionResult>,
}

impl FailureReport {
    pub fn new(results: Vec<PolicyExecutionResult>) -> Self {
        FailureReport { results }
    }

    pub fn failed(&self) -> impl Iterator<Item = &PolicyExecutionResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Policy execution failed:")?;
        for result in &self.results {
            let verdict = if result.passed { "PASSED" } else { "FAILED" };
            write!(f, "\n  Policy '{}': {}.", result.policy_name, verdict)?;
            if let Some(e) = &result.error {
                write!(f, " Error: {}.", e)?;
            }
            write!(f, "\n  Rule details:")?;
            for rule in &result.rule_results {
                write!(
                    f,
                    "\n    - Rule: '{}', Status: {}, Details: {}",
                    rule.rule,
                    rule.status.as_str(),
                    rule.details
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Policy, PolicyRegistry};
    use praxis_core::Value;
    use serde_json::json;

    #[test]
    fn renders_each_policy_and_rule() {
        let mut registry = PolicyRegistry::new();
        registry.insert(Policy::new("limites", ["SET $.visto = true", "$.valor > 1000"]));
        registry.insert(Policy::new("ok", ["$.valor > 1"]));
        let mut doc = Value::from(json!({"valor": 150}));
        let names = vec!["ok".to_string(), "limites".to_string()];
        let (results, all) = registry.execute(&mut doc, &names);
        assert!(!all);

        let text = FailureReport::new(results).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Policy execution failed:");
        assert_eq!(lines[1], "  Policy 'ok': PASSED.");
        assert_eq!(lines[2], "  Rule details:");
        assert!(lines[3].starts_with("    - Rule: '$.valor > 1', Status: OK, Details: "));
        assert!(lines[4].starts_with(
            "  Policy 'limites': FAILED. Error: rule condition not met: '$.valor > 1000'."
        ));
        assert_eq!(lines[5], "  Rule details:");
        assert!(lines[6].starts_with("    - Rule: 'SET $.visto = true', Status: OK, "));
        assert!(lines[7].starts_with("    - Rule: '$.valor > 1000', Status: CONDITION_FAILED, "));
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn undefined_policy_has_no_rule_lines() {
        let registry = PolicyRegistry::new();
        let (results, _) = registry.execute(&mut Value::object(), &["nada".to_string()]);
        let report = FailureReport::new(results);
        assert_eq!(report.failed().count(), 1);
        assert_eq!(
            report.to_string(),
            "Policy execution failed:\n  Policy 'nada': FAILED. Error: policy 'nada' is not defined.\n  Rule details:"
        );
    }
}
