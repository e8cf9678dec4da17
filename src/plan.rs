// Replay plan - a scripted test tree loaded from JSON
//
// Each case replays a recorded outcome instead of executing real test code,
// which lets the whole observation layer be driven from the command line.

use crate::error::FrameworkError;
use crate::execution::{TestCase, TestMetadata, TestSize, TestSuite};
use crate::state::{Condition, StackFrame};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    pub name: String,
    #[serde(default)]
    pub tests: Vec<PlanEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanEntry {
    Suite { suite: TestPlan },
    /// Placeholder for a test that could not be loaded
    Warning { warning: String },
    Case(CasePlan),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasePlan {
    pub class: String,
    pub name: String,
    #[serde(default)]
    pub data_set: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub tickets: Vec<String>,
    #[serde(default)]
    pub size: TestSize,
    #[serde(default)]
    pub assertions: usize,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub expected_output: Option<String>,
    #[serde(default)]
    pub outcome: Option<ScriptedOutcome>,
}

/// Outcome a case reports when replayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedOutcome {
    pub status: String,
    #[serde(default)]
    pub message: String,
    /// Runtime class name for `error`
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub actual: Option<String>,
    #[serde(default)]
    pub trace: Vec<StackFrame>,
    #[serde(default)]
    pub previous: Option<Box<ScriptedOutcome>>,
}

impl ScriptedOutcome {
    /// `None` for a scripted pass
    fn to_condition(&self) -> Result<Option<Condition>, FrameworkError> {
        let message = self.message.clone();
        let condition = match self.status.as_str() {
            "pass" | "passed" => return Ok(None),
            "failure" | "fail" => match (&self.expected, &self.actual) {
                (Some(expected), Some(actual)) => {
                    Condition::expectation_failed(message, expected.as_str(), actual.as_str())
                }
                _ => Condition::assertion_failed(message),
            },
            "error" => Condition::runtime(
                self.class.clone().unwrap_or_else(|| "Exception".to_string()),
                message,
            ),
            "warning" => Condition::warning(message),
            "notice" => Condition::notice(message),
            "deprecated" => Condition::deprecated(message),
            "incomplete" => Condition::incomplete(message),
            "risky" => Condition::risky(message),
            "skipped" => Condition::skipped(message),
            other => {
                return Err(FrameworkError::InvalidPlan(format!(
                    "unknown outcome status '{}'",
                    other
                )));
            }
        };

        let mut condition = condition;
        condition.trace = self.trace.clone();

        if let Some(previous) = &self.previous {
            match previous.to_condition()? {
                Some(cause) => condition = condition.caused_by(cause),
                None => {
                    return Err(FrameworkError::InvalidPlan(
                        "a previous condition cannot be a pass".to_string(),
                    ));
                }
            }
        }

        Ok(Some(condition))
    }
}

impl TestPlan {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse test plan")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read test plan: {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid test plan: {}", path.display()))
    }

    /// Build the runnable tree. Every scripted outcome is validated up front.
    pub fn into_suite(self) -> Result<TestSuite, FrameworkError> {
        let mut suite = TestSuite::new(self.name);

        for entry in self.tests {
            match entry {
                PlanEntry::Suite { suite: nested } => {
                    suite.add_test(Box::new(nested.into_suite()?))
                }
                PlanEntry::Warning { warning } => {
                    suite.add_test(Box::new(TestCase::warning(warning)))
                }
                PlanEntry::Case(case) => suite.add_test(Box::new(case.into_test()?)),
            }
        }

        Ok(suite)
    }
}

impl CasePlan {
    fn into_test(self) -> Result<TestCase, FrameworkError> {
        if self.class.is_empty() || self.name.is_empty() {
            return Err(FrameworkError::InvalidPlan(
                "test cases need a class and a name".to_string(),
            ));
        }

        let condition = match &self.outcome {
            Some(outcome) => outcome.to_condition()?,
            None => None,
        };
        let assertions = self.assertions;
        let output = self.output;

        let mut test = TestCase::new(self.class, self.name, move |ctx| {
            ctx.add_to_assertion_count(assertions);
            if let Some(output) = &output {
                ctx.print(output);
            }
            match &condition {
                Some(condition) => Err(condition.clone()),
                None => Ok(()),
            }
        })
        .with_metadata(TestMetadata {
            groups: self.groups,
            tickets: self.tickets,
            size: self.size,
            file: self.file,
        });

        if let Some(data_set) = self.data_set {
            test = test.with_data_set(data_set);
        }
        if let Some(expected) = self.expected_output {
            test = test.expect_output_string(expected);
        }

        Ok(test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::Test;

    const PLAN: &str = r##"{
        "name": "Bank",
        "tests": [
            {"class": "AccountTest", "name": "testDeposit", "assertions": 2, "groups": ["fast"]},
            {"class": "AccountTest", "name": "testWithdraw", "tickets": ["42"],
             "outcome": {"status": "error", "class": "RuntimeException", "message": "boom",
                         "trace": [{"file": "tests/account.rs", "line": 12}],
                         "previous": {"status": "failure", "message": "root cause"}}},
            {"suite": {"name": "Nested", "tests": [
                {"class": "LedgerTest", "name": "testSum", "data_set": "#1", "size": "small"}
            ]}},
            {"warning": "No tests found in class \"EmptyTest\"."}
        ]
    }"##;

    #[test]
    fn test_plan_builds_tree() {
        let suite = TestPlan::from_json(PLAN).unwrap().into_suite().unwrap();

        assert_eq!(suite.name(), "Bank");
        assert_eq!(suite.count(), 4);
        assert_eq!(suite.tests()[2].label(), "Nested");
    }

    #[test]
    fn test_replayed_outcomes() {
        let mut suite = TestPlan::from_json(PLAN).unwrap().into_suite().unwrap();
        let results = suite.run_with_new_result().unwrap();

        assert_eq!(results.count(), 4);
        assert_eq!(results.assertion_count(), 2);
        assert_eq!(results.error_count(), 1);
        assert_eq!(results.warning_count(), 1);

        let error = &results.errors()[0];
        assert_eq!(error.test_name(), "AccountTest::testWithdraw");
        assert_eq!(error.thrown().trace[0].line, 12);
        assert_eq!(error.thrown().causes().count(), 1);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let plan = r#"{"name": "x", "tests": [
            {"class": "A", "name": "testA", "outcome": {"status": "exploded"}}
        ]}"#;

        let err = TestPlan::from_json(plan).unwrap().into_suite().unwrap_err();
        assert!(matches!(err, FrameworkError::InvalidPlan(_)));
    }

    #[test]
    fn test_expectation_failure_carries_comparison() {
        let plan = r#"{"name": "x", "tests": [
            {"class": "A", "name": "testEq", "outcome":
                {"status": "failure", "message": "not equal", "expected": "1", "actual": "2"}}
        ]}"#;

        let mut suite = TestPlan::from_json(plan).unwrap().into_suite().unwrap();
        let results = suite.run_with_new_result().unwrap();

        assert!(results.failures()[0].thrown().comparison.is_some());
    }
}
