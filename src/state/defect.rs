// Defect record - immutable snapshot of one non-passing test

use crate::execution::{Test, TestId};
use crate::state::{Category, Condition, ConditionKind};

/// A recorded non-pass outcome together with the condition that caused it
#[derive(Debug, Clone, PartialEq)]
pub struct Defect {
    test_label: String,
    failed_test: Option<TestId>,
    category: Category,
    thrown: Condition,
}

impl Defect {
    /// Snapshot a failed test. The back-reference is dropped for tests that ran in isolation.
    pub fn new(test: &dyn Test, category: Category, thrown: Condition) -> Self {
        let failed_test = if test.in_isolation() {
            None
        } else {
            Some(test.id())
        };

        Self {
            test_label: test.label(),
            failed_test,
            category,
            thrown,
        }
    }

    /// Label of the failed test, e.g. `CalculatorTest::testAdd`
    pub fn test_name(&self) -> &str {
        &self.test_label
    }

    /// Handle of the failed test, absent when it ran in a separate process
    pub fn failed_test(&self) -> Option<TestId> {
        self.failed_test
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn thrown(&self) -> &Condition {
        &self.thrown
    }

    pub fn exception_message(&self) -> &str {
        &self.thrown.message
    }

    pub fn is_failure(&self) -> bool {
        self.thrown.kind.is_assertion_failure()
    }

    /// Condition rendered the way reporters print it
    pub fn exception_as_string(&self) -> String {
        Self::exception_to_string(&self.thrown)
    }

    /// Render a condition: framework conditions describe themselves (plus diff),
    /// runtime conditions are prefixed with their class.
    pub fn exception_to_string(condition: &Condition) -> String {
        match &condition.kind {
            kind if kind.is_self_describing() => {
                let mut buffer = condition.message.clone();
                if let Some(comparison) = &condition.comparison {
                    buffer.push_str(&comparison.diff());
                }
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    String::new()
                } else {
                    format!("{}\n", trimmed)
                }
            }
            ConditionKind::Runtime { class } => format!("{}: {}\n", class, condition.message),
            _ => format!("{}\n", condition.message),
        }
    }
}

impl std::fmt::Display for Defect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.test_label, self.thrown.message)
    }
}
