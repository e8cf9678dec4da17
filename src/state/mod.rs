// State module - run-wide result aggregation
// Collects defects and assertion counts, applies the stop policy and fans every
// lifecycle event out to the registered listeners.

pub mod defect;
pub mod metrics;
pub mod outcome;

pub use defect::Defect;
pub use metrics::ExecutionMetrics;
pub use outcome::{
    Category, ComparisonFailure, Condition, ConditionKind, Outcome, StackFrame, StatusCode,
};

use crate::execution::{Test, TestSuite};
use crate::report::TestListener;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Which defect categories abort the remaining run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopPolicy {
    #[serde(default)]
    pub stop_on_error: bool,
    #[serde(default)]
    pub stop_on_failure: bool,
    #[serde(default)]
    pub stop_on_warning: bool,
    #[serde(default)]
    pub stop_on_risky: bool,
    #[serde(default)]
    pub stop_on_incomplete: bool,
    #[serde(default)]
    pub stop_on_skipped: bool,
}

impl StopPolicy {
    /// Whether recording a defect of this category should stop the run
    pub fn triggers(&self, category: Category) -> bool {
        match category {
            Category::Error => self.stop_on_error || self.stop_on_failure,
            Category::Failure => self.stop_on_failure,
            Category::Warning => self.stop_on_warning,
            Category::Risky => self.stop_on_risky,
            Category::Incomplete => self.stop_on_incomplete,
            Category::Skipped => self.stop_on_skipped,
        }
    }
}

/// Whether runtime notices, warnings and deprecations raised by a test body become errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionConversion {
    pub warnings: bool,
    pub notices: bool,
    pub deprecations: bool,
}

impl Default for ConditionConversion {
    fn default() -> Self {
        Self {
            warnings: true,
            notices: true,
            deprecations: true,
        }
    }
}

impl ConditionConversion {
    /// `false` means the condition is ignored and the test carries on as passed
    pub fn converts(&self, kind: &ConditionKind) -> bool {
        match kind {
            ConditionKind::Warning => self.warnings,
            ConditionKind::Notice => self.notices,
            ConditionKind::Deprecated => self.deprecations,
            _ => true,
        }
    }
}

/// Result aggregate for one run
pub struct TestResults {
    errors: Vec<Defect>,
    warnings: Vec<Defect>,
    failures: Vec<Defect>,
    not_implemented: Vec<Defect>,
    risky: Vec<Defect>,
    skipped: Vec<Defect>,
    run_tests: usize,
    num_assertions: usize,
    stop: bool,
    policy: StopPolicy,
    conversion: ConditionConversion,
    report_useless_tests: bool,
    listeners: Vec<Box<dyn TestListener>>,
    pub metrics: ExecutionMetrics,
}

impl Default for TestResults {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TestResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestResults")
            .field("run_tests", &self.run_tests)
            .field("errors", &self.errors.len())
            .field("failures", &self.failures.len())
            .field("warnings", &self.warnings.len())
            .field("listeners", &self.listeners.len())
            .field("stop", &self.stop)
            .finish()
    }
}

impl TestResults {
    /// Create an empty result with the default policy
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            failures: Vec::new(),
            not_implemented: Vec::new(),
            risky: Vec::new(),
            skipped: Vec::new(),
            run_tests: 0,
            num_assertions: 0,
            stop: false,
            policy: StopPolicy::default(),
            conversion: ConditionConversion::default(),
            report_useless_tests: false,
            listeners: Vec::new(),
            metrics: ExecutionMetrics::default(),
        }
    }

    pub fn with_stop_policy(mut self, policy: StopPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_conversion(mut self, conversion: ConditionConversion) -> Self {
        self.conversion = conversion;
        self
    }

    /// Mark tests that perform no assertions as risky
    pub fn with_report_useless_tests(mut self, enabled: bool) -> Self {
        self.report_useless_tests = enabled;
        self
    }

    pub fn conversion(&self) -> ConditionConversion {
        self.conversion
    }

    pub fn report_useless_tests(&self) -> bool {
        self.report_useless_tests
    }

    /// Register a listener; it receives every event from now on, after those registered before it
    pub fn add_listener(&mut self, listener: Box<dyn TestListener>) {
        self.listeners.push(listener);
        debug!("Registered listener #{}", self.listeners.len());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify<F>(&mut self, mut event: F) -> Result<()>
    where
        F: FnMut(&mut dyn TestListener) -> Result<()>,
    {
        for listener in self.listeners.iter_mut() {
            event(listener.as_mut())?;
        }
        Ok(())
    }

    /// A leaf test is about to run
    pub fn start_test(&mut self, test: &dyn Test) -> Result<()> {
        self.run_tests += test.count();
        self.notify(|l| l.start_test(test))
    }

    /// A leaf test finished; no preceding defect means it passed
    pub fn end_test(&mut self, test: &dyn Test, time: Duration) -> Result<()> {
        self.num_assertions += test.num_assertions();
        self.metrics.test_time += time;
        self.notify(|l| l.end_test(test, time))
    }

    pub fn start_test_suite(&mut self, suite: &TestSuite) -> Result<()> {
        self.notify(|l| l.start_test_suite(suite))
    }

    pub fn end_test_suite(&mut self, suite: &TestSuite) -> Result<()> {
        self.notify(|l| l.end_test_suite(suite))
    }

    pub fn add_error(
        &mut self,
        test: &dyn Test,
        condition: Condition,
        time: Duration,
    ) -> Result<()> {
        self.record(Category::Error, test, condition, time)
    }

    pub fn add_warning(
        &mut self,
        test: &dyn Test,
        condition: Condition,
        time: Duration,
    ) -> Result<()> {
        self.record(Category::Warning, test, condition, time)
    }

    pub fn add_failure(
        &mut self,
        test: &dyn Test,
        condition: Condition,
        time: Duration,
    ) -> Result<()> {
        self.record(Category::Failure, test, condition, time)
    }

    pub fn add_incomplete_test(
        &mut self,
        test: &dyn Test,
        condition: Condition,
        time: Duration,
    ) -> Result<()> {
        self.record(Category::Incomplete, test, condition, time)
    }

    pub fn add_risky_test(
        &mut self,
        test: &dyn Test,
        condition: Condition,
        time: Duration,
    ) -> Result<()> {
        self.record(Category::Risky, test, condition, time)
    }

    pub fn add_skipped_test(
        &mut self,
        test: &dyn Test,
        condition: Condition,
        time: Duration,
    ) -> Result<()> {
        self.record(Category::Skipped, test, condition, time)
    }

    /// Record a classified outcome. `Passed` records nothing.
    pub fn report(&mut self, test: &dyn Test, outcome: Outcome, time: Duration) -> Result<()> {
        match outcome.into_parts() {
            Some((category, condition)) => self.record(category, test, condition, time),
            None => Ok(()),
        }
    }

    /// Single entry point behind the per-category report calls
    pub fn record(
        &mut self,
        category: Category,
        test: &dyn Test,
        condition: Condition,
        time: Duration,
    ) -> Result<()> {
        self.defects_mut(category)
            .push(Defect::new(test, category, condition.clone()));

        if !self.stop && self.policy.triggers(category) {
            debug!("Stop requested after {} in {}", category.noun(), test.label());
            self.stop = true;
        }

        self.notify(|l| dispatch_defect(l, category, test, &condition, time))
    }

    /// Request that no further tests are started
    pub fn stop(&mut self) {
        self.stop = true;
    }

    pub fn should_stop(&self) -> bool {
        self.stop
    }

    /// Mark the end of the run
    pub fn finish(&mut self) {
        self.metrics.finish();
    }

    fn defects_mut(&mut self, category: Category) -> &mut Vec<Defect> {
        match category {
            Category::Error => &mut self.errors,
            Category::Warning => &mut self.warnings,
            Category::Failure => &mut self.failures,
            Category::Incomplete => &mut self.not_implemented,
            Category::Risky => &mut self.risky,
            Category::Skipped => &mut self.skipped,
        }
    }

    /// Defects of one category in discovery order
    pub fn defects(&self, category: Category) -> &[Defect] {
        match category {
            Category::Error => &self.errors,
            Category::Warning => &self.warnings,
            Category::Failure => &self.failures,
            Category::Incomplete => &self.not_implemented,
            Category::Risky => &self.risky,
            Category::Skipped => &self.skipped,
        }
    }

    pub fn errors(&self) -> &[Defect] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Defect] {
        &self.warnings
    }

    pub fn failures(&self) -> &[Defect] {
        &self.failures
    }

    pub fn not_implemented(&self) -> &[Defect] {
        &self.not_implemented
    }

    pub fn risky(&self) -> &[Defect] {
        &self.risky
    }

    pub fn skipped(&self) -> &[Defect] {
        &self.skipped
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn not_implemented_count(&self) -> usize {
        self.not_implemented.len()
    }

    pub fn risky_count(&self) -> usize {
        self.risky.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Number of tests run so far
    pub fn count(&self) -> usize {
        self.run_tests
    }

    pub fn assertion_count(&self) -> usize {
        self.num_assertions
    }

    /// No errors and no failures
    pub fn was_successful(&self) -> bool {
        self.errors.is_empty() && self.failures.is_empty()
    }

    /// No risky tests
    pub fn all_harmless(&self) -> bool {
        self.risky.is_empty()
    }

    /// No incomplete tests
    pub fn all_completely_implemented(&self) -> bool {
        self.not_implemented.is_empty()
    }

    pub fn none_skipped(&self) -> bool {
        self.skipped.is_empty()
    }
}

fn dispatch_defect(
    listener: &mut dyn TestListener,
    category: Category,
    test: &dyn Test,
    condition: &Condition,
    time: Duration,
) -> Result<()> {
    match category {
        Category::Error => listener.add_error(test, condition, time),
        Category::Warning => listener.add_warning(test, condition, time),
        Category::Failure => listener.add_failure(test, condition, time),
        Category::Incomplete => listener.add_incomplete_test(test, condition, time),
        Category::Risky => listener.add_risky_test(test, condition, time),
        Category::Skipped => listener.add_skipped_test(test, condition, time),
    }
}
