// Composite test: an ordered list of child tests

use crate::execution::{Test, TestId};
use crate::filter::GroupFilter;
use crate::state::TestResults;
use anyhow::Result;
use std::collections::BTreeMap;

/// Group name used for tests that carry no group
pub const DEFAULT_GROUP: &str = "default";

/// Ordered collection of tests, itself runnable
pub struct TestSuite {
    id: TestId,
    name: String,
    tests: Vec<Box<dyn Test>>,
    run_test_in_separate_process: bool,
}

impl std::fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSuite")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tests", &self.tests.len())
            .finish()
    }
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TestId::next(),
            name: name.into(),
            tests: Vec::new(),
            run_test_in_separate_process: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_test(&mut self, test: Box<dyn Test>) {
        self.tests.push(test);
    }

    /// Builder-style `add_test`
    pub fn with_test(mut self, test: impl Test + 'static) -> Self {
        self.tests.push(Box::new(test));
        self
    }

    pub fn tests(&self) -> &[Box<dyn Test>] {
        &self.tests
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn set_run_test_in_separate_process(&mut self, enabled: bool) {
        self.run_test_in_separate_process = enabled;
    }

    pub fn run_test_in_separate_process(&self) -> bool {
        self.run_test_in_separate_process
    }

    /// Index of every group to the ids of the tests tagged with it, nested suites included
    pub fn group_details(&self) -> BTreeMap<String, Vec<TestId>> {
        let mut details: BTreeMap<String, Vec<TestId>> = BTreeMap::new();

        for test in &self.tests {
            if let Some(suite) = test.as_suite() {
                for (group, ids) in suite.group_details() {
                    details.entry(group).or_default().extend(ids);
                }
                continue;
            }

            let mut groups = test.groups();
            if groups.is_empty() {
                groups.push(DEFAULT_GROUP.to_string());
            }
            for group in groups {
                details.entry(group).or_default().push(test.id());
            }
        }

        details
    }

    /// Drop every leaf the filter rejects, recursing into nested suites
    pub fn apply_filter(&mut self, filter: &GroupFilter) {
        self.tests.retain(|test| filter.accept(test.as_ref()));

        for test in self.tests.iter_mut() {
            if let Some(suite) = test.as_suite_mut() {
                suite.apply_filter(filter);
            }
        }
    }
}

impl Test for TestSuite {
    fn id(&self) -> TestId {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn count(&self) -> usize {
        self.tests.iter().map(|t| t.count()).sum()
    }

    fn run(&mut self, result: &mut TestResults) -> Result<()> {
        result.start_test_suite(self)?;

        for test in self.tests.iter_mut() {
            if result.should_stop() {
                break;
            }

            if self.run_test_in_separate_process {
                test.set_run_in_separate_process(true);
            }

            test.run(result)?;
        }

        result.end_test_suite(self)
    }

    fn groups(&self) -> Vec<String> {
        self.group_details().into_keys().collect()
    }

    fn set_run_in_separate_process(&mut self, enabled: bool) {
        self.run_test_in_separate_process = enabled;
    }

    fn as_suite(&self) -> Option<&TestSuite> {
        Some(self)
    }

    fn as_suite_mut(&mut self) -> Option<&mut TestSuite> {
        Some(self)
    }
}
