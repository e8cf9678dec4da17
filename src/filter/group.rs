// Group filter - selects leaf tests by group membership

use crate::execution::{Test, TestId, TestSuite};
use std::collections::HashSet;
use tracing::debug;

/// Whether membership in the selected groups keeps or drops a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Include,
    Exclude,
}

/// Selection predicate over a test tree.
///
/// The membership set is computed once, at construction, from the suite's
/// group index. Suites are always accepted so pruning can reach their leaves.
#[derive(Debug, Clone)]
pub struct GroupFilter {
    mode: FilterMode,
    group_tests: HashSet<TestId>,
}

impl GroupFilter {
    pub fn new<S: AsRef<str>>(mode: FilterMode, groups: &[S], suite: &TestSuite) -> Self {
        let details = suite.group_details();
        let group_tests: HashSet<TestId> = groups
            .iter()
            .filter_map(|group| details.get(group.as_ref()))
            .flat_map(|ids| ids.iter().copied())
            .collect();

        debug!(
            "{:?} filter over {} group(s) matches {} test(s)",
            mode,
            groups.len(),
            group_tests.len()
        );

        Self { mode, group_tests }
    }

    /// Accept only leaves that belong to one of `groups`
    pub fn include<S: AsRef<str>>(groups: &[S], suite: &TestSuite) -> Self {
        Self::new(FilterMode::Include, groups, suite)
    }

    /// Accept only leaves that belong to none of `groups`
    pub fn exclude<S: AsRef<str>>(groups: &[S], suite: &TestSuite) -> Self {
        Self::new(FilterMode::Exclude, groups, suite)
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn accept(&self, test: &dyn Test) -> bool {
        if test.as_suite().is_some() {
            return true;
        }

        let member = self.group_tests.contains(&test.id());
        match self.mode {
            FilterMode::Include => member,
            FilterMode::Exclude => !member,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::TestCase;

    fn case(name: &str, groups: &[&str]) -> TestCase {
        TestCase::new("GroupTest", name, |_| Ok(())).with_groups(groups.iter().copied())
    }

    #[test]
    fn test_suites_are_always_accepted() {
        let suite = TestSuite::new("root").with_test(case("testA", &["fast"]));
        let nested = TestSuite::new("nested");

        let include = GroupFilter::include(&["nothing"], &suite);
        let exclude = GroupFilter::exclude(&["fast"], &suite);

        assert!(include.accept(&nested));
        assert!(exclude.accept(&nested));
    }

    #[test]
    fn test_include_and_exclude_are_complements() {
        let fast = case("testFast", &["fast"]);
        let slow = case("testSlow", &["slow"]);
        let plain = case("testPlain", &[]);
        let (fast_id, slow_id, plain_id) = (fast.id(), slow.id(), plain.id());
        let suite = TestSuite::new("root")
            .with_test(fast)
            .with_test(slow)
            .with_test(plain);

        let include = GroupFilter::include(&["fast"], &suite);
        let exclude = GroupFilter::exclude(&["fast"], &suite);

        for test in suite.tests() {
            assert_ne!(include.accept(test.as_ref()), exclude.accept(test.as_ref()));
        }
        assert!(include.group_tests.contains(&fast_id));
        assert!(!include.group_tests.contains(&slow_id));
        assert!(!include.group_tests.contains(&plain_id));
    }

    #[test]
    fn test_default_group_selects_untagged_tests() {
        let plain = case("testPlain", &[]);
        let suite = TestSuite::new("root")
            .with_test(plain)
            .with_test(case("testTagged", &["db"]));

        let filter = GroupFilter::include(&[crate::execution::DEFAULT_GROUP], &suite);
        let accepted: Vec<_> = suite
            .tests()
            .iter()
            .filter(|t| filter.accept(t.as_ref()))
            .map(|t| t.label())
            .collect();

        assert_eq!(accepted, vec!["GroupTest::testPlain"]);
    }

    #[test]
    fn test_apply_filter_prunes_nested_leaves() {
        let mut suite = TestSuite::new("root")
            .with_test(
                TestSuite::new("nested")
                    .with_test(case("testA", &["fast"]))
                    .with_test(case("testB", &["slow"])),
            )
            .with_test(case("testC", &["slow"]));

        let filter = GroupFilter::include(&["fast"], &suite);
        suite.apply_filter(&filter);

        assert_eq!(suite.count(), 1);
        assert_eq!(suite.tests().len(), 1);
    }
}
