// Decorators - wrap a test to add behaviour without the inner test knowing

use crate::error::FrameworkError;
use crate::execution::{Test, TestId};
use crate::state::TestResults;
use anyhow::Result;

/// Wraps exactly one test and forwards to it
pub struct TestDecorator {
    id: TestId,
    test: Box<dyn Test>,
}

impl TestDecorator {
    pub fn new(test: Box<dyn Test>) -> Self {
        Self {
            id: TestId::next(),
            test,
        }
    }

    /// The decorated test
    pub fn test(&self) -> &dyn Test {
        self.test.as_ref()
    }

    pub fn test_mut(&mut self) -> &mut dyn Test {
        self.test.as_mut()
    }

    /// Run the decorated test against the caller's result
    pub fn basic_run(&mut self, result: &mut TestResults) -> Result<()> {
        self.test.run(result)
    }
}

impl Test for TestDecorator {
    fn id(&self) -> TestId {
        self.id
    }

    fn label(&self) -> String {
        self.test.label()
    }

    fn count(&self) -> usize {
        self.test.count()
    }

    fn run(&mut self, result: &mut TestResults) -> Result<()> {
        self.basic_run(result)
    }

    fn groups(&self) -> Vec<String> {
        self.test.groups()
    }
}

/// Runs the decorated test a fixed number of times
pub struct RepeatedTest {
    decorator: TestDecorator,
    times_repeat: usize,
    process_isolation: bool,
}

impl RepeatedTest {
    /// Fails with `InvalidArgument` for a negative repeat count, or one whose
    /// total test count does not fit in `usize`. Zero is allowed.
    pub fn new(
        test: Box<dyn Test>,
        times_repeat: i64,
        process_isolation: bool,
    ) -> Result<Self, FrameworkError> {
        let times_repeat =
            usize::try_from(times_repeat).map_err(|_| FrameworkError::InvalidArgument {
                argument: 2,
                expected: "positive integer",
            })?;

        if times_repeat.checked_mul(test.count()).is_none() {
            return Err(FrameworkError::InvalidArgument {
                argument: 2,
                expected: "repeat count small enough to total the decorated tests",
            });
        }

        Ok(Self {
            decorator: TestDecorator::new(test),
            times_repeat,
            process_isolation,
        })
    }

    pub fn times_repeat(&self) -> usize {
        self.times_repeat
    }

    pub fn test(&self) -> &dyn Test {
        self.decorator.test()
    }
}

impl Test for RepeatedTest {
    fn id(&self) -> TestId {
        self.decorator.id()
    }

    fn label(&self) -> String {
        self.decorator.label()
    }

    fn count(&self) -> usize {
        self.times_repeat.saturating_mul(self.decorator.count())
    }

    fn run(&mut self, result: &mut TestResults) -> Result<()> {
        for _ in 0..self.times_repeat {
            if result.should_stop() {
                break;
            }

            if let Some(suite) = self.decorator.test_mut().as_suite_mut() {
                suite.set_run_test_in_separate_process(self.process_isolation);
            }

            self.decorator.basic_run(result)?;
        }

        Ok(())
    }

    fn groups(&self) -> Vec<String> {
        self.decorator.groups()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{TestCase, TestSuite};

    fn passing() -> Box<dyn Test> {
        Box::new(TestCase::new("RepeatTest", "testOnce", |ctx| {
            ctx.add_to_assertion_count(1);
            Ok(())
        }))
    }

    #[test]
    fn test_decorator_forwards_count_and_label() {
        let decorator = TestDecorator::new(passing());
        assert_eq!(decorator.count(), 1);
        assert_eq!(decorator.label(), "RepeatTest::testOnce");
    }

    #[test]
    fn test_decorator_runs_with_fresh_result() {
        let mut decorator = TestDecorator::new(passing());
        let results = decorator.run_with_new_result().unwrap();
        assert_eq!(results.count(), 1);
    }

    #[test]
    fn test_negative_repeat_is_invalid() {
        let err = RepeatedTest::new(passing(), -1, false).err();
        assert!(matches!(
            err,
            Some(FrameworkError::InvalidArgument { argument: 2, .. })
        ));
    }

    #[test]
    fn test_repeat_overflowing_total_is_invalid() {
        let suite = TestSuite::new("inner")
            .with_test(TestCase::new("BigTest", "testA", |_| Ok(())))
            .with_test(TestCase::new("BigTest", "testB", |_| Ok(())));

        let err = RepeatedTest::new(Box::new(suite), i64::MAX, false).err();

        assert!(matches!(
            err,
            Some(FrameworkError::InvalidArgument { argument: 2, .. })
        ));
    }

    #[test]
    fn test_large_repeat_of_single_test_counts_exactly() {
        let repeated = RepeatedTest::new(passing(), i64::MAX, false).unwrap();
        assert_eq!(repeated.count(), i64::MAX as usize);
    }

    #[test]
    fn test_zero_repeat_runs_nothing() {
        let mut repeated = RepeatedTest::new(passing(), 0, false).unwrap();
        let results = repeated.run_with_new_result().unwrap();

        assert_eq!(repeated.count(), 0);
        assert_eq!(results.count(), 0);
    }

    #[test]
    fn test_repeat_propagates_isolation_into_suite() {
        let suite = TestSuite::new("inner").with_test(TestCase::new("IsoTest", "testBoom", |_| {
            Err(crate::state::Condition::runtime("Exception", "boom"))
        }));
        let mut repeated = RepeatedTest::new(Box::new(suite), 2, true).unwrap();
        let results = repeated.run_with_new_result().unwrap();

        assert_eq!(results.error_count(), 2);
        assert!(results.errors().iter().all(|d| d.failed_test().is_none()));
    }
}
