// Report module - listener protocol and the reporters built on it

pub mod color;
pub mod console;
pub mod json;
pub mod prettifier;
pub mod testdox;

pub use color::Colorizer;
pub use self::console::{ColorMode, Columns, PrinterOptions, ResultPrinter};
pub use json::JsonLogger;
pub use prettifier::NamePrettifier;
pub use testdox::TestDoxXmlPrinter;

use crate::execution::{Test, TestSuite};
use crate::state::Condition;
use anyhow::Result;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Observer of a run's event stream.
///
/// For a leaf test the only legal sequence is `start_test`, at most one outcome call,
/// then `end_test`. Suite events bracket all events of their children. Every method
/// defaults to a no-op so implementors only override what they care about.
/// An `Err` aborts the run: a broken listener is a defect, not a test outcome.
pub trait TestListener {
    fn add_error(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        Ok(())
    }

    fn add_warning(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        Ok(())
    }

    fn add_failure(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        Ok(())
    }

    fn add_incomplete_test(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        Ok(())
    }

    fn add_risky_test(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        Ok(())
    }

    fn add_skipped_test(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        Ok(())
    }

    fn start_test_suite(&mut self, _suite: &TestSuite) -> Result<()> {
        Ok(())
    }

    fn end_test_suite(&mut self, _suite: &TestSuite) -> Result<()> {
        Ok(())
    }

    fn start_test(&mut self, _test: &dyn Test) -> Result<()> {
        Ok(())
    }

    fn end_test(&mut self, _test: &dyn Test, _time: Duration) -> Result<()> {
        Ok(())
    }
}

/// Listener that buffers or streams to an output and must be flushed once the run is over
pub trait Printer: TestListener {
    fn flush(&mut self) -> Result<()>;
}

/// Listener that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseTestListener;

impl TestListener for BaseTestListener {}

// Lets the driver keep a handle on a listener it registered, e.g. to print or flush it
// after the run.
impl<L: TestListener + ?Sized> TestListener for Rc<RefCell<L>> {
    fn add_error(&mut self, test: &dyn Test, condition: &Condition, time: Duration) -> Result<()> {
        self.borrow_mut().add_error(test, condition, time)
    }

    fn add_warning(
        &mut self,
        test: &dyn Test,
        condition: &Condition,
        time: Duration,
    ) -> Result<()> {
        self.borrow_mut().add_warning(test, condition, time)
    }

    fn add_failure(
        &mut self,
        test: &dyn Test,
        condition: &Condition,
        time: Duration,
    ) -> Result<()> {
        self.borrow_mut().add_failure(test, condition, time)
    }

    fn add_incomplete_test(
        &mut self,
        test: &dyn Test,
        condition: &Condition,
        time: Duration,
    ) -> Result<()> {
        self.borrow_mut().add_incomplete_test(test, condition, time)
    }

    fn add_risky_test(
        &mut self,
        test: &dyn Test,
        condition: &Condition,
        time: Duration,
    ) -> Result<()> {
        self.borrow_mut().add_risky_test(test, condition, time)
    }

    fn add_skipped_test(
        &mut self,
        test: &dyn Test,
        condition: &Condition,
        time: Duration,
    ) -> Result<()> {
        self.borrow_mut().add_skipped_test(test, condition, time)
    }

    fn start_test_suite(&mut self, suite: &TestSuite) -> Result<()> {
        self.borrow_mut().start_test_suite(suite)
    }

    fn end_test_suite(&mut self, suite: &TestSuite) -> Result<()> {
        self.borrow_mut().end_test_suite(suite)
    }

    fn start_test(&mut self, test: &dyn Test) -> Result<()> {
        self.borrow_mut().start_test(test)
    }

    fn end_test(&mut self, test: &dyn Test, time: Duration) -> Result<()> {
        self.borrow_mut().end_test(test, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::TestCase;
    use crate::state::TestResults;

    #[derive(Default)]
    struct EndCounter {
        end_count: usize,
    }

    impl TestListener for EndCounter {
        fn end_test(&mut self, _test: &dyn Test, _time: Duration) -> Result<()> {
            self.end_count += 1;
            Ok(())
        }
    }

    #[test]
    fn test_base_listener_accepts_every_event() {
        let mut listener = BaseTestListener;
        let test = TestCase::new("FooTest", "testBar", |_| Ok(()));

        assert!(listener.start_test(&test).is_ok());
        assert!(
            listener
                .add_error(&test, &Condition::runtime("E", "x"), Duration::ZERO)
                .is_ok()
        );
        assert!(listener.end_test(&test, Duration::ZERO).is_ok());
    }

    #[test]
    fn test_shared_listener_sees_events() {
        let counter = Rc::new(RefCell::new(EndCounter::default()));
        let mut results = TestResults::new();
        results.add_listener(Box::new(counter.clone()));

        let mut test = TestCase::new("FooTest", "testBar", |_| Ok(()));
        test.run(&mut results).unwrap();

        assert_eq!(counter.borrow().end_count, 1);
    }
}
