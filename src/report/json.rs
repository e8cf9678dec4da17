// JSON reporter - one JSON object per lifecycle event, one event per line

use super::{Printer, TestListener};
use crate::execution::{Test, TestSuite};
use crate::state::{Condition, Defect, StackFrame};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum LogEvent<'a> {
    SuiteStart {
        suite: &'a str,
        tests: usize,
    },
    TestStart {
        suite: &'a str,
        test: &'a str,
    },
    Test {
        suite: &'a str,
        test: &'a str,
        status: &'static str,
        time: f64,
        trace: &'a [StackFrame],
        message: String,
        output: &'a str,
    },
}

/// Streams the event log to any writer
pub struct JsonLogger<W: Write> {
    out: W,
    current_suite: String,
    current_test: String,
    current_pass: bool,
}

impl<W: Write> JsonLogger<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            current_suite: String::new(),
            current_test: String::new(),
            current_pass: true,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_case(
        &mut self,
        test: &dyn Test,
        status: &'static str,
        time: Duration,
        trace: &[StackFrame],
        message: String,
    ) -> Result<()> {
        let output = test.as_case().map(|case| case.output()).unwrap_or("");
        let event = LogEvent::Test {
            suite: &self.current_suite,
            test: &self.current_test,
            status,
            time: time.as_secs_f64(),
            trace,
            message,
            output,
        };
        emit(&mut self.out, &event)
    }

    fn record(
        &mut self,
        test: &dyn Test,
        status: &'static str,
        condition: &Condition,
        time: Duration,
        message: String,
    ) -> Result<()> {
        self.current_pass = false;
        self.write_case(test, status, time, &condition.trace, message)
    }
}

fn emit<W: Write>(out: &mut W, event: &LogEvent<'_>) -> Result<()> {
    serde_json::to_writer(&mut *out, event).context("Failed to serialize JSON event")?;
    out.write_all(b"\n")?;
    Ok(())
}

impl<W: Write> TestListener for JsonLogger<W> {
    fn add_error(&mut self, test: &dyn Test, condition: &Condition, time: Duration) -> Result<()> {
        let message = Defect::exception_to_string(condition);
        self.record(test, "error", condition, time, message)
    }

    fn add_warning(
        &mut self,
        test: &dyn Test,
        condition: &Condition,
        time: Duration,
    ) -> Result<()> {
        let message = Defect::exception_to_string(condition);
        self.record(test, "warning", condition, time, message)
    }

    fn add_failure(
        &mut self,
        test: &dyn Test,
        condition: &Condition,
        time: Duration,
    ) -> Result<()> {
        let message = Defect::exception_to_string(condition);
        self.record(test, "fail", condition, time, message)
    }

    fn add_incomplete_test(
        &mut self,
        test: &dyn Test,
        condition: &Condition,
        time: Duration,
    ) -> Result<()> {
        let message = format!("Incomplete Test: {}", condition.message);
        self.record(test, "error", condition, time, message)
    }

    fn add_risky_test(
        &mut self,
        test: &dyn Test,
        condition: &Condition,
        time: Duration,
    ) -> Result<()> {
        let message = format!("Risky Test: {}", condition.message);
        self.record(test, "error", condition, time, message)
    }

    fn add_skipped_test(
        &mut self,
        test: &dyn Test,
        condition: &Condition,
        time: Duration,
    ) -> Result<()> {
        let message = format!("Skipped Test: {}", condition.message);
        self.record(test, "error", condition, time, message)
    }

    fn start_test_suite(&mut self, suite: &TestSuite) -> Result<()> {
        self.current_suite = suite.name().to_string();
        self.current_test.clear();

        let event = LogEvent::SuiteStart {
            suite: suite.name(),
            tests: suite.count(),
        };
        emit(&mut self.out, &event)
    }

    fn end_test_suite(&mut self, _suite: &TestSuite) -> Result<()> {
        self.current_suite.clear();
        self.current_test.clear();
        Ok(())
    }

    fn start_test(&mut self, test: &dyn Test) -> Result<()> {
        self.current_test = test.label();
        self.current_pass = true;

        let event = LogEvent::TestStart {
            suite: &self.current_suite,
            test: &self.current_test,
        };
        emit(&mut self.out, &event)
    }

    fn end_test(&mut self, test: &dyn Test, time: Duration) -> Result<()> {
        if self.current_pass {
            self.write_case(test, "pass", time, &[], String::new())?;
        }
        Ok(())
    }
}

impl<W: Write> Printer for JsonLogger<W> {
    fn flush(&mut self) -> Result<()> {
        self.out.flush().context("Failed to flush JSON log")
    }
}
