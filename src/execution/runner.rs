// Test runner
// Prunes the tree, wires the listeners onto a fresh result and drives one run

use crate::execution::{RepeatedTest, Test, TestSuite};
use crate::filter::GroupFilter;
use crate::report::{JsonLogger, Printer, ResultPrinter, TestDoxXmlPrinter, TestListener};
use crate::state::{ConditionConversion, StopPolicy, TestResults};
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

/// Knobs for a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Only run tests in these groups
    pub groups: Vec<String>,
    /// Skip tests in these groups
    pub exclude_groups: Vec<String>,
    pub repeat: i64,
    pub process_isolation: bool,
    pub stop: StopPolicy,
    pub conversion: ConditionConversion,
    pub report_useless_tests: bool,
    pub log_json: Option<PathBuf>,
    pub testdox_xml: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            exclude_groups: Vec::new(),
            repeat: 1,
            process_isolation: false,
            stop: StopPolicy::default(),
            conversion: ConditionConversion::default(),
            report_useless_tests: false,
            log_json: None,
            testdox_xml: None,
        }
    }
}

/// Owns the console printer and any extra listeners for the run
pub struct TestRunner<W: Write + 'static> {
    printer: Rc<RefCell<ResultPrinter<W>>>,
    listeners: Vec<Box<dyn TestListener>>,
}

impl<W: Write + 'static> TestRunner<W> {
    pub fn new(printer: ResultPrinter<W>) -> Self {
        Self {
            printer: Rc::new(RefCell::new(printer)),
            listeners: Vec::new(),
        }
    }

    /// Registered after the built-in reporters, in call order
    pub fn add_listener(&mut self, listener: Box<dyn TestListener>) {
        self.listeners.push(listener);
    }

    pub fn printer(&self) -> Rc<RefCell<ResultPrinter<W>>> {
        Rc::clone(&self.printer)
    }

    pub fn do_run(&mut self, suite: TestSuite, options: &RunOptions) -> Result<TestResults> {
        let mut test = prepare(suite, options)?;

        let mut results = TestResults::new()
            .with_stop_policy(options.stop)
            .with_conversion(options.conversion)
            .with_report_useless_tests(options.report_useless_tests);

        let mut printers: Vec<Rc<RefCell<dyn Printer>>> = Vec::new();
        let console: Rc<RefCell<dyn Printer>> = self.printer.clone();
        printers.push(console);

        if let Some(path) = &options.log_json {
            let logger = JsonLogger::new(create_output(path)?);
            printers.push(Rc::new(RefCell::new(logger)));
        }
        if let Some(path) = &options.testdox_xml {
            let printer = TestDoxXmlPrinter::new(create_output(path)?);
            printers.push(Rc::new(RefCell::new(printer)));
        }

        for printer in &printers {
            results.add_listener(Box::new(Rc::clone(printer)));
        }
        for listener in self.listeners.drain(..) {
            results.add_listener(listener);
        }

        info!("Running {} test(s)", test.count());
        test.run(&mut results)?;
        results.finish();

        self.printer.borrow_mut().print_result(&results)?;
        for printer in &printers {
            printer.borrow_mut().flush()?;
        }
        debug!("Flushed {} report(s)", printers.len());

        Ok(results)
    }
}

/// Apply group filters and repetition, returning the test the run starts from
fn prepare(mut suite: TestSuite, options: &RunOptions) -> Result<Box<dyn Test>> {
    if !options.groups.is_empty() {
        let filter = GroupFilter::include(options.groups.as_slice(), &suite);
        suite.apply_filter(&filter);
    }
    if !options.exclude_groups.is_empty() {
        let filter = GroupFilter::exclude(options.exclude_groups.as_slice(), &suite);
        suite.apply_filter(&filter);
    }

    if options.repeat == 1 {
        suite.set_run_test_in_separate_process(options.process_isolation);
        return Ok(Box::new(suite));
    }

    // The outer suite gives the reporters a total that accounts for the repeats
    let name = suite.name().to_string();
    let repeated = RepeatedTest::new(Box::new(suite), options.repeat, options.process_isolation)?;
    Ok(Box::new(TestSuite::new(name).with_test(repeated)))
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}
