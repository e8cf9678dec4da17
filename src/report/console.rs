// Console reporter - progress characters, defect lists and a summary footer

use super::{Colorizer, Printer, TestListener};
use crate::error::FrameworkError;
use crate::execution::{Test, TestSuite};
use crate::state::{Category, Condition, Defect, TestResults};
use anyhow::Result;
use console::Term;
use serde::{Deserialize, Serialize};
use std::io::{Stdout, Write};
use std::time::Duration;

pub const DEFAULT_COLUMNS: usize = 80;

/// When to emit ANSI colours
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Never,
    Auto,
    Always,
}

impl ColorMode {
    /// `Auto` resolves against the terminal attached to stdout
    pub fn resolve(self) -> bool {
        match self {
            ColorMode::Never => false,
            ColorMode::Always => true,
            ColorMode::Auto => console::colors_enabled(),
        }
    }
}

impl std::str::FromStr for ColorMode {
    type Err = FrameworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(Self::Never),
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            _ => Err(FrameworkError::InvalidArgument {
                argument: 3,
                expected: "value from \"never\", \"auto\" or \"always\"",
            }),
        }
    }
}

/// Progress line width: a fixed number of columns or the whole terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ColumnsRepr", into = "ColumnsRepr")]
pub enum Columns {
    Fixed(usize),
    Max,
}

impl Default for Columns {
    fn default() -> Self {
        Columns::Fixed(DEFAULT_COLUMNS)
    }
}

impl Columns {
    /// Effective width given the width of the terminal being written to, if any.
    /// Never wider than that terminal.
    pub fn resolve(self, terminal: Option<usize>) -> usize {
        match (self, terminal) {
            (Columns::Max, Some(width)) => width,
            (Columns::Max, None) => DEFAULT_COLUMNS,
            (Columns::Fixed(n), Some(width)) if n > width => width,
            (Columns::Fixed(n), _) => n,
        }
    }
}

impl std::str::FromStr for Columns {
    type Err = FrameworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "max" {
            return Ok(Columns::Max);
        }
        s.parse::<usize>()
            .map(Columns::Fixed)
            .map_err(|_| FrameworkError::InvalidArgument {
                argument: 5,
                expected: "integer or \"max\"",
            })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ColumnsRepr {
    Number(usize),
    Text(String),
}

impl TryFrom<ColumnsRepr> for Columns {
    type Error = FrameworkError;

    fn try_from(repr: ColumnsRepr) -> Result<Self, Self::Error> {
        match repr {
            ColumnsRepr::Number(n) => Ok(Columns::Fixed(n)),
            ColumnsRepr::Text(s) => s.parse(),
        }
    }
}

impl From<Columns> for ColumnsRepr {
    fn from(columns: Columns) -> Self {
        match columns {
            Columns::Fixed(n) => ColumnsRepr::Number(n),
            Columns::Max => ColumnsRepr::Text("max".to_string()),
        }
    }
}

/// Console printer settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrinterOptions {
    /// Also list risky, incomplete and skipped tests
    pub verbose: bool,
    pub colors: ColorMode,
    /// Announce every test before it starts
    pub debug: bool,
    pub columns: Columns,
    /// Print defect lists newest first
    pub reverse: bool,
}

const COUNTER_TEMPLATE: &str = "  /  (XXX%)";

/// Human-readable reporter
pub struct ResultPrinter<W: Write> {
    out: W,
    colorizer: Colorizer,
    options: PrinterOptions,
    number_of_columns: usize,
    column: usize,
    max_column: usize,
    last_test_failed: bool,
    num_assertions: usize,
    num_tests: Option<usize>,
    num_tests_width: usize,
    num_tests_run: usize,
    defect_list_printed: bool,
}

impl ResultPrinter<Stdout> {
    /// Printer on stdout; the progress width is clamped to the attached terminal
    pub fn stdout(options: PrinterOptions) -> Self {
        let terminal = Term::stdout()
            .size_checked()
            .map(|(_, cols)| cols as usize);
        Self::with_terminal_width(std::io::stdout(), options, terminal)
    }
}

impl<W: Write> ResultPrinter<W> {
    /// Printer on an arbitrary writer. Fixed columns are taken as given.
    pub fn new(out: W, options: PrinterOptions) -> Self {
        Self::with_terminal_width(out, options, None)
    }

    fn with_terminal_width(out: W, options: PrinterOptions, terminal: Option<usize>) -> Self {
        Self {
            out,
            colorizer: Colorizer::new(options.colors.resolve()),
            options,
            number_of_columns: options.columns.resolve(terminal),
            column: 0,
            max_column: 0,
            last_test_failed: false,
            num_assertions: 0,
            num_tests: None,
            num_tests_width: 0,
            num_tests_run: 0,
            defect_list_printed: false,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Defect lists, then the summary footer
    pub fn print_result(&mut self, result: &TestResults) -> Result<()> {
        self.print_header(result)?;

        self.print_defects(result.errors(), Category::Error)?;
        self.print_defects(result.warnings(), Category::Warning)?;
        self.print_defects(result.failures(), Category::Failure)?;

        if self.options.verbose {
            self.print_defects(result.risky(), Category::Risky)?;
            self.print_defects(result.not_implemented(), Category::Incomplete)?;
            self.print_defects(result.skipped(), Category::Skipped)?;
        }

        self.print_footer(result)
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    fn print_header(&mut self, result: &TestResults) -> Result<()> {
        let elapsed = format_elapsed(result.metrics.total_duration);
        self.write(&format!("\n\nTime: {}\n\n", elapsed))
    }

    fn print_defects(&mut self, defects: &[Defect], category: Category) -> Result<()> {
        let count = defects.len();
        if count == 0 {
            return Ok(());
        }

        if self.defect_list_printed {
            self.write("\n--\n\n")?;
        }

        self.write(&format!(
            "There {} {} {}{}:\n",
            if count == 1 { "was" } else { "were" },
            count,
            category.noun(),
            if count == 1 { "" } else { "s" }
        ))?;

        let ordered: Vec<&Defect> = if self.options.reverse {
            defects.iter().rev().collect()
        } else {
            defects.iter().collect()
        };

        for (i, defect) in ordered.into_iter().enumerate() {
            self.print_defect(defect, i + 1)?;
        }

        self.defect_list_printed = true;
        Ok(())
    }

    fn print_defect(&mut self, defect: &Defect, number: usize) -> Result<()> {
        self.write(&format!("\n{}) {}\n", number, defect.test_name()))?;

        let thrown = defect.thrown();
        self.print_condition(thrown)?;
        for previous in thrown.causes() {
            self.write("\nCaused by\n")?;
            self.print_condition(previous)?;
        }
        Ok(())
    }

    fn print_condition(&mut self, condition: &Condition) -> Result<()> {
        self.write(&Defect::exception_to_string(condition))?;

        if !condition.trace.is_empty() {
            self.write("\n")?;
            for frame in &condition.trace {
                self.write(&format!("{}\n", frame))?;
            }
        }
        Ok(())
    }

    fn print_footer(&mut self, result: &TestResults) -> Result<()> {
        let tests = result.count();
        if tests == 0 {
            return self.write_with_color("fg-black, bg-yellow", "No tests executed!", true);
        }

        if result.was_successful()
            && result.warning_count() == 0
            && result.all_harmless()
            && result.all_completely_implemented()
            && result.none_skipped()
        {
            let assertions = self.num_assertions;
            return self.write_with_color(
                "fg-black, bg-green",
                &format!(
                    "OK ({} test{}, {} assertion{})",
                    tests,
                    if tests == 1 { "" } else { "s" },
                    assertions,
                    if assertions == 1 { "" } else { "s" }
                ),
                true,
            );
        }

        let color = if result.was_successful() && result.warning_count() == 0 {
            if self.options.verbose {
                self.write("\n")?;
            }
            let color = "fg-black, bg-yellow";
            self.write_with_color(color, "OK, but incomplete, skipped, or risky tests!", true)?;
            color
        } else {
            self.write("\n")?;
            let (color, banner) = if result.error_count() > 0 {
                ("fg-white, bg-red", "ERRORS!")
            } else if result.failure_count() > 0 {
                ("fg-white, bg-red", "FAILURES!")
            } else {
                ("fg-black, bg-yellow", "WARNINGS!")
            };
            self.write_with_color(color, banner, true)?;
            color
        };

        let counts = [
            ("Tests", tests, true),
            ("Assertions", self.num_assertions, true),
            ("Errors", result.error_count(), false),
            ("Failures", result.failure_count(), false),
            ("Warnings", result.warning_count(), false),
            ("Skipped", result.skipped_count(), false),
            ("Incomplete", result.not_implemented_count(), false),
            ("Risky", result.risky_count(), false),
        ];

        let mut first = true;
        for (name, count, always) in counts {
            if always || count > 0 {
                let separator = if first { "" } else { ", " };
                self.write_with_color(color, &format!("{}{}: {}", separator, name, count), false)?;
                first = false;
            }
        }

        self.write_with_color(color, ".", true)
    }

    fn write_with_color(&mut self, color: &str, buffer: &str, lf: bool) -> Result<()> {
        let formatted = self.colorizer.format_with_color(color, buffer)?;
        self.write(&formatted)?;
        if lf {
            self.write("\n")?;
        }
        Ok(())
    }

    fn write_progress_with_color(&mut self, color: &str, progress: char) -> Result<()> {
        let formatted = self
            .colorizer
            .format_with_color(color, &progress.to_string())?;
        self.write_progress(&formatted)
    }

    fn write_progress(&mut self, progress: &str) -> Result<()> {
        self.write(progress)?;
        self.column += 1;
        self.num_tests_run += 1;

        let Some(total) = self.num_tests else {
            return Ok(());
        };

        let run = self.num_tests_run;
        if self.column == self.max_column || run == total {
            if run == total {
                let padding = " ".repeat(self.max_column.saturating_sub(self.column));
                self.write(&padding)?;
            }

            let percent = (run * 100).checked_div(total).unwrap_or(100);
            self.write(&format!(
                " {:>width$} / {:>width$} ({:>3}%)",
                run,
                total,
                percent,
                width = self.num_tests_width
            ))?;

            if self.column == self.max_column {
                self.column = 0;
                self.write("\n")?;
            }
        }
        Ok(())
    }

    fn on_defect(&mut self, category: Category) -> Result<()> {
        self.write_progress_with_color(progress_color(category), category.progress_char())?;
        self.last_test_failed = true;
        Ok(())
    }
}

fn progress_color(category: Category) -> &'static str {
    match category {
        Category::Error => "fg-red, bold",
        Category::Failure => "bg-red, fg-white",
        Category::Warning | Category::Incomplete | Category::Risky => "fg-yellow, bold",
        Category::Skipped => "fg-cyan, bold",
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.2} seconds", elapsed.as_secs_f64())
    } else {
        format!("{} ms", elapsed.as_millis())
    }
}

impl<W: Write> TestListener for ResultPrinter<W> {
    fn add_error(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.on_defect(Category::Error)
    }

    fn add_warning(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.on_defect(Category::Warning)
    }

    fn add_failure(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.on_defect(Category::Failure)
    }

    fn add_incomplete_test(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.on_defect(Category::Incomplete)
    }

    fn add_risky_test(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.on_defect(Category::Risky)
    }

    fn add_skipped_test(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.on_defect(Category::Skipped)
    }

    fn start_test_suite(&mut self, suite: &TestSuite) -> Result<()> {
        // Totals come from the outermost suite only
        if self.num_tests.is_none() {
            let total = suite.count();
            self.num_tests_width = total.to_string().len();
            self.max_column = self
                .number_of_columns
                .saturating_sub(COUNTER_TEMPLATE.len() + 2 * self.num_tests_width);
            self.num_tests = Some(total);
        }
        Ok(())
    }

    fn start_test(&mut self, test: &dyn Test) -> Result<()> {
        if self.options.debug {
            self.write(&format!("\nStarting test '{}'.\n", test.label()))?;
        }
        Ok(())
    }

    fn end_test(&mut self, test: &dyn Test, _time: Duration) -> Result<()> {
        if !self.last_test_failed {
            self.write_progress(".")?;
        }

        self.num_assertions += test.num_assertions();
        self.last_test_failed = false;

        if let Some(case) = test.as_case() {
            if !case.has_expectation_on_output() {
                self.write(case.output())?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Printer for ResultPrinter<W> {
    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::TestCase;

    fn options() -> PrinterOptions {
        PrinterOptions {
            columns: Columns::Fixed(40),
            ..Default::default()
        }
    }

    fn output(printer: &ResultPrinter<Vec<u8>>) -> String {
        String::from_utf8_lossy(printer.writer()).into_owned()
    }

    #[test]
    fn test_columns_parse() {
        assert_eq!("max".parse::<Columns>().unwrap(), Columns::Max);
        assert_eq!("120".parse::<Columns>().unwrap(), Columns::Fixed(120));
        assert!(matches!(
            "wide".parse::<Columns>(),
            Err(FrameworkError::InvalidArgument { argument: 5, .. })
        ));
    }

    #[test]
    fn test_columns_resolve_against_terminal() {
        assert_eq!(Columns::Fixed(120).resolve(Some(80)), 80);
        assert_eq!(Columns::Fixed(60).resolve(Some(80)), 60);
        assert_eq!(Columns::Max.resolve(Some(132)), 132);
        assert_eq!(Columns::Max.resolve(None), DEFAULT_COLUMNS);
    }

    #[test]
    fn test_buffer_printer_keeps_fixed_width() {
        let printer = ResultPrinter::new(
            Vec::new(),
            PrinterOptions {
                columns: Columns::Fixed(300),
                ..Default::default()
            },
        );

        assert_eq!(printer.number_of_columns, 300);
    }

    #[test]
    fn test_color_mode_parse() {
        assert_eq!("auto".parse::<ColorMode>().unwrap(), ColorMode::Auto);
        assert!("sometimes".parse::<ColorMode>().is_err());
    }

    #[test]
    fn test_progress_counter_on_last_test() {
        let suite = TestSuite::new("s").with_test(TestCase::new("A", "testA", |_| Ok(())));
        let mut printer = ResultPrinter::new(Vec::new(), options());

        printer.start_test_suite(&suite).unwrap();
        printer.end_test(suite.tests()[0].as_ref(), Duration::ZERO).unwrap();

        let out = output(&printer);
        assert!(out.starts_with('.'));
        assert!(out.ends_with(" 1 / 1 (100%)"));
    }

    #[test]
    fn test_defect_char_replaces_dot() {
        let test = TestCase::new("A", "testA", |_| Ok(()));
        let mut printer = ResultPrinter::new(Vec::new(), options());

        printer
            .add_skipped_test(&test, &Condition::skipped("later"), Duration::ZERO)
            .unwrap();
        printer.end_test(&test, Duration::ZERO).unwrap();

        assert_eq!(output(&printer), "S");
    }

    #[test]
    fn test_debug_announces_tests() {
        let test = TestCase::new("A", "testA", |_| Ok(()));
        let mut printer = ResultPrinter::new(
            Vec::new(),
            PrinterOptions {
                debug: true,
                ..options()
            },
        );

        printer.start_test(&test).unwrap();
        assert_eq!(output(&printer), "\nStarting test 'A::testA'.\n");
    }

    #[test]
    fn test_no_tests_executed() {
        let mut printer = ResultPrinter::new(Vec::new(), options());
        printer.print_result(&TestResults::new()).unwrap();

        assert!(output(&printer).ends_with("No tests executed!\n"));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(12)), "12 ms");
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.50 seconds");
    }
}
