// Tests for the console, JSON and TestDox reporters - public API only

use pretty_assertions::assert_eq;
use unitrun::execution::{RunOptions, TestCase, TestRunner, TestSize, TestSuite};
use unitrun::report::{Columns, PrinterOptions, ResultPrinter};
use unitrun::state::Condition;

fn runner() -> TestRunner<Vec<u8>> {
    TestRunner::new(ResultPrinter::new(
        Vec::new(),
        PrinterOptions {
            columns: Columns::Fixed(80),
            ..Default::default()
        },
    ))
}

fn console_output(runner: &TestRunner<Vec<u8>>) -> String {
    let printer = runner.printer();
    let out = String::from_utf8_lossy(printer.borrow().writer()).into_owned();
    out
}

#[test]
fn test_single_passing_test_prints_ok() {
    // Arrange
    let suite = TestSuite::new("Calculator").with_test(TestCase::new(
        "CalculatorTest",
        "testAdd",
        |ctx| {
            ctx.add_to_assertion_count(1);
            Ok(())
        },
    ));
    let mut runner = runner();

    // Act
    let results = runner.do_run(suite, &RunOptions::default()).unwrap();

    // Assert
    let out = console_output(&runner);
    assert!(results.was_successful());
    assert!(out.starts_with('.'));
    assert!(out.contains(" 1 / 1 (100%)"));
    let last_line = out.trim_end().lines().last().unwrap();
    assert!(last_line.starts_with("OK (1 test, 1 assertion)"));
}

#[test]
fn test_runtime_error_is_listed() {
    // Arrange
    let suite = TestSuite::new("Calculator").with_test(TestCase::new(
        "CalculatorTest",
        "testDivide",
        |_| {
            Err(Condition::runtime("DivisionByZero", "cannot divide by zero")
                .with_frame("src/calculator.rs", 12))
        },
    ));
    let mut runner = runner();

    // Act
    let results = runner.do_run(suite, &RunOptions::default()).unwrap();

    // Assert
    assert_eq!(results.error_count(), 1);
    assert_eq!(results.errors()[0].test_name(), "CalculatorTest::testDivide");
    assert_eq!(
        results.errors()[0].exception_message(),
        "cannot divide by zero"
    );

    let out = console_output(&runner);
    assert!(out.starts_with('E'));
    assert!(out.contains("There was 1 error:\n"));
    assert!(out.contains(concat!(
        "\n1) CalculatorTest::testDivide\n",
        "DivisionByZero: cannot divide by zero\n",
        "\nsrc/calculator.rs:12\n"
    )));
    assert!(out.contains("ERRORS!\nTests: 1, Assertions: 0, Errors: 1."));
}

#[test]
fn test_harmless_defects_print_yellow_banner() {
    // Arrange
    let suite = TestSuite::new("Mixed")
        .with_test(TestCase::new("MixedTest", "testSkip", |_| {
            Err(Condition::skipped("no database"))
        }))
        .with_test(TestCase::new("MixedTest", "testPass", |ctx| {
            ctx.add_to_assertion_count(1);
            Ok(())
        }));
    let mut runner = runner();

    // Act
    runner.do_run(suite, &RunOptions::default()).unwrap();

    // Assert
    let out = console_output(&runner);
    assert!(out.starts_with("S."));
    assert!(!out.contains("There was 1 skipped test"));
    assert!(out.contains(
        "OK, but incomplete, skipped, or risky tests!\nTests: 2, Assertions: 1, Skipped: 1."
    ));
}

#[test]
fn test_json_and_testdox_files_are_written() {
    // Arrange
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let json_path = temp_dir.path().join("log.jsonl");
    let xml_path = temp_dir.path().join("testdox.xml");
    let suite = TestSuite::new("Bank")
        .with_test(
            TestCase::new("BankAccountTest", "testDeposit", |ctx| {
                ctx.add_to_assertion_count(1);
                Ok(())
            })
            .with_groups(["small", "money"])
            .with_size(TestSize::Small),
        )
        .with_test(TestCase::new("BankAccountTest", "testWithdraw", |_| {
            Err(Condition::assertion_failed("balance went negative"))
        }));
    let options = RunOptions {
        log_json: Some(json_path.clone()),
        testdox_xml: Some(xml_path.clone()),
        ..Default::default()
    };
    let mut runner = runner();

    // Act
    runner.do_run(suite, &options).unwrap();

    // Assert
    let events: Vec<serde_json::Value> = std::fs::read_to_string(&json_path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["suiteStart", "testStart", "test", "testStart", "test"]);
    assert_eq!(events[2]["status"], "pass");
    assert_eq!(events[4]["status"], "fail");
    assert_eq!(events[4]["message"], "balance went negative\n");

    let xml = std::fs::read_to_string(&xml_path).unwrap();
    assert!(xml.contains("methodName=\"testDeposit\""));
    assert!(xml.contains("prettifiedMethodName=\"Deposit\""));
    assert!(xml.contains("groups=\"money\""));
    assert!(xml.contains("status=\"3\""));
    assert!(xml.contains("exceptionMessage=\"balance went negative\""));
}

#[test]
fn test_verbose_lists_harmless_defects_reversed() {
    // Arrange
    let suite = TestSuite::new("Todo")
        .with_test(TestCase::new("TodoTest", "testFirst", |_| {
            Err(Condition::incomplete("first"))
        }))
        .with_test(TestCase::new("TodoTest", "testSecond", |_| {
            Err(Condition::incomplete("second"))
        }));
    let mut runner = TestRunner::new(ResultPrinter::new(
        Vec::new(),
        PrinterOptions {
            verbose: true,
            reverse: true,
            ..Default::default()
        },
    ));

    // Act
    runner.do_run(suite, &RunOptions::default()).unwrap();

    // Assert
    let out = console_output(&runner);
    let first = out.find("1) TodoTest::testSecond").unwrap();
    let second = out.find("2) TodoTest::testFirst").unwrap();
    assert!(out.contains("There were 2 incomplete tests:"));
    assert!(first < second);
}
