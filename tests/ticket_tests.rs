// Tests for the ticket listener driven through a real run - public API only

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use unitrun::cli::RunArgs;
use unitrun::commands::execute;
use unitrun::config::Config;
use unitrun::execution::{RunOptions, TestCase, TestRunner, TestSuite};
use unitrun::extensions::{InMemoryTracker, TicketListener};
use unitrun::report::{PrinterOptions, ResultPrinter};
use unitrun::state::Condition;

fn passing(name: &str) -> TestCase {
    TestCase::new("IssueTest", name, |ctx| {
        ctx.add_to_assertion_count(1);
        Ok(())
    })
    .with_tickets(["42"])
}

fn failing(name: &str) -> TestCase {
    TestCase::new("IssueTest", name, |_| {
        Err(Condition::assertion_failed("regression is back"))
    })
    .with_tickets(["42"])
}

fn run_with_tracker(suite: TestSuite, tracker: InMemoryTracker) -> InMemoryTracker {
    let listener = Rc::new(RefCell::new(TicketListener::new(tracker)));
    let mut runner = TestRunner::new(ResultPrinter::new(Vec::new(), PrinterOptions::default()));
    runner.add_listener(Box::new(Rc::clone(&listener)));

    runner.do_run(suite, &RunOptions::default()).unwrap();

    let tracker = listener.borrow().tracker().clone();
    tracker
}

#[test]
fn test_pass_then_fail_reopens_ticket() {
    // Arrange
    let suite = TestSuite::new("Issues")
        .with_test(passing("testFixed"))
        .with_test(failing("testBroken"));
    let tracker = InMemoryTracker::new().with_ticket("42", "closed");

    // Act
    let tracker = run_with_tracker(suite, tracker);

    // Assert
    assert_eq!(tracker.status("42"), Some("reopened"));
    assert_eq!(tracker.updates().len(), 1);
    assert_eq!(tracker.updates()[0].status, "reopened");
    assert_eq!(
        tracker.updates()[0].message,
        "Automatically reopened by unitrun (test failed)."
    );
}

#[test]
fn test_fail_then_pass_keeps_ticket_open() {
    // Arrange
    let suite = TestSuite::new("Issues")
        .with_test(failing("testBroken"))
        .with_test(passing("testFixed"));
    let tracker = InMemoryTracker::new().with_ticket("42", "closed");

    // Act
    let tracker = run_with_tracker(suite, tracker);

    // Assert
    assert_eq!(tracker.status("42"), Some("reopened"));
    assert_eq!(tracker.updates().len(), 1);
}

#[test]
fn test_single_passing_test_closes_ticket() {
    // Arrange
    let suite = TestSuite::new("Issues").with_test(passing("testFixed"));
    let tracker = InMemoryTracker::new().with_ticket("42", "assigned");

    // Act
    let tracker = run_with_tracker(suite, tracker);

    // Assert
    assert_eq!(tracker.status("42"), Some("closed"));
    assert_eq!(tracker.updates()[0].resolution, "fixed");
}

#[test]
fn test_skipped_test_leaves_ticket_alone() {
    // Arrange
    let suite = TestSuite::new("Issues").with_test(
        TestCase::new("IssueTest", "testLater", |_| Err(Condition::skipped("later")))
            .with_tickets(["42"]),
    );
    let tracker = InMemoryTracker::new().with_ticket("42", "new");

    // Act
    let tracker = run_with_tracker(suite, tracker);

    // Assert
    assert_eq!(tracker.status("42"), Some("new"));
    assert!(tracker.updates().is_empty());
}

#[test]
fn test_ticket_ledger_file_is_updated() {
    // Arrange
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let plan = temp_dir.path().join("plan.json");
    let tickets = temp_dir.path().join("tickets.json");
    std::fs::write(
        &plan,
        r#"{"name": "Issues", "tests": [
            {"class": "IssueTest", "name": "testFixed", "assertions": 1, "tickets": ["7"]}
        ]}"#,
    )
    .unwrap();
    std::fs::write(&tickets, r#"{"7": "reopened"}"#).unwrap();
    let args = RunArgs {
        plan: Some(plan),
        tickets: Some(tickets.clone()),
        ..Default::default()
    };
    let runner = TestRunner::new(ResultPrinter::new(Vec::new(), PrinterOptions::default()));

    // Act
    execute(runner, &args, &Config::default()).unwrap();

    // Assert
    let saved = InMemoryTracker::load(&tickets).unwrap();
    assert_eq!(saved.status("7"), Some("closed"));
}
