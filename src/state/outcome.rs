// Outcome model - what a finished test case reports back

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Defect category. One per non-passing outcome variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Error,
    Warning,
    Failure,
    Incomplete,
    Risky,
    Skipped,
}

impl Category {
    /// Noun used in console defect headings ("There were 2 risky tests:")
    pub fn noun(self) -> &'static str {
        match self {
            Category::Error => "error",
            Category::Warning => "warning",
            Category::Failure => "failure",
            Category::Incomplete => "incomplete test",
            Category::Risky => "risky test",
            Category::Skipped => "skipped test",
        }
    }

    /// Progress character printed by the console reporter
    pub fn progress_char(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Failure => 'F',
            Category::Incomplete => 'I',
            Category::Risky => 'R',
            Category::Skipped => 'S',
        }
    }

    /// Harmless categories never make a run unsuccessful
    pub fn is_harmless(self) -> bool {
        matches!(
            self,
            Category::Incomplete | Category::Risky | Category::Skipped
        )
    }
}

/// Numeric status codes used by the structured reporters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Passed = 0,
    Skipped = 1,
    Incomplete = 2,
    Failure = 3,
    Error = 4,
    Risky = 5,
    Warning = 6,
}

impl From<Option<Category>> for StatusCode {
    fn from(category: Option<Category>) -> Self {
        match category {
            None => StatusCode::Passed,
            Some(Category::Skipped) => StatusCode::Skipped,
            Some(Category::Incomplete) => StatusCode::Incomplete,
            Some(Category::Failure) => StatusCode::Failure,
            Some(Category::Error) => StatusCode::Error,
            Some(Category::Risky) => StatusCode::Risky,
            Some(Category::Warning) => StatusCode::Warning,
        }
    }
}

/// What raised a condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionKind {
    AssertionFailed,
    ExpectationFailed,
    OutputMismatch,
    Runtime { class: String },
    Warning,
    Notice,
    Deprecated,
    Incomplete,
    Risky,
    Skipped,
}

impl ConditionKind {
    /// Framework conditions describe themselves; runtime ones are prefixed with their class.
    pub fn is_self_describing(&self) -> bool {
        !matches!(
            self,
            ConditionKind::Runtime { .. }
                | ConditionKind::Warning
                | ConditionKind::Notice
                | ConditionKind::Deprecated
        )
    }

    pub fn is_assertion_failure(&self) -> bool {
        matches!(
            self,
            ConditionKind::AssertionFailed
                | ConditionKind::ExpectationFailed
                | ConditionKind::OutputMismatch
        )
    }
}

/// Single frame of a condition's trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub file: String,
    pub line: u32,
}

impl StackFrame {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Expected/actual pair attached to an expectation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonFailure {
    pub expected: String,
    pub actual: String,
}

impl ComparisonFailure {
    pub fn new(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Unified-style, line-oriented diff of expected against actual.
    /// A last line without a newline is flagged the way `diff -u` does.
    pub fn diff(&self) -> String {
        let mut buffer = String::from("\n--- Expected\n+++ Actual\n@@ @@\n");
        let mut lines: Vec<&str> = Vec::new();
        let mut index: HashMap<&str, char> = HashMap::new();
        let encoded = encode_lines(&self.expected, &mut lines, &mut index)
            .zip(encode_lines(&self.actual, &mut lines, &mut index));

        let Some((expected, actual)) = encoded else {
            // Too many distinct lines to encode; show both sides whole.
            push_lines(&mut buffer, '-', self.expected.split_inclusive('\n'));
            push_lines(&mut buffer, '+', self.actual.split_inclusive('\n'));
            return buffer;
        };

        for chunk in dissimilar::diff(&expected, &actual) {
            let (marker, encoded) = match chunk {
                dissimilar::Chunk::Equal(text) => (' ', text),
                dissimilar::Chunk::Delete(text) => ('-', text),
                dissimilar::Chunk::Insert(text) => ('+', text),
            };
            push_lines(
                &mut buffer,
                marker,
                encoded.chars().map(|symbol| decode_line(symbol, &lines)),
            );
        }

        buffer
    }
}

fn push_lines<'a>(buffer: &mut String, marker: char, lines: impl Iterator<Item = &'a str>) {
    for line in lines {
        buffer.push(marker);
        match line.strip_suffix('\n') {
            Some(content) => buffer.push_str(content),
            None => {
                buffer.push_str(line);
                buffer.push_str("\n\\ No newline at end of file");
            }
        }
        buffer.push('\n');
    }
}

// Each distinct line becomes one scalar value so the character diff works line by line.
// Symbols start above the surrogate block, leaving room for about a million distinct lines.
const LINE_SYMBOL_BASE: u32 = 0xE000;

fn symbol_for(position: usize) -> Option<char> {
    let position = u32::try_from(position).ok()?;
    char::from_u32(LINE_SYMBOL_BASE.checked_add(position)?)
}

/// `None` once the text holds more distinct lines than there are symbols
fn encode_lines<'a>(
    text: &'a str,
    lines: &mut Vec<&'a str>,
    index: &mut HashMap<&'a str, char>,
) -> Option<String> {
    let mut encoded = String::new();
    for line in text.split_inclusive('\n') {
        let symbol = match index.get(line) {
            Some(symbol) => *symbol,
            None => {
                let symbol = symbol_for(lines.len())?;
                lines.push(line);
                index.insert(line, symbol);
                symbol
            }
        };
        encoded.push(symbol);
    }
    Some(encoded)
}

fn decode_line<'a>(symbol: char, lines: &[&'a str]) -> &'a str {
    (symbol as u32)
        .checked_sub(LINE_SYMBOL_BASE)
        .and_then(|i| lines.get(i as usize))
        .copied()
        .unwrap_or("")
}

/// Condition raised by a test: message, optional diff, trace and causal chain
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[error("{message}")]
pub struct Condition {
    pub kind: ConditionKind,
    pub message: String,
    pub comparison: Option<ComparisonFailure>,
    pub trace: Vec<StackFrame>,
    #[source]
    pub previous: Option<Box<Condition>>,
}

impl Condition {
    pub fn new(kind: ConditionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            comparison: None,
            trace: Vec::new(),
            previous: None,
        }
    }

    pub fn assertion_failed(message: impl Into<String>) -> Self {
        Self::new(ConditionKind::AssertionFailed, message)
    }

    /// Assertion failure that carries an expected/actual comparison
    pub fn expectation_failed(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let mut condition = Self::new(ConditionKind::ExpectationFailed, message);
        condition.comparison = Some(ComparisonFailure::new(expected, actual));
        condition
    }

    pub fn runtime(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ConditionKind::Runtime {
                class: class.into(),
            },
            message,
        )
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ConditionKind::Warning, message)
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self::new(ConditionKind::Notice, message)
    }

    pub fn deprecated(message: impl Into<String>) -> Self {
        Self::new(ConditionKind::Deprecated, message)
    }

    pub fn incomplete(message: impl Into<String>) -> Self {
        Self::new(ConditionKind::Incomplete, message)
    }

    pub fn risky(message: impl Into<String>) -> Self {
        Self::new(ConditionKind::Risky, message)
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self::new(ConditionKind::Skipped, message)
    }

    pub fn with_frame(mut self, file: impl Into<String>, line: u32) -> Self {
        self.trace.push(StackFrame::new(file, line));
        self
    }

    pub fn caused_by(mut self, previous: Condition) -> Self {
        self.previous = Some(Box::new(previous));
        self
    }

    /// Iterate over the causal chain, starting with the condition this one wraps
    pub fn causes(&self) -> impl Iterator<Item = &Condition> {
        std::iter::successors(self.previous.as_deref(), |c| c.previous.as_deref())
    }
}

/// Classified result of one leaf-test execution
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    Error(Condition),
    Failure(Condition),
    Warning(Condition),
    Incomplete(Condition),
    Risky(Condition),
    Skipped(Condition),
}

impl Outcome {
    pub fn category(&self) -> Option<Category> {
        match self {
            Outcome::Passed => None,
            Outcome::Error(_) => Some(Category::Error),
            Outcome::Failure(_) => Some(Category::Failure),
            Outcome::Warning(_) => Some(Category::Warning),
            Outcome::Incomplete(_) => Some(Category::Incomplete),
            Outcome::Risky(_) => Some(Category::Risky),
            Outcome::Skipped(_) => Some(Category::Skipped),
        }
    }

    pub fn condition(&self) -> Option<&Condition> {
        match self {
            Outcome::Passed => None,
            Outcome::Error(c)
            | Outcome::Failure(c)
            | Outcome::Warning(c)
            | Outcome::Incomplete(c)
            | Outcome::Risky(c)
            | Outcome::Skipped(c) => Some(c),
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    /// Split into category and condition, `None` when passed
    pub fn into_parts(self) -> Option<(Category, Condition)> {
        let category = self.category()?;
        match self {
            Outcome::Passed => None,
            Outcome::Error(c)
            | Outcome::Failure(c)
            | Outcome::Warning(c)
            | Outcome::Incomplete(c)
            | Outcome::Risky(c)
            | Outcome::Skipped(c) => Some((category, c)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_outcome_category() {
        assert_eq!(Outcome::Passed.category(), None);
        assert_eq!(
            Outcome::Failure(Condition::assertion_failed("x")).category(),
            Some(Category::Failure)
        );
        assert_eq!(
            Outcome::Skipped(Condition::skipped("x")).category(),
            Some(Category::Skipped)
        );
    }

    #[test]
    fn test_condition_source_is_previous() {
        let condition = Condition::runtime("RuntimeException", "outer")
            .caused_by(Condition::runtime("LogicException", "inner"));

        let source = condition.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("inner"));
    }

    #[test]
    fn test_condition_causes_walks_chain() {
        let condition = Condition::runtime("A", "a")
            .caused_by(Condition::runtime("B", "b").caused_by(Condition::runtime("C", "c")));

        let messages: Vec<_> = condition.causes().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["b", "c"]);
    }

    #[test]
    fn test_comparison_diff_marks_changed_lines() {
        let comparison = ComparisonFailure::new("foo\nbar\n", "foo\nbaz\n");
        let diff = comparison.diff();

        assert!(diff.contains("--- Expected"));
        assert!(diff.contains("+++ Actual"));
        assert!(diff.contains(" foo\n"));
        assert!(diff.contains("-bar\n"));
        assert!(diff.contains("+baz\n"));
    }

    #[test]
    fn test_comparison_diff_shows_missing_trailing_newline() {
        let diff = ComparisonFailure::new("foo", "foo\n").diff();

        assert_eq!(
            diff,
            "\n--- Expected\n+++ Actual\n@@ @@\n-foo\n\\ No newline at end of file\n+foo\n"
        );
    }

    #[test]
    fn test_comparison_diff_handles_many_distinct_lines() {
        let expected: String = (0..140_000).map(|i| format!("line {}\n", i)).collect();
        let actual = format!("{}extra\n", expected);

        let diff = ComparisonFailure::new(expected, actual).diff();

        assert!(diff.contains(" line 0\n"));
        assert!(diff.contains(" line 139999\n"));
        assert!(diff.ends_with("+extra\n"));
    }

    #[test]
    fn test_status_code_from_category() {
        assert_eq!(StatusCode::from(None) as i32, 0);
        assert_eq!(StatusCode::from(Some(Category::Error)) as i32, 4);
        assert_eq!(StatusCode::from(Some(Category::Warning)) as i32, 6);
    }

    #[test]
    fn test_harmless_categories() {
        assert!(Category::Risky.is_harmless());
        assert!(!Category::Warning.is_harmless());
        assert!(!Category::Error.is_harmless());
    }
}
