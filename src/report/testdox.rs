// TestDox XML reporter - one <test> node per finished test case, written on flush

use super::{NamePrettifier, Printer, TestListener};
use crate::execution::{Test, TestSize};
use crate::state::{Condition, StatusCode};
use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::io::Write;
use std::time::Duration;
use tracing::debug;

const SIZE_GROUPS: [&str; 3] = ["small", "medium", "large"];

#[derive(Debug, Clone, PartialEq)]
struct TestNode {
    class_name: String,
    method_name: String,
    prettified_class_name: String,
    prettified_method_name: String,
    status: StatusCode,
    time: Duration,
    size: TestSize,
    groups: Vec<String>,
    exception_line: Option<u32>,
    exception_message: Option<String>,
}

/// Accumulates a TestDox document and writes it once the run is over
pub struct TestDoxXmlPrinter<W: Write> {
    out: W,
    prettifier: NamePrettifier,
    nodes: Vec<TestNode>,
    exception: Option<Condition>,
    flushed: bool,
}

impl<W: Write> TestDoxXmlPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            prettifier: NamePrettifier::new(),
            nodes: Vec::new(),
            exception: None,
            flushed: false,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_document(&mut self) -> Result<()> {
        let mut writer = Writer::new_with_indent(&mut self.out, b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        if self.nodes.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("tests")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("tests")))?;
            for node in &self.nodes {
                writer.write_event(Event::Empty(node_tag(node)))?;
            }
            writer.write_event(Event::End(BytesEnd::new("tests")))?;
        }

        self.out.write_all(b"\n")?;
        Ok(())
    }
}

fn node_tag(node: &TestNode) -> BytesStart<'static> {
    let mut tag = BytesStart::new("test");
    tag.push_attribute(("className", node.class_name.as_str()));
    tag.push_attribute(("methodName", node.method_name.as_str()));
    tag.push_attribute(("prettifiedClassName", node.prettified_class_name.as_str()));
    tag.push_attribute(("prettifiedMethodName", node.prettified_method_name.as_str()));
    tag.push_attribute(("status", (node.status as i32).to_string().as_str()));
    tag.push_attribute(("time", format!("{:.6}", node.time.as_secs_f64()).as_str()));
    tag.push_attribute(("size", node.size.code().to_string().as_str()));
    tag.push_attribute(("groups", node.groups.join(",").as_str()));

    if let Some(line) = node.exception_line {
        tag.push_attribute(("exceptionLine", line.to_string().as_str()));
    }
    if let Some(message) = &node.exception_message {
        tag.push_attribute(("exceptionMessage", message.as_str()));
    }
    tag
}

impl<W: Write> TestListener for TestDoxXmlPrinter<W> {
    fn add_error(
        &mut self,
        _test: &dyn Test,
        condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.exception = Some(condition.clone());
        Ok(())
    }

    fn add_failure(
        &mut self,
        _test: &dyn Test,
        condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.exception = Some(condition.clone());
        Ok(())
    }

    fn start_test(&mut self, _test: &dyn Test) -> Result<()> {
        self.exception = None;
        Ok(())
    }

    fn end_test(&mut self, test: &dyn Test, time: Duration) -> Result<()> {
        let Some(case) = test.as_case() else {
            return Ok(());
        };
        if case.is_synthetic() {
            return Ok(());
        }

        let metadata = case.metadata();
        let groups = metadata
            .groups
            .iter()
            .filter(|group| !SIZE_GROUPS.iter().any(|size| *size == group.as_str()))
            .cloned()
            .collect();

        let exception = self.exception.take();
        let exception_line = exception.as_ref().and_then(|condition| {
            let file = metadata.file.as_deref()?;
            condition
                .trace
                .iter()
                .find(|frame| frame.file == file)
                .map(|frame| frame.line)
        });

        let method_name = case.name_with_data_set();
        let node = TestNode {
            class_name: case.class_name().to_string(),
            prettified_class_name: self.prettifier.prettify_test_class(case.class_name()),
            prettified_method_name: self.prettifier.prettify_test_method(&method_name),
            method_name,
            status: StatusCode::from(case.outcome().and_then(|o| o.category())),
            time,
            size: metadata.size,
            groups,
            exception_line,
            exception_message: exception.map(|condition| condition.message),
        };

        self.nodes.push(node);
        Ok(())
    }
}

impl<W: Write> Printer for TestDoxXmlPrinter<W> {
    fn flush(&mut self) -> Result<()> {
        if !self.flushed {
            self.write_document().context("Failed to write TestDox XML")?;
            self.flushed = true;
            debug!("Wrote TestDox XML with {} test(s)", self.nodes.len());
        }
        self.out.flush()?;
        Ok(())
    }
}
