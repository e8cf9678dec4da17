// Ticket reconciliation - close or reopen tracker tickets from test outcomes

use crate::execution::Test;
use crate::report::TestListener;
use crate::state::{Category, Condition};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const CLOSE_MESSAGE: &str = "Automatically closed by unitrun (test passed).";
pub const REOPEN_MESSAGE: &str = "Automatically reopened by unitrun (test failed).";

const CLOSE_IF_STATUS: [&str; 3] = ["assigned", "new", "reopened"];
const REOPEN_IF_STATUS: [&str; 1] = ["closed"];

/// Tracker-side view of a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketInfo {
    pub status: String,
}

/// Binding to an issue tracker. Errors propagate to the driver untouched.
pub trait TicketTracker {
    fn fetch_ticket_info(&mut self, ticket_id: &str) -> Result<TicketInfo>;

    fn update_ticket(
        &mut self,
        ticket_id: &str,
        new_status: &str,
        message: &str,
        resolution: &str,
    ) -> Result<()>;
}

struct Adjustment {
    if_status: &'static [&'static str],
    new_status: &'static str,
    message: &'static str,
    resolution: &'static str,
    cumulative: bool,
}

const CLOSE: Adjustment = Adjustment {
    if_status: &CLOSE_IF_STATUS,
    new_status: "closed",
    message: CLOSE_MESSAGE,
    resolution: "fixed",
    cumulative: true,
};

const REOPEN: Adjustment = Adjustment {
    if_status: &REOPEN_IF_STATUS,
    new_status: "reopened",
    message: REOPEN_MESSAGE,
    resolution: "",
    cumulative: false,
};

/// Listener that reconciles ticket state with the outcomes of the tests referencing them.
///
/// A ticket is closed only once every registered test referencing it has passed,
/// and reopened as soon as one of them fails or errors. Registration in the ledger
/// happens for the first test this listener sees and is suppressed afterwards.
pub struct TicketListener<T: TicketTracker> {
    tracker: T,
    ticket_counts: HashMap<String, HashSet<String>>,
    ran: bool,
    current: Option<Category>,
}

impl<T: TicketTracker> TicketListener<T> {
    pub fn new(tracker: T) -> Self {
        Self {
            tracker,
            ticket_counts: HashMap::new(),
            ran: false,
            current: None,
        }
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Tests still holding `ticket` open
    pub fn pending_tests(&self, ticket: &str) -> usize {
        self.ticket_counts.get(ticket).map_or(0, HashSet::len)
    }

    fn observe(&mut self, category: Category) -> Result<()> {
        self.current.get_or_insert(category);
        Ok(())
    }

    fn adjust(&mut self, ticket: &str, adjustment: &Adjustment) -> Result<()> {
        let info = self
            .tracker
            .fetch_ticket_info(ticket)
            .with_context(|| format!("Failed to fetch ticket {}", ticket))?;

        if adjustment.if_status.iter().any(|status| *status == info.status) {
            info!(
                "Ticket {}: {} -> {}",
                ticket, info.status, adjustment.new_status
            );
            self.tracker.update_ticket(
                ticket,
                adjustment.new_status,
                adjustment.message,
                adjustment.resolution,
            )?;
        }
        Ok(())
    }
}

impl<T: TicketTracker> TestListener for TicketListener<T> {
    fn add_error(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.observe(Category::Error)
    }

    fn add_warning(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.observe(Category::Warning)
    }

    fn add_failure(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.observe(Category::Failure)
    }

    fn add_incomplete_test(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.observe(Category::Incomplete)
    }

    fn add_risky_test(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.observe(Category::Risky)
    }

    fn add_skipped_test(
        &mut self,
        _test: &dyn Test,
        _condition: &Condition,
        _time: Duration,
    ) -> Result<()> {
        self.observe(Category::Skipped)
    }

    fn start_test(&mut self, test: &dyn Test) -> Result<()> {
        self.current = None;

        let Some(case) = test.as_case() else {
            return Ok(());
        };
        if case.is_synthetic() || self.ran {
            return Ok(());
        }

        for ticket in &case.metadata().tickets {
            debug!("Ticket {} referenced by {}", ticket, case.name());
            self.ticket_counts
                .entry(ticket.clone())
                .or_default()
                .insert(case.name().to_string());
        }
        self.ran = true;
        Ok(())
    }

    fn end_test(&mut self, test: &dyn Test, _time: Duration) -> Result<()> {
        let Some(case) = test.as_case() else {
            return Ok(());
        };
        if case.is_synthetic() {
            return Ok(());
        }

        let adjustment = match self.current.take() {
            None => &CLOSE,
            Some(Category::Failure | Category::Error) => &REOPEN,
            Some(_) => return Ok(()),
        };

        let name = case.name();
        for ticket in &case.metadata().tickets {
            if adjustment.cumulative {
                if let Some(pending) = self.ticket_counts.get_mut(ticket) {
                    pending.remove(name);
                }
                if self.pending_tests(ticket) > 0 {
                    debug!("Ticket {} still has failing or pending tests", ticket);
                    continue;
                }
            }

            self.adjust(ticket, adjustment)?;
        }
        Ok(())
    }
}

/// One `update_ticket` call as seen by [`InMemoryTracker`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketUpdate {
    pub ticket: String,
    pub status: String,
    pub message: String,
    pub resolution: String,
}

/// Tracker backed by a map of ticket id to status; records every update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryTracker {
    tickets: BTreeMap<String, String>,
    updates: Vec<TicketUpdate>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticket(mut self, id: impl Into<String>, status: impl Into<String>) -> Self {
        self.tickets.insert(id.into(), status.into());
        self
    }

    /// Load a `{"<id>": "<status>"}` JSON document
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tickets file: {}", path.display()))?;
        let tickets = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse tickets file: {}", path.display()))?;

        Ok(Self {
            tickets,
            updates: Vec::new(),
        })
    }

    /// Write current statuses back in the format `load` reads
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.tickets)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write tickets file: {}", path.display()))
    }

    pub fn status(&self, id: &str) -> Option<&str> {
        self.tickets.get(id).map(String::as_str)
    }

    pub fn updates(&self) -> &[TicketUpdate] {
        &self.updates
    }
}

impl TicketTracker for InMemoryTracker {
    fn fetch_ticket_info(&mut self, ticket_id: &str) -> Result<TicketInfo> {
        match self.tickets.get(ticket_id) {
            Some(status) => Ok(TicketInfo {
                status: status.clone(),
            }),
            None => bail!("Unknown ticket: {}", ticket_id),
        }
    }

    fn update_ticket(
        &mut self,
        ticket_id: &str,
        new_status: &str,
        message: &str,
        resolution: &str,
    ) -> Result<()> {
        self.tickets
            .insert(ticket_id.to_string(), new_status.to_string());
        self.updates.push(TicketUpdate {
            ticket: ticket_id.to_string(),
            status: new_status.to_string(),
            message: message.to_string(),
            resolution: resolution.to_string(),
        });
        Ok(())
    }
}
