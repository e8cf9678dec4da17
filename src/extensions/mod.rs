// Extensions - listeners that talk to systems outside the run

pub mod ticket;

pub use ticket::{InMemoryTracker, TicketInfo, TicketListener, TicketTracker, TicketUpdate};
