// Filter module - test tree selection ahead of a run

pub mod group;

pub use group::{FilterMode, GroupFilter};
