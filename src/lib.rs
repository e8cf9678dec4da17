pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod execution;
pub mod extensions;
pub mod filter;
pub mod logging;
pub mod plan;
pub mod report;
pub mod state;

pub use error::FrameworkError;
pub use execution::{RepeatedTest, RunOptions, Test, TestCase, TestRunner, TestSuite};
pub use plan::TestPlan;
pub use report::TestListener;
pub use state::TestResults;
