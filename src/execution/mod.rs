// Execution module - runnable tests, decorators and the run driver

pub mod decorator;
pub mod runner;
pub mod suite;

pub use decorator::{RepeatedTest, TestDecorator};
pub use runner::{RunOptions, TestRunner};
pub use suite::{DEFAULT_GROUP, TestSuite};
pub use test::{Test, TestBody, TestCase, TestContext, TestId, TestMetadata, TestSize};
