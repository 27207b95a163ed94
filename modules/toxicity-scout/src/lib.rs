pub mod classifier;
pub mod corpus;
pub mod normalizer;
pub mod persist;
pub mod prompt;
pub mod report;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod walker;
