//! The AI news pipeline: source fetchers, settle-all fan-out, dedup,
//! scoring, the aggregation run and weekly script generation.

pub mod aggregate;
pub mod dedup;
pub mod fanout;
pub mod scorer;
pub mod sources;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod weekly_script;

pub use aggregate::{AggregationResult, Aggregator};
pub use sources::{default_fetchers, NewsFetcher};
pub use weekly_script::{ScriptError, ScriptGenerator, ScriptRun};
