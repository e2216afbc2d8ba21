//! Persistence for stories, scrape logs, quiz progress, submissions and
//! weekly scripts.
//!
//! Consumers depend on the traits in [`traits`]; [`PgStore`] implements all of
//! them against Postgres. `MemoryStore` (feature `test-support`) implements
//! them in memory for tests.

pub mod pg;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use pg::PgStore;
pub use traits::{QuizStore, ScrapeLog, ScriptStore, StoryStore};
