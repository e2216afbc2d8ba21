//! Quiz taking: the attempt state machine, local and remote progress sinks,
//! the effectful session that ties them to storage, and grading.

pub mod cache;
pub mod error;
pub mod grading;
pub mod machine;
pub mod session;
pub mod sinks;

pub use cache::{cache_key, CachedProgress, FileCache, LocalCache, MemoryCache};
pub use error::QuizError;
pub use grading::{grade, leaderboard, revision, LeaderboardEntry, RevisionItem};
pub use machine::{transition, AttemptState, Phase, QuizEvent, SavedFrom, SavedProgress};
pub use session::{QuizSession, ResumeOutcome, StartOutcome};
pub use sinks::{DebouncedRemoteSink, LocalCacheSink, ProgressSink, REMOTE_QUIET_PERIOD};
