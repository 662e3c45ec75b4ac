//! SDG scoring domain - the content-scoring pipeline.
//!
//! An upload notification for `posts/{id}.{ext}` drives one pass through:
//! safety check, SDG relevance scoring, post finalization, then user score
//! and streak aggregation. All infrastructure access goes through the
//! `Base*` traits in the kernel so the whole pipeline runs against fakes
//! in tests.

pub mod aggregator;
pub mod classify;
pub mod decision;
pub mod dispatcher;
pub mod models;
pub mod prompts;
pub mod streak;

pub use classify::ClassifierClient;
pub use decision::decide;
pub use dispatcher::{handle_upload, PipelineOutcome};
pub use models::{Decision, Post, PostKind, PostStatus, RelevanceVerdict, SafetyVerdict, StorageEvent, User};
pub use streak::next_streak;
