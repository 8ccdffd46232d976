//! The highlight notification pipeline: keyword cache, cooldown tracking,
//! and edit/delete propagation for already-sent notifications.

pub mod cache;
pub mod commands;
pub mod cooldown;
pub mod pending;
pub mod pipeline;

pub use cache::HighlightCache;
pub use cooldown::CooldownTracker;
pub use pipeline::{DismissOutcome, HighlightPipeline, PipelineConfig};
