pub mod classify;
pub mod config;
pub mod db;
pub mod engine;
pub mod models;
pub mod render;
pub mod status;
pub mod sync;

pub use config::Settings;
pub use engine::{classify_all, group_by_clans, run_scheduled, ReconcileContext};
pub use models::{ActivityRecord, Rank, RankEngineError, RankMap, RankThreshold, Result};
pub use render::{render, Leaderboard};
