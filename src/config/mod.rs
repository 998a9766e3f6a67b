pub mod clans;
pub mod settings;

pub use clans::load_clans;
pub use settings::{DatabaseSettings, ScheduleSettings, Settings, StatusSettings};
