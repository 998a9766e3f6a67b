use serde::{Deserialize, Serialize};

/// Aggregated per-user activity for one reconciliation pass.
///
/// Built fresh from the datastore on every pass; the engine never persists
/// these. One record per platform user id (the aggregation query groups by
/// it), with chat and game activity summed across all of the user's linked
/// rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub user_id: String,
    pub nicknames: Vec<String>,
    pub chat_activity: f64,
    pub game_activity: f64,
}

impl ActivityRecord {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            nicknames: Vec::new(),
            chat_activity: 0.0,
            game_activity: 0.0,
        }
    }

    /// Display label: first known nickname, falling back to the user id.
    pub fn label(&self) -> &str {
        self.nicknames
            .first()
            .map(String::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.user_id)
    }
}

/// A named clan and the nickname patterns that identify its members,
/// loaded from the separate clans configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClanGroup {
    pub name: String,
    #[serde(default)]
    pub member_patterns: Vec<String>,
}

impl ClanGroup {
    /// Whether any of the record's nicknames matches one of the clan's
    /// member patterns (case-insensitive substring match).
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        self.member_patterns.iter().any(|pattern| {
            let pattern = pattern.to_lowercase();
            record
                .nicknames
                .iter()
                .any(|nick| nick.to_lowercase().contains(&pattern))
        })
    }
}
