use std::fmt;

use crate::models::{GroupMap, RankMap};

/// One rendered block: a tier (or clan) label and its joined member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardField {
    pub name: String,
    pub value: String,
}

/// Ordered leaderboard view of one reconciliation pass. Produced for the
/// display layer; the engine itself only logs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    pub fields: Vec<LeaderboardField>,
    pub summary: String,
}

/// Renders the rank map into display order: strictly descending by tier,
/// with `Unranked` first so users the thresholds could not place are
/// surfaced prominently. Tiers without members are omitted. Pure; the map
/// is not touched.
pub fn render(rank_map: &RankMap, member_count: usize) -> Leaderboard {
    let fields = rank_map
        .iter()
        .rev()
        .filter(|(_, labels)| !labels.is_empty())
        .map(|(rank, labels)| LeaderboardField {
            name: rank.to_string(),
            value: labels.join(", "),
        })
        .collect();

    Leaderboard {
        fields,
        summary: format!("{} users 👤", member_count),
    }
}

/// Same field structure for clan rosters, ordered by clan name.
pub fn render_groups(groups: &GroupMap) -> Vec<LeaderboardField> {
    groups
        .iter()
        .filter(|(_, members)| !members.is_empty())
        .map(|(name, members)| LeaderboardField {
            name: name.clone(),
            value: members.join(", "),
        })
        .collect()
}

impl fmt::Display for Leaderboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            writeln!(f, "{}: {}", field.name, field.value)?;
        }
        writeln!(f, "{}", self.summary)
    }
}
