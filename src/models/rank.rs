use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Classification outcome for one user in one reconciliation pass.
///
/// `Unranked` is a first-class variant, not a numeric sentinel, and it
/// deliberately sorts above every real tier so that users the thresholds
/// could not place are surfaced at the top of the leaderboard instead of
/// disappearing at the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    Ranked(u32),
    Unranked,
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Rank::Unranked, Rank::Unranked) => Ordering::Equal,
            (Rank::Unranked, Rank::Ranked(_)) => Ordering::Greater,
            (Rank::Ranked(_), Rank::Unranked) => Ordering::Less,
            (Rank::Ranked(a), Rank::Ranked(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Ranked(tier) => write!(f, "Rank {}", tier),
            Rank::Unranked => write!(f, "Unranked"),
        }
    }
}

impl Rank {
    /// Platform role name for this rank, if one should be held.
    /// Unranked users hold no rank-role at all.
    pub fn role_name(&self) -> Option<String> {
        match self {
            Rank::Ranked(tier) => Some(format!("Rank {}", tier)),
            Rank::Unranked => None,
        }
    }
}

/// One entry of the ordered threshold table: scores at or above `min_score`
/// (and below the next threshold) belong to `tier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankThreshold {
    pub min_score: f64,
    pub tier: u32,
}
