use crate::config::Settings;
use crate::models::{ActivityRecord, Rank, RankThreshold};

/// Maps aggregated activity to a rank tier: a weighted score over the two
/// activity counters, looked up in the ordered threshold table.
pub struct RankClassifier {
    chat_activity_ratio: f64,
    game_activity_ratio: f64,
    thresholds: Vec<RankThreshold>,
}

impl RankClassifier {
    pub fn new(
        chat_activity_ratio: f64,
        game_activity_ratio: f64,
        thresholds: Vec<RankThreshold>,
    ) -> Self {
        Self {
            chat_activity_ratio,
            game_activity_ratio,
            thresholds,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.chat_activity_ratio,
            settings.game_activity_ratio,
            settings.thresholds.clone(),
        )
    }

    /// Weighted activity score. With both ratios at their 0 default this is
    /// flat, leaving classification purely threshold-driven.
    pub fn score(&self, record: &ActivityRecord) -> f64 {
        record.chat_activity * self.chat_activity_ratio
            + record.game_activity * self.game_activity_ratio
    }

    /// The tier of the highest threshold at or below the score. A
    /// non-finite score, an empty threshold table, or a score below the
    /// lowest threshold all classify as `Unranked`, never as an error.
    pub fn classify(&self, record: &ActivityRecord) -> Rank {
        let score = self.score(record);
        if !score.is_finite() {
            return Rank::Unranked;
        }

        let mut matched = None;
        for threshold in &self.thresholds {
            if score >= threshold.min_score {
                matched = Some(threshold.tier);
            } else {
                break;
            }
        }

        match matched {
            Some(tier) => Rank::Ranked(tier),
            None => Rank::Unranked,
        }
    }

    /// Every platform role name a tier can map to, used by the synchronizer
    /// to tell rank-roles apart from unrelated roles.
    pub fn rank_role_names(&self) -> Vec<String> {
        self.thresholds
            .iter()
            .filter_map(|t| Rank::Ranked(t.tier).role_name())
            .collect()
    }
}
