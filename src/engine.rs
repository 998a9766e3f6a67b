use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::classify::RankClassifier;
use crate::config::{load_clans, Settings};
use crate::db::ActivityStore;
use crate::models::{ActivityRecord, ClanGroup, GroupMap, RankMap, Result};
use crate::render::{render, Leaderboard};
use crate::status::{update_presence, StatusSource};
use crate::sync::{PresenceApi, RoleApi, RoleAssignment, RoleSynchronizer, SyncReport};

/// Everything one reconciliation pass needs, created once at startup after
/// config validation and held for the process lifetime. Never mutated
/// between passes.
pub struct ReconcileContext {
    settings: Settings,
    classifier: RankClassifier,
    store: ActivityStore,
    clans: Vec<ClanGroup>,
}

/// Pure classification result for one pass, before any platform I/O.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub rank_map: RankMap,
    pub assignments: Vec<RoleAssignment>,
    pub member_count: usize,
}

/// What one completed pass produced.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub leaderboard: Leaderboard,
    pub sync: SyncReport,
}

impl ReconcileContext {
    /// Connects the datastore and loads the optional clan table. A
    /// connection failure here is fatal; the caller terminates the process.
    pub async fn initialize(settings: Settings) -> Result<Self> {
        let store = ActivityStore::connect(&settings.db, &settings.table_name).await?;

        let clans = match &settings.clans_config_path {
            Some(path) => match load_clans(path) {
                Ok(clans) => {
                    info!("Loaded {} clan groups", clans.len());
                    clans
                }
                Err(e) => {
                    warn!("Failed to load clans config {}: {}", path, e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let classifier = RankClassifier::from_settings(&settings);

        Ok(Self {
            settings,
            classifier,
            store,
            clans,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn classifier(&self) -> &RankClassifier {
        &self.classifier
    }

    /// One full reconciliation pass: aggregate, classify, render, and push
    /// role state. A datastore error aborts only this pass.
    pub async fn run_pass(&self, roles: &dyn RoleApi) -> Result<PassReport> {
        let started_at = Utc::now();

        let records = self.store.fetch_activity().await?;
        info!("Fetched activity for {} users", records.len());

        let outcome = classify_all(&self.classifier, &records);
        let leaderboard = render(&outcome.rank_map, outcome.member_count);

        let synchronizer = RoleSynchronizer::new(roles, self.classifier.rank_role_names());
        let sync = synchronizer.sync_all(&outcome.assignments).await;

        info!(
            "Pass complete: {} updated, {} unchanged, {} failed",
            sync.updated, sync.unchanged, sync.failed
        );

        Ok(PassReport {
            started_at,
            leaderboard,
            sync,
        })
    }

    /// Renders the current leaderboard without touching role state.
    pub async fn leaderboard(&self) -> Result<Leaderboard> {
        let records = self.store.fetch_activity().await?;
        let outcome = classify_all(&self.classifier, &records);
        Ok(render(&outcome.rank_map, outcome.member_count))
    }

    /// Clan rosters for the current activity records.
    pub async fn clan_roster(&self) -> Result<GroupMap> {
        let records = self.store.fetch_activity().await?;
        Ok(group_by_clans(&self.clans, &records))
    }
}

/// Classifies every record, keeping query order within each tier, and
/// collects the desired role assignment per user.
pub fn classify_all(classifier: &RankClassifier, records: &[ActivityRecord]) -> PassOutcome {
    let mut rank_map = RankMap::new();
    let mut assignments = Vec::with_capacity(records.len());
    let mut member_count = 0;

    for record in records {
        let rank = classifier.classify(record);
        if rank_map.add(rank, record.label()) {
            member_count += 1;
        }
        assignments.push(RoleAssignment {
            user_id: record.user_id.clone(),
            rank,
        });
    }

    PassOutcome {
        rank_map,
        assignments,
        member_count,
    }
}

/// Partitions records into clan groups by nickname match. A record can
/// belong to several clans; unmatched records belong to none.
pub fn group_by_clans(clans: &[ClanGroup], records: &[ActivityRecord]) -> GroupMap {
    let mut groups = GroupMap::new();

    for record in records {
        for clan in clans {
            if clan.matches(record) {
                groups.add_raw(&clan.name, record.label().to_string());
            }
        }
    }

    groups
}

/// Keeps a second reconciliation pass from starting while one is still in
/// flight. `try_begin` hands out a token that releases the guard when
/// dropped, so a panicking pass cannot leave it latched.
pub struct PassGuard {
    in_flight: Arc<AtomicBool>,
}

impl Default for PassGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl PassGuard {
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn try_begin(&self) -> Option<PassToken> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(PassToken {
            in_flight: Arc::clone(&self.in_flight),
        })
    }
}

pub struct PassToken {
    in_flight: Arc<AtomicBool>,
}

impl Drop for PassToken {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

/// Reconciliation timer: fixed period, first tick one full period after
/// startup, late ticks delayed rather than bunched.
fn reconcile_interval(minutes: u64) -> tokio::time::Interval {
    let period = Duration::from_secs(minutes * 60);
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Runs the pipeline on the configured timer until the process exits. Ticks
/// are guarded: if a pass is still in flight when the next tick fires, the
/// tick is skipped with a warning rather than running two passes against
/// the same role state.
pub async fn run_scheduled(
    ctx: Arc<ReconcileContext>,
    roles: Arc<dyn RoleApi>,
    presence: Arc<dyn PresenceApi>,
    status: Option<Arc<dyn StatusSource>>,
) {
    let minutes = ctx.settings.schedule.interval_minutes;
    info!("Scheduling reconciliation every {} minutes", minutes);

    let mut interval = reconcile_interval(minutes);
    let guard = PassGuard::new();

    loop {
        interval.tick().await;

        let token = match guard.try_begin() {
            Some(token) => token,
            None => {
                warn!("Previous reconciliation pass still in flight, skipping this tick");
                continue;
            }
        };

        let ctx = Arc::clone(&ctx);
        let roles = Arc::clone(&roles);
        let presence = Arc::clone(&presence);
        let status = status.clone();

        tokio::spawn(async move {
            // releases the guard on completion or panic
            let _token = token;

            // Presence poll and rank pass share the tick but their
            // failures are isolated from each other.
            if let Some(source) = &status {
                update_presence(source.as_ref(), presence.as_ref()).await;
            }

            match ctx.run_pass(roles.as_ref()).await {
                Ok(report) => info!("Leaderboard: {}", report.leaderboard.summary),
                Err(e) => error!("Reconciliation pass failed, will retry next tick: {}", e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rank, RankThreshold};

    fn record(id: &str, nick: &str, chat: f64, game: f64) -> ActivityRecord {
        ActivityRecord {
            user_id: id.to_string(),
            nicknames: if nick.is_empty() {
                vec![]
            } else {
                vec![nick.to_string()]
            },
            chat_activity: chat,
            game_activity: game,
        }
    }

    fn classifier() -> RankClassifier {
        RankClassifier::new(
            1.0,
            2.0,
            vec![
                RankThreshold {
                    min_score: 0.0,
                    tier: 0,
                },
                RankThreshold {
                    min_score: 50.0,
                    tier: 1,
                },
                RankThreshold {
                    min_score: 100.0,
                    tier: 2,
                },
            ],
        )
    }

    #[test]
    fn test_classify_all_counts_and_assigns_every_user() {
        let records = vec![
            record("1", "Alice", 120.0, 0.0),
            record("2", "Bob", 100.0, 0.0),
            record("3", "Carol", 10.0, 0.0),
            record("4", "", 0.0, 0.0),
        ];

        let outcome = classify_all(&classifier(), &records);

        assert_eq!(outcome.member_count, 4);
        assert_eq!(outcome.assignments.len(), 4);
        assert_eq!(outcome.assignments[0].rank, Rank::Ranked(2));
        assert_eq!(outcome.assignments[3].rank, Rank::Ranked(0));
        assert_eq!(
            outcome.rank_map.members(Rank::Ranked(2)),
            Some("Alice, Bob".to_string())
        );
        // nickname-less user falls back to their platform id
        assert_eq!(
            outcome.rank_map.members(Rank::Ranked(0)),
            Some("Carol, 4".to_string())
        );
    }

    #[test]
    fn test_guard_skips_second_pass_while_one_is_in_flight() {
        let guard = PassGuard::new();

        let token = guard.try_begin().expect("first pass must start");
        assert!(guard.try_begin().is_none());

        drop(token);
        assert!(guard.try_begin().is_some());
    }

    #[test]
    fn test_guard_is_released_when_a_pass_panics() {
        let guard = PassGuard::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _token = guard.try_begin().expect("pass must start");
            panic!("datastore blew up mid-pass");
        }));
        assert!(result.is_err());

        assert!(guard.try_begin().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_a_full_period() {
        let mut interval = reconcile_interval(10);
        assert_eq!(interval.period(), Duration::from_secs(600));

        // nothing fires before the first period has elapsed
        let early = tokio::time::timeout(Duration::from_secs(599), interval.tick()).await;
        assert!(early.is_err());

        let on_time = tokio::time::timeout(Duration::from_secs(2), interval.tick()).await;
        assert!(on_time.is_ok());
    }

    #[test]
    fn test_group_by_clans_partitions_by_nickname() {
        let clans = vec![
            ClanGroup {
                name: "Miners".to_string(),
                member_patterns: vec!["[MIN]".to_string()],
            },
            ClanGroup {
                name: "Farmers".to_string(),
                member_patterns: vec!["[FRM]".to_string()],
            },
        ];
        let records = vec![
            record("1", "[MIN] Alice", 0.0, 0.0),
            record("2", "[FRM] Bob", 0.0, 0.0),
            record("3", "Loner", 0.0, 0.0),
        ];

        let groups = group_by_clans(&clans, &records);

        assert_eq!(
            groups.get("Miners"),
            Some(["[MIN] Alice".to_string()].as_slice())
        );
        assert_eq!(
            groups.get("Farmers"),
            Some(["[FRM] Bob".to_string()].as_slice())
        );
        assert_eq!(groups.iter().count(), 2);
    }
}
