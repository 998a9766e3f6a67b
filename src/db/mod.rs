use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use tracing::info;

use crate::config::DatabaseSettings;
use crate::models::{ActivityRecord, Result};

/// Separator used by the aggregation query when concatenating a user's
/// known nicknames into one column. A control character, so nicknames
/// containing commas survive the round trip intact.
const NICKNAME_SEPARATOR: char = '\u{1f}';

/// Read-only access to the activity table. One aggregation query per
/// reconciliation pass; the datastore stays the source of truth.
pub struct ActivityStore {
    pool: MySqlPool,
    query: String,
}

impl ActivityStore {
    /// Connects the pool and prepares the aggregation query for the
    /// configured table. A connection failure here is fatal to the caller:
    /// no ranks can ever be computed without a live datastore.
    pub async fn connect(db: &DatabaseSettings, table_name: &str) -> Result<Self> {
        info!("Connecting to MySQL database {} on {}", db.db_name, db.host);

        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect(&db.connection_url())
            .await?;

        info!("Connected to MySQL database {}", db.db_name);

        Ok(Self {
            pool,
            query: build_aggregation_query(table_name),
        })
    }

    /// Fetches one `ActivityRecord` per platform user, with chat and game
    /// activity summed across all of the user's linked rows. A failure is
    /// recoverable: the caller skips the current pass.
    pub async fn fetch_activity(&self) -> Result<Vec<ActivityRecord>> {
        let rows = sqlx::query(&self.query).fetch_all(&self.pool).await?;
        rows.iter().map(record_from_row).collect()
    }
}

/// The CASTs pin MySQL's DECIMAL sums to doubles so the rows decode
/// directly into f64 activity fields.
fn build_aggregation_query(table: &str) -> String {
    format!(
        "SELECT ds_id, \
         group_concat(nickname separator '{sep}') AS nickname, \
         CAST(SUM(chat_activity) AS DOUBLE) AS chat_activity, \
         CAST(SUM(game_activity) AS DOUBLE) AS game_activity \
         FROM {table} WHERE ds_id IS NOT NULL GROUP BY ds_id",
        sep = NICKNAME_SEPARATOR,
        table = table
    )
}

fn record_from_row(row: &MySqlRow) -> Result<ActivityRecord> {
    let user_id: String = row.try_get("ds_id")?;
    let nickname: Option<String> = row.try_get("nickname")?;
    let chat_activity: Option<f64> = row.try_get("chat_activity")?;
    let game_activity: Option<f64> = row.try_get("game_activity")?;

    Ok(ActivityRecord {
        user_id,
        nicknames: split_nicknames(nickname),
        chat_activity: chat_activity.unwrap_or(0.0),
        game_activity: game_activity.unwrap_or(0.0),
    })
}

fn split_nicknames(joined: Option<String>) -> Vec<String> {
    joined
        .map(|s| {
            s.split(NICKNAME_SEPARATOR)
                .map(str::to_string)
                .filter(|n| !n.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_query_shape() {
        let query = build_aggregation_query("activity");

        assert!(query.starts_with("SELECT ds_id"));
        assert!(query.contains("FROM activity"));
        assert!(query.contains("WHERE ds_id IS NOT NULL"));
        assert!(query.contains("GROUP BY ds_id"));
        assert!(query.contains("SUM(chat_activity)"));
        assert!(query.contains("SUM(game_activity)"));
        assert!(query.contains("separator '\u{1f}'"));
    }

    #[test]
    fn test_nickname_splitting() {
        assert_eq!(
            split_nicknames(Some("Alice\u{1f}alt".to_string())),
            vec!["Alice".to_string(), "alt".to_string()]
        );
        assert!(split_nicknames(None).is_empty());
        assert!(split_nicknames(Some(String::new())).is_empty());
    }

    #[test]
    fn test_nickname_containing_comma_stays_intact() {
        assert_eq!(
            split_nicknames(Some("Smith, John\u{1f}jsmith".to_string())),
            vec!["Smith, John".to_string(), "jsmith".to_string()]
        );
    }
}
