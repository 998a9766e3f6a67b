use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::Result;
use crate::sync::PresenceApi;

/// Player counts reported by the game-server status endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlayerCounts {
    pub online: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ServerStatus {
    pub players: PlayerCounts,
}

pub fn presence_text(status: &ServerStatus) -> String {
    format!(
        "{}/{} players online",
        status.players.online, status.players.max
    )
}

/// Source of game-server status, polled once per tick.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self) -> Result<ServerStatus>;
}

/// Queries the configured lookup server over HTTP with a per-request
/// timeout, so a stalled endpoint cannot hold up the tick.
pub struct HttpStatusSource {
    client: reqwest::Client,
    url: String,
}

impl HttpStatusSource {
    pub fn new(server: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: format!("https://{}/status", server),
        })
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self) -> Result<ServerStatus> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        parse_status(&response.text().await?)
    }
}

fn parse_status(body: &str) -> Result<ServerStatus> {
    Ok(serde_json::from_str(body)?)
}

/// Polls the status source and pushes the player counts into the bot
/// presence. Any failure leaves the presence unchanged for this tick; the
/// rank pass is never affected.
pub async fn update_presence(source: &dyn StatusSource, presence: &dyn PresenceApi) {
    let status = match source.fetch().await {
        Ok(status) => status,
        Err(e) => {
            warn!("Status poll failed, leaving presence unchanged: {}", e);
            return;
        }
    };

    let text = presence_text(&status);
    info!("Updating presence: {}", text);
    if let Err(e) = presence.set_presence(&text).await {
        warn!("Failed to update presence: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RankEngineError;
    use crate::sync::MockPresenceApi;
    use mockall::predicate::eq;

    fn status(online: u32, max: u32) -> ServerStatus {
        ServerStatus {
            players: PlayerCounts { online, max },
        }
    }

    #[test]
    fn test_presence_text_format() {
        assert_eq!(presence_text(&status(17, 100)), "17/100 players online");
    }

    #[test]
    fn test_status_payload_parsing() {
        let parsed = parse_status(r#"{"players": {"online": 5, "max": 64}}"#).unwrap();
        assert_eq!(parsed.players.online, 5);
        assert_eq!(parsed.players.max, 64);
    }

    #[test]
    fn test_malformed_payload_is_a_serialization_error() {
        let err = parse_status("<html>offline</html>").unwrap_err();
        assert!(matches!(err, RankEngineError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_successful_poll_sets_presence() {
        let mut source = MockStatusSource::new();
        source.expect_fetch().returning(|| Ok(status(3, 20)));

        let mut presence = MockPresenceApi::new();
        presence
            .expect_set_presence()
            .with(eq("3/20 players online"))
            .times(1)
            .returning(|_| Ok(()));

        update_presence(&source, &presence).await;
    }

    #[tokio::test]
    async fn test_failed_poll_leaves_presence_unchanged() {
        let mut source = MockStatusSource::new();
        source
            .expect_fetch()
            .returning(|| Err(RankEngineError::Status("timed out".to_string())));

        let mut presence = MockPresenceApi::new();
        presence.expect_set_presence().never();

        update_presence(&source, &presence).await;
    }

    #[tokio::test]
    async fn test_presence_failure_is_swallowed() {
        let mut source = MockStatusSource::new();
        source.expect_fetch().returning(|| Ok(status(1, 2)));

        let mut presence = MockPresenceApi::new();
        presence.expect_set_presence().returning(|_| {
            Err(RankEngineError::Status("gateway unavailable".to_string()))
        });

        // must not panic or propagate
        update_presence(&source, &presence).await;
    }
}
