//! Notification emitter and real-time broadcaster
//!
//! Both collaborators are fire-and-forget from the engine's point of view:
//! an authoritative write never fails or rolls back because delivery did.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::AppResult;
use crate::models::{Notification, RealtimeEvent};

/// Notification emitter contract (delivery is an external concern)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> AppResult<()>;
}

/// Emit a notification, logging and discarding any delivery failure
pub async fn notify_best_effort(notifier: &dyn Notifier, notification: Notification) {
    if let Err(e) = notifier.notify(notification).await {
        tracing::warn!("Notification delivery failed: {}", e);
    }
}

/// Notifier that only logs the event payload
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> AppResult<()> {
        tracing::info!(event = ?notification, "notification emitted");
        Ok(())
    }
}

/// Real-time broadcaster contract
pub trait Broadcaster: Send + Sync {
    fn publish(&self, channel: &str, event: RealtimeEvent);
}

/// Message carried on the in-process broadcast channel
#[derive(Debug, Clone)]
pub struct RealtimeMessage {
    pub channel: String,
    pub event: RealtimeEvent,
}

/// Broadcaster backed by a `tokio::sync::broadcast` channel.
///
/// Created at process start, torn down at shutdown; publishing with no
/// subscribers is not an error.
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<RealtimeMessage>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Hub sized from the configured broadcast capacity
    pub fn from_config() -> Self {
        Self::new(crate::config::CONFIG.realtime.broadcast_capacity)
    }

    /// Subscribe to everything published on this hub
    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeMessage> {
        self.tx.subscribe()
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn publish(&self, channel: &str, event: RealtimeEvent) {
        let message = RealtimeMessage {
            channel: channel.to_string(),
            event,
        };
        if self.tx.send(message).is_err() {
            tracing::trace!(channel, "no realtime subscribers");
        }
    }
}

/// Broadcaster for deployments without a real-time hub
pub struct NoopBroadcaster;

impl Broadcaster for NoopBroadcaster {
    fn publish(&self, _channel: &str, _event: RealtimeEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::leaderboard_channel;
    use crate::models::submission::Level;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_channel_broadcaster_delivers_to_subscribers() {
        let hub = ChannelBroadcaster::new(8);
        let mut rx = hub.subscribe();

        let channel = leaderboard_channel(2026, Level::National);
        hub.publish(
            &channel,
            RealtimeEvent::RoundStateChanged {
                round_id: Uuid::nil(),
                status: "ended".to_string(),
            },
        );

        let message = rx.recv().await.unwrap();
        assert_eq!(message.channel, "leaderboard:2026:national");
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let hub = ChannelBroadcaster::from_config();
        // Must not panic or error
        hub.publish(
            "leaderboard:2026:council",
            RealtimeEvent::ScoreUpdated {
                submission_id: Uuid::nil(),
                average_score: 50.0,
            },
        );
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        let mut mock = MockNotifier::new();
        mock.expect_notify()
            .returning(|_| Err(crate::error::AppError::Storage("emitter down".into())));

        // Must not propagate the failure
        notify_best_effort(
            &mock,
            Notification::RoundEnded {
                round_id: Uuid::nil(),
            },
        )
        .await;
    }
}
