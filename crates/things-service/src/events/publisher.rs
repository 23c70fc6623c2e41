//! Event sinks.

use chrono::Utc;
use redis::aio::ConnectionManager;
use tokio::sync::broadcast;
use tracing::{info, trace};

use super::{Event, EventError};

pub trait EventPublisher: Send + Sync + 'static {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), EventError>> + Send;
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: Event) -> Result<(), EventError> {
        trace!(operation = event.operation(), "Dropping event");
        Ok(())
    }
}

/// In-process fan-out over a `tokio` broadcast channel.
///
/// Publishing with no subscriber is not an error; slow subscribers lag and
/// lose the oldest events.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<Event>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl EventPublisher for BroadcastPublisher {
    async fn publish(&self, event: Event) -> Result<(), EventError> {
        trace!(operation = event.operation(), "Broadcasting event");
        let _ = self.sender.send(event);
        Ok(())
    }
}

/// Appends events to a Redis stream with `XADD`, trimming it to about
/// `max_len` entries.
#[derive(Clone)]
pub struct RedisStreamPublisher {
    conn: ConnectionManager,
    stream: String,
    max_len: usize,
}

impl RedisStreamPublisher {
    pub async fn connect(url: &str, stream: &str, max_len: usize) -> Result<Self, EventError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        info!(%stream, "Publishing events to Redis stream");
        Ok(Self::with_connection(conn, stream, max_len))
    }

    pub fn with_connection(conn: ConnectionManager, stream: &str, max_len: usize) -> Self {
        Self {
            conn,
            stream: stream.to_string(),
            max_len,
        }
    }
}

impl EventPublisher for RedisStreamPublisher {
    async fn publish(&self, event: Event) -> Result<(), EventError> {
        let payload = serde_json::to_string(&event)?;
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("XADD")
            .arg(&self.stream)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_len)
            .arg("*")
            .arg("operation")
            .arg(event.operation())
            .arg("occurred_at")
            .arg(Utc::now().to_rfc3339())
            .arg("payload")
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}
