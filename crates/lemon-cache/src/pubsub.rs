//! Redis Pub/Sub for cross-instance local tier invalidation.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::task::JoinHandle;

use crate::error::CacheResult;
use crate::local::LocalTier;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Subscribes to the invalidation channel and evicts announced keys from the
/// local tier.
///
/// ```text
/// Instance 1: cache.remove("lemon:jwt:admin:42")
///   ↓
/// Redis: PUBLISH lemon:cache:invalidate "lemon:jwt:admin:42"
///   ↓
/// Instance 2: listener receives key → removes from L1
/// Instance 1: listener receives own key → L1 already clean
/// ```
///
/// A `set` is announced the same way, so the writer also drops its own copy
/// and the next read is served from Redis. Every successful subscribe empties
/// the local tier, since announcements sent while disconnected never arrive.
pub struct InvalidationListener {
    redis_url: String,
    channel: String,
    local: Arc<LocalTier>,
}

impl InvalidationListener {
    pub fn new(redis_url: String, channel: String, local: Arc<LocalTier>) -> Self {
        Self {
            redis_url,
            channel,
            local,
        }
    }

    /// Spawn the listener. It reconnects with exponential backoff whenever
    /// the subscription fails or is closed; the delay starts over after every
    /// successful subscribe.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut backoff = Backoff::new();

            loop {
                match self.run(&mut backoff).await {
                    Ok(()) => tracing::warn!(
                        backoff_secs = backoff.current().as_secs(),
                        "Cache invalidation subscription closed, reconnecting..."
                    ),
                    Err(e) => tracing::error!(
                        error = %e,
                        backoff_secs = backoff.current().as_secs(),
                        "Cache invalidation listener error, reconnecting..."
                    ),
                }
                tokio::time::sleep(backoff.advance()).await;
            }
        })
    }

    /// Evict a key announced by another instance.
    fn handle_message(&self, key: &str) {
        tracing::debug!(key = %key, "received cache invalidation");
        self.local.remove(key);
    }

    /// Invalidations published while unsubscribed are lost, so the local tier
    /// is emptied on every (re)subscribe.
    fn on_subscribed(&self, backoff: &mut Backoff) {
        let dropped = self.local.len();
        self.local.clear();
        backoff.reset();
        tracing::info!(
            channel = %self.channel,
            dropped_entries = dropped,
            "Subscribed to cache invalidation channel"
        );
    }

    /// One subscription session. `Ok` means the stream closed after a
    /// successful subscribe.
    async fn run(&self, backoff: &mut Backoff) -> CacheResult<()> {
        let client = redis::Client::open(self.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(&self.channel).await?;
        self.on_subscribed(backoff);

        let mut stream = pubsub.on_message();
        while let Some(msg) = stream.next().await {
            match msg.get_payload::<String>() {
                Ok(key) => self.handle_message(&key),
                Err(e) => tracing::warn!(error = %e, "failed to parse invalidation message payload"),
            }
        }

        Ok(())
    }
}

/// Reconnect delay: doubles per failed attempt up to [`MAX_BACKOFF`].
#[derive(Debug)]
struct Backoff {
    current: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            current: INITIAL_BACKOFF,
        }
    }

    fn current(&self) -> Duration {
        self.current
    }

    /// Delay to wait now; the following one is doubled.
    fn advance(&mut self) -> Duration {
        let delay = self.current;
        self.current = next_backoff(delay);
        delay
    }

    fn reset(&mut self) {
        self.current = INITIAL_BACKOFF;
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}
