use async_trait::async_trait;
use std::time::Duration;

/// Paces calls against an external rate limit.
///
/// `wait` is awaited before every batch except the first. Dropping the future
/// cancels the wait.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn wait(&self);
}

/// Sleeps for a fixed delay on the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelayPacer {
    delay: Duration,
}

impl FixedDelayPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Pacer for FixedDelayPacer {
    async fn wait(&self) {
        log::debug!("Pacing for {:?}", self.delay);
        tokio::time::sleep(self.delay).await;
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn wait(&self) {}
}
