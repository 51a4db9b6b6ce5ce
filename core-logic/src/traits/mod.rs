use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub success: u64,
    pub failed: u64,
}

impl WorkerStats {
    pub fn total(&self) -> u64 {
        self.success + self.failed
    }
}

/// A long-running unit of work owned by exactly one account.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Runs until cancelled. Setup failures are returned as errors and are
    /// isolated to this worker by the runner.
    async fn start(&mut self, cancellation_token: CancellationToken) -> Result<WorkerStats>;
}
