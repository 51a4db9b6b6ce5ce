use crate::traits::{Worker, WorkerStats};
use anyhow::Result;
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

pub struct WorkerRunner;

impl WorkerRunner {
    /// Spawns one task per worker and waits for them, stopping everything on
    /// Ctrl+C.
    pub async fn run_workers(workers: Vec<Box<dyn Worker>>) -> Result<WorkerStats> {
        let token = CancellationToken::new();
        let cloned_token = token.clone();

        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("🛑 Received Ctrl+C. Initiating graceful shutdown...");
                    cloned_token.cancel();
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });

        Self::run_workers_until(workers, token).await
    }

    /// Spawns one task per worker and waits until every one of them has
    /// returned. A failing or panicking worker never affects the others.
    pub async fn run_workers_until(
        workers: Vec<Box<dyn Worker>>,
        token: CancellationToken,
    ) -> Result<WorkerStats> {
        let mut set = JoinSet::new();

        let start_time = std::time::Instant::now();
        info!("Starting {} account workers...", workers.len());

        for (i, mut worker) in workers.into_iter().enumerate() {
            let id = i + 1;
            let span = tracing::info_span!("account", account = %format!("{:03}", id));
            let child_token = token.clone();

            set.spawn(
                async move {
                    match worker.start(child_token).await {
                        Ok(stats) => Ok(stats),
                        Err(e) => {
                            error!("Account {} stopped: {:#}", id, e);
                            Err(e)
                        }
                    }
                }
                .instrument(span),
            );
        }

        let mut total = WorkerStats::default();

        while let Some(res) = set.join_next().await {
            match res {
                Ok(Ok(stats)) => {
                    total.success += stats.success;
                    total.failed += stats.failed;
                }
                Ok(Err(_)) => {
                    // Already logged inside the worker span
                }
                Err(e) => {
                    error!("An account task panicked or failed to join: {:?}", e);
                }
            }
        }

        let total_duration = start_time.elapsed();
        let rate = if total.total() > 0 {
            (total.success as f64 / total.total() as f64) * 100.0
        } else {
            0.0
        };

        info!("🛑 Shutdown Complete.");
        info!(
            "Total Time: {:.1}s | Taps OK: {} | Taps Failed: {} | Success Rate: {:.2}%",
            total_duration.as_secs_f64(),
            total.success,
            total.failed,
            rate
        );

        Ok(total)
    }
}
