//! Daily login bonus task, running beside the tap loop.

use crate::api::TapApi;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, Instrument, Span};

/// Claims the bonus right away and then once per `interval` until cancelled.
/// Failures are logged by the api layer and never end the loop.
pub async fn run_daily_bonus(api: Arc<TapApi>, interval: Duration, token: CancellationToken) {
    loop {
        info!("Performing daily login.");
        tokio::select! {
            _ = token.cancelled() => break,
            _ = api.daily_login() => {}
        }

        info!(
            "Daily login done, next one in {:.1} hours.",
            interval.as_secs_f64() / 3600.0
        );
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Spawns the task inside the caller's span so its logs keep the account tag.
pub fn spawn_daily_bonus(
    api: Arc<TapApi>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_daily_bonus(api, interval, token).instrument(Span::current()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{timeout, MockTransport};
    use crate::client::ApiResponse;
    use crate::config::TapperConfig;
    use serde_json::json;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[tokio::test(start_paused = true)]
    async fn test_fires_at_start_and_once_per_day() {
        let config = TapperConfig::default();
        let url = config.endpoints.daily_login.clone();
        let transport =
            Arc::new(MockTransport::new().route(&url, |_| Ok(ApiResponse::ok(json!({"streak": 1})))));
        let api = Arc::new(TapApi::from_config(transport.clone(), &config));
        let token = CancellationToken::new();

        let handle = spawn_daily_bonus(api, config.daily_interval(), token.clone());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.calls(&url), 1);

        tokio::time::sleep(DAY - Duration::from_secs(10)).await;
        assert_eq!(transport.calls(&url), 1);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(transport.calls(&url), 2);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_task() {
        let config = TapperConfig::default();
        let url = config.endpoints.daily_login.clone();
        let failing = url.clone();
        let transport = Arc::new(MockTransport::new().route(&url, move |_| Err(timeout(&failing))));
        let api = Arc::new(TapApi::from_config(transport.clone(), &config));
        let token = CancellationToken::new();

        let handle = spawn_daily_bonus(api, Duration::from_secs(60), token.clone());
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(transport.calls(&url), 3);

        token.cancel();
        handle.await.unwrap();
    }
}
