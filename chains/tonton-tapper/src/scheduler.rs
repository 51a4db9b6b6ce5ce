//! Per-account scheduler
//!
//! Each account runs one loop:
//!
//! ```text
//! Starting -> Probing -> Tapping        -> Probing
//!                     -> LowEnergyWait  -> Probing
//!                     -> ErrorBackoff   -> Probing
//! ```
//!
//! The only way out is the cancellation token. Every sleep and every
//! network call races against it, so Ctrl+C is honored at the next
//! suspension point.

use crate::api::{EnergyStatus, TapApi};
use crate::client::AccountClient;
use crate::config::TapperConfig;
use crate::credential::resolver_for;
use crate::daily::spawn_daily_bonus;
use crate::proxy_health::resolve_proxy_binding;
use anyhow::{Context, Result};
use async_trait::async_trait;
use core_logic::{NetworkError, ProxyConfig, Worker, WorkerStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Probing,
    Tapping,
    LowEnergyWait,
    ErrorBackoff,
}

/// Decides what follows a probe. Both energy and balance must be known,
/// otherwise the probe counts as failed.
pub fn next_state(probe: &Result<EnergyStatus, NetworkError>, tap: u32, floor: i64) -> State {
    match probe {
        Ok(EnergyStatus {
            energy: Some(energy),
            balance: Some(_),
        }) => {
            if *energy < i64::from(tap).saturating_add(floor) {
                State::LowEnergyWait
            } else {
                State::Tapping
            }
        }
        _ => State::ErrorBackoff,
    }
}

/// Everything one account owns for the lifetime of the process.
#[derive(Clone)]
pub struct AccountSession {
    /// 1-based, as shown in logs
    pub index: usize,
    raw_token: String,
    pub proxy: Option<ProxyConfig>,
    pub tap: u32,
    pub tap_delay: Duration,
    pub startup_jitter: Duration,
    pub energy: Option<i64>,
    pub balance: Option<i64>,
}

impl std::fmt::Debug for AccountSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSession")
            .field("index", &self.index)
            .field("proxy", &self.proxy.as_ref().map(|p| p.url.as_str()))
            .field("tap", &self.tap)
            .field("tap_delay", &self.tap_delay)
            .field("energy", &self.energy)
            .field("balance", &self.balance)
            .finish()
    }
}

impl AccountSession {
    /// Draws the tap delay and the startup jitter once; they stay fixed for
    /// the whole session.
    pub fn new(
        index: usize,
        raw_token: impl Into<String>,
        proxy: Option<ProxyConfig>,
        config: &TapperConfig,
    ) -> Self {
        Self {
            index,
            raw_token: raw_token.into(),
            proxy,
            tap: config.tap,
            tap_delay: config.tap_delay_ms.sample(),
            startup_jitter: config.startup_jitter(),
            energy: None,
            balance: None,
        }
    }

    pub fn raw_token(&self) -> &str {
        &self.raw_token
    }
}

/// Aborts the daily bonus child when the scheduler goes away, however it
/// ends.
struct ChildTask(JoinHandle<()>);

impl Drop for ChildTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn pause(duration: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// The state machine of one connected account.
pub struct AccountScheduler {
    api: Arc<TapApi>,
    config: Arc<TapperConfig>,
    session: AccountSession,
}

impl AccountScheduler {
    pub fn new(api: Arc<TapApi>, config: Arc<TapperConfig>, session: AccountSession) -> Self {
        Self {
            api,
            config,
            session,
        }
    }

    pub fn session(&self) -> &AccountSession {
        &self.session
    }

    pub async fn run(&mut self, token: CancellationToken) -> WorkerStats {
        let mut stats = WorkerStats::default();

        if !pause(self.session.startup_jitter, &token).await {
            return stats;
        }

        let _daily = self.config.daily_bonus.then(|| {
            ChildTask(spawn_daily_bonus(
                self.api.clone(),
                self.config.daily_interval(),
                token.child_token(),
            ))
        });

        let mut state = State::Probing;
        loop {
            state = match state {
                State::Probing => {
                    let probe = tokio::select! {
                        _ = token.cancelled() => break,
                        probe = self.api.probe() => probe,
                    };
                    if let Ok(status) = &probe {
                        self.session.energy = status.energy;
                        self.session.balance = status.balance;
                    }
                    let next = next_state(&probe, self.session.tap, self.config.energy_floor);
                    match next {
                        State::Tapping => info!(
                            "Balance: {} | Energy: {}",
                            self.session.balance.unwrap_or_default(),
                            self.session.energy.unwrap_or_default()
                        ),
                        State::LowEnergyWait => info!(
                            "Low energy ({}), cooling down",
                            self.session.energy.unwrap_or_default()
                        ),
                        _ => warn!(
                            "Failed to retrieve energy, retrying in {}s",
                            self.config.retry_interval_secs
                        ),
                    }
                    next
                }
                State::Tapping => {
                    let tapped = tokio::select! {
                        _ = token.cancelled() => break,
                        tapped = self.api.tap(self.session.tap) => tapped,
                    };
                    match tapped {
                        Ok(()) => stats.success += 1,
                        Err(_) => stats.failed += 1,
                    }
                    if !pause(self.session.tap_delay, &token).await {
                        break;
                    }
                    State::Probing
                }
                State::LowEnergyWait => {
                    let cooldown = self.config.low_energy.cooldown();
                    info!("Waiting {}s for energy to refill", cooldown.as_secs());
                    if !pause(cooldown, &token).await {
                        break;
                    }
                    State::Probing
                }
                State::ErrorBackoff => {
                    if !pause(self.config.retry_interval(), &token).await {
                        break;
                    }
                    State::Probing
                }
            };
        }

        info!(
            "Account {} stopping: {} taps ok, {} failed",
            self.session.index, stats.success, stats.failed
        );
        stats
    }
}

#[async_trait]
impl Worker for AccountScheduler {
    async fn start(&mut self, cancellation_token: CancellationToken) -> Result<WorkerStats> {
        Ok(self.run(cancellation_token).await)
    }
}

/// One account from token line to running scheduler.
pub struct TapperWorker {
    session: AccountSession,
    config: Arc<TapperConfig>,
}

impl TapperWorker {
    pub fn new(
        index: usize,
        raw_token: impl Into<String>,
        proxy: Option<ProxyConfig>,
        config: Arc<TapperConfig>,
    ) -> Self {
        Self {
            session: AccountSession::new(index, raw_token, proxy, &config),
            config,
        }
    }

    pub fn session(&self) -> &AccountSession {
        &self.session
    }

    /// Validates the proxy, builds the client and resolves the credential.
    /// A bad proxy or a failed credential only degrades the account; a
    /// client that cannot be built is an error.
    pub async fn connect(&mut self) -> Result<Arc<TapApi>> {
        let config = self.config.clone();

        if config.use_proxy {
            self.session.proxy = resolve_proxy_binding(
                self.session.proxy.take(),
                &config.proxy_check_url,
                config.request_timeout(),
            )
            .await;
        } else {
            self.session.proxy = None;
        }

        let client = AccountClient::new(self.session.proxy.as_ref(), config.request_timeout())
            .with_context(|| format!("account {}: failed to build HTTP client", self.session.index))?;

        let resolver = resolver_for(
            config.credential_mode,
            Arc::new(client.clone()),
            &config.endpoints.auth,
        );
        let bearer = match resolver.resolve(self.session.raw_token()).await {
            Ok(bearer) => Some(bearer.into_inner()),
            Err(e) => {
                error!("Failed to fetch bearer token: {}", e);
                None
            }
        };

        let client = client.with_bearer(bearer);
        Ok(Arc::new(TapApi::from_config(Arc::new(client), &config)))
    }
}

#[async_trait]
impl Worker for TapperWorker {
    async fn start(&mut self, cancellation_token: CancellationToken) -> Result<WorkerStats> {
        let api = tokio::select! {
            _ = cancellation_token.cancelled() => return Ok(WorkerStats::default()),
            api = self.connect() => api?,
        };

        let mut scheduler =
            AccountScheduler::new(api, self.config.clone(), self.session.clone());
        Ok(scheduler.run(cancellation_token).await)
    }
}
