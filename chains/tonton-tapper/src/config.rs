//! Configuration loader for tonton-tapper
//!
//! The configuration is a single JSON object. Every option is optional and
//! falls back to the defaults below; [`TapperConfig::validate`] runs on load
//! so an out-of-range value is rejected before any network activity.

use core_logic::ConfigError;
use rand::Rng;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Remote endpoints of the game API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub tap: String,
    pub energy: String,
    pub quests: String,
    pub daily_login: String,
    pub auth: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        const BASE: &str = "https://gcpapilb.intract.io/api/qv1";
        Self {
            tap: format!("{BASE}/tma/tap"),
            energy: format!("{BASE}/auth/get-super-user"),
            quests: format!("{BASE}/search/results"),
            daily_login: format!("{BASE}/auth/gm-streak"),
            auth: format!("{BASE}/auth/telegram"),
        }
    }
}

/// Inclusive millisecond range the per-session tap delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    pub fn sample(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.min..=self.max);
        Duration::from_millis(ms)
    }
}

/// How long to wait once energy drops under the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LowEnergyPolicy {
    Fixed { secs: u64 },
    Random { min_secs: u64, max_secs: u64 },
}

impl LowEnergyPolicy {
    pub fn cooldown(&self) -> Duration {
        match *self {
            LowEnergyPolicy::Fixed { secs } => Duration::from_secs(secs),
            LowEnergyPolicy::Random { min_secs, max_secs } => {
                Duration::from_secs(rand::thread_rng().gen_range(min_secs..=max_secs))
            }
        }
    }
}

/// How the raw line of `token.txt` becomes a bearer credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialMode {
    /// The line is already the bearer value
    Passthrough,
    /// The line is a Telegram init-data query string exchanged for a bearer
    Exchange,
}

/// Configuration for the tapper, shared read-only by every account
#[derive(Debug, Clone, Deserialize)]
pub struct TapperConfig {
    /// Attach proxies from the proxy list
    #[serde(default)]
    pub use_proxy: bool,
    /// Taps submitted per tap call (1..=10)
    #[serde(default = "default_tap")]
    pub tap: u32,
    /// Safety margin added to `tap` before a tap is attempted
    #[serde(default = "default_energy_floor")]
    pub energy_floor: i64,
    #[serde(default = "default_tap_delay")]
    pub tap_delay_ms: DelayRange,
    #[serde(default = "default_low_energy")]
    pub low_energy: LowEnergyPolicy,
    /// Wait after a failed probe
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,
    #[serde(default = "default_probe_attempts")]
    pub probe_max_attempts: u32,
    #[serde(default = "default_probe_retry_delay")]
    pub probe_retry_delay_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Upper bound of the random delay before an account's first request
    #[serde(default = "default_startup_jitter")]
    pub startup_jitter_secs: u64,
    #[serde(default = "default_true")]
    pub daily_bonus: bool,
    #[serde(default = "default_daily_interval")]
    pub daily_interval_secs: u64,
    #[serde(default = "default_credential_mode")]
    pub credential_mode: CredentialMode,
    #[serde(default = "default_proxy_check_url")]
    pub proxy_check_url: String,
    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_tap() -> u32 {
    3
}

fn default_energy_floor() -> i64 {
    30
}

fn default_tap_delay() -> DelayRange {
    DelayRange { min: 300, max: 500 }
}

fn default_low_energy() -> LowEnergyPolicy {
    LowEnergyPolicy::Random {
        min_secs: 300,
        max_secs: 1800,
    }
}

fn default_retry_interval() -> u64 {
    60
}

fn default_probe_attempts() -> u32 {
    3
}

fn default_probe_retry_delay() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    10
}

fn default_startup_jitter() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_daily_interval() -> u64 {
    24 * 60 * 60
}

fn default_credential_mode() -> CredentialMode {
    CredentialMode::Exchange
}

fn default_proxy_check_url() -> String {
    "http://httpbin.org/ip".to_string()
}

impl Default for TapperConfig {
    fn default() -> Self {
        Self {
            use_proxy: false,
            tap: default_tap(),
            energy_floor: default_energy_floor(),
            tap_delay_ms: default_tap_delay(),
            low_energy: default_low_energy(),
            retry_interval_secs: default_retry_interval(),
            probe_max_attempts: default_probe_attempts(),
            probe_retry_delay_secs: default_probe_retry_delay(),
            request_timeout_secs: default_request_timeout(),
            startup_jitter_secs: default_startup_jitter(),
            daily_bonus: true,
            daily_interval_secs: default_daily_interval(),
            credential_mode: default_credential_mode(),
            proxy_check_url: default_proxy_check_url(),
            endpoints: Endpoints::default(),
        }
    }
}

impl TapperConfig {
    /// Load and validate configuration from a JSON file
    ///
    /// # Example
    /// ```ignore
    /// let config = TapperConfig::from_path("config.json")?;
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            msg: e.to_string(),
        })?;
        Self::from_json_str(&content).map_err(|e| match e {
            ConfigError::Parse { msg, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                msg,
            },
            other => other,
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            msg: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=10).contains(&self.tap) {
            return Err(ConfigError::invalid(
                "tap",
                format!("must be between 1 and 10, got {}", self.tap),
            ));
        }
        if self.energy_floor < 0 {
            return Err(ConfigError::invalid("energy_floor", "must not be negative"));
        }
        if self.tap_delay_ms.min == 0 || self.tap_delay_ms.min > self.tap_delay_ms.max {
            return Err(ConfigError::invalid(
                "tap_delay_ms",
                "min must be positive and not greater than max",
            ));
        }
        if let LowEnergyPolicy::Random { min_secs, max_secs } = self.low_energy {
            if min_secs > max_secs {
                return Err(ConfigError::invalid(
                    "low_energy",
                    "min_secs must not be greater than max_secs",
                ));
            }
        }
        if self.probe_max_attempts == 0 {
            return Err(ConfigError::invalid("probe_max_attempts", "must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("request_timeout_secs", "must be positive"));
        }
        if self.daily_interval_secs == 0 {
            return Err(ConfigError::invalid("daily_interval_secs", "must be positive"));
        }
        Ok(())
    }

    /// Energy required before a tap is attempted
    pub fn energy_threshold(&self) -> i64 {
        i64::from(self.tap).saturating_add(self.energy_floor)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn daily_interval(&self) -> Duration {
        Duration::from_secs(self.daily_interval_secs)
    }

    pub fn probe_retry_delay(&self) -> Duration {
        Duration::from_secs(self.probe_retry_delay_secs)
    }

    /// Random delay before an account's first request
    pub fn startup_jitter(&self) -> Duration {
        let max = Duration::from_secs(self.startup_jitter_secs);
        rand::thread_rng().gen_range(Duration::ZERO..=max)
    }
}
