//! Game API calls made on behalf of one account.

use crate::client::Transport;
use crate::config::{Endpoints, TapperConfig};
use core_logic::{with_retry_if, NetworkError, RetryConfig};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Snapshot returned by the energy probe. Either field is `None` when the
/// response did not carry it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnergyStatus {
    pub energy: Option<i64>,
    pub balance: Option<i64>,
}

impl EnergyStatus {
    pub fn from_body(body: &Value) -> Self {
        Self {
            energy: as_int(&body["tapDetails"]["energyLeft"]),
            balance: as_int(&body["totalTxps"]),
        }
    }
}

fn as_int(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}

/// Ids of quests that are still running and count towards the multiplier.
pub fn extract_quest_ids(body: &Value) -> Vec<String> {
    let Some(items) = body["data"].as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| {
            let stopped = item["isStopped"].as_bool().unwrap_or(true);
            let multiplier = item["isMultiplierQuest"].as_bool().unwrap_or(false);
            !stopped && multiplier
        })
        .filter_map(|item| match &item["id"] {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// Outcome of one daily bonus claim
#[derive(Debug, Clone, PartialEq)]
pub enum DailyOutcome {
    Claimed(Option<Value>),
    AlreadyClaimed,
}

pub struct TapApi {
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
    probe_retry: RetryConfig,
}

impl TapApi {
    pub fn new(transport: Arc<dyn Transport>, endpoints: Endpoints, probe_retry: RetryConfig) -> Self {
        Self {
            transport,
            endpoints,
            probe_retry,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &TapperConfig) -> Self {
        Self::new(
            transport,
            config.endpoints.clone(),
            RetryConfig::fixed(config.probe_max_attempts, config.probe_retry_delay()),
        )
    }

    /// Reads energy and balance. Timeouts and connection errors are retried
    /// with the probe policy; an HTTP error status is returned at once.
    pub async fn probe(&self) -> Result<EnergyStatus, NetworkError> {
        let result = with_retry_if(
            self.probe_retry,
            "energy probe",
            || async {
                self.transport
                    .request(Method::GET, &self.endpoints.energy, None)
                    .await
                    .map(|response| {
                        response
                            .body
                            .as_ref()
                            .map(EnergyStatus::from_body)
                            .unwrap_or_default()
                    })
            },
            NetworkError::is_transient,
        )
        .await;

        if let Err(e) = &result {
            error!("Failed to fetch energy: {}", e);
        }
        result
    }

    /// Submits one batch of taps. Never retried.
    pub async fn tap(&self, batch: u32) -> Result<(), NetworkError> {
        let body = json!({ "userTaps": batch });
        match self
            .transport
            .request(Method::POST, &self.endpoints.tap, Some(&body))
            .await
        {
            Ok(_) => {
                debug!("Tapped {} times", batch);
                Ok(())
            }
            Err(e) => {
                error!("Tap failed: {}", e);
                Err(e)
            }
        }
    }

    /// Claims the daily login bonus. A rejected claim means it was already
    /// taken today.
    pub async fn daily_login(&self) -> Result<DailyOutcome, NetworkError> {
        match self
            .transport
            .request(Method::GET, &self.endpoints.daily_login, None)
            .await
        {
            Ok(response) => {
                match &response.body {
                    Some(body) => info!("Daily login success: {}", body),
                    None => info!("Daily login success"),
                }
                Ok(DailyOutcome::Claimed(response.body))
            }
            Err(NetworkError::HttpError { status_code, .. }) => {
                info!("Daily login seems to have completed already (status {})", status_code);
                Ok(DailyOutcome::AlreadyClaimed)
            }
            Err(e) => {
                error!("Daily login failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn fetch_quest_ids(&self) -> Result<Vec<String>, NetworkError> {
        let response = self
            .transport
            .request(Method::GET, &self.endpoints.quests, None)
            .await?;
        let body = response.body.ok_or_else(|| NetworkError::InvalidResponse {
            endpoint: self.endpoints.quests.clone(),
            reason: "empty or non-JSON body".to_string(),
        })?;
        let ids = extract_quest_ids(&body);
        info!("Extracted quest ids: {:?}", ids);
        Ok(ids)
    }
}
