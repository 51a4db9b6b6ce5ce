//! Credential resolution
//!
//! A line of `token.txt` is either the bearer value itself or a Telegram
//! init-data query string (`user=...&auth_date=...&hash=...`) that has to be
//! exchanged for a signed bearer. The exchange answer carries the bearer in
//! its `Authorization` response header, not in the body.

use crate::client::Transport;
use crate::config::CredentialMode;
use async_trait::async_trait;
use core_logic::CredentialError;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Opaque signed token attached to every authenticated request
#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredential(String);

impl BearerCredential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerCredential(***REDACTED***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    pub username: String,
}

/// Decoded Telegram init data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPayload {
    pub user: TelegramUser,
    pub auth_date: i64,
    pub hash: String,
}

impl LoginPayload {
    /// Body of the bearer exchange request
    pub fn exchange_body(&self) -> Value {
        json!({
            "isTaskLogin": false,
            "source": "TELEGRAM",
            "isTmaTonAppUser": true,
            "user": {
                "auth_date": self.auth_date,
                "first_name": self.user.first_name,
                "hash": self.hash,
                "id": self.user.id,
                "username": self.user.username,
            },
            "fingerprintId": null,
        })
    }
}

fn first_param<'a>(params: &'a [(String, String)], key: &str) -> Result<&'a str, CredentialError> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| CredentialError::Decode {
            reason: format!("missing '{}' field", key),
        })
}

/// Percent-decodes the raw line, splits it as a query string and parses the
/// embedded `user` JSON.
pub fn decode_login_payload(raw: &str) -> Result<LoginPayload, CredentialError> {
    let decoded = urlencoding::decode(raw.trim()).map_err(|e| CredentialError::Decode {
        reason: format!("invalid percent-encoding: {}", e),
    })?;

    let params: Vec<(String, String)> = url::form_urlencoded::parse(decoded.as_bytes())
        .into_owned()
        .collect();

    let user: TelegramUser =
        serde_json::from_str(first_param(&params, "user")?).map_err(|e| {
            CredentialError::Decode {
                reason: format!("invalid user JSON: {}", e),
            }
        })?;

    let auth_date = first_param(&params, "auth_date")?
        .parse::<i64>()
        .map_err(|e| CredentialError::Decode {
            reason: format!("invalid auth_date: {}", e),
        })?;

    let hash = first_param(&params, "hash")?.to_string();

    Ok(LoginPayload {
        user,
        auth_date,
        hash,
    })
}

/// Produces a usable bearer credential from a raw token line
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, raw: &str) -> Result<BearerCredential, CredentialError>;
}

/// The raw line is the bearer
pub struct PassThrough;

#[async_trait]
impl CredentialResolver for PassThrough {
    async fn resolve(&self, raw: &str) -> Result<BearerCredential, CredentialError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CredentialError::Decode {
                reason: "empty token".to_string(),
            });
        }
        Ok(BearerCredential::new(raw))
    }
}

/// Exchanges Telegram init data for a signed bearer
pub struct Exchange {
    transport: Arc<dyn Transport>,
    auth_url: String,
}

impl Exchange {
    pub fn new(transport: Arc<dyn Transport>, auth_url: impl Into<String>) -> Self {
        Self {
            transport,
            auth_url: auth_url.into(),
        }
    }
}

#[async_trait]
impl CredentialResolver for Exchange {
    async fn resolve(&self, raw: &str) -> Result<BearerCredential, CredentialError> {
        let payload = decode_login_payload(raw)?;
        debug!(
            "Exchanging init data for user {} ({})",
            payload.user.id, payload.user.username
        );

        let response = self
            .transport
            .request(Method::POST, &self.auth_url, Some(&payload.exchange_body()))
            .await
            .map_err(|e| CredentialError::Exchange {
                reason: e.to_string(),
            })?;

        let header = response.authorization.unwrap_or_default();
        let bearer = header.strip_prefix("Bearer ").unwrap_or(&header).trim();
        if bearer.is_empty() {
            return Err(CredentialError::Exchange {
                reason: "response carried no Authorization header".to_string(),
            });
        }

        info!("Bearer token acquired for {}", payload.user.username);
        Ok(BearerCredential::new(bearer))
    }
}

pub fn resolver_for(
    mode: CredentialMode,
    transport: Arc<dyn Transport>,
    auth_url: &str,
) -> Box<dyn CredentialResolver> {
    match mode {
        CredentialMode::Passthrough => Box::new(PassThrough),
        CredentialMode::Exchange => Box::new(Exchange::new(transport, auth_url)),
    }
}
