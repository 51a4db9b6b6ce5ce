//! Proxy Health - startup liveness check for account proxies
//!
//! Each account's proxy is checked once, before the account makes any call,
//! by fetching an IP-echo endpoint through it. A proxy that fails the check
//! is dropped and the account continues without one; the check never stops
//! an account from starting.

use core_logic::ProxyConfig;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{info, warn};

/// Returns true when `check_url` answers 200 through `proxy`.
pub async fn validate_proxy(proxy: &ProxyConfig, check_url: &str, timeout: Duration) -> bool {
    let proxy_config = match proxy.to_reqwest() {
        Ok(p) => p,
        Err(e) => {
            warn!("Bad proxy config for {}: {}", proxy.url, e);
            return false;
        }
    };

    let client = match Client::builder()
        .proxy(proxy_config)
        .timeout(timeout)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to build client for {}: {}", proxy.url, e);
            return false;
        }
    };

    match client.get(check_url).send().await {
        Ok(resp) if resp.status() == StatusCode::OK => true,
        Ok(resp) => {
            warn!(
                "Proxy {} failed with status code: {}",
                proxy.url,
                resp.status()
            );
            false
        }
        Err(e) => {
            warn!("Proxy {} failed with error: {}", proxy.url, e);
            false
        }
    }
}

/// Keeps the binding only if the proxy passes its liveness check.
pub async fn resolve_proxy_binding(
    proxy: Option<ProxyConfig>,
    check_url: &str,
    timeout: Duration,
) -> Option<ProxyConfig> {
    let proxy = proxy?;
    if validate_proxy(&proxy, check_url, timeout).await {
        info!("Proxy {} is working.", proxy.url);
        Some(proxy)
    } else {
        warn!("Continuing without proxy (was {}).", proxy.url);
        None
    }
}
