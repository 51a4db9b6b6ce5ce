use crate::config::ProxyConfig;
use crate::error::ConfigError;
use crate::utils::token_manager::read_lines;
use std::path::Path;
use tracing::{info, warn};

pub struct ProxyManager;

impl ProxyManager {
    /// Loads proxies from a newline-delimited file, one per line.
    ///
    /// Order is preserved: line `i` belongs to account `i`. A missing file
    /// means "run without proxies".
    pub fn load_proxies(path: impl AsRef<Path>) -> Result<Vec<ProxyConfig>, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("{} not found. Running without proxies.", path.display());
            return Ok(Vec::new());
        }

        let proxies: Vec<ProxyConfig> = read_lines(path)?
            .iter()
            .map(|line| Self::parse_line(line))
            .collect();

        info!("Loaded {} proxies from {}", proxies.len(), path.display());
        Ok(proxies)
    }

    /// Accepted formats:
    /// - `scheme://[user:pass@]host:port`
    /// - `host:port`
    /// - `host:port:user:pass`
    ///
    /// Anything else is kept verbatim so the account keeps its position; the
    /// startup liveness check will reject it.
    pub fn parse_line(line: &str) -> ProxyConfig {
        let line = line.trim();

        if line.contains("://") {
            if let Ok(u) = url::Url::parse(line) {
                if let Some(host) = u.host_str() {
                    let base_url = match u.port() {
                        Some(port) => format!("{}://{}:{}", u.scheme(), host, port),
                        None => format!("{}://{}", u.scheme(), host),
                    };
                    let username = (!u.username().is_empty()).then(|| u.username().to_string());
                    let password = u.password().map(str::to_string);
                    return ProxyConfig {
                        url: base_url,
                        username,
                        password,
                    };
                }
            }
            warn!("Unrecognized proxy line, keeping as-is: {}", line);
            return ProxyConfig::new(line);
        }

        let parts: Vec<&str> = line.split(':').map(str::trim).collect();
        match parts.as_slice() {
            [host, port] => ProxyConfig::new(format!("http://{}:{}", host, port)),
            [host, port, user, pass] => {
                ProxyConfig::new(format!("http://{}:{}", host, port)).with_auth(*user, *pass)
            }
            _ => {
                warn!("Unrecognized proxy line, keeping as-is: {}", line);
                ProxyConfig::new(line)
            }
        }
    }

    /// Positional lookup: accounts past the end of the list run unproxied.
    pub fn proxy_for(proxies: &[ProxyConfig], account_index: usize) -> Option<ProxyConfig> {
        proxies.get(account_index).cloned()
    }
}
