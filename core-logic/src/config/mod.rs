use serde::{Deserialize, Serialize};

/// Outbound proxy binding for one account.
///
/// `url` is the base `scheme://host:port`; credentials are kept apart so they
/// can be attached with basic auth and never show up in logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Builds the reqwest proxy, attaching basic auth when credentials exist.
    pub fn to_reqwest(&self) -> reqwest::Result<reqwest::Proxy> {
        let proxy = reqwest::Proxy::all(&self.url)?;
        Ok(match (&self.username, &self.password) {
            (Some(u), Some(p)) => proxy.basic_auth(u, p),
            _ => proxy,
        })
    }
}
