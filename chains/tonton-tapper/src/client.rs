//! Account Client - per-account HTTP transport
//!
//! Every account owns exactly one [`AccountClient`]. It carries the account's
//! proxy binding, the fixed browser-like header set and, once known, the
//! bearer credential. Clients are never shared between accounts so proxy and
//! header bindings cannot leak from one account into another.
//!
//! The [`Transport`] trait is the seam the rest of the crate talks to, which
//! lets the scheduler be driven by an in-memory transport in tests.

use async_trait::async_trait;
use core_logic::{NetworkError, ProxyConfig};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 12; K) AppleWebKit/537.36 \
     (KHTML, like Gecko) Version/4.0 Chrome/127.06533103 Mobile Safari/537.36";

const FIXED_HEADERS: &[(&str, &str)] = &[
    ("accept", "application/json, text/plain, */*"),
    ("accept-language", "id,en-US;q=0.9,en;q=0.8,id-ID;q=0.7"),
    ("content-type", "application/json"),
    ("origin", "https://www.intract.io"),
    ("referer", "https://www.intract.io/"),
    ("sec-ch-ua-mobile", "?1"),
    ("sec-ch-ua-platform", "Android"),
    ("sec-fetch-site", "same-site"),
    ("pragma", "no-cache"),
];

/// Successful (2xx) response from the remote service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Value of the `Authorization` response header, if present
    pub authorization: Option<String>,
    /// Parsed JSON body; `None` when empty or not JSON
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            authorization: None,
            body: Some(body),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one request. A non-2xx status is reported as
    /// [`NetworkError::HttpError`]; network failures as `Timeout` or
    /// `Connection`.
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, NetworkError>;
}

pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for &(name, value) in FIXED_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers.insert(
        reqwest::header::USER_AGENT,
        HeaderValue::from_static(USER_AGENT),
    );
    headers
}

/// HTTP client bound to a single account
#[derive(Clone)]
pub struct AccountClient {
    http: Client,
    bearer: Option<String>,
    timeout: Duration,
    proxy: Option<ProxyConfig>,
}

impl std::fmt::Debug for AccountClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountClient")
            .field("proxy", &self.proxy.as_ref().map(|p| p.url.as_str()))
            .field("has_bearer", &self.bearer.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AccountClient {
    pub fn new(proxy: Option<&ProxyConfig>, timeout: Duration) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .default_headers(default_headers())
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90));

        if let Some(proxy_conf) = proxy {
            builder = builder.proxy(proxy_conf.to_reqwest()?);
        }

        Ok(Self {
            http: builder.build()?,
            bearer: None,
            timeout,
            proxy: proxy.cloned(),
        })
    }

    /// Same connection pool, now authenticated.
    pub fn with_bearer(&self, bearer: Option<String>) -> Self {
        Self {
            bearer,
            ..self.clone()
        }
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> NetworkError {
        if e.is_timeout() {
            NetworkError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
                endpoint: url.to_string(),
            }
        } else {
            NetworkError::Connection {
                endpoint: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for AccountClient {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, NetworkError> {
        let mut req = self.http.request(method, url);
        if let Some(bearer) = &self.bearer {
            req = req.header(AUTHORIZATION, format!("Bearer {}", bearer));
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| self.map_send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status_code: status.as_u16(),
                endpoint: url.to_string(),
            });
        }

        let authorization = response
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(url, e))?;
        let body = serde_json::from_slice(&bytes).ok();

        Ok(ApiResponse {
            status: status.as_u16(),
            authorization,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> AccountClient {
        AccountClient::new(None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_default_headers_present() {
        let headers = default_headers();
        assert_eq!(headers["origin"], "https://www.intract.io");
        assert_eq!(headers["content-type"], "application/json");
        assert!(headers[reqwest::header::USER_AGENT]
            .to_str()
            .unwrap()
            .contains("Mobile Safari"));
    }

    #[test]
    fn test_bad_proxy_url_fails_client_build() {
        let proxy = ProxyConfig::new("not a proxy at all");
        assert!(AccountClient::new(Some(&proxy), Duration::from_secs(5)).is_err());
    }

    #[tokio::test]
    async fn test_sends_fixed_headers_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tap"))
            .and(header("authorization", "Bearer tok"))
            .and(header("referer", "https://www.intract.io/"))
            .and(body_json(json!({"userTaps": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client().with_bearer(Some("tok".to_string()));
        let resp = client
            .request(
                Method::POST,
                &format!("{}/tap", server.uri()),
                Some(&json!({"userTaps": 3})),
            )
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client()
            .request(Method::GET, &format!("{}/energy", server.uri()), None)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(401));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_slow_server_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client = AccountClient::new(None, Duration::from_millis(200)).unwrap();
        let err = client
            .request(Method::GET, &server.uri(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, NetworkError::Timeout { timeout_ms: 200, .. }));
    }

    #[tokio::test]
    async fn test_authorization_header_captured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).insert_header("authorization", "signed"))
            .mount(&server)
            .await;

        let resp = client()
            .request(Method::POST, &server.uri(), Some(&json!({})))
            .await
            .unwrap();

        assert_eq!(resp.authorization.as_deref(), Some("signed"));
        assert_eq!(resp.body, None);
    }
}
