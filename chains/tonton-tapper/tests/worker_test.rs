use core_logic::{ProxyConfig, Worker};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tonton_tapper::{TapperConfig, TapperWorker};
use wiremock::matchers::{header, method, path};
use wiremock::Request;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, use_proxy: bool) -> TapperConfig {
    config_with(&server.uri(), json!({ "use_proxy": use_proxy }))
}

/// Test config whose endpoints live under `base`, with `overrides` applied
/// on top.
fn config_with(base: &str, overrides: Value) -> TapperConfig {
    let mut raw = json!({
        "tap": 5,
        "tap_delay_ms": {"min": 20, "max": 20},
        "startup_jitter_secs": 0,
        "request_timeout_secs": 2,
        "credential_mode": "passthrough",
        "proxy_check_url": format!("{}/ip", base),
        "endpoints": {
            "tap": format!("{}/tma/tap", base),
            "energy": format!("{}/auth/get-super-user", base),
            "quests": format!("{}/search/results", base),
            "daily_login": format!("{}/auth/gm-streak", base),
            "auth": format!("{}/auth/telegram", base)
        }
    });
    if let (Some(raw), Some(overrides)) = (raw.as_object_mut(), overrides.as_object()) {
        for (key, value) in overrides {
            raw.insert(key.clone(), value.clone());
        }
    }
    TapperConfig::from_json_str(&raw.to_string()).unwrap()
}

async fn mount_game(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/get-super-user"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tapDetails": {"energyLeft": 900},
            "totalTxps": 12345
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tma/tap"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/gm-streak"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"streak": 3})))
        .mount(server)
        .await;
}

async fn run_for(mut worker: TapperWorker, duration: Duration) -> core_logic::WorkerStats {
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(duration).await;
        canceller.cancel();
    });
    worker.start(token).await.unwrap()
}

async fn requests_to(server: &MockServer, wanted: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == wanted)
        .collect()
}

async fn count_requests(server: &MockServer, wanted: &str) -> usize {
    requests_to(server, wanted).await.len()
}

#[tokio::test]
async fn test_worker_taps_and_claims_daily_bonus() {
    let server = MockServer::start().await;
    mount_game(&server).await;

    let config = Arc::new(config_for(&server, false));
    let worker = TapperWorker::new(1, "tok-1", None, config);
    let stats = run_for(worker, Duration::from_millis(500)).await;

    let taps = count_requests(&server, "/tma/tap").await;
    assert!(taps > 0);
    // a tap in flight at cancellation reaches the server but is not counted
    let counted = stats.success as usize;
    assert!(counted == taps || counted + 1 == taps);
    assert_eq!(stats.failed, 0);
    assert_eq!(count_requests(&server, "/auth/gm-streak").await, 1);
}

#[tokio::test]
async fn test_dead_proxy_falls_back_to_direct_connection() {
    let server = MockServer::start().await;
    mount_game(&server).await;

    let config = Arc::new(config_for(&server, true));
    // nothing listens on port 9 locally
    let dead = ProxyConfig::new("http://127.0.0.1:9");
    let worker = TapperWorker::new(1, "tok-1", Some(dead), config);
    let stats = run_for(worker, Duration::from_millis(800)).await;

    assert!(stats.success > 0);
    assert_eq!(count_requests(&server, "/ip").await, 0);
}

#[tokio::test]
async fn test_proxy_is_ignored_when_disabled() {
    let server = MockServer::start().await;
    mount_game(&server).await;

    let config = Arc::new(config_for(&server, false));
    let worker = TapperWorker::new(1, "tok-1", Some(ProxyConfig::new("http://127.0.0.1:9")), config);
    let stats = run_for(worker, Duration::from_millis(300)).await;

    assert!(stats.success > 0);
}

#[tokio::test]
async fn test_cancel_before_start_returns_empty_stats() {
    let server = MockServer::start().await;
    let config = Arc::new(config_for(&server, false));
    let mut worker = TapperWorker::new(1, "tok-1", None, config);

    let token = CancellationToken::new();
    token.cancel();
    let stats = worker.start(token).await.unwrap();
    assert_eq!(stats.total(), 0);
}

#[tokio::test]
async fn test_rejected_exchange_keeps_account_probing_without_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/telegram"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/get-super-user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let config = Arc::new(config_with(
        &server.uri(),
        json!({
            "credential_mode": "exchange",
            "retry_interval_secs": 1,
            "daily_bonus": false
        }),
    ));
    let line = "user=%7B%22id%22%3A1%2C%22first_name%22%3A%22A%22%2C%22username%22%3A%22a%22%7D&auth_date=100&hash=abc";
    let worker = TapperWorker::new(1, line, None, config);
    let stats = run_for(worker, Duration::from_millis(1500)).await;

    assert_eq!(stats.total(), 0);
    assert_eq!(count_requests(&server, "/auth/telegram").await, 1);

    // first probe at once, second after the 1s backoff
    let probes = requests_to(&server, "/auth/get-super-user").await;
    assert_eq!(probes.len(), 2);
    assert!(probes
        .iter()
        .all(|r| !r.headers.contains_key("authorization")));
    assert_eq!(count_requests(&server, "/tma/tap").await, 0);
}

#[tokio::test]
async fn test_undecodable_token_skips_exchange_and_keeps_running() {
    let server = MockServer::start().await;
    mount_game(&server).await;

    let config = Arc::new(config_with(
        &server.uri(),
        json!({ "credential_mode": "exchange", "retry_interval_secs": 1 }),
    ));
    let worker = TapperWorker::new(1, "not-init-data", None, config);
    let stats = run_for(worker, Duration::from_millis(300)).await;

    assert_eq!(stats.total(), 0);
    assert_eq!(count_requests(&server, "/auth/telegram").await, 0);
    // the energy route wants a bearer, so the unauthenticated probe falls through to 404
    assert_eq!(count_requests(&server, "/auth/get-super-user").await, 1);
}

#[tokio::test]
async fn test_healthy_proxy_carries_game_traffic() {
    // the fake proxy answers every route; the game host itself does not resolve
    let proxy_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"origin": "10.0.0.1"})))
        .mount(&proxy_server)
        .await;
    mount_game(&proxy_server).await;

    let config = Arc::new(config_with(
        "http://game.invalid",
        json!({ "use_proxy": true, "daily_bonus": false }),
    ));
    let proxy = ProxyConfig::new(proxy_server.uri());
    let worker = TapperWorker::new(1, "tok-1", Some(proxy), config);
    let stats = run_for(worker, Duration::from_millis(500)).await;

    assert!(stats.success > 0);
    assert_eq!(count_requests(&proxy_server, "/ip").await, 1);
    let taps = requests_to(&proxy_server, "/tma/tap").await;
    assert!(!taps.is_empty());
    assert!(taps
        .iter()
        .all(|r| r.url.host_str() == Some("game.invalid")));
}
