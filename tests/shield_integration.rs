//! End-to-end tests driving the shield over HTTP.

use std::sync::Arc;

use axum::http::StatusCode;
use forum_shield::config::ShieldConfig;
use forum_shield::signature::{
    current_timestamp, generate_nonce, sign, MemoryNonceStore, SignedRequest,
};
use forum_shield::ShieldServer;

/// Boot a server on an OS-assigned port and return its base URL.
async fn start_shield(config: ShieldConfig) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = ShieldServer::new(config, Arc::new(MemoryNonceStore::new())).unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    format!("http://{}", addr)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let base = start_shield(ShieldConfig::default()).await;
    let res = client().get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unsigned_request_rejected_when_signatures_required() {
    let mut config = ShieldConfig::default();
    config.signature.enabled = true;
    config.signature.secret_key = "integration-test-secret-key".into();
    config.signature.require_signature = true;
    let base = start_shield(config).await;

    let res = client()
        .post(format!("{}/api/v1/topics", base))
        .json(&serde_json::json!({"title": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signed_request_passes_and_replay_is_rejected() {
    const SECRET: &str = "integration-test-secret-key";
    let mut config = ShieldConfig::default();
    config.signature.enabled = true;
    config.signature.secret_key = SECRET.into();
    config.signature.require_signature = true;
    let base = start_shield(config).await;

    let body = r#"{"title":"a signed topic"}"#;
    let ts = current_timestamp();
    let nonce = generate_nonce(24);
    let sig = sign(SECRET, "POST", "/api/v1/topics", ts, &nonce, body);

    let send = || {
        client()
            .post(format!("{}/api/v1/topics", base))
            .header("x-timestamp", ts.to_string())
            .header("x-nonce", &nonce)
            .header("x-signature", &sig)
            .header("content-type", "application/json")
            .body(body)
            .send()
    };

    let first = send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // Identical request again: the nonce is already consumed.
    let second = send().await.unwrap();
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signed_get_verifies_over_sorted_query() {
    const SECRET: &str = "integration-test-secret-key";
    let mut config = ShieldConfig::default();
    config.signature.enabled = true;
    config.signature.secret_key = SECRET.into();
    let base = start_shield(config).await;

    // Sign with the params in a different order than the URL carries.
    let signed = SignedRequest::for_query(SECRET, "GET", "/search", [("q", "rust"), ("page", "2")]);

    let mut request = client().get(format!("{}/search?page=2&q=rust", base));
    for (name, value) in signed.headers() {
        request = request.header(name, value);
    }
    let res = request.send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn tampered_body_fails_verification() {
    const SECRET: &str = "integration-test-secret-key";
    let mut config = ShieldConfig::default();
    config.signature.enabled = true;
    config.signature.secret_key = SECRET.into();
    let base = start_shield(config).await;

    let ts = current_timestamp();
    let nonce = generate_nonce(24);
    let sig = sign(SECRET, "POST", "/api/v1/topics", ts, &nonce, r#"{"title":"x"}"#);

    let res = client()
        .post(format!("{}/api/v1/topics", base))
        .header("x-timestamp", ts.to_string())
        .header("x-nonce", &nonce)
        .header("x-signature", &sig)
        .body(r#"{"title":"y"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rate_limit_reports_headers_and_rejects_overflow() {
    let mut config = ShieldConfig::default();
    config.rate_limit.default_spec = "2-M".into();
    let base = start_shield(config).await;
    let client = client();

    let first = client.get(format!("{}/anything", base)).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-ratelimit-limit"], "2");
    assert_eq!(first.headers()["x-ratelimit-remaining"], "1");

    let second = client.get(format!("{}/anything", base)).send().await.unwrap();
    assert_eq!(second.headers()["x-ratelimit-remaining"], "0");

    let third = client.get(format!("{}/anything", base)).send().await.unwrap();
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(third.headers().contains_key("retry-after"));

    let body: serde_json::Value = third.json().await.unwrap();
    assert_eq!(body["code"], "rate_limited");
}

#[tokio::test]
async fn route_override_is_stricter_than_default() {
    let mut config = ShieldConfig::default();
    config.rate_limit.default_spec = "100-M".into();
    config
        .rate_limit
        .route_specs
        .insert("/api/v1/login".into(), "1-M".into());
    let base = start_shield(config).await;
    let client = client();

    let first = client.get(format!("{}/api/v1/login", base)).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let second = client.get(format!("{}/api/v1/login", base)).send().await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    // Other paths still use the wide default.
    let other = client.get(format!("{}/api/v1/topics", base)).send().await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn sensitive_words_are_filtered_in_transit() {
    let mut config = ShieldConfig::default();
    config.content.words = vec!["casino".into()];
    let base = start_shield(config).await;

    let res = client()
        .post(format!("{}/api/v1/topics", base))
        .json(&serde_json::json!({
            "title": "visit my casino please",
            "content": "the best CASINO in town"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["payload"]["title"], "visit my *** please");
    assert_eq!(body["payload"]["content"], "the best *** in town");
    assert_eq!(body["filtered_words"][0], "casino");
}

#[tokio::test]
async fn hostile_markup_is_rejected_outright() {
    let base = start_shield(ShieldConfig::default()).await;

    let res = client()
        .post(format!("{}/api/v1/topics", base))
        .json(&serde_json::json!({
            "content": "<script>document.cookie</script>"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "hostile_content");
}

#[tokio::test]
async fn get_requests_skip_content_checks() {
    let mut config = ShieldConfig::default();
    config.content.words = vec!["casino".into()];
    let base = start_shield(config).await;

    // Reads are never content-checked, even on a checked path.
    let res = client()
        .get(format!("{}/api/v1/topics?q=casino", base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
