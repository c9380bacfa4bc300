use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use models::{LoadGenerator, LoadTestPreferences, PerformanceTestConfig, Preference, User};
use serde_json::{json, Value};
use service::provider::mock::{MockProvider, ProviderCall};
use service::provider::{Provider, SessionStore};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use server::routes;
use server::state::ServerState;

const PREFS_URL: &str = "/api/perf/load-test-prefs";
const PERF_URL: &str = "/api/user/prefs/perf";

fn build_app() -> (Router, Arc<MockProvider>) {
    let mock = Arc::new(MockProvider::new());
    let provider: Arc<dyn Provider> = mock.clone();
    let sessions: Arc<dyn SessionStore> = mock.clone();
    let state = ServerState::new(provider, sessions, "x-user-id").expect("state");
    (routes::build_router(state, CorsLayer::very_permissive(), 64 * 1024), mock)
}

async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, String)> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok((status, String::from_utf8(bytes.to_vec())?))
}

fn form_post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(PREFS_URL)
        .header("x-user-id", "alice")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn user_request(method: &str, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "alice")
        .body(body)
        .expect("request")
}

fn valid_config_json(name: &str) -> Value {
    json!({
        "name": name,
        "duration": "30s",
        "clients": [{
            "loadGenerator": "fortio",
            "connections": 2,
            "rps": 50,
            "endpointUrls": ["http://productpage.bookinfo:9080/"]
        }]
    })
}

fn alice() -> User {
    User::new("alice").expect("user")
}

#[tokio::test]
async fn valid_load_test_prefs_are_recorded_once() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    let (status, body) = send(&app, form_post("qps=10&t=30s&c=5&gen=fortio")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "{}");

    assert_eq!(mock.calls().len(), 1);
    let records = mock.record_calls();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].load_test_prefs,
        Some(LoadTestPreferences {
            concurrent_requests: 5,
            duration: "30s".into(),
            queries_per_second: 10,
            load_generator: LoadGenerator::Fortio,
        })
    );
    Ok(())
}

#[tokio::test]
async fn invalid_numbers_never_reach_the_provider() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    let cases = [
        ("qps=-1&t=30s&c=5&gen=fortio", "please provide a valid value for qps"),
        ("qps=abc&t=30s&c=5&gen=fortio", "please provide a valid value for qps"),
        ("t=30s&c=5&gen=fortio", "please provide a valid value for qps"),
        ("qps=10&t=30s&c=-5&gen=fortio", "please provide a valid value for c"),
        ("qps=10&t=30s&c=five&gen=fortio", "please provide a valid value for c"),
    ];
    for (form, message) in cases {
        let (status, body) = send(&app, form_post(form)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{form}");
        assert_eq!(body, message, "{form}");
    }
    assert!(mock.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn bad_duration_is_reported_before_generator() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    let (status, body) = send(&app, form_post("qps=10&t=30&c=5&gen=unknown")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "please provide a valid value for t");

    let (status, body) = send(&app, form_post("qps=10&t=30s&c=5&gen=unknown")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "please provide a valid value for gen (load generator)");
    assert!(mock.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn query_string_fields_are_accepted_and_body_wins() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    let req = Request::builder()
        .method("POST")
        .uri(format!("{PREFS_URL}?qps=1&t=1s&c=1&gen=fortio"))
        .header("x-user-id", "alice")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("gen=wrk2"))?;
    let (status, _) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK);
    let prefs = mock.record_calls()[0].load_test_prefs.clone().expect("prefs");
    assert_eq!(prefs.load_generator, LoadGenerator::Wrk2);
    assert_eq!(prefs.queries_per_second, 1);
    Ok(())
}

#[tokio::test]
async fn multipart_form_fields_are_accepted() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    let mut body = String::new();
    for (name, value) in [("qps", "10"), ("t", "30s"), ("c", "5"), ("gen", "fortio")] {
        body.push_str(&format!(
            "--XBOUNDARY\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(
        "--XBOUNDARY\r\nContent-Disposition: form-data; name=\"gen\"; filename=\"gen.txt\"\r\n\r\nwrk2\r\n",
    );
    body.push_str("--XBOUNDARY--\r\n");
    let req = Request::builder()
        .method("POST")
        .uri(PREFS_URL)
        .header("x-user-id", "alice")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(body))?;

    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    let records = mock.record_calls();
    assert_eq!(records.len(), 1);
    let prefs = records[0].load_test_prefs.clone().expect("prefs");
    assert_eq!(prefs.queries_per_second, 10);
    assert_eq!(prefs.concurrent_requests, 5);
    assert_eq!(prefs.load_generator, LoadGenerator::Fortio);
    Ok(())
}

#[tokio::test]
async fn session_preference_failure_is_a_server_error() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    mock.set_session_failing(true);
    let (status, body) = send(&app, form_post("qps=10&t=30s&c=5&gen=fortio")).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "unable to read user preferences");
    assert!(mock.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn saving_prefs_keeps_other_preference_fields() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    mock.seed_preferences(&alice(), Preference { anonymous_usage_stats: true, ..Default::default() });
    let (status, _) = send(&app, form_post("qps=0&t=1m&c=0&gen=wrk2")).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, user_request("GET", "/api/user/prefs", Body::empty())).await?;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body)?;
    assert_eq!(v["anonymousUsageStats"], json!(true));
    assert_eq!(v["loadTestPrefs"], json!({"c": 0, "t": "1m", "qps": 0, "gen": "wrk2"}));
    Ok(())
}

#[tokio::test]
async fn non_post_update_is_not_found() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    for method in ["GET", "PUT", "DELETE"] {
        let (status, body) = send(&app, user_request(method, PREFS_URL, Body::empty())).await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
        assert!(body.is_empty());
    }
    assert!(mock.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn persistence_failure_is_a_server_error() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    mock.set_failing(true);
    let (status, body) = send(&app, form_post("qps=10&t=30s&c=5&gen=fortio")).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "unable to save user preferences");
    Ok(())
}

#[tokio::test]
async fn missing_user_is_unauthorized() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    let req = Request::builder().method("GET").uri(PERF_URL).body(Body::empty())?;
    let (status, _) = send(&app, req).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(mock.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn store_returns_generated_id() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    let body = serde_json::to_vec(&valid_config_json("baseline"))?;
    let (status, id) = send(&app, user_request("POST", PERF_URL, Body::from(body))).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(mock.store_calls(), 1);

    let (status, body) = send(&app, user_request("GET", &format!("{PERF_URL}?uuid={id}"), Body::empty())).await?;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body)?;
    assert_eq!(v["id"], json!(id));
    assert_eq!(v["name"], json!("baseline"));
    Ok(())
}

#[tokio::test]
async fn invalid_config_is_rejected_without_storing() -> anyhow::Result<()> {
    let (app, mock) = build_app();

    let mut cfg = valid_config_json("no clients");
    cfg["clients"] = json!([]);
    let (status, body) = send(&app, user_request("POST", PERF_URL, Body::from(cfg.to_string()))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("minimum one test client needs to be specified"));

    let (status, body) = send(&app, user_request("POST", PERF_URL, Body::from("{not json"))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "unable to parse the provided input");

    assert_eq!(mock.store_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn oversized_config_body_is_a_read_error() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    let body = vec![b' '; 80 * 1024];
    let (status, body) = send(&app, user_request("POST", PERF_URL, Body::from(body))).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "unable to read request body");
    assert_eq!(mock.store_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn repeated_uuid_uses_the_first_value() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    let id = mock.seed_test_config(&alice(), PerformanceTestConfig { name: "first".into(), ..Default::default() });

    let uri = format!("{PERF_URL}?uuid={id}&uuid=other");
    let (status, body) = send(&app, user_request("GET", &uri, Body::empty())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body)?["name"], json!("first"));

    let (status, _) = send(&app, user_request("DELETE", &uri, Body::empty())).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(mock
        .calls()
        .contains(&ProviderCall::DeleteTestConfig { user: "alice".into(), id: id.clone() }));
    Ok(())
}

#[tokio::test]
async fn store_failure_is_a_server_error() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    mock.set_failing(true);
    let body = valid_config_json("x").to_string();
    let (status, body) = send(&app, user_request("POST", PERF_URL, Body::from(body))).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "unable to save user preferences");
    Ok(())
}

#[tokio::test]
async fn list_returns_every_config_with_defaults() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    let user = alice();
    for name in ["one", "two", "three"] {
        mock.seed_test_config(&user, PerformanceTestConfig { name: name.into(), ..Default::default() });
    }
    mock.seed_test_config(&User::new("bob")?, PerformanceTestConfig::default());

    let (status, body) = send(&app, user_request("GET", PERF_URL, Body::empty())).await?;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body)?;
    let items = v.as_array().expect("array");
    assert_eq!(items.len(), 3);
    // default-valued fields are present
    assert_eq!(items[0]["duration"], json!(""));
    assert_eq!(items[0]["clients"], json!([]));

    // empty uuid behaves like no uuid
    let (status, body) = send(&app, user_request("GET", &format!("{PERF_URL}?uuid="), Body::empty())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body)?.as_array().map(Vec::len), Some(3));
    Ok(())
}

#[tokio::test]
async fn empty_list_is_an_empty_array() -> anyhow::Result<()> {
    let (app, _mock) = build_app();
    let (status, body) = send(&app, user_request("GET", PERF_URL, Body::empty())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
    Ok(())
}

#[tokio::test]
async fn unknown_uuid_is_not_found() -> anyhow::Result<()> {
    let (app, _mock) = build_app();
    let (status, body) = send(&app, user_request("GET", &format!("{PERF_URL}?uuid=nope"), Body::empty())).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
    Ok(())
}

#[tokio::test]
async fn fetch_failure_is_a_server_error() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    mock.set_failing(true);
    let (status, body) = send(&app, user_request("GET", PERF_URL, Body::empty())).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "error fetching test configs");
    Ok(())
}

#[tokio::test]
async fn delete_requires_uuid_and_surfaces_errors() -> anyhow::Result<()> {
    let (app, mock) = build_app();
    let (status, body) = send(&app, user_request("DELETE", PERF_URL, Body::empty())).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "field uuid not found");
    assert!(mock.calls().is_empty());

    let id = mock.seed_test_config(&alice(), PerformanceTestConfig::default());
    let (status, _) = send(&app, user_request("DELETE", &format!("{PERF_URL}?uuid={id}"), Body::empty())).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(mock
        .calls()
        .contains(&ProviderCall::DeleteTestConfig { user: "alice".into(), id: id.clone() }));

    // deleting again is still OK
    let (status, _) = send(&app, user_request("DELETE", &format!("{PERF_URL}?uuid={id}"), Body::empty())).await?;
    assert_eq!(status, StatusCode::OK);

    mock.set_failing(true);
    let (status, body) = send(&app, user_request("DELETE", &format!("{PERF_URL}?uuid={id}"), Body::empty())).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "unable to delete test config");
    Ok(())
}

#[tokio::test]
async fn health_and_openapi_are_public() -> anyhow::Result<()> {
    let (app, _mock) = build_app();
    let req = Request::builder().uri("/health").body(Body::empty())?;
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body)?["status"], json!("ok"));

    let req = Request::builder().uri("/api-docs/openapi.json").body(Body::empty())?;
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK);
    let doc: Value = serde_json::from_str(&body)?;
    assert!(doc["paths"].get(PERF_URL).is_some());
    Ok(())
}

#[tokio::test]
async fn metrics_expose_handler_counters() -> anyhow::Result<()> {
    let (app, _mock) = build_app();
    let (status, _) = send(&app, form_post("qps=10&t=30s&c=5&gen=fortio")).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, form_post("qps=10&t=30s&c=5&gen=siege")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder().uri("/metrics").body(Body::empty())?;
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("prefs_load_test_saved_total"));
    assert!(body.contains("prefs_load_test_rejected_total{field=\"gen\"}"));
    Ok(())
}
