use super::*;
use axum::{body, body::Body, http::Request, response::Response};
use tower::ServiceExt;

async fn test_app() -> (Router, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let app = build_router(Arc::new(AppState {
        counters: CounterContext::new(storage.clone()),
    }));
    (app, storage)
}

async fn body_text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("response")
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).expect("request")
}

fn get_req(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

fn json_req(method: &str, uri: &str, value: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(value.to_string()))
        .expect("request")
}

async fn counter_json(response: Response) -> CounterResponse {
    let text = body_text(response).await;
    serde_json::from_str(&text).expect("counter json")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage) = test_app().await;
    let response = send(&app, get_req("/healthz")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn root_redirects_to_counter_page() {
    let (app, _storage) = test_app().await;
    let response = send(&app, get_req("/")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok()),
        Some("/counter")
    );
}

#[tokio::test]
async fn counter_page_loads_at_zero_and_creates_default() {
    let (app, storage) = test_app().await;
    let response = send(&app, get_req("/counter")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Simple Counter"));
    assert!(html.contains(r#"id="count">0</div>"#));
    assert!(html.contains("Increment"));
    assert!(html.contains("Reset"));
    assert_eq!(storage.count_rows().await.expect("rows"), 1);
}

#[tokio::test]
async fn increment_button_counts_up_with_notice() {
    let (app, _storage) = test_app().await;
    send(&app, get_req("/counter")).await;

    for expected in 1..=3 {
        let html = body_text(send(&app, post_empty("/counter/increment")).await).await;
        assert!(html.contains(&format!(r#"id="count">{expected}</div>"#)));
        assert!(html.contains(&format!("Count increased to {expected}")));
    }
}

#[tokio::test]
async fn reset_button_returns_to_zero_with_notice() {
    let (app, _storage) = test_app().await;
    send(&app, post_empty("/counter/increment")).await;
    send(&app, post_empty("/counter/increment")).await;

    let html = body_text(send(&app, post_empty("/counter/reset")).await).await;
    assert!(html.contains(r#"id="count">0</div>"#));
    assert!(html.contains("Counter reset to 0"));
}

#[tokio::test]
async fn reset_button_without_counter_shows_no_notice() {
    let (app, storage) = test_app().await;
    let html = body_text(send(&app, post_empty("/counter/reset")).await).await;
    assert!(html.contains(r#"id="count">0</div>"#));
    assert!(!html.contains("Counter reset to 0"));
    assert_eq!(storage.count_rows().await.expect("rows"), 0);
}

#[tokio::test]
async fn count_persists_across_page_loads() {
    let (app, _storage) = test_app().await;
    for _ in 0..3 {
        send(&app, post_empty("/counter/increment")).await;
    }
    let html = body_text(send(&app, get_req("/counter")).await).await;
    assert!(html.contains(r#"id="count">3</div>"#));

    let html = body_text(send(&app, post_empty("/counter/increment")).await).await;
    assert!(html.contains(r#"id="count">4</div>"#));
}

#[tokio::test]
async fn api_fetch_missing_counter_is_404() {
    let (app, _storage) = test_app().await;
    let response = send(&app, get_req("/api/counters/ghost")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let err: ApiError = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn api_create_then_duplicate_conflicts() {
    let (app, _storage) = test_app().await;
    let response = send(
        &app,
        json_req("POST", "/api/counters", serde_json::json!({ "name": "c", "count": 42 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = counter_json(response).await;
    assert_eq!(created.count, 42);

    let response = send(
        &app,
        json_req("POST", "/api/counters", serde_json::json!({ "name": "c" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn api_reset_keeps_identity() {
    let (app, _storage) = test_app().await;
    let created = counter_json(
        send(
            &app,
            json_req("POST", "/api/counters", serde_json::json!({ "name": "c", "count": 42 })),
        )
        .await,
    )
    .await;

    let response = send(&app, post_empty("/api/counters/c/reset")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let reset = counter_json(response).await;
    assert_eq!(reset.id, created.id);
    assert_eq!(reset.name, "c");
    assert_eq!(reset.count, 0);
}

#[tokio::test]
async fn api_update_ghost_creates_nothing() {
    let (app, storage) = test_app().await;
    let response = send(
        &app,
        json_req("PUT", "/api/counters/ghost", serde_json::json!({ "count": 10 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(storage.count_rows().await.expect("rows"), 0);

    let response = send(&app, get_req("/api/counters/ghost")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_update_with_null_count_keeps_value() {
    let (app, _storage) = test_app().await;
    send(&app, post_empty("/api/counters/x/increment")).await;
    send(&app, post_empty("/api/counters/x/increment")).await;

    let response = send(
        &app,
        json_req("PUT", "/api/counters/x", serde_json::json!({ "count": null })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(counter_json(response).await.count, 2);

    let response = send(
        &app,
        json_req("PUT", "/api/counters/x", serde_json::json!({ "count": -5 })),
    )
    .await;
    assert_eq!(counter_json(response).await.count, -5);
}

#[tokio::test]
async fn api_value_is_zero_for_missing_and_tracks_increments() {
    let (app, _storage) = test_app().await;
    let text = body_text(send(&app, get_req("/api/counters/a/value")).await).await;
    let value: CounterValueResponse = serde_json::from_str(&text).expect("json");
    assert_eq!(value.count, 0);

    for _ in 0..3 {
        send(&app, post_empty("/api/counters/a/increment")).await;
    }
    let text = body_text(send(&app, get_req("/api/counters/a/value")).await).await;
    let value: CounterValueResponse = serde_json::from_str(&text).expect("json");
    assert_eq!(value, CounterValueResponse { name: "a".into(), count: 3 });
}

#[tokio::test]
async fn api_get_or_create_is_idempotent() {
    let (app, _storage) = test_app().await;
    let first = counter_json(send(&app, post_empty("/api/counters/n/get_or_create")).await).await;
    let second = counter_json(send(&app, post_empty("/api/counters/n/get_or_create")).await).await;
    assert_eq!(first, second);
    assert_eq!(first.count, 0);
}

#[tokio::test]
async fn api_rejects_overlong_name() {
    let (app, _storage) = test_app().await;
    let name = "x".repeat(shared::domain::MAX_COUNTER_NAME_LEN + 1);
    let response = send(&app, post_empty(&format!("/api/counters/{name}/increment"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
