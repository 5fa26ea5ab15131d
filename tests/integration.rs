//! End-to-end tests for the HTTP API using wiremock for the target page and
//! the Gemini endpoint.

use std::time::Duration;

use page_summarizer::{
    api::routes::create_router,
    config::Config,
    llm::RetryPolicy,
    AppState,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEMINI_PATH: &str = "/models/gemini-1.5-pro:generateContent";

fn test_config(gemini: &MockServer, api_key: Option<&str>) -> Config {
    Config {
        server_addr: "127.0.0.1:0".parse().unwrap(),
        gemini_api_key: api_key.map(String::from),
        gemini_api_base: gemini.uri(),
        gemini_model: "gemini-1.5-pro".to_string(),
        gemini_max_retries: 3,
    }
}

async fn spawn_app(config: Config) -> String {
    let mut state = AppState::new(&config).unwrap();
    state.summarizer = state
        .summarizer
        .with_retry_policy(RetryPolicy::new(3).with_base_delay(Duration::from_millis(10)));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn post_scrape(app: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}/scrape", app))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
    }))
}

async fn mount_page(server: &MockServer, html: &str) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_landing_page() {
    let gemini = MockServer::start().await;
    let app = spawn_app(test_config(&gemini, Some("test-key"))).await;

    let resp = reqwest::get(format!("{}/", app)).await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert!(resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(resp.text().await.unwrap().contains("<form"));
}

#[tokio::test]
async fn test_missing_url_is_rejected() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("unused"))
        .expect(0)
        .mount(&gemini)
        .await;
    let app = spawn_app(test_config(&gemini, Some("test-key"))).await;

    for body in [json!({}), json!({"url": ""}), json!({"url": "   "}), json!({"url": null})] {
        let (status, body) = post_scrape(&app, body).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({"error": "Missing URL"}));
    }
}

#[tokio::test]
async fn test_invalid_body_is_rejected() {
    let gemini = MockServer::start().await;
    let app = spawn_app(test_config(&gemini, Some("test-key"))).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/scrape", app))
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_non_success_page_status_returns_500() {
    let target = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&target)
        .await;

    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("unused"))
        .expect(0)
        .mount(&gemini)
        .await;
    let app = spawn_app(test_config(&gemini, Some("test-key"))).await;

    let (status, body) = post_scrape(&app, json!({"url": format!("{}/missing", target.uri())})).await;

    assert_eq!(status, 500);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Error:"), "unexpected error: {}", error);
    assert!(error.contains("404"));
}

#[tokio::test]
async fn test_unreachable_host_returns_500() {
    let gemini = MockServer::start().await;
    let app = spawn_app(test_config(&gemini, Some("test-key"))).await;

    let (status, body) = post_scrape(&app, json!({"url": "http://127.0.0.1:1/"})).await;

    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().starts_with("Error:"));
}

#[tokio::test]
async fn test_malformed_url_returns_500() {
    let gemini = MockServer::start().await;
    let app = spawn_app(test_config(&gemini, Some("test-key"))).await;

    let (status, body) = post_scrape(&app, json!({"url": "not a url"})).await;

    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().starts_with("Error:"));
}

#[tokio::test]
async fn test_end_to_end_summary() {
    let target = MockServer::start().await;
    mount_page(&target, "<html><body><p>Hello world</p></body></html>").await;

    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(query_param("key", "test-key"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "contents": [{"parts": [{"text": "Summarize the following text in bullet points:\n\nHello world"}]}]
        })))
        .respond_with(gemini_reply("- point one\n- point two"))
        .expect(1)
        .mount(&gemini)
        .await;
    let app = spawn_app(test_config(&gemini, Some("test-key"))).await;

    let (status, body) = post_scrape(&app, json!({"url": target.uri()})).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"summary": ["- point one", "- point two"]}));
}

#[tokio::test]
async fn test_missing_api_key_still_returns_200() {
    let target = MockServer::start().await;
    mount_page(&target, "<html><body><p>Hello world</p></body></html>").await;

    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("unused"))
        .expect(0)
        .mount(&gemini)
        .await;
    let app = spawn_app(test_config(&gemini, None)).await;

    let (status, body) = post_scrape(&app, json!({"url": target.uri()})).await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({"summary": ["Error: Missing Gemini API key in .env file."]})
    );
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let target = MockServer::start().await;
    mount_page(&target, "<html><body><p>Hello world</p></body></html>").await;

    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&gemini)
        .await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(gemini_reply("- retried"))
        .expect(1)
        .mount(&gemini)
        .await;
    let app = spawn_app(test_config(&gemini, Some("test-key"))).await;

    let (status, body) = post_scrape(&app, json!({"url": target.uri()})).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"summary": ["- retried"]}));
}

#[tokio::test]
async fn test_summarizer_failure_is_reported_in_summary() {
    let target = MockServer::start().await;
    mount_page(&target, "<html><body><p>Hello world</p></body></html>").await;

    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&gemini)
        .await;
    let app = spawn_app(test_config(&gemini, Some("test-key"))).await;

    let (status, body) = post_scrape(&app, json!({"url": target.uri()})).await;

    assert_eq!(status, 200);
    let summary = body["summary"].as_array().unwrap();
    assert_eq!(summary.len(), 1);
    let line = summary[0].as_str().unwrap();
    assert!(line.starts_with("Error:"), "unexpected line: {}", line);
    assert!(!line.contains("test-key"));
}
