use axum::Json;
use axum::http::StatusCode;
use axum::response::Html;

use crate::api::models::ScrapeResponse;

const LANDING_PAGE: &str = include_str!("../../static/index.html");

pub fn success(summary: Vec<String>) -> (StatusCode, Json<ScrapeResponse>) {
    (StatusCode::OK, Json(ScrapeResponse { summary }))
}

pub fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}
