use axum::{
    routing::{get, post},
    Router,
    extract::{Json, State, rejection::JsonRejection},
    response::{Html, IntoResponse, Response},
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use std::time::Instant;

use crate::error::{Result, AppError};
use crate::api::models::ScrapeRequest;
use crate::api::response;
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/scrape", post(scrape_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn index_handler() -> Html<&'static str> {
    response::landing_page()
}

async fn scrape_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ScrapeRequest>, JsonRejection>,
) -> Response {
    let start_time = Instant::now();
    let result = process_scrape_request(&state, payload).await;
    let elapsed_ms = start_time.elapsed().as_millis() as u64;

    match result {
        Ok(summary) => {
            info!(elapsed_ms = elapsed_ms, lines = summary.len(), "Scrape request completed");
            response::success(summary).into_response()
        }
        Err(err) => {
            error!(elapsed_ms = elapsed_ms, status = err.status().as_u16(), error = %err, "Scrape request failed");
            err.into_response()
        }
    }
}

/// Extraction errors abort the request. Summarizer errors do not: they come
/// back as a line of the summary and the request still succeeds.
async fn process_scrape_request(
    state: &AppState,
    payload: std::result::Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Vec<String>> {
    let Json(req) = payload.map_err(|rejection| AppError::InvalidBody(rejection.body_text()))?;
    let url = req.target_url().ok_or(AppError::MissingUrl)?;

    info!(url = %url, "Processing scrape request");
    let text = state.extractor.extract(url).await?;

    let summary = state.summarizer.summarize(&text).await;
    Ok(summary)
}
