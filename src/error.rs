use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing URL")]
    MissingUrl,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    Fetch(String),

    #[error("Missing Gemini API key in .env file.")]
    MissingApiKey,

    #[error("Rate limit exceeded after {attempts} {}", attempt_noun(.attempts))]
    RateLimited { attempts: u32 },

    #[error("{0}")]
    Summarize(String),

    #[error("Failed to generate summary.")]
    MalformedSummary,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
}

fn attempt_noun(attempts: &u32) -> &'static str {
    if *attempts == 1 { "attempt" } else { "attempts" }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingUrl | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to callers. Pipeline failures carry the `Error:` prefix,
    /// request validation failures do not.
    pub fn user_message(&self) -> String {
        match self {
            AppError::MissingUrl | AppError::InvalidBody(_) => self.to_string(),
            _ => format!("Error: {}", self),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.user_message(),
        });

        (self.status(), body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Fetch(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
