use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

impl ScrapeRequest {
    /// The trimmed URL, or `None` when it is absent or blank.
    pub fn target_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }
}

#[derive(Serialize)]
pub struct ScrapeResponse {
    pub summary: Vec<String>,
}
