pub mod api;
pub mod config;
pub mod error;
pub mod extractor;
pub mod llm;

use crate::config::Config;
use crate::error::Result;
use crate::extractor::PageExtractor;
use crate::llm::GeminiClient;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub extractor: PageExtractor,
    pub summarizer: GeminiClient,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let extractor = PageExtractor::new()?;
        let summarizer = GeminiClient::from_config(config)?;

        Ok(Self {
            extractor,
            summarizer,
        })
    }
}

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// `info` level. Calling it again once a subscriber is set does nothing.
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
