use tokio::net::TcpListener;
use tracing::{info, warn};
use page_summarizer::{
    config::Config,
    api::routes::create_router,
    setup_logging,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let config = Config::load()?;
    let server_addr = config.server_addr;
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set, summaries will report the missing key");
    }
    info!(model = %config.gemini_model, "Starting server on {}", server_addr);

    let app_state = AppState::new(&config)?;
    let app = create_router(app_state);

    let listener = TcpListener::bind(server_addr).await?;

    info!("Listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
