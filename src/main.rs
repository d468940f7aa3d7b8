use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use newslens::logging::{init_logging, LoggingConfig};
use newslens::services::llm_service::{LlmConfig, LlmService};
use newslens::services::news_service::{NewsConfig, NewsService};
use newslens::services::summary_service::SummaryService;
use newslens::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    let logging_config = LoggingConfig::from_env().context("invalid LOKI_URL")?;
    init_logging(logging_config)
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize logging")?;

    let news_config = NewsConfig::from_env();
    let llm_config = LlmConfig::from_env();
    tracing::info!(?news_config, ?llm_config, "Loaded configuration");

    let llm_service = Arc::new(LlmService::new(llm_config));
    let state = AppState {
        news_service: Arc::new(NewsService::new(news_config)),
        summary_service: Arc::new(SummaryService::new(llm_service)),
    };
    let app = create_app(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid HOST/PORT: {}:{}", host, port))?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("newslens running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
