use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use triage_agents::OpenRouterCompletionModel;
use triage_service::{ServiceConfig, create_app, telemetry::init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let model = Arc::new(OpenRouterCompletionModel::new(
        &config.openrouter_api_key,
        config.model.clone(),
    ));

    let app = create_app(model);
    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    let addr = listener.local_addr()?;

    info!("Chat triage service starting on {}", addr);
    info!("Router endpoint: POST http://{}/agents/router", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
