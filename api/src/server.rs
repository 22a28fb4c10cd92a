use crate::{create_router, AppState};
use tokio::task::JoinHandle;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind, e.g. 0.0.0.0
    pub bind: String,
    /// Port to listen on
    pub port: u16,
    /// Route prefix the API is mounted under
    pub prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3030,
            prefix: "api/articlai".to_string(),
        }
    }
}

/// Start the API server and serve until shutdown
pub async fn start_server(
    state: AppState,
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state, &config.prefix);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);
    info!(
        "Swagger UI available at http://localhost:{}/swagger",
        config.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Start the API server in a background task
pub fn spawn_server(state: AppState, config: ServerConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = start_server(state, config).await {
            tracing::error!("API server error: {}", e);
        }
    })
}
