use formpilot_config::Config;
use formpilot_http::{AppState, build_router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ServeInput {
    /// Overrides `server.bind`.
    pub bind: Option<String>,
}

/// Strategy for running the HTTP API until interrupted.
#[derive(Debug, Clone, Copy)]
pub struct ServeStrategy;

impl super::CommandStrategy for ServeStrategy {
    type Input = ServeInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load_or_default()?;
        let service = Arc::new(super::build_service(&config, false));

        tokio::fs::create_dir_all(config.server.forms_dir()).await?;

        let router = build_router(
            AppState::new(service),
            &config.server.static_dir,
            &config.server.allowed_origins,
        );

        let bind = input.bind.unwrap_or_else(|| config.server.bind.clone());
        let listener = TcpListener::bind(&bind).await?;
        info!("formpilot listening on {}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutting down");
            })
            .await?;
        Ok(())
    }
}
