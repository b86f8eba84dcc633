//! Serve command implementation
//!
//! Runs the HTTP API until a shutdown signal arrives.

use crate::adapters::database::create_stores;
use crate::api::{router, AppState};
use crate::config::load_config;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override server.host
    #[arg(long)]
    pub host: Option<String>,

    /// Override server.port
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        config_path: &str,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(1); // Configuration error exit code
            }
        };

        if let Some(host) = &self.host {
            tracing::info!(host = %host, "Overriding server host from CLI");
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            tracing::info!(port, "Overriding server port from CLI");
            config.server.port = port;
        }

        let (store, notes) = match create_stores(&config).await {
            Ok(stores) => stores,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create stores");
                eprintln!("Failed to initialize storage: {e}");
                return Ok(5);
            }
        };
        if let Err(e) = store.test_connection().await {
            tracing::error!(error = %e, "Storage backend is unreachable");
            eprintln!("Storage backend is unreachable: {e}");
            return Ok(5);
        }

        let address = config.server.bind_address();
        let app = router(AppState::new(&config, store, notes), &config.server);
        let listener = tokio::net::TcpListener::bind(&address).await?;

        tracing::info!(
            address = %address,
            backend = ?config.storage_backend,
            environment = ?config.environment,
            "Clinic API listening"
        );
        println!("Clinic API listening on http://{address}");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_signal.wait_for(|stop| *stop).await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("Server stopped");
        Ok(0)
    }
}
