//! Server application implementation

use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;
use warp::Filter;

use crate::config::ScannerConfig;
use crate::discovery::ShellyEngine;

/// Server application main struct
pub struct ServerApp {
    config: ScannerConfig,
    state: Arc<ServerState>,
}

/// Shared state handed to every route
///
/// Built once at startup. Nothing in here changes while serving, so handlers
/// share it through an `Arc` without locking.
#[derive(Clone)]
pub struct ServerState {
    pub config: ScannerConfig,
    pub engine: ShellyEngine,
}

impl ServerState {
    pub fn new(config: ScannerConfig) -> crate::errors::Result<Self> {
        let engine = ShellyEngine::new(&config)?;
        Ok(Self { config, engine })
    }
}

impl ServerApp {
    pub fn new(config: ScannerConfig) -> Result<Self> {
        config.validate()?;
        let state = Arc::new(ServerState::new(config.clone())?);
        Ok(Self { config, state })
    }

    pub fn get_state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Routes with request logging and CORS applied
    pub fn routes(
        state: Arc<ServerState>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let cors = warp::cors()
            .allow_any_origin()
            .allow_headers(vec!["content-type", "authorization"])
            .allow_methods(vec!["GET", "POST", "OPTIONS"]);

        let logging = crate::server::middleware::logging::with_request_logging();

        crate::server::routes::create_routes(state)
            .with(logging)
            .with(cors)
    }

    fn log_banner(&self) {
        info!("🚀 Shelly Scanner v{}", crate::VERSION);
        info!(
            "🌍 Listening on {}:{}",
            self.config.bind_address, self.config.port
        );
        info!(
            "🔑 Admin password configured: {}",
            if self.config.credential().is_some() {
                "yes"
            } else {
                "no"
            }
        );
        info!(
            "📡 Network range: {}",
            self.config
                .network_override()
                .unwrap_or("Auto-detect (/24)")
        );
    }

    pub async fn run(self) -> Result<()> {
        self.log_banner();

        let bind_addr: std::net::SocketAddr =
            format!("{}:{}", self.config.bind_address, self.config.port)
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

        let routes = Self::routes(self.get_state());

        let (addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(bind_addr, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
                    return;
                }
                info!("ℹ️ Received shutdown signal (Ctrl+C)...");
            })
            .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", bind_addr, e))?;

        info!("🌍 Server listening on http://{}", addr);
        info!("📄 API endpoints:");
        info!("   GET    /api/scan          - Scan the subnet for Shelly devices");
        info!("   GET    /api/device/{{ip}}   - Probe a single address");
        info!("   POST   /api/update/{{ip}}   - Start a firmware update");
        info!("   POST   /api/auth/{{ip}}     - Enable or disable device login");
        info!("   GET    /health            - Health check");

        server.await;

        info!("🛑 Server shut down gracefully");
        Ok(())
    }
}
