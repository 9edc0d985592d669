mod cors;
mod health;

use std::net::SocketAddr;

use axum::Router;
use mirage_config::Config;
use tower_http::trace::TraceLayer;

pub use cors::cors_layer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a subsystem fails to initialize, e.g. the scenario
    /// table does not load or the storage bucket cannot be configured
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

        let faceswap_state = faceswap::build_server(config)?;
        let relay_state = relay::build_server(config)?;
        let voice_state = voice::build_server(config)?;

        let mut app = Router::new();

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        app = app
            .merge(faceswap::endpoint_router().with_state(faceswap_state))
            .merge(relay::endpoint_router().with_state(relay_state))
            .merge(voice::endpoint_router().with_state(voice_state));

        app = app.layer(TraceLayer::new_for_http());

        // Outermost so preflight requests never reach the handlers
        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests until the token is cancelled
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "mirage listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
