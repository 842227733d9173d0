use axum::Router;
use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::auth::Argon2Hasher;
use crate::config::ServerConfig;
use crate::enrollment::EnrollmentService;
use crate::error::ServerError;
use crate::server::router::build_router;
use crate::storage::FileCredentialStore;

pub struct Server {
    listener: TcpListener,
    router: Router,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Opens the credential store, builds the service, and binds the listener.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let (store, report) = FileCredentialStore::open(config.store_path())?;
        if report.skipped > 0 || report.duplicates > 0 {
            warn!(
                "Credential store {} has {} malformed and {} duplicate records; they were ignored",
                config.store_path,
                report.skipped,
                report.duplicates
            );
        }

        let hasher = Argon2Hasher::new(config.hash_params())?;
        let service = Arc::new(EnrollmentService::new(
            Arc::new(store),
            Arc::new(hasher),
            config.input_limits(),
            config.max_concurrent_hashes,
        ));

        let socket = config.socket_addr();
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(ServerError::Io(e));
            }
        };
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router: build_router(service),
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until Ctrl-C or SIGTERM.
    pub async fn start(self) -> Result<(), ServerError> {
        self.start_with_shutdown(shutdown_signal()).await
    }

    /// Serves until `signal` resolves, then drains in-flight requests.
    pub async fn start_with_shutdown<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            "Starting enrollment server on {} (store {}, cost factor {})",
            self.listener.local_addr()?,
            self.config.store_path,
            self.config.cost_factor
        );

        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
