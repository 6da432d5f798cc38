use service_core::error::AppError;
use service_core::observability::{init_metrics, init_tracing};
use std::net::SocketAddr;
use std::sync::Arc;
use tenant_auth::{
    build_router,
    config::{AuthConfig, StoreBackend},
    db,
    services::{
        CredentialStore, Database, DisabledEmailService, EmailProvider, EmailService,
        InMemoryStore,
    },
    AppState,
};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);
    let metrics = init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting tenant access-control service"
    );

    let store: Arc<dyn CredentialStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config.database)
                .await
                .map_err(|e| AppError::DatabaseError(e.into()))?;
            db::run_migrations(&pool)
                .await
                .map_err(|e| AppError::DatabaseError(e.into()))?;
            Arc::new(Database::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory credential store; data is lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };

    let mailer: Arc<dyn EmailProvider> = match &config.mail.smtp {
        Some(smtp) => Arc::new(EmailService::new(smtp, &config.mail.from)?),
        None => {
            tracing::warn!("SMTP not configured, login codes will not be delivered");
            Arc::new(DisabledEmailService)
        }
    };

    let state = AppState::new(config.clone(), store, mailer, Some(metrics));

    if config.preload_sessions {
        state.auth_service.preload_sessions().await?;
    }

    let app = build_router(state);

    let addr = config.common.socket_addr();
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
