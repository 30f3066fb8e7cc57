use notes_api::{
    app::{self, AppState},
    config,
    db::Database,
    error::ErrorTranslator,
    repository::PgNoteRepository,
    service::NoteService,
};

use tracing_subscriber::EnvFilter;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {e}");
        panic!("failed to load config: {e}");
    });
    tracing::info!("Loaded config, environment: {:?}", cfg.environment);

    // Pool creation and migration
    let db = Database::connect(&cfg.database_url, cfg.pool_max_size).unwrap_or_else(|e| {
        tracing::error!("Failed to create database pool: {e}");
        panic!("failed to create database pool: {e}");
    });

    db.migrate().await.unwrap_or_else(|e| {
        tracing::error!("Failed to migrate database: {e}");
        panic!("failed to migrate database: {e}");
    });

    // Service creation
    let repo = Arc::new(PgNoteRepository::new(db.clone()));
    let service = NoteService::new(repo);
    let errors = ErrorTranslator::new(cfg.environment.exposes_error_details());
    let state = Arc::new(AppState::new(service, errors));

    // Router config
    let router = app::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.port))
        .await
        .expect("failed to bind listener");
    let addr = listener.local_addr().expect("listener has no local address");

    tracing::info!("Notes server starting, listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("failed to start server");

    db.close();
    tracing::info!("Notes server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
