use employer_service::{
    build_router,
    config::EmployerConfig,
    services::{
        metrics::init_metrics,
        providers::{
            EmailProvider, MobileVerifier, MockEmailProvider, MockMobileVerifier,
            SmtpEmailProvider, TwilioVerifyProvider,
        },
        MongoDb, ServiceError, SystemClock,
    },
    AppState, Dependencies,
};
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = EmployerConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Metrics exporter unavailable");
    }

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting employer service"
    );

    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
        .await
        .map_err(ServiceError::from)?;
    db.initialize_indexes().await.map_err(ServiceError::from)?;
    tracing::info!("Database initialized successfully");

    let email: Arc<dyn EmailProvider> = if config.smtp.enabled {
        match SmtpEmailProvider::new(config.smtp.clone()) {
            Ok(provider) => {
                tracing::info!("SMTP email provider initialized");
                Arc::new(provider)
            }
            Err(e) => {
                tracing::warn!("Failed to initialize SMTP provider: {}. Using mock.", e);
                Arc::new(MockEmailProvider::new(true))
            }
        }
    } else {
        tracing::info!("SMTP provider disabled, using mock email provider");
        Arc::new(MockEmailProvider::new(true))
    };

    let mobile: Arc<dyn MobileVerifier> = if config.twilio.enabled {
        match TwilioVerifyProvider::new(config.twilio.clone()) {
            Ok(provider) => {
                tracing::info!("Twilio Verify provider initialized");
                Arc::new(provider)
            }
            Err(e) => {
                tracing::warn!("Failed to initialize Twilio provider: {}. Using mock.", e);
                Arc::new(MockMobileVerifier::new(true))
            }
        }
    } else {
        tracing::info!("Twilio provider disabled, using mock mobile verifier");
        Arc::new(MockMobileVerifier::new(true))
    };

    let db = Arc::new(db);
    let state = AppState::new(
        Dependencies {
            accounts: db.clone(),
            jobs: db,
            email,
            mobile,
            clock: Arc::new(SystemClock),
        },
        &config.jwt,
        &config.security,
        &config.rate_limit,
    );
    let app = build_router(state);

    let addr = config.common.socket_addr();

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
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
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
