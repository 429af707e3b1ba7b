//! Volunteer hub server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{Router, middleware, routing::get};
use hub_api::{AppState, auth_middleware, healthz, router as api_router};
use hub_common::{Config, config::LoggingConfig};
use hub_core::{
    ApplicationService, AttendanceService, CertificateService, EligibilityGate, EscalationPolicy,
    ModerationService, PenaltyService, PostService, UserService,
};
use hub_db::repositories::{
    ApplicationRepository, CertificateRepository, PenaltyRepository, PostRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "volunteer_hub=debug,hub_core=debug,hub_api=debug,tower_http=debug".into());

    if logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    info!("Starting volunteer-hub server...");

    let db = Arc::new(hub_db::init(&config.database).await?);
    info!("Connected to database");

    hub_db::migrate(&db).await?;
    info!("Migrations complete");

    // Repositories
    let user_repo = Arc::new(UserRepository::new(Arc::clone(&db)));
    let post_repo = Arc::new(PostRepository::new(Arc::clone(&db)));
    let application_repo = Arc::new(ApplicationRepository::new(Arc::clone(&db)));
    let penalty_repo = Arc::new(PenaltyRepository::new(Arc::clone(&db)));
    let certificate_repo = Arc::new(CertificateRepository::new(Arc::clone(&db)));

    // Services
    let policy = EscalationPolicy::from(&config.engine);
    info!(?policy, "Escalation policy loaded");

    let gate = EligibilityGate::new(penalty_repo.clone());
    let penalty_service = PenaltyService::new(penalty_repo, user_repo.clone(), policy);
    let attendance_service = AttendanceService::new(
        application_repo.clone(),
        post_repo.clone(),
        penalty_service.clone(),
    );
    let application_service =
        ApplicationService::new(application_repo.clone(), post_repo.clone(), gate.clone());
    let certificate_service = CertificateService::new(
        certificate_repo,
        application_repo.clone(),
        post_repo.clone(),
        gate,
    );
    let post_service = PostService::new(post_repo.clone());
    let moderation_service = ModerationService::new(post_repo, user_repo.clone(), application_repo);
    let user_service = UserService::new(user_repo.clone());

    let state = AppState {
        user_store: user_repo,
        application_service,
        attendance_service,
        penalty_service,
        certificate_service,
        post_service,
        moderation_service,
        user_service,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
