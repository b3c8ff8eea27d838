use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lead_intake_api::config::Config;
use lead_intake_api::errors::ResultExt;
use lead_intake_api::handlers::{self, AppState};
use lead_intake_api::metrics::LeadMetrics;
use lead_intake_api::notifier::EmailClient;
use lead_intake_api::pipeline::LeadPipeline;
use lead_intake_api::record_store::CrmClient;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, builds the email and CRM
/// clients and the shared metrics aggregator, then serves the lead routes.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_intake_api=debug,lead_pipeline=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let email_client = EmailClient::new(
        config.email_api_url.clone(),
        config.email_api_key.clone(),
        config.email_from.clone(),
        config.email_to.clone(),
    )
    .context("initializing email client")?;
    tracing::info!("✓ Email client initialized: {}", config.email_api_url);

    let crm_client = CrmClient::new(config.crm_base_url.clone(), config.crm_token.clone())
        .context("initializing CRM client")?;
    tracing::info!("✓ CRM client initialized: {}", config.crm_base_url);

    let metrics = Arc::new(LeadMetrics::new());
    let pipeline = LeadPipeline::new(
        Arc::new(email_client),
        Arc::new(crm_client),
        metrics,
        config.pipeline_options(),
    );

    let app_state = Arc::new(AppState { pipeline });

    // Configure rate limiter: 5 requests/second per IP, burst of 10
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(5)
            .burst_size(10)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?,
    );

    let lead_routes = Router::new()
        .route("/api/v1/leads", post(handlers::submit_lead))
        .layer(
            ServiceBuilder::new()
                // Form submissions are small; 64KB is plenty
                .layer(RequestBodyLimitLayer::new(64 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/metrics", get(handlers::metrics_snapshot))
        .merge(lead_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
