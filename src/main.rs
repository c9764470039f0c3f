use anyhow::Context;
use commit_dashboard::application::use_cases::fetch_commits::FetchCommitsInteractor;
use commit_dashboard::config::AppConfig;
use commit_dashboard::infrastructures::adapters::primary::web::{AppState, create_router};
use commit_dashboard::infrastructures::adapters::secondary::external_apis::github::GitHubApiAdapter;
use commit_dashboard::infrastructures::adapters::secondary::storage::file_credential_store::FileCredentialStore;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::Arc;
use tracing::{info, info_span};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize tracing
    let provider = match &config.otlp_endpoint {
        Some(endpoint) => {
            let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint.clone())
                .build()
                .context("Failed to create OTLP exporter")?;
            Some(
                SdkTracerProvider::builder()
                    .with_batch_exporter(otlp_exporter)
                    .build(),
            )
        }
        None => None,
    };
    let telemetry = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer("commit-dashboard")));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(telemetry)
        .with(fmt_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    {
        let initialize_span = info_span!("initialize");
        let _enter = initialize_span.enter();
        info!("Application starting");
        info!(
            base_url = %config.github_api_base_url,
            credentials_path = %config.credentials_path.display(),
            otlp = config.otlp_endpoint.is_some(),
            "Loaded configuration"
        );
    }

    // Build dependencies
    let github_api_adapter = Arc::new(GitHubApiAdapter::new(config.github_api_base_url.clone()));
    let credential_store = Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
    let fetch_use_case = Arc::new(FetchCommitsInteractor::new(
        github_api_adapter,
        credential_store,
    ));
    let app_state = Arc::new(AppState::new(fetch_use_case));

    // Create router
    let app = create_router(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Listening on http://{}", config.listen_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Application stopped");
    if let Some(provider) = provider {
        provider
            .shutdown()
            .context("Failed to flush spans on shutdown")?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
