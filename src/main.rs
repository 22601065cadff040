use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use gdp_predictor::artifacts::artifact_paths;
use gdp_predictor::config::LoggingConfig;
use gdp_predictor::handlers::{self, AppState};
use gdp_predictor::{AppConfig, ArtifactBundle};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;

    info!(
        feature_set = %config.prediction.feature_set,
        fallback_policy = %config.prediction.fallback_policy,
        "Starting Nigeria GDP predictor"
    );
    for path in artifact_paths(&config.models) {
        info!(path = %path.display(), "Expecting artifact");
    }

    let bundle = ArtifactBundle::load_or_degrade(&config.models, config.prediction.feature_set);
    let state = web::Data::new(AppState::new(
        bundle,
        config.prediction.feature_set,
        config.prediction.fallback_policy,
    ));

    let (host, port) = config.server.bind_addr();
    info!("Server running at http://{}:{}", host, port);

    let mut server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(handlers::json_config())
            .configure(handlers::configure)
    });
    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server
        .bind((host.as_str(), port))
        .with_context(|| format!("Failed to bind {}:{}", host, port))?
        .run()
        .await
        .context("Server error")
}
