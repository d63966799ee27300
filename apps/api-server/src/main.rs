//! # RyseTor API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

#[cfg(feature = "scheduler")]
mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::error::AppError;
use state::AppState;
use telemetry::LogFormat;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_logging(LogFormat::from_env());

    let config = AppConfig::from_env()?;

    tracing::info!(
        "Starting RyseTor API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::build(&config).await?;

    #[cfg(feature = "scheduler")]
    let maintenance = background::Maintenance::start(&state, &config.follow_up).await?;

    let app_state = state.clone();
    HttpServer::new(move || {
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            AppError::BadRequest(err.to_string()).into()
        });

        App::new()
            .wrap(from_fn(observability::correlate))
            .wrap(TracingLogger::default())
            .app_data(json_config)
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(app_state.tokens.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    #[cfg(feature = "scheduler")]
    if let Some(maintenance) = maintenance {
        maintenance.stop().await?;
    }

    let stats = state.dispatcher.stats();
    tracing::info!(
        delivered = stats.delivered,
        failed = stats.failed,
        pending = stats.pending,
        "Server stopped"
    );

    Ok(())
}
