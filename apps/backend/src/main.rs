use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use findmines::config::ServerConfig;
use findmines::middleware::cors::cors_middleware;
use findmines::routes;
use findmines::state::app_state::AppState;
use findmines::timer::IntervalTimerFactory;
use tracing::info;

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: Set via docker-compose env_file or docker run --env-file
    // - Local dev: Source env files manually (e.g., set -a; . ./.env; set +a)
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    let host = config.host.clone();
    let port = config.port;
    info!(
        host = %host,
        port,
        tick_ms = config.tick_interval.as_millis() as u64,
        "Starting findmines server"
    );

    let timers = Arc::new(IntervalTimerFactory::new(config.tick_interval));
    let data = web::Data::new(AppState::new(config, timers));

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(Logger::default())
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
