pub mod assets;
pub mod cli;
pub mod config;
pub mod error;
pub mod fairings;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use rocket::Config;
use rocket_cors::{AllowedOrigins, CorsOptions};
use std::net::IpAddr;

pub use config::{AppConfig, ReportConfig, RuntimeConfig};
pub use error::ReportError;
pub use fairings::RequestLogger;
pub use models::{Dependencies, ReportArtifact, ReportOptions, ReportStats};
pub use state::AppState;

pub fn create_rocket(config: AppConfig) -> Result<rocket::Rocket<rocket::Build>, ReportError> {
    let address: IpAddr = config
        .host
        .parse()
        .map_err(|e| ReportError::Config(format!("Invalid host address '{}': {e}", config.host)))?;

    // Configure Rocket with custom host and port
    let rocket_config = Config {
        port: config.port,
        address,
        ..Config::default()
    };

    // Only configured origins may call in from a browser.
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(&config.allowed_origins))
        .to_cors()
        .map_err(|e| ReportError::Config(format!("Failed to create CORS configuration: {e}")))?;

    let state = AppState::new(config, reqwest::Client::new());

    Ok(rocket::custom(&rocket_config)
        .manage(state)
        .attach(cors)
        .attach(RequestLogger)
        .mount("/", routes::get_routes()))
}

/// Builds a report from already scanned dependencies, with settings read from the environment.
pub async fn report(
    dependencies: &Dependencies,
    config: &ReportConfig,
    options: &ReportOptions,
) -> Result<ReportArtifact, ReportError> {
    AppState::new(AppConfig::from_env(), reqwest::Client::new())
        .reports
        .report(dependencies, config, options)
        .await
}
