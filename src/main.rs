use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dspd_predict::{config::Config, configure, AppState};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dspd_predict=info,actix_web=info".into()),
        )
        .init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let addr = (config.host.clone(), config.port);

    match &config.ml_api_url {
        Some(url) => tracing::info!(ml_api_url = %url, "external ML service configured"),
        None => tracing::info!("ML_API_URL not set, serving mock predictions"),
    }
    if config.local_fallback {
        tracing::info!(local_url = %config.local_url, "local ML service fallback enabled");
    }

    let state = web::Data::new(AppState::new(config).map_err(io::Error::other)?);

    tracing::info!("Server running at http://{}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(configure)
    })
    .bind(addr)?
    .run()
    .await
}
