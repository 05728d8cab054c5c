//! Backend for the DSPD sequence-analysis demo.
//!
//! `POST /api/predict` takes a multipart upload and walks a chain of
//! inference backends (external service, optional local service) before
//! falling back to a mock prediction, so every valid upload gets a result.

pub mod config;
pub mod error;
pub mod handlers;
pub mod intake;
pub mod mock;
pub mod models;
pub mod normalize;
pub mod resolver;
pub mod sequence;

use actix_web::web;

use crate::config::Config;
use crate::resolver::ResolutionChain;

/// Shared, read-only state handed to every handler.
pub struct AppState {
    pub config: Config,
    pub chain: ResolutionChain,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dspd-predict/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let chain = ResolutionChain::from_config(&config, client);
        Ok(Self { config, chain })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/predict")
            .route(web::post().to(handlers::predict))
            .route(web::get().to(handlers::status)),
    )
    .route("/health", web::get().to(handlers::health));
}
