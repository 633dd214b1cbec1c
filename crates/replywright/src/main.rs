use common::catalog::Catalog;
use common::configuration::Configuration;
use common::consts::{BIND_ADDRESS_ENV, CONFIG_PATH_ENV, DEFAULT_BIND_ADDRESS, DEFAULT_CONFIG_PATH};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use replywright::drafting::DraftService;
use replywright::handlers::{handle_request, AppState};
use replywright::refiner::Refiner;
use replywright::state::SessionStore;
use replywright::utils::tracing::init_logger;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bind_address =
        env::var(BIND_ADDRESS_ENV).unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());

    // config is read before the logger so its level can apply
    let config_path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    eprintln!("loading replywright config from {}", config_path);
    let config = Configuration::load(&config_path)?;

    init_logger(config.logging.as_ref().and_then(|l| l.level.as_deref()));
    info!(path = %config_path, version = %config.version, "loaded configuration");

    let catalog = Catalog::load(&config.catalog.pain_points, &config.catalog.god_mode_prompts)?;
    info!(
        pain_points = catalog.pain_points.len(),
        god_mode_prompts = catalog.god_mode_prompts.len(),
        "loaded catalogs"
    );

    let refiner = Refiner::from_config(config.refiner.as_ref());
    let drafts = DraftService::new(Arc::new(catalog), config.matching.clone(), refiner);
    let sessions = SessionStore::from_config(config.sessions.as_ref());
    let state = Arc::new(AppState::new(drafts, sessions.clone()));

    // interval panics on a zero period
    let sweep_every = sessions
        .idle_timeout()
        .clamp(Duration::from_secs(1), Duration::from_secs(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            sessions.sweep_idle().await;
        }
    });

    let listener = TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "listening");

    loop {
        let (stream, _) = listener.accept().await?;
        let peer_addr = stream.peer_addr()?;
        let io = TokioIo::new(stream);

        let state = Arc::clone(&state);
        let service = service_fn(move |req| handle_request(req, Arc::clone(&state)));

        tokio::task::spawn(async move {
            debug!(peer = ?peer_addr, "accepted connection");
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                warn!(error = ?err, "error serving connection");
            }
        });
    }
}
