// QRIS reconciler - settles pending shop orders against the payment
// gateway's mutation feed on a fixed polling cadence.

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use reconciler::config::Config;
use reconciler::cycle::ReconciliationCycle;
use reconciler::integration::qris::QrisFeedClient;
use reconciler::integration::telegram::TelegramMessenger;
use reconciler::inventory::SqliteInventory;
use reconciler::metrics;
use reconciler::store::SqliteRecordStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🏦 QRIS reconciler starting...");

    let config = Config::from_env().map_err(fatal)?;

    let store = SqliteRecordStore::connect(&config.database_url)
        .await
        .map_err(fatal)?;
    let inventory = SqliteInventory::prepare(store.pool().clone())
        .await
        .map_err(fatal)?;
    let feed = QrisFeedClient::new(
        &config.qris_api_url,
        &config.qris_api_key,
        &config.qris_merchant_key,
    );
    let messenger = TelegramMessenger::new(&config.bot_token);

    let cycle = Arc::new(ReconciliationCycle::new(
        Arc::new(store),
        Arc::new(feed),
        Arc::new(messenger),
        Arc::new(inventory),
        &config,
    ));

    let poll_interval = Duration::from_secs(config.poll_interval_secs);
    tokio::spawn(cycle.run_forever(poll_interval));
    info!(
        "✅ reconciliation loop started (every {}s, expiry {}m, match window {}m)",
        config.poll_interval_secs, config.expiry_minutes, config.match_window_minutes
    );

    let server_port = config.server_port;
    info!("🚀 starting HTTP server on port {}", server_port);

    HttpServer::new(|| {
        App::new()
            .route("/health", web::get().to(health_check))
            .route("/metrics", web::get().to(serve_metrics))
    })
    .bind(("0.0.0.0", server_port))?
    .run()
    .await
}

fn fatal(e: impl std::fmt::Display) -> std::io::Error {
    error!("initialization failed: {}", e);
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "reconciler",
        "version": "0.1.0"
    }))
}

async fn serve_metrics() -> impl Responder {
    match metrics::metrics_handler() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            error!("failed to encode metrics: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
