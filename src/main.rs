use std::sync::Arc;

use ops_console::config::Config;
use ops_console::synch::mutex_swapper::MutexSwapper;
use ops_console::{app, db, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::from_env().expect("Failed to load configuration");
    // Compute before moving state anywhere
    let addr = format!("{}:{}", cfg.app_host, cfg.app_port);

    let pool = db::connect(&cfg.database_url)
        .await
        .expect("Failed to open database");
    let http = reqwest::Client::new();

    let state = AppState {
        cfg,
        db: pool,
        http,
        phone_locks: Arc::new(MutexSwapper::new()),
    };

    let listener = TcpListener::bind(&addr).await.unwrap();

    tracing::info!("Ops console listening on http://{addr}");
    axum::serve(listener, app(state)).await.unwrap();
}
