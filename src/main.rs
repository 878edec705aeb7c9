//! Neutron game server binary.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use neutron_games::{
    AiProxy, AppState, Cli, Command, Config, EngineMode, GameStore, MemoryStore, MinimaxEngine,
    RoomRegistry, TurnEngine, router,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level().clone())),
        )
        .init();

    match cli.command {
        Command::Serve { port, host } => serve(config, host, port).await,
    }
}

/// Wires the store, engines, and router, then serves until shutdown.
async fn serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.host().clone());
    let port = port.unwrap_or(*config.port());

    let store = Arc::new(MemoryStore::new(*config.game_ttl()));

    let mut proxy = AiProxy::new();
    proxy.register(EngineMode::Search, Arc::new(MinimaxEngine));
    // The learned-policy backend ships separately; until one registers
    // here, difficulties 11-13 are rejected as unavailable.
    info!(
        model = %config.rl_model_path().display(),
        "learned-policy engine not loaded"
    );

    let app = AppState {
        store: store.clone() as Arc<dyn GameStore>,
        engine: Arc::new(TurnEngine::new(proxy)),
        rooms: RoomRegistry::new(),
    };

    // Periodic expiry sweep alongside the lazy on-access expiry.
    let sweeper = store.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            sweeper.sweep();
        }
    });

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!(%host, port, "listening");

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");

    // If draining open connections hangs, exit hard after the grace period.
    tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        tracing::error!("shutdown grace period exceeded, forcing exit");
        std::process::exit(1);
    });
}
