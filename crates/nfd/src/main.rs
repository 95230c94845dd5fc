use std::{env, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;

use nfd_core::{
    clock::SystemClock,
    config::{self, Config},
    router::MessageRouter,
    store::{JsonFileStore, ModerationStore},
};
use nfd_remote::HttpDocumentSource;
use nfd_telegram::TelegramMessenger;
use nfd_webhook::GatewayState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    nfd_core::logging::init("nfd")?;

    let cfg = match Config::load() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => return serve_unconfigured(e).await,
    };
    tracing::info!(
        admin = %cfg.admin_chat_id,
        listen = %cfg.listen_addr,
        webhook_path = %cfg.webhook_path,
        store = %cfg.store_path.display(),
        "starting relay"
    );

    let store = JsonFileStore::open(&cfg.store_path)
        .await
        .with_context(|| format!("opening store {}", cfg.store_path.display()))?;
    let telegram = Arc::new(TelegramMessenger::from_token(cfg.bot_token.clone()));
    let documents = Arc::new(HttpDocumentSource::new(cfg.documents.clone())?);

    let router = Arc::new(MessageRouter::new(
        cfg.clone(),
        ModerationStore::new(Arc::new(store)),
        telegram.clone(),
        documents,
        Arc::new(SystemClock),
    ));
    let state = GatewayState::new(cfg.clone(), router, telegram);
    let tasks = state.tasks.clone();

    let listener = TcpListener::bind(cfg.listen_addr)
        .await
        .with_context(|| format!("binding {}", cfg.listen_addr))?;
    axum::serve(listener, nfd_webhook::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight updates finish before exiting.
    tasks.close();
    tracing::info!(pending = tasks.len(), "waiting for background updates");
    tasks.wait().await;
    Ok(())
}

/// Keep answering HTTP so every caller sees what is missing.
async fn serve_unconfigured(err: nfd_core::Error) -> anyhow::Result<()> {
    tracing::error!(error = %err, "relay is not configured");
    let addr = config::listen_addr(|key| env::var(key).ok())?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, nfd_webhook::unconfigured_app(err.to_string()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
