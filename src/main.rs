use salvo::{listener::TcpListener, Server};
use tracing_subscriber::EnvFilter;

use qa_forum::{
    config::env_var,
    infra::{bootstrap, router},
};

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        return;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let env = env_var::get();
    let ctx = match bootstrap::context(env).await {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::error!("FATAL: {err}");
            std::process::exit(1);
        }
    };

    let address = format!("0.0.0.0:{}", env.port);
    tracing::info!(%address, storage = ?env.storage, broker = ?env.broker, "starting qa forum api");
    let listener = TcpListener::bind(&address);
    Server::new(listener)
        .serve_with_graceful_shutdown(router::app(ctx), shutdown_signal())
        .await;
}
