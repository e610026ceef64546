use std::sync::Arc;

use greet_http::config::Config;
use greet_http::server;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("starting server.");
    let listener = TcpListener::bind(config.listen.as_str()).await?;
    info!(
        addr = listener.local_addr()?.to_string(),
        name = %config.resource.name,
        id = %config.resource.id,
        "bound tcp server."
    );

    server::serve(listener, Arc::new(config.resource)).await;
    Ok(())
}
