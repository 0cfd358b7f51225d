use std::sync::Arc;

use attune_core::config::Config;
use tracing::info;

mod stdio_platform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attune_runtime=info".into()),
        )
        .init();

    let config_path = std::env::var("ATTUNE_CONFIG").ok();
    let config = Config::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("config load failed ({}), using defaults", e);
        Config::default()
    });

    let events = Box::new(stdio_platform::StdioEvents::new());
    let actions = Arc::new(stdio_platform::StdioActions);

    let handle = attune_runtime::start(config, events, actions).await?;
    info!("attune is running, type a message and press enter (ctrl-c to stop)");

    tokio::signal::ctrl_c().await?;
    attune_runtime::shutdown(handle).await;

    Ok(())
}
