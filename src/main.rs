use futures::StreamExt;
use ringside::application::CoordinatorBuilder;
use ringside::config::Config;
use ringside::infrastructure::metrics::init_metrics;
use ringside::infrastructure::telephony::LoopbackTelephony;
use ringside::interface::{Console, TracingObserver};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    // Initialize tracing; logs go to stderr so stdout stays JSON
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Ringside call coordinator");
    info!("Configuration loaded: {:?}", config);

    if config.metrics.enabled {
        init_metrics(&config.metrics.listen)?;
    }

    let builder = CoordinatorBuilder::new(config.clone());
    let provider = Arc::new(LoopbackTelephony::new(
        config.provider.clone(),
        builder.provider_sink(),
    ));
    let coordinator = builder.spawn(provider.clone());

    let observer = Arc::new(TracingObserver::new());
    coordinator.add_observer(&observer);

    let mut tokens = coordinator.subscribe_device_token();
    tokio::spawn(async move {
        while let Some(token) = tokens.next().await {
            match token {
                Some(token) => info!("Device token: {}", token),
                None => info!("No device token"),
            }
        }
    });

    let console = Console::new(coordinator.clone(), provider);
    console
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!("Input closed, shutting down");
    coordinator.shutdown().await;
    Ok(())
}
