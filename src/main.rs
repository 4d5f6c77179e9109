use sitoptenkit::{AppConfig, app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sitoptenkit=debug,tower_http=debug")),
        )
        .init();

    // SITOPTENKIT_* variables first, then `[addr] [data_dir]` arguments
    let config = AppConfig::load()?;

    app::run(config).await?;

    Ok(())
}
