use anyhow::Context;
use drugclass_tools::server::{serve, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may be set another way.
    dotenvy::dotenv().ok();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = ServerConfig::from_env().context("invalid print-server configuration")?;
    log::info!(
        "Using browser {} with dumps in {}",
        config.chromium_path.display(),
        config.dump_dir.display()
    );
    serve(AppState::chromium(config))
        .await
        .context("print-server stopped")?;
    Ok(())
}
