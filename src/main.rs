use anyhow::Result;
use eurlex_panel::{config::Config, fetch::HttpSource, pipeline};
use reqwest::Client;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();
    info!("startup");

    // ─── 2) config ───────────────────────────────────────────────────
    let cfg = Config::load()?;
    info!(
        first_year = cfg.first_year,
        last_year = cfg.last_year,
        cache_dir = %cfg.cache_dir.display(),
        "configured"
    );

    // ─── 3) run ──────────────────────────────────────────────────────
    let summary = pipeline::run(&cfg, HttpSource::new(Client::new())).await?;
    info!(?summary, "all done");
    Ok(())
}
