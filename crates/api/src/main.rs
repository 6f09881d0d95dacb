use anyhow::Context;

use docgate_api::{app, config::GatewayConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docgate_observability::init();

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    let bind_addr = config.bind_addr;

    let state = app::services::build_services(config).context("failed to build services")?;
    let router = app::build_app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}
