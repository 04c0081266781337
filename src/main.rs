use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cors_proxy::config::Config;
use cors_proxy::server::listener;
use cors_proxy::server::router::{PROXY_PREFIX, VERSION_CHECK_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load().context("Failed to load configuration")?;

    let listener = match listener::bind(&cfg.server.listen_addr).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            tracing::error!(
                addr = %cfg.server.listen_addr,
                "Address already in use; stop the other process or set LISTEN to another port"
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to bind {}", cfg.server.listen_addr));
        }
    };

    let router = Arc::new(listener::build_router(&cfg)?);
    tracing::info!(
        proxy = %format!("{}?url=<target>[&insecure=true]", PROXY_PREFIX),
        version_check = VERSION_CHECK_PATH,
        "Routes ready"
    );

    tokio::select! {
        res = listener::serve(listener, router, cfg.server.max_request_bytes) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
