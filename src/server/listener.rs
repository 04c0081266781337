use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::http::connection::Connection;
use crate::proxy::upstream::ProxyHandler;
use crate::server::router::Router;
use crate::version::VersionChecker;

/// Builds the router described by `cfg`.
pub fn build_router(cfg: &Config) -> anyhow::Result<Router> {
    let proxy = ProxyHandler::new(&cfg.proxy, &cfg.cors)?;
    let version = VersionChecker::new(cfg.version.clone())?;
    Ok(Router::new(proxy, version))
}

pub async fn bind(addr: &str) -> std::io::Result<TcpListener> {
    TcpListener::bind(addr).await
}

/// Accept loop: one task per connection, nothing shared but the router.
pub async fn serve(
    listener: TcpListener,
    router: Arc<Router>,
    max_request_bytes: usize,
) -> anyhow::Result<()> {
    let local: SocketAddr = listener.local_addr()?;
    info!("Listening on http://{}", local);

    loop {
        let (socket, peer) = listener.accept().await?;
        tracing::debug!("Accepted connection from {}", peer);

        let router = Arc::clone(&router);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, router, max_request_bytes);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
