//! Method and path routing for inbound requests

use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::proxy::upstream::ProxyHandler;
use crate::version::VersionChecker;

pub const PROXY_PREFIX: &str = "/proxy";
pub const VERSION_CHECK_PATH: &str = "/version-check";

pub struct Router {
    proxy: ProxyHandler,
    version: VersionChecker,
}

impl Router {
    pub fn new(proxy: ProxyHandler, version: VersionChecker) -> Self {
        Self { proxy, version }
    }

    pub async fn dispatch(&self, request: &Request) -> Response {
        tracing::debug!(method = request.method.as_str(), path = %request.path, "Dispatching");

        match request.method {
            Method::OPTIONS => self.proxy.cors().preflight(),
            Method::GET | Method::POST => {
                let route = request.route();
                if route.starts_with(PROXY_PREFIX) {
                    self.proxy.handle(request).await
                } else if route == VERSION_CHECK_PATH && request.method == Method::GET {
                    self.version_check().await
                } else {
                    Response::not_found()
                }
            }
            _ => Response::not_implemented(),
        }
    }

    async fn version_check(&self) -> Response {
        let report = self.version.check().await;
        let body = match serde_json::to_value(&report) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize version report");
                serde_json::json!({ "status": "error", "error": e.to_string() })
            }
        };

        self.proxy
            .cors()
            .apply(ResponseBuilder::new(StatusCode::Ok))
            .json(&body)
            .build()
    }
}
