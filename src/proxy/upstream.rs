//! Outbound call to the target and result mapping
//!
//! `ProxyHandler` owns two pre-built clients, one verifying certificates and
//! one not. A request only reaches the insecure client when it carried
//! `insecure=true`, so the opt-in never leaks to other requests.

use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;

use crate::config::{CorsConfig, ProxyConfig};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::proxy::cors::CorsPolicy;
use crate::proxy::error::ProxyError;
use crate::proxy::headers::{HeaderPolicy, HeaderSet};
use crate::proxy::target::TargetSpec;

/// The request sent to the target
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub target: TargetSpec,
    pub headers: HeaderSet,
    pub body: Vec<u8>,
}

/// What the target answered, whatever the status
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Bytes,
}

/// Handles `/proxy` requests end to end
pub struct ProxyHandler {
    /// Client enforcing certificate verification
    strict: reqwest::Client,

    /// Client with certificate verification disabled
    insecure: reqwest::Client,

    headers: HeaderPolicy,
    cors: CorsPolicy,
}

impl ProxyHandler {
    /// Create a new proxy handler
    pub fn new(proxy: &ProxyConfig, cors: &CorsConfig) -> anyhow::Result<Self> {
        let timeout = proxy.timeout_secs.map(Duration::from_secs);

        Ok(Self {
            strict: build_client(timeout, false).context("Failed to build HTTP client")?,
            insecure: build_client(timeout, true)
                .context("Failed to build insecure HTTP client")?,
            headers: HeaderPolicy::new(proxy),
            cors: CorsPolicy::new(cors),
        })
    }

    pub fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    /// Handle a GET/POST `/proxy` request.
    ///
    /// Every failure is turned into a CORS-carrying response here; nothing
    /// propagates to the connection.
    pub async fn handle(&self, request: &Request) -> Response {
        let outbound = match self.build_outbound(request) {
            Ok(outbound) => outbound,
            Err(e) => {
                tracing::warn!(path = %request.path, error = %e, "Rejected proxy request");
                return e.to_response(&self.cors);
            }
        };

        match self.send(&outbound).await {
            Ok(reply) => {
                tracing::info!(
                    target_url = %outbound.target.url,
                    status = reply.status,
                    insecure = outbound.target.insecure,
                    "Request forwarded"
                );
                self.relay(reply)
            }
            Err(e) => {
                match &e {
                    ProxyError::UpstreamStatus { status, .. } => tracing::info!(
                        target_url = %outbound.target.url,
                        status = *status,
                        "Target returned an error status"
                    ),
                    ProxyError::TlsCertificate(_) | ProxyError::Tls(_) => tracing::warn!(
                        target_url = %outbound.target.url,
                        error = %e,
                        "TLS failure talking to target"
                    ),
                    _ => tracing::error!(
                        target_url = %outbound.target.url,
                        error = %e,
                        "Proxy request failed"
                    ),
                }
                e.to_response(&self.cors)
            }
        }
    }

    /// Derive the outbound request from the inbound one.
    ///
    /// Fails with `ProxyError::MissingTarget` before anything else is built.
    pub fn build_outbound(&self, request: &Request) -> Result<OutboundRequest, ProxyError> {
        let target = TargetSpec::from_request(request)?;

        let body = match request.method {
            Method::POST => {
                let len = request.content_length().min(request.body.len());
                request.body[..len].to_vec()
            }
            _ => Vec::new(),
        };

        Ok(OutboundRequest {
            method: request.method.clone(),
            headers: self.headers.outbound_headers(request),
            target,
            body,
        })
    }

    /// Issue the outbound call.
    pub async fn send(&self, outbound: &OutboundRequest) -> Result<UpstreamReply, ProxyError> {
        let client = if outbound.target.insecure {
            tracing::warn!(
                target_url = %outbound.target.url,
                "Insecure mode: certificate verification disabled for this request"
            );
            &self.insecure
        } else {
            &self.strict
        };

        let method = match outbound.method {
            Method::POST => reqwest::Method::POST,
            _ => reqwest::Method::GET,
        };

        tracing::debug!(
            method = outbound.method.as_str(),
            target_url = %outbound.target.url,
            headers = outbound.headers.len(),
            body_bytes = outbound.body.len(),
            "Proxying request"
        );

        let mut builder = client.request(method, &outbound.target.url);
        for (name, value) in outbound.headers.iter() {
            builder = builder.header(name, value);
        }
        if outbound.method == Method::POST {
            builder = builder.body(outbound.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProxyError::from_transport(&e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::from_transport(&e))?;

        Ok(UpstreamReply { status, body })
    }

    /// Pass the target's status and body through unchanged.
    pub fn relay(&self, reply: UpstreamReply) -> Response {
        self.cors
            .apply(ResponseBuilder::new(StatusCode::from_u16(reply.status)))
            .header("Content-Type", "application/json")
            .body(reply.body.to_vec())
            .build()
    }
}

fn build_client(timeout: Option<Duration>, insecure: bool) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .danger_accept_invalid_certs(insecure);

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder.build()
}
