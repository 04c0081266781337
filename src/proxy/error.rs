//! Proxy error taxonomy and its mapping onto JSON responses

use std::error::Error as StdError;

use serde_json::json;

use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::proxy::cors::CorsPolicy;

const CERTIFICATE_MESSAGE: &str = "The server's SSL certificate could not be verified. \
This may happen with self-signed certificates or internal servers.";

const RETRY_MESSAGE: &str =
    "You can retry with SSL verification disabled (insecure mode), or cancel the operation.";

/// Everything that can go wrong while handling a `/proxy` request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// No usable `url` query parameter
    #[error("Missing ?url= parameter")]
    MissingTarget,

    /// The transport reported a target status as an error; relayed as-is
    #[error("target returned HTTP {status}")]
    UpstreamStatus { status: u16, body: Vec<u8> },

    /// Certificate chain or hostname could not be verified
    #[error("SSL certificate verification failed: {0}")]
    TlsCertificate(String),

    /// Any other TLS failure
    #[error("SSL connection error: {0}")]
    Tls(String),

    /// Refused, DNS failure, timeout, truncated body
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected error: {0}")]
    Unclassified(String),
}

impl ProxyError {
    /// Classifies a transport error.
    ///
    /// A `rustls::Error` anywhere in the source chain decides the TLS cases.
    /// When none can be found (for example when the TLS stack is linked at a
    /// different version) the error text is checked against TLS keywords.
    /// That fallback is a heuristic and can misfire on unusual messages.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let details = describe(err);

        if let Some(status) = err.status() {
            return ProxyError::UpstreamStatus {
                status: status.as_u16(),
                body: Vec::new(),
            };
        }

        if let Some(tls) = find_rustls_error(err) {
            return match tls {
                rustls::Error::InvalidCertificate(_) | rustls::Error::NoCertificatesPresented => {
                    ProxyError::TlsCertificate(details)
                }
                _ => ProxyError::Tls(details),
            };
        }

        if let Some(tls) = sniff_tls(&source_text(err)) {
            return tls.with_details(details);
        }

        if err.is_timeout()
            || err.is_connect()
            || err.is_request()
            || err.is_body()
            || err.is_decode()
            || err.is_redirect()
        {
            return ProxyError::Network(details);
        }

        ProxyError::Unclassified(details)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTarget => StatusCode::BadRequest,
            ProxyError::UpstreamStatus { status, .. } => StatusCode::from_u16(*status),
            ProxyError::TlsCertificate(_) | ProxyError::Tls(_) => StatusCode::SslCertificateError,
            ProxyError::Network(_) | ProxyError::Unclassified(_) => StatusCode::InternalServerError,
        }
    }

    /// Builds the CORS-carrying response the caller receives.
    pub fn to_response(&self, cors: &CorsPolicy) -> Response {
        let builder = cors.apply(ResponseBuilder::new(self.status()));

        match self {
            ProxyError::MissingTarget => builder
                .json(&json!({ "error": "Missing ?url= parameter" }))
                .build(),
            ProxyError::UpstreamStatus { body, .. } => builder
                .header("Content-Type", "application/json")
                .body(body.clone())
                .build(),
            ProxyError::TlsCertificate(details) => builder
                .json(&json!({
                    "error": "SSL Certificate Verification Failed",
                    "error_type": "ssl_certificate_error",
                    "details": details,
                    "message": CERTIFICATE_MESSAGE,
                    "options": {
                        "retry_insecure": true,
                        "retry_message": RETRY_MESSAGE,
                    },
                }))
                .build(),
            ProxyError::Tls(details) => builder
                .json(&json!({
                    "error": "SSL Connection Error",
                    "error_type": "ssl_error",
                    "details": details,
                }))
                .build(),
            ProxyError::Network(details) | ProxyError::Unclassified(details) => builder
                .json(&json!({
                    "error": "Proxy request failed",
                    "details": details,
                }))
                .build(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TlsKind {
    Certificate,
    Other,
}

impl TlsKind {
    fn with_details(self, details: String) -> ProxyError {
        match self {
            TlsKind::Certificate => ProxyError::TlsCertificate(details),
            TlsKind::Other => ProxyError::Tls(details),
        }
    }
}

const CERTIFICATE_KEYWORDS: &[&str] = &[
    "certificate",
    "verify failed",
    "unknownissuer",
    "unknown issuer",
    "self-signed",
    "self signed",
    "notvalidforname",
];

const TLS_KEYWORDS: &[&str] = &["ssl", "tls", "handshake"];

fn sniff_tls(text: &str) -> Option<TlsKind> {
    let lower = text.to_ascii_lowercase();

    if CERTIFICATE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Some(TlsKind::Certificate)
    } else if TLS_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Some(TlsKind::Other)
    } else {
        None
    }
}

fn find_rustls_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a rustls::Error> {
    let mut current: Option<&'a (dyn StdError + 'static)> = Some(err);

    while let Some(e) = current {
        if let Some(tls) = e.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }

        // io::Error::source() skips the wrapped error, so look inside it
        if let Some(tls) = e
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
            .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        {
            return Some(tls);
        }

        current = e.source();
    }

    None
}

/// Text of the causes below the top-level error, which excludes the URL.
fn source_text(err: &(dyn StdError + 'static)) -> String {
    let mut parts = Vec::new();
    let mut current = err.source();

    while let Some(e) = current {
        parts.push(e.to_string());
        current = e.source();
    }

    parts.join(": ")
}

fn describe(err: &(dyn StdError + 'static)) -> String {
    let causes = source_text(err);
    if causes.is_empty() {
        err.to_string()
    } else {
        format!("{}: {}", err, causes)
    }
}
