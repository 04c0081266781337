//! CORS forwarding proxy
//!
//! This module implements the request-forwarding pipeline: target
//! derivation, outbound header policy, the outbound call and the mapping of
//! its outcome onto CORS-carrying responses.

pub mod cors;
pub mod error;
pub mod headers;
pub mod target;
pub mod upstream;

pub use cors::CorsPolicy;
pub use error::ProxyError;
pub use headers::{merge_layers, HeaderPolicy, HeaderSet};
pub use target::TargetSpec;
pub use upstream::{OutboundRequest, ProxyHandler, UpstreamReply};
