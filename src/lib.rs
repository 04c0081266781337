//! cors-proxy - local CORS forwarding proxy
//!
//! Forwards `/proxy?url=<target>` requests to the target and relays the
//! answer with CORS headers so browser pages can call third-party APIs.

pub mod config;
pub mod http;
pub mod proxy;
pub mod server;
pub mod version;
