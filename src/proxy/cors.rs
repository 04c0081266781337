//! CORS header set attached to proxy responses

use crate::config::CorsConfig;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const MAX_AGE: &str = "Access-Control-Max-Age";

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_origin: String,
    allow_methods: String,
    allow_headers: String,
    max_age: String,
}

impl CorsPolicy {
    pub fn new(config: &CorsConfig) -> Self {
        Self {
            allow_origin: config.allow_origin.clone(),
            allow_methods: config.allow_methods.join(", "),
            allow_headers: config.allow_headers.join(", "),
            max_age: config.max_age.to_string(),
        }
    }

    /// Adds the origin/methods/headers triple to a response under construction.
    pub fn apply(&self, builder: ResponseBuilder) -> ResponseBuilder {
        builder
            .header(ALLOW_ORIGIN, self.allow_origin.as_str())
            .header(ALLOW_METHODS, self.allow_methods.as_str())
            .header(ALLOW_HEADERS, self.allow_headers.as_str())
    }

    /// Answers an OPTIONS preflight: 200, no body, CORS headers plus max-age.
    pub fn preflight(&self) -> Response {
        self.apply(ResponseBuilder::new(StatusCode::Ok))
            .header(MAX_AGE, self.max_age.as_str())
            .build()
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new(&CorsConfig::default())
    }
}
