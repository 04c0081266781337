//! Target derivation from the inbound query string

use crate::http::request::Request;
use crate::proxy::error::ProxyError;

/// Where an inbound `/proxy` request should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    /// Target URL, used verbatim. Any URL the caller supplies is fetched.
    pub url: String,

    /// Skip certificate verification for this call only
    pub insecure: bool,
}

impl TargetSpec {
    /// Reads `url` and `insecure` from the request's query string.
    ///
    /// A missing or empty `url` yields `ProxyError::MissingTarget`.
    pub fn from_request(request: &Request) -> Result<Self, ProxyError> {
        let url = request
            .query_param("url")
            .filter(|u| !u.is_empty())
            .ok_or(ProxyError::MissingTarget)?;

        let insecure = request
            .query_param("insecure")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(Self { url, insecure })
    }
}
