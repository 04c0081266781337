//! Outbound header policy
//!
//! The outbound header set is built from three layers merged in order
//! (baseline, browser-like defaults, caller overrides) followed by the
//! passthrough mappings. Only allow-listed or passthrough headers from the
//! inbound request ever reach the target.

use crate::config::{PassthroughHeader, ProxyConfig};
use crate::http::request::{Method, Request};

/// Ordered header list with case-insensitive replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing the value of an existing entry with the
    /// same name (ignoring case) in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        for (k, v) in iter {
            set.set(k, v);
        }
        set
    }
}

/// Merges layers in order; a later layer's value wins for a given name.
pub fn merge_layers(layers: &[&HeaderSet]) -> HeaderSet {
    let mut merged = HeaderSet::new();
    for layer in layers {
        for (name, value) in layer.iter() {
            merged.set(name, value);
        }
    }
    merged
}

/// Decides which headers an outbound call carries.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    allowed: Vec<String>,
    defaults: HeaderSet,
    passthrough: Vec<PassthroughHeader>,
    user_agent: String,
}

impl HeaderPolicy {
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            allowed: config.allowed_headers.clone(),
            defaults: config
                .default_headers
                .iter()
                .map(|h| (h.name.as_str(), h.value.as_str()))
                .collect(),
            passthrough: config.passthrough.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Layer 1: what the proxy sends regardless of the caller.
    pub fn baseline(&self, method: &Method) -> HeaderSet {
        let mut baseline = HeaderSet::new();
        baseline.set("User-Agent", self.user_agent.as_str());
        if *method == Method::POST {
            baseline.set("Content-Type", "application/json");
        }
        baseline
    }

    /// Layer 2: browser-like defaults for the allow-listed names.
    pub fn defaults(&self) -> &HeaderSet {
        &self.defaults
    }

    /// Layer 3: allow-listed headers the caller sent, values as received.
    pub fn overrides(&self, request: &Request) -> HeaderSet {
        self.allowed
            .iter()
            .filter_map(|name| request.header(name).map(|v| (name.as_str(), v)))
            .collect()
    }

    /// Builds the complete outbound header set for `request`.
    pub fn outbound_headers(&self, request: &Request) -> HeaderSet {
        let baseline = self.baseline(&request.method);
        let overrides = self.overrides(request);
        let mut headers = merge_layers(&[&baseline, &self.defaults, &overrides]);

        for mapping in &self.passthrough {
            if let Some(value) = request.header(&mapping.from) {
                headers.set(mapping.to.as_str(), value);
            }
        }

        headers
    }
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self::new(&ProxyConfig::default())
    }
}
