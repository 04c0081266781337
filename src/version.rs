//! Release version check
//!
//! Compares the local version tag against the latest published release.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::VersionConfig;

const FALLBACK_VERSION: &str = "v1";
const CHECKER_USER_AGENT: &str = "cors-proxy-version-checker";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    UpToDate,
    UpdateAvailable,
    NoReleases,
    Error,
}

/// Outcome of a version check, serialized as the `/version-check` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionReport {
    pub current_version: String,
    pub latest_version: Option<String>,
    pub status: VersionStatus,
    pub update_available: bool,
    pub error: Option<String>,
}

impl VersionReport {
    pub fn new(current: String, latest: Result<Option<String>, String>) -> Self {
        let (latest_version, status, error) = match latest {
            Ok(None) => (None, VersionStatus::NoReleases, None),
            Ok(Some(tag)) if tag == current => (Some(tag), VersionStatus::UpToDate, None),
            Ok(Some(tag)) => (Some(tag), VersionStatus::UpdateAvailable, None),
            Err(e) => (None, VersionStatus::Error, Some(e)),
        };

        Self {
            current_version: current,
            latest_version,
            update_available: status == VersionStatus::UpdateAvailable,
            status,
            error,
        }
    }

    /// 0 when nothing needs doing, 1 on error, 2 when an update exists.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            VersionStatus::Error => 1,
            VersionStatus::UpdateAvailable => 2,
            VersionStatus::UpToDate | VersionStatus::NoReleases => 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: Option<String>,
}

pub struct VersionChecker {
    client: reqwest::Client,
    config: VersionConfig,
}

impl VersionChecker {
    pub fn new(config: VersionConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(CHECKER_USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Version tag of the running installation, `v1` when no file exists.
    pub fn current_version(&self) -> String {
        match std::fs::read_to_string(&self.config.version_file) {
            Ok(raw) => raw.trim().to_string(),
            Err(_) => FALLBACK_VERSION.to_string(),
        }
    }

    /// Tag of the latest release; `Ok(None)` when none is published.
    pub async fn latest_version(&self) -> Result<Option<String>, String> {
        let response = self
            .client
            .get(&self.config.releases_url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response.error_for_status().map_err(|e| e.to_string())?;
        let release: Release = response.json().await.map_err(|e| e.to_string())?;

        Ok(release.tag_name)
    }

    pub async fn check(&self) -> VersionReport {
        let current = self.current_version();
        let latest = self.latest_version().await;

        if let Err(e) = &latest {
            tracing::warn!(error = %e, "Version check failed");
        }

        VersionReport::new(current, latest)
    }
}
