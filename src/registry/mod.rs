//! Package registry clients.
//!
//! [`Registry`] is the collaborator the request builder resolves versions
//! and shasums through. Implementations:
//!
//! - [`npm::NpmRegistry`] — `registry.npmjs.org` JSON API
//! - [`pypi::PypiRegistry`] — PyPI JSON API
//! - [`fixture::StaticRegistry`] — in-memory packages, for tests and dry runs
//!
//! Cancellation is by dropping the future; timeouts are set on the
//! underlying `reqwest::Client`.

pub mod fixture;
pub mod npm;
pub mod pypi;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::RegistryConfig;
use crate::error::RegistryError;

/// One published version of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersion {
    pub name: String,
    pub version: String,
    pub shasum: String,
}

/// Every published version of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageList {
    pub name: String,
    pub latest: Option<String>,
    pub versions: Vec<PackageVersion>,
}

impl PackageList {
    pub fn get(&self, version: &str) -> Option<&PackageVersion> {
        self.versions.iter().find(|v| v.version == version)
    }
}

#[async_trait]
pub trait Registry: Send + Sync {
    async fn package_list(&self, name: &str) -> Result<PackageList, RegistryError>;

    async fn package_version(&self, name: &str, version: &str) -> Result<PackageVersion, RegistryError>;

    async fn package_latest_version(&self, name: &str) -> Result<PackageVersion, RegistryError>;
}

/// Build the shared HTTP client from configuration.
pub fn http_client(config: &RegistryConfig) -> Result<Client, RegistryError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()?)
}

/// Map a non-success status to a registry error.
///
/// `version` is set for per-version endpoints, where a 404 is reported as a
/// missing version.
fn check_status(
    response: Response,
    name: &str,
    version: Option<&str>,
) -> Result<Response, RegistryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(match version {
            Some(version) => RegistryError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            },
            None => RegistryError::NotFound {
                name: name.to_string(),
            },
        });
    }
    Err(RegistryError::ServiceUnavailable(format!(
        "{} returned {}",
        response.url(),
        status
    )))
}
