use std::sync::Arc;

use serde::Deserialize;

use crate::analysis::request::{AnalysisRequest, Base, NopRequest, NpmRequest, PackageRequest, PypiRequest, Request};
use crate::analysis::types::Type;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, RequestError};
use crate::models::Ecosystem;
use crate::registry::npm::NpmRegistry;
use crate::registry::pypi::PypiRegistry;
use crate::registry::{http_client, Registry};

/// Turns raw request JSON into a validated [`Request`].
///
/// When a registry is configured for the request's ecosystem, missing
/// versions and shasums are resolved against it and supplied shasums are
/// verified. Without one, only requests that pin both version and shasum
/// are accepted, unverified.
#[derive(Clone, Default)]
pub struct Builder {
    npm: Option<Arc<dyn Registry>>,
    pypi: Option<Arc<dyn Registry>>,
}

/// Fields common to every request, decoded before the variant is known.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    snowflake_id: String,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder backed by the public npm and PyPI registries.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let client = http_client(config)?;
        Ok(Self::new()
            .with_npm(Arc::new(NpmRegistry::new(client.clone(), &config.npm_url)))
            .with_pypi(Arc::new(PypiRegistry::new(client, &config.pypi_url))))
    }

    pub fn with_npm(mut self, registry: Arc<dyn Registry>) -> Self {
        self.npm = Some(registry);
        self
    }

    pub fn with_pypi(mut self, registry: Arc<dyn Registry>) -> Self {
        self.pypi = Some(registry);
        self
    }

    fn registry(&self, ecosystem: Ecosystem) -> Option<&dyn Registry> {
        match ecosystem {
            Ecosystem::Npm => self.npm.as_deref(),
            Ecosystem::Pypi => self.pypi.as_deref(),
        }
    }

    /// Decode, validate and enrich one request.
    pub async fn build(&self, raw: &[u8]) -> Result<Request, RequestError> {
        let envelope: Envelope = serde_json::from_slice(raw)?;
        let kind = Type::from_urn(&envelope.kind)
            .map_err(|_| RequestError::UnsupportedType(envelope.kind.clone()))?;
        if envelope.snowflake_id.trim().is_empty() {
            return Err(RequestError::Validation {
                field: "snowflake_id",
                reason: "must not be empty".to_string(),
            });
        }

        let request = match kind.ecosystem()? {
            None => {
                let base: Base = serde_json::from_slice(raw)?;
                Request::Nop(NopRequest { base })
            }
            Some(ecosystem) => {
                let mut package: PackageRequest = serde_json::from_slice(raw)?;
                // Name must be checked before we spend a round-trip on it
                if package.name.trim().is_empty() {
                    return Err(RequestError::Validation {
                        field: "name",
                        reason: "must not be empty".to_string(),
                    });
                }
                match self.registry(ecosystem) {
                    Some(registry) => fill_missing(&mut package, registry).await?,
                    None if package.version.is_some() && package.shasum.is_some() => {
                        tracing::debug!(name = %package.name, "no registry, keeping pinned version");
                    }
                    None => {
                        return Err(RequestError::NoRegistry {
                            name: package.name,
                            ecosystem,
                        })
                    }
                }
                match ecosystem {
                    Ecosystem::Npm => Request::Npm(NpmRequest(package)),
                    Ecosystem::Pypi => Request::Pypi(PypiRequest(package)),
                }
            }
        };

        request.validate()?;
        tracing::debug!(request = %request, "analysis request built");
        Ok(request)
    }
}

/// Resolve the version and shasum of `package` with a single registry call.
///
/// - no version: take the latest release (and check any supplied shasum)
/// - version only: take that release's shasum
/// - both: check the supplied shasum against the release
pub async fn fill_missing(package: &mut PackageRequest, registry: &dyn Registry) -> Result<(), RequestError> {
    let resolved = match package.version.as_deref() {
        None => registry.package_latest_version(&package.name).await,
        Some(version) => registry.package_version(&package.name, version).await,
    }
    .inspect_err(|e| tracing::warn!(name = %package.name, error = %e, "registry lookup failed"))?;

    if let Some(expected) = package.shasum.as_deref() {
        if !expected.eq_ignore_ascii_case(&resolved.shasum) {
            return Err(RequestError::ShasumMismatch {
                name: package.name.clone(),
                version: resolved.version,
                expected: expected.to_string(),
                actual: resolved.shasum,
            });
        }
    }

    tracing::debug!(
        name = %package.name,
        version = %resolved.version,
        shasum = %resolved.shasum,
        "package resolved"
    );
    package.version = Some(resolved.version);
    package.shasum = Some(resolved.shasum);
    Ok(())
}
