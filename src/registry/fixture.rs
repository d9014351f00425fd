use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{PackageList, PackageVersion, Registry};
use crate::error::RegistryError;

/// In-memory registry serving a fixed set of packages.
///
/// The last version added for a package is its latest unless
/// [`StaticRegistry::with_latest`] says otherwise.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    packages: HashMap<String, PackageList>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, name: &str, version: &str, shasum: &str) -> Self {
        let list = self
            .packages
            .entry(name.to_string())
            .or_insert_with(|| PackageList {
                name: name.to_string(),
                latest: None,
                versions: Vec::new(),
            });
        list.versions.push(PackageVersion {
            name: name.to_string(),
            version: version.to_string(),
            shasum: shasum.to_string(),
        });
        list.latest = Some(version.to_string());
        self
    }

    pub fn with_latest(mut self, name: &str, version: &str) -> Self {
        if let Some(list) = self.packages.get_mut(name) {
            list.latest = Some(version.to_string());
        }
        self
    }

    /// Make every lookup fail as if the registry were down.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Number of lookups served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn lookup(&self, name: &str) -> Result<&PackageList, RegistryError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.unavailable {
            return Err(RegistryError::ServiceUnavailable(
                "static registry marked unavailable".to_string(),
            ));
        }
        self.packages.get(name).ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
        })
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    async fn package_list(&self, name: &str) -> Result<PackageList, RegistryError> {
        self.lookup(name).cloned()
    }

    async fn package_version(&self, name: &str, version: &str) -> Result<PackageVersion, RegistryError> {
        self.lookup(name)?
            .get(version)
            .cloned()
            .ok_or_else(|| RegistryError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            })
    }

    async fn package_latest_version(&self, name: &str) -> Result<PackageVersion, RegistryError> {
        let list = self.lookup(name)?;
        list.latest
            .as_deref()
            .and_then(|latest| list.get(latest))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }
}
