use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{check_status, PackageList, PackageVersion, Registry};
use crate::error::RegistryError;

pub const DEFAULT_URL: &str = "https://pypi.org";

/// Client for the PyPI JSON API.
///
/// The shasum of a release is the sha256 digest of its sdist, or of the
/// first uploaded file when there is no sdist.
pub struct PypiRegistry {
    client: Client,
    base_url: String,
}

impl PypiRegistry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, url: &str, name: &str, version: Option<&str>) -> Result<Vec<u8>, RegistryError> {
        tracing::debug!(url, "pypi registry request");
        let response = self.client.get(url).send().await?;
        let response = check_status(response, name, version)?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct Project {
    info: Info,
    #[serde(default)]
    releases: BTreeMap<String, Vec<File>>,
    #[serde(default)]
    urls: Vec<File>,
}

#[derive(Debug, Deserialize)]
struct Info {
    name: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct File {
    packagetype: String,
    digests: Digests,
}

#[derive(Debug, Deserialize)]
struct Digests {
    sha256: String,
}

fn pick_shasum(files: &[File]) -> Option<String> {
    files
        .iter()
        .find(|f| f.packagetype == "sdist")
        .or_else(|| files.first())
        .map(|f| f.digests.sha256.clone())
}

fn decode(body: &[u8]) -> Result<Project, RegistryError> {
    serde_json::from_slice(body).map_err(|e| RegistryError::Decode(e.to_string()))
}

/// Parse `/pypi/{name}/json`. Releases without files (fully yanked or
/// never uploaded) are skipped.
fn parse_project(body: &[u8]) -> Result<PackageList, RegistryError> {
    let project = decode(body)?;
    let name = project.info.name;
    let versions = project
        .releases
        .into_iter()
        .filter_map(|(version, files)| {
            pick_shasum(&files).map(|shasum| PackageVersion {
                name: name.clone(),
                version,
                shasum,
            })
        })
        .collect();
    Ok(PackageList {
        name,
        latest: Some(project.info.version),
        versions,
    })
}

/// Parse `/pypi/{name}/{version}/json` (or the latest-release document).
fn parse_release(body: &[u8]) -> Result<PackageVersion, RegistryError> {
    let project = decode(body)?;
    let shasum = pick_shasum(&project.urls).ok_or_else(|| {
        RegistryError::Decode(format!(
            "{} {} has no distribution files",
            project.info.name, project.info.version
        ))
    })?;
    Ok(PackageVersion {
        name: project.info.name,
        version: project.info.version,
        shasum,
    })
}

#[async_trait]
impl Registry for PypiRegistry {
    async fn package_list(&self, name: &str) -> Result<PackageList, RegistryError> {
        let url = format!("{}/pypi/{}/json", self.base_url, name);
        parse_project(&self.fetch(&url, name, None).await?)
    }

    async fn package_version(&self, name: &str, version: &str) -> Result<PackageVersion, RegistryError> {
        let url = format!("{}/pypi/{}/{}/json", self.base_url, name, version);
        parse_release(&self.fetch(&url, name, Some(version)).await?)
    }

    async fn package_latest_version(&self, name: &str) -> Result<PackageVersion, RegistryError> {
        // The project document's `urls` describe the latest release
        let url = format!("{}/pypi/{}/json", self.base_url, name);
        parse_release(&self.fetch(&url, name, None).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = r#"{
  "info": { "name": "requests", "version": "2.31.0", "license": "Apache 2.0" },
  "releases": {
    "2.30.0": [
      { "packagetype": "bdist_wheel", "digests": { "sha256": "wheel-2300" } },
      { "packagetype": "sdist", "digests": { "sha256": "sdist-2300" } }
    ],
    "2.31.0": [
      { "packagetype": "bdist_wheel", "digests": { "sha256": "wheel-2310" } }
    ],
    "0.0.1": []
  },
  "urls": [
    { "packagetype": "bdist_wheel", "digests": { "sha256": "wheel-2310" } }
  ]
}"#;

    #[test]
    fn test_parse_project() {
        let list = parse_project(PROJECT.as_bytes()).unwrap();
        assert_eq!(list.name, "requests");
        assert_eq!(list.latest.as_deref(), Some("2.31.0"));
        // 0.0.1 has no files
        assert_eq!(list.versions.len(), 2);
        assert_eq!(list.get("2.30.0").unwrap().shasum, "sdist-2300");
        assert_eq!(list.get("2.31.0").unwrap().shasum, "wheel-2310");
    }

    #[test]
    fn test_parse_release() {
        let v = parse_release(PROJECT.as_bytes()).unwrap();
        assert_eq!(v.version, "2.31.0");
        assert_eq!(v.shasum, "wheel-2310");
    }

    #[test]
    fn test_parse_release_without_files() {
        let body = r#"{"info":{"name":"ghost","version":"1.0"},"urls":[]}"#;
        assert!(matches!(
            parse_release(body.as_bytes()),
            Err(RegistryError::Decode(_))
        ));
    }
}
