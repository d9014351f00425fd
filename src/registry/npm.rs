use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{check_status, PackageList, PackageVersion, Registry};
use crate::error::RegistryError;

pub const DEFAULT_URL: &str = "https://registry.npmjs.org";

/// Client for the npm registry JSON API.
pub struct NpmRegistry {
    client: Client,
    base_url: String,
}

impl NpmRegistry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get(&self, url: &str, name: &str, version: Option<&str>) -> Result<reqwest::Response, RegistryError> {
        tracing::debug!(url, "npm registry request");
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;
        check_status(response, name, version)
    }
}

// Scoped packages need URL encoding: @scope/pkg → %40scope%2Fpkg
fn encode_name(name: &str) -> String {
    name.replace('@', "%40").replace('/', "%2F")
}

#[derive(Debug, Deserialize)]
struct Packument {
    name: String,
    #[serde(rename = "dist-tags", default)]
    dist_tags: BTreeMap<String, String>,
    #[serde(default)]
    versions: BTreeMap<String, Manifest>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    name: String,
    version: String,
    dist: Dist,
}

#[derive(Debug, Deserialize)]
struct Dist {
    shasum: String,
}

impl From<Manifest> for PackageVersion {
    fn from(m: Manifest) -> Self {
        PackageVersion {
            name: m.name,
            version: m.version,
            shasum: m.dist.shasum,
        }
    }
}

/// Parse the document served at `/{name}`.
fn parse_packument(body: &[u8]) -> Result<PackageList, RegistryError> {
    let doc: Packument =
        serde_json::from_slice(body).map_err(|e| RegistryError::Decode(e.to_string()))?;
    Ok(PackageList {
        name: doc.name,
        latest: doc.dist_tags.get("latest").cloned(),
        versions: doc.versions.into_values().map(PackageVersion::from).collect(),
    })
}

/// Parse the document served at `/{name}/{version}`.
fn parse_manifest(body: &[u8]) -> Result<PackageVersion, RegistryError> {
    let doc: Manifest =
        serde_json::from_slice(body).map_err(|e| RegistryError::Decode(e.to_string()))?;
    Ok(doc.into())
}

#[async_trait]
impl Registry for NpmRegistry {
    async fn package_list(&self, name: &str) -> Result<PackageList, RegistryError> {
        let url = format!("{}/{}", self.base_url, encode_name(name));
        let body = self.get(&url, name, None).await?.bytes().await?;
        parse_packument(&body)
    }

    async fn package_version(&self, name: &str, version: &str) -> Result<PackageVersion, RegistryError> {
        let url = format!("{}/{}/{}", self.base_url, encode_name(name), version);
        let body = self.get(&url, name, Some(version)).await?.bytes().await?;
        parse_manifest(&body)
    }

    async fn package_latest_version(&self, name: &str) -> Result<PackageVersion, RegistryError> {
        let url = format!("{}/{}/latest", self.base_url, encode_name(name));
        let body = self.get(&url, name, None).await?.bytes().await?;
        parse_manifest(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKUMENT: &str = r#"{
  "name": "chalk",
  "dist-tags": { "latest": "5.1.2", "next": "6.0.0-beta" },
  "versions": {
    "5.1.1": {
      "name": "chalk",
      "version": "5.1.1",
      "license": "MIT",
      "dist": { "shasum": "aaaa", "tarball": "https://registry.npmjs.org/chalk/-/chalk-5.1.1.tgz" }
    },
    "5.1.2": {
      "name": "chalk",
      "version": "5.1.2",
      "dist": { "shasum": "d957f370038b75ac572471e83be4c5ca9f8e8c45" }
    }
  }
}"#;

    #[test]
    fn test_parse_packument() {
        let list = parse_packument(PACKUMENT.as_bytes()).unwrap();
        assert_eq!(list.name, "chalk");
        assert_eq!(list.latest.as_deref(), Some("5.1.2"));
        assert_eq!(list.versions.len(), 2);
        assert_eq!(
            list.get("5.1.2").unwrap().shasum,
            "d957f370038b75ac572471e83be4c5ca9f8e8c45"
        );
    }

    #[test]
    fn test_parse_manifest() {
        let body = r#"{"name":"lodash","version":"4.17.21","dist":{"shasum":"679591c564c3bffaae8454cf0b3df370c3d6911c"}}"#;
        let v = parse_manifest(body.as_bytes()).unwrap();
        assert_eq!(v.name, "lodash");
        assert_eq!(v.version, "4.17.21");
        assert_eq!(v.shasum, "679591c564c3bffaae8454cf0b3df370c3d6911c");
    }

    #[test]
    fn test_parse_manifest_missing_dist() {
        let err = parse_manifest(br#"{"name":"x","version":"1.0.0"}"#).unwrap_err();
        assert!(matches!(err, RegistryError::Decode(_)));
    }

    #[test]
    fn test_encode_scoped_name() {
        assert_eq!(encode_name("@types/node"), "%40types%2Fnode");
        assert_eq!(encode_name("chalk"), "chalk");
    }
}
