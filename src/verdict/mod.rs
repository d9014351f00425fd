//! Verdicts produced by analysis collectors.
//!
//! Verdicts are created outside this crate; here they are only carried,
//! rendered and filtered.

pub mod filter;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Ecosystem;
use crate::util::int64_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// What kind of behaviour a verdict reports.
///
/// Categories unknown to this crate are kept verbatim in [`Category::Other`]
/// so verdicts from newer collectors survive a round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Malware,
    Typosquatting,
    InstallScript,
    Network,
    Filesystem,
    Process,
    Exfiltration,
    Obfuscation,
    Secrets,
    Vulnerability,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Malware => "malware",
            Category::Typosquatting => "typosquatting",
            Category::InstallScript => "install_script",
            Category::Network => "network",
            Category::Filesystem => "filesystem",
            Category::Process => "process",
            Category::Exfiltration => "exfiltration",
            Category::Obfuscation => "obfuscation",
            Category::Secrets => "secrets",
            Category::Vulnerability => "vulnerability",
            Category::Other(other) => other,
        }
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "malware" => Category::Malware,
            "typosquatting" => Category::Typosquatting,
            "install_script" => Category::InstallScript,
            "network" => Category::Network,
            "filesystem" => Category::Filesystem,
            "process" => Category::Process,
            "exfiltration" => Category::Exfiltration,
            "obfuscation" => Category::Obfuscation,
            "secrets" => Category::Secrets,
            "vulnerability" => Category::Vulnerability,
            other => Category::Other(other.to_string()),
        })
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub message: String,
    pub severity: Severity,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Collector-specific rule code.
    #[serde(default)]
    pub code: String,
    pub ecosystem: Ecosystem,
    pub pkg: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub shasum: String,
    /// File inside the package the verdict points at.
    #[serde(default)]
    pub file: String,
    #[serde(
        default,
        with = "int64_string::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub org: Option<i64>,
}

impl Verdict {
    pub fn has_category(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }

    /// Whether the verdict has expired at `now`. Verdicts without an expiry
    /// never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Ordered list of verdicts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Verdicts(pub Vec<Verdict>);

impl Verdicts {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Verdict> {
        self.0.iter()
    }

    /// Highest severity present.
    pub fn max_severity(&self) -> Option<Severity> {
        self.0.iter().map(|v| v.severity).max()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.0.iter().filter(|v| v.severity == severity).count()
    }
}

impl FromIterator<Verdict> for Verdicts {
    fn from_iter<I: IntoIterator<Item = Verdict>>(iter: I) -> Self {
        Verdicts(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Verdicts {
    type Item = &'a Verdict;
    type IntoIter = std::slice::Iter<'a, Verdict>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample() -> Verdicts {
        serde_json::from_str(
            r#"[
  {
    "message": "install script contacts a remote host",
    "severity": "high",
    "categories": ["install_script", "network"],
    "metadata": { "host": "evil.example" },
    "created_at": "2024-03-01T10:00:00Z",
    "code": "FALCO-NET-001",
    "ecosystem": "npm",
    "pkg": "chalk",
    "version": "5.1.2",
    "shasum": "d957f370038b75ac572471e83be4c5ca9f8e8c45",
    "file": "package.json",
    "org": "9007199254740993"
  },
  {
    "message": "name is one edit away from 'requests'",
    "severity": "medium",
    "categories": ["typosquatting"],
    "metadata": {},
    "code": "TYPO-001",
    "ecosystem": "pypi",
    "pkg": "reqeusts",
    "version": "1.0.0",
    "shasum": "abc",
    "file": ""
  },
  {
    "message": "minified bundle",
    "severity": "low",
    "categories": ["obfuscation", "cryptomining"],
    "metadata": {},
    "expires_at": "2020-01-01T00:00:00Z",
    "code": "STATIC-OBF-002",
    "ecosystem": "npm",
    "pkg": "left-pad",
    "version": "1.3.0",
    "shasum": "def",
    "file": "index.min.js"
  }
]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_decode_sample() {
        let verdicts = sample();
        assert_eq!(verdicts.len(), 3);
        assert_eq!(verdicts.0[0].org, Some(9_007_199_254_740_993));
        assert!(verdicts.0[0].has_category(&Category::Network));
        assert_eq!(
            verdicts.0[2].categories[1],
            Category::Other("cryptomining".to_string())
        );
    }

    #[test]
    fn test_unknown_category_survives() {
        let verdicts = sample();
        let json = serde_json::to_value(&verdicts).unwrap();
        assert_eq!(json[2]["categories"][1], "cryptomining");
        assert_eq!(json[0]["org"], "9007199254740993");
        assert!(json[1].get("org").is_none());
    }

    #[test]
    fn test_severity_order() {
        let verdicts = sample();
        assert_eq!(verdicts.max_severity(), Some(Severity::High));
        assert_eq!(verdicts.count(Severity::Medium), 1);
        assert!(Severity::Low < Severity::High);
        assert_eq!(Verdicts::default().max_severity(), None);
    }

    #[test]
    fn test_expiry() {
        let verdicts = sample();
        let now = Utc::now();
        assert!(!verdicts.0[0].is_expired(now));
        assert!(verdicts.0[2].is_expired(now));
    }
}
