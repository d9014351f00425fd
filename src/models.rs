use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Package ecosystem an analysis request or verdict pertains to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Npm,
    Pypi,
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 2] = [Ecosystem::Npm, Ecosystem::Pypi];

    /// Lowercase identifier used in URNs, paths and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Pypi => "pypi",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Ecosystem {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "npm" => Ok(Ecosystem::Npm),
            "pypi" => Ok(Ecosystem::Pypi),
            other => Err(TypeError::UnknownEcosystem(other.to_string())),
        }
    }
}

/// Whether a project file declares dependencies or pins them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Manifest,
    Lockfile,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Manifest => write!(f, "manifest"),
            FileKind::Lockfile => write!(f, "lockfile"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecosystem_parse() {
        assert_eq!("npm".parse::<Ecosystem>().unwrap(), Ecosystem::Npm);
        assert_eq!("pypi".parse::<Ecosystem>().unwrap(), Ecosystem::Pypi);
        // Literal comparison: ecosystem segments are case-sensitive
        assert!("NPM".parse::<Ecosystem>().is_err());
    }

    #[test]
    fn test_ecosystem_json() {
        assert_eq!(serde_json::to_string(&Ecosystem::Pypi).unwrap(), "\"pypi\"");
        let eco: Ecosystem = serde_json::from_str("\"npm\"").unwrap();
        assert_eq!(eco, Ecosystem::Npm);
    }
}
