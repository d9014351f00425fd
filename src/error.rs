//! Error types for every concern in the crate.
//!
//! - [`TypeError`]: URN parsing, type lookup, table verification, sealing
//! - [`RegistryError`]: npm / PyPI registry lookups
//! - [`RequestError`]: decoding, validating and enriching analysis requests
//! - [`FilterError`]: verdict filtering
//! - [`ConfigError`]: configuration loading
//! - [`UploadError`]: result upload collaborator

use crate::models::Ecosystem;

/// Errors raised by the analysis type codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// The string is not a syntactically valid URN.
    #[error("invalid urn '{urn}': {reason}")]
    InvalidUrn {
        /// Offending input.
        urn: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The namespace-specific string does not follow the collector grammar.
    #[error("invalid type components '{input}': {reason}")]
    InvalidComponents {
        /// Offending namespace-specific string.
        input: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The ecosystem segment names an ecosystem we do not know.
    #[error("unknown ecosystem '{0}'")]
    UnknownEcosystem(String),

    /// No registered type matches the URN.
    #[error("no analysis type registered for '{0}'")]
    NotFound(String),

    /// The type table is inconsistent with the declared variants.
    #[error("analysis type table mismatch: {0}")]
    CodecMismatch(String),

    /// Sealing or opening a type token failed.
    #[error("type token error: {0}")]
    Seal(String),
}

/// Errors returned by registry clients.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The package does not exist.
    #[error("package not found: {name}")]
    NotFound {
        /// Package name.
        name: String,
    },

    /// The package exists but the requested version does not.
    #[error("version not found: {name}@{version}")]
    VersionNotFound {
        /// Package name.
        name: String,
        /// Requested version.
        version: String,
    },

    /// The registry answered with an unexpected status.
    #[error("registry unavailable: {0}")]
    ServiceUnavailable(String),

    /// Transport failure.
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry document did not have the expected shape.
    #[error("malformed registry document: {0}")]
    Decode(String),
}

/// Errors returned while building analysis requests.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Malformed JSON or a missing mandatory field.
    #[error("cannot decode analysis request: {0}")]
    Decode(#[from] serde_json::Error),

    /// The `type` field does not resolve to a registered type.
    #[error("unsupported analysis type '{0}'")]
    UnsupportedType(String),

    /// A variant-specific field is missing or empty.
    #[error("invalid analysis request: {field}: {reason}")]
    Validation {
        /// Field that failed validation.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The registry could not answer.
    #[error("malfunctioning registry: {0}")]
    RegistryUnavailable(#[source] RegistryError),

    /// No registry is configured for the request's ecosystem, and the
    /// request does not pin both version and shasum.
    #[error("no {ecosystem} registry configured to resolve {name}")]
    NoRegistry {
        /// Package name.
        name: String,
        /// Ecosystem of the request type.
        ecosystem: Ecosystem,
    },

    /// The requested version does not exist upstream.
    #[error("version {version} of {name} not found")]
    VersionNotFound {
        /// Package name.
        name: String,
        /// Requested version.
        version: String,
    },

    /// The caller's shasum disagrees with the registry.
    #[error("shasum mismatch for {name}@{version}: expected {expected}, registry has {actual}")]
    ShasumMismatch {
        /// Package name.
        name: String,
        /// Package version.
        version: String,
        /// Shasum provided by the caller.
        expected: String,
        /// Shasum published by the registry.
        actual: String,
    },

    /// A switch was attempted towards a type of another ecosystem.
    #[error("cannot switch {from} to {to}: ecosystems differ")]
    IncompatibleType {
        /// Current type.
        from: String,
        /// Requested type.
        to: String,
    },

    /// The type table itself is broken.
    #[error(transparent)]
    Codec(#[from] TypeError),
}

impl From<RegistryError> for RequestError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::VersionNotFound { name, version } => {
                RequestError::VersionNotFound { name, version }
            }
            other => RequestError::RegistryUnavailable(other),
        }
    }
}

/// Errors returned by the verdict filter.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// The expression could not be evaluated.
    #[error("invalid filter expression '{expr}': {reason}")]
    InvalidExpression {
        /// Expression as given.
        expr: String,
        /// Evaluator message.
        reason: String,
    },

    /// The matched value is not a list of verdicts.
    #[error("filtered value is not a verdict list: {0}")]
    Shape(#[source] serde_json::Error),

    /// The verdicts could not be serialized.
    #[error("cannot serialize verdicts: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors returned while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Config file path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys.
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Config file path.
        path: String,
        /// Parser error.
        source: toml::de::Error,
    },
}

/// Errors returned by uploaders.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Reading the payload failed.
    #[error("upload io error: {path}: {source}")]
    Io {
        /// Destination path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Something is already stored at the destination.
    #[error("object already exists: {0}")]
    AlreadyExists(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_not_found_is_kept_distinct() {
        let err: RequestError = RegistryError::VersionNotFound {
            name: "chalk".to_owned(),
            version: "9.9.9".to_owned(),
        }
        .into();
        assert!(matches!(err, RequestError::VersionNotFound { .. }));
        assert!(err.to_string().contains("9.9.9"));
    }

    #[test]
    fn other_registry_errors_are_wrapped() {
        let err: RequestError =
            RegistryError::ServiceUnavailable("503 Service Unavailable".to_owned()).into();
        assert!(matches!(err, RequestError::RegistryUnavailable(_)));
        assert!(err.to_string().starts_with("malfunctioning registry"));
    }

    #[test]
    fn shasum_mismatch_display() {
        let err = RequestError::ShasumMismatch {
            name: "chalk".to_owned(),
            version: "5.1.2".to_owned(),
            expected: "aaa".to_owned(),
            actual: "bbb".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("chalk@5.1.2"));
        assert!(msg.contains("aaa"));
        assert!(msg.contains("bbb"));
    }
}
