use serde::{Deserialize, Serialize};

use crate::analysis::path::ResultUploadPath;
use crate::analysis::types::Type;
use crate::error::RequestError;
use crate::models::Ecosystem;

/// Capabilities every analysis request exposes.
pub trait AnalysisRequest: std::fmt::Display {
    /// Snowflake identifier.
    fn id(&self) -> &str;

    fn kind(&self) -> Type;

    fn validate(&self) -> Result<(), RequestError>;

    /// JSON payload to publish on the work queue.
    fn publishing(&self) -> Result<Vec<u8>, RequestError>;

    /// Storage key for this request's results.
    fn results_path(&self) -> Result<ResultUploadPath, RequestError>;
}

/// Header shared by all request variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base {
    #[serde(rename = "type")]
    pub kind: Type,
    pub snowflake_id: String,
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub force: bool,
}

impl Base {
    pub fn new(kind: Type, snowflake_id: impl Into<String>) -> Self {
        Self {
            kind,
            snowflake_id: snowflake_id.into(),
            priority: 0,
            force: false,
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.snowflake_id.trim().is_empty() {
            return Err(RequestError::Validation {
                field: "snowflake_id",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Request that carries no package; used for pipeline health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NopRequest {
    #[serde(flatten)]
    pub base: Base,
}

/// Package identity shared by ecosystem-bound requests.
///
/// `version` and `shasum` may be absent on input; the builder resolves them
/// against the origin registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRequest {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shasum: Option<String>,
}

impl PackageRequest {
    pub fn new(kind: Type, snowflake_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: Base::new(kind, snowflake_id),
            name: name.into(),
            version: None,
            shasum: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_shasum(mut self, shasum: impl Into<String>) -> Self {
        self.shasum = Some(shasum.into());
        self
    }

    fn validate_package(&self, ecosystem: Ecosystem) -> Result<(), RequestError> {
        self.base.validate()?;
        if self.name.trim().is_empty() {
            return Err(RequestError::Validation {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        let declared = self.base.kind.ecosystem()?;
        if declared != Some(ecosystem) {
            return Err(RequestError::Validation {
                field: "type",
                reason: format!("{} is not a {} type", self.base.kind.name(), ecosystem),
            });
        }
        Ok(())
    }

    fn package_path(&self, ecosystem: Ecosystem) -> Result<ResultUploadPath, RequestError> {
        let (Some(version), Some(shasum)) = (&self.version, &self.shasum) else {
            return Err(RequestError::Validation {
                field: "version",
                reason: format!("{} has no resolved version and shasum", self.name),
            });
        };
        let filename = self.base.kind.components()?.filename();
        Ok(ResultUploadPath::new(vec![
            ecosystem.to_string(),
            self.name.clone(),
            version.clone(),
            shasum.clone(),
            filename,
        ]))
    }

    fn fmt_package(&self, ecosystem: Ecosystem, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}@{} [{}] id={}",
            ecosystem,
            self.name,
            self.version.as_deref().unwrap_or("latest"),
            self.base.kind.name(),
            self.base.snowflake_id
        )
    }
}

/// npm package scan request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpmRequest(pub PackageRequest);

/// PyPI package scan request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PypiRequest(pub PackageRequest);

impl AnalysisRequest for NopRequest {
    fn id(&self) -> &str {
        &self.base.snowflake_id
    }

    fn kind(&self) -> Type {
        self.base.kind
    }

    fn validate(&self) -> Result<(), RequestError> {
        self.base.validate()?;
        if self.base.kind.ecosystem()?.is_some() {
            return Err(RequestError::Validation {
                field: "type",
                reason: format!("{} requires a package", self.base.kind.name()),
            });
        }
        Ok(())
    }

    fn publishing(&self) -> Result<Vec<u8>, RequestError> {
        Ok(serde_json::to_vec(self)?)
    }

    fn results_path(&self) -> Result<ResultUploadPath, RequestError> {
        let filename = self.base.kind.components()?.filename();
        Ok(ResultUploadPath::new(vec![
            "nop".to_string(),
            self.base.snowflake_id.clone(),
            filename,
        ]))
    }
}

impl std::fmt::Display for NopRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "nop [{}] id={}", self.base.kind.name(), self.base.snowflake_id)
    }
}

macro_rules! package_request {
    ($request:ident, $ecosystem:expr) => {
        impl AnalysisRequest for $request {
            fn id(&self) -> &str {
                &self.0.base.snowflake_id
            }

            fn kind(&self) -> Type {
                self.0.base.kind
            }

            fn validate(&self) -> Result<(), RequestError> {
                self.0.validate_package($ecosystem)
            }

            fn publishing(&self) -> Result<Vec<u8>, RequestError> {
                Ok(serde_json::to_vec(self)?)
            }

            fn results_path(&self) -> Result<ResultUploadPath, RequestError> {
                self.0.package_path($ecosystem)
            }
        }

        impl std::fmt::Display for $request {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt_package($ecosystem, f)
            }
        }
    };
}

package_request!(NpmRequest, Ecosystem::Npm);
package_request!(PypiRequest, Ecosystem::Pypi);

/// Any analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Nop(NopRequest),
    Npm(NpmRequest),
    Pypi(PypiRequest),
}

impl Request {
    fn inner(&self) -> &dyn AnalysisRequest {
        match self {
            Request::Nop(r) => r,
            Request::Npm(r) => r,
            Request::Pypi(r) => r,
        }
    }

    pub fn base(&self) -> &Base {
        match self {
            Request::Nop(r) => &r.base,
            Request::Npm(r) => &r.0.base,
            Request::Pypi(r) => &r.0.base,
        }
    }

    fn base_mut(&mut self) -> &mut Base {
        match self {
            Request::Nop(r) => &mut r.base,
            Request::Npm(r) => &mut r.0.base,
            Request::Pypi(r) => &mut r.0.base,
        }
    }

    /// Package fields, `None` for NOP requests.
    pub fn package(&self) -> Option<&PackageRequest> {
        match self {
            Request::Nop(_) => None,
            Request::Npm(r) => Some(&r.0),
            Request::Pypi(r) => Some(&r.0),
        }
    }

    pub fn ecosystem(&self) -> Option<Ecosystem> {
        match self {
            Request::Nop(_) => None,
            Request::Npm(_) => Some(Ecosystem::Npm),
            Request::Pypi(_) => Some(Ecosystem::Pypi),
        }
    }

    /// Same request under another type of the same ecosystem.
    pub fn switch(&self, to: Type) -> Result<Request, RequestError> {
        if to.ecosystem()? != self.ecosystem() {
            return Err(RequestError::IncompatibleType {
                from: self.kind().name().to_string(),
                to: to.name().to_string(),
            });
        }
        let mut switched = self.clone();
        switched.base_mut().kind = to;
        Ok(switched)
    }

    /// Same request with a new snowflake identifier.
    pub fn with_id(mut self, snowflake_id: impl Into<String>) -> Request {
        self.base_mut().snowflake_id = snowflake_id.into();
        self
    }
}

impl AnalysisRequest for Request {
    fn id(&self) -> &str {
        self.inner().id()
    }

    fn kind(&self) -> Type {
        self.inner().kind()
    }

    fn validate(&self) -> Result<(), RequestError> {
        self.inner().validate()
    }

    fn publishing(&self) -> Result<Vec<u8>, RequestError> {
        self.inner().publishing()
    }

    fn results_path(&self) -> Result<ResultUploadPath, RequestError> {
        self.inner().results_path()
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.inner(), f)
    }
}

impl Serialize for Request {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Request::Nop(r) => r.serialize(serializer),
            Request::Npm(r) => r.serialize(serializer),
            Request::Pypi(r) => r.serialize(serializer),
        }
    }
}
