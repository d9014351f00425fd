use serde::Serialize;

/// Storage key for analysis results.
///
/// Package requests map to `<ecosystem>/<name>/<version>/<shasum>/<file>`,
/// NOP requests to `nop/<snowflake>/<file>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResultUploadPath(Vec<String>);

impl ResultUploadPath {
    pub(crate) fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment, the result file name.
    pub fn filename(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl std::fmt::Display for ResultUploadPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}
