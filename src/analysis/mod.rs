//! Analysis types and requests.
//!
//! - [`urn`] — RFC 8141 URN parsing and normalization.
//! - [`components`] — the structured form of a type name
//!   (`collector,actions!ecosystem,actions.format`, optionally `parent+enricher`).
//! - [`types`] — the closed set of registered analysis types and their URNs.
//! - [`request`] — NOP, npm and PyPI analysis requests.
//! - [`builder`] — decode raw request JSON and enrich it from a registry.
//! - [`path`] — where a request's results are stored.
//! - [`generate`] — random valid requests.
//! - [`seal`] — opaque encrypted type tokens.

pub mod builder;
pub mod components;
pub mod generate;
pub mod path;
pub mod request;
pub mod seal;
pub mod types;
pub mod urn;

pub use builder::Builder;
pub use components::TypeComponents;
pub use path::ResultUploadPath;
pub use request::{AnalysisRequest, Request};
pub use types::Type;
pub use urn::Urn;
