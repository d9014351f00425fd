//! `pkgsec` — analysis types, requests and verdicts for package security scanning.
//!
//! # Flow
//! 1. Every analysis type has a URN ([`analysis::types::Type`]); the table is
//!    checked once with [`analysis::types::init`].
//! 2. Raw request JSON is decoded by [`analysis::Builder`], which resolves
//!    missing versions and shasums from a [`registry::Registry`].
//! 3. Results are stored under the request's [`analysis::ResultUploadPath`]
//!    through an [`upload::Uploader`].
//! 4. Collectors emit [`verdict::Verdicts`], which can be filtered with
//!    `JSONPath`.

pub mod analysis;
pub mod config;
pub mod detector;
pub mod error;
pub mod models;
pub mod registry;
pub mod upload;
pub mod util;
pub mod verdict;

pub use analysis::{AnalysisRequest, Builder, Request, ResultUploadPath, Type};
pub use models::Ecosystem;
pub use verdict::{Severity, Verdict, Verdicts};
