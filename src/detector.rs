use std::path::Path;

use crate::models::{Ecosystem, FileKind};

const NPM_MANIFESTS: &[&str] = &["package.json"];
const NPM_LOCKFILES: &[&str] = &["package-lock.json", "npm-shrinkwrap.json", "yarn.lock", "pnpm-lock.yaml"];
const PYPI_MANIFESTS: &[&str] = &["requirements.txt", "pyproject.toml", "setup.py", "setup.cfg", "Pipfile"];
const PYPI_LOCKFILES: &[&str] = &["Pipfile.lock", "poetry.lock", "pdm.lock", "uv.lock"];

/// Identify a dependency file by its file name.
pub fn classify_path(path: &Path) -> Option<(Ecosystem, FileKind)> {
    let name = path.file_name()?.to_str()?;
    let table = [
        (Ecosystem::Npm, FileKind::Manifest, NPM_MANIFESTS),
        (Ecosystem::Npm, FileKind::Lockfile, NPM_LOCKFILES),
        (Ecosystem::Pypi, FileKind::Manifest, PYPI_MANIFESTS),
        (Ecosystem::Pypi, FileKind::Lockfile, PYPI_LOCKFILES),
    ];
    table
        .into_iter()
        .find(|(_, _, names)| names.contains(&name))
        .map(|(ecosystem, kind, _)| (ecosystem, kind))
}

pub fn is_manifest(path: &Path) -> bool {
    matches!(classify_path(path), Some((_, FileKind::Manifest)))
}

pub fn is_lockfile(path: &Path) -> bool {
    matches!(classify_path(path), Some((_, FileKind::Lockfile)))
}

/// Auto-detect supported ecosystems by scanning a directory for known
/// manifest and lock files. Only the top level is inspected.
pub fn detect_ecosystems(path: &Path) -> Vec<Ecosystem> {
    let mut ecosystems = Vec::new();

    if NPM_MANIFESTS.iter().chain(NPM_LOCKFILES).any(|f| path.join(f).exists()) {
        ecosystems.push(Ecosystem::Npm);
    }

    if PYPI_MANIFESTS.iter().chain(PYPI_LOCKFILES).any(|f| path.join(f).exists()) {
        ecosystems.push(Ecosystem::Pypi);
    }

    ecosystems
}
