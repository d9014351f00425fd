use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::registry::{npm, pypi};

/// Root configuration structure, deserialized from `.pkgsec/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Registry endpoints and HTTP settings.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub npm_url: String,
    pub pypi_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// How many requests are enriched concurrently.
    pub batch_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            npm_url: npm::DEFAULT_URL.to_string(),
            pypi_url: pypi::DEFAULT_URL.to_string(),
            timeout_secs: 10,
            user_agent: format!("pkgsec/{}", env!("CARGO_PKG_VERSION")),
            batch_size: 75,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Load configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.pkgsec/config.toml`
/// 3. `~/.config/pkgsec/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".pkgsec").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config: PathBuf = home.join(".config").join("pkgsec").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.registry.npm_url, "https://registry.npmjs.org");
        assert_eq!(cfg.registry.pypi_url, "https://pypi.org");
        assert_eq!(cfg.registry.timeout_secs, 10);
        assert_eq!(cfg.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "[registry]").unwrap();
        writeln!(f, "npm_url = \"http://localhost:4873\"").unwrap();
        writeln!(f, "[log]").unwrap();
        writeln!(f, "format = \"json\"").unwrap();

        let cfg = load_config(Path::new("/nonexistent"), Some(f.path())).unwrap();
        assert_eq!(cfg.registry.npm_url, "http://localhost:4873");
        assert_eq!(cfg.registry.batch_size, 75);
        assert_eq!(cfg.log.format, LogFormat::Json);
        assert_eq!(cfg.log.level, "warn");
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "[log]\nformat = \"xml\"").unwrap();
        let err = load_config(Path::new("/nonexistent"), Some(f.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_project_config_found() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".pkgsec")).unwrap();
        std::fs::write(
            dir.path().join(".pkgsec").join("config.toml"),
            "[registry]\ntimeout_secs = 3\n",
        )
        .unwrap();
        let cfg = load_config(dir.path(), None).unwrap();
        assert_eq!(cfg.registry.timeout_secs, 3);
    }

    #[test]
    fn test_missing_override_is_io_error() {
        let err = load_config(Path::new("."), Some(Path::new("/nonexistent/pkgsec.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
