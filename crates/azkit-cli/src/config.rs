//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by reference. The
//! CLI layer owns it; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (applied by each command)
//! 2. `AZKIT_*` environment variables, e.g. `AZKIT_DEFAULTS__PACKAGE_NAME`
//! 3. The TOML file (`--config` or the platform config directory)
//! 4. Built-in defaults

use std::fs;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CliError, CliResult};

const ENV_PREFIX: &str = "AZKIT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fallbacks for `azkit add` and `azkit package` flags.
    pub defaults: Defaults,
    pub package: PackageConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub package_name: Option<String>,
    pub source_root: Option<PathBuf>,
    /// Parent of the per-app staging directory, relative to the project.
    pub staging_directory: PathBuf,
    pub template: Option<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            package_name: None,
            source_root: None,
            staging_directory: PathBuf::from("target").join("azure-functions"),
            template: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    pub skip_install_extensions: bool,
    pub final_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

impl AppConfig {
    /// Layer defaults, the config file and the environment.
    ///
    /// An explicit `config_file` must exist; the default location is optional.
    pub fn load(config_file: Option<&PathBuf>) -> CliResult<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.clone(), true),
            None => (Self::config_path(), false),
        };

        let defaults = Config::try_from(&Self::default()).map_err(config_error)?;
        Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Toml).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error)
    }

    /// Path to the default configuration file.
    ///
    /// Falls back to `.azkit.toml` in the current directory when the platform
    /// has no config directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "azkit", "azkit")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".azkit.toml"))
    }

    /// Every dotted key with its current value, sorted by key.
    pub fn entries(&self) -> CliResult<Vec<(String, Value)>> {
        let mut entries = Vec::new();
        flatten("", &self.to_json()?, &mut entries);
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    /// Value of a dotted key such as `package.final_name`.
    pub fn get(&self, key: &str) -> CliResult<Value> {
        self.entries()?
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| CliError::UnknownConfigKey { key: key.into() })
    }

    fn to_json(&self) -> CliResult<Value> {
        serde_json::to_value(self).map_err(|e| CliError::ConfigError {
            message: "cannot serialize configuration".into(),
            source: Some(Box::new(e)),
        })
    }
}

/// Persist `key = value` in the TOML file at `path`, keeping other entries.
///
/// Boolean keys only accept `true`/`false`; an empty value removes an
/// optional key.
pub fn set_value(path: &Path, key: &str, value: &str) -> CliResult<()> {
    let current = AppConfig::default().get(key)?;
    let (section, field) = key
        .split_once('.')
        .ok_or_else(|| CliError::UnknownConfigKey { key: key.into() })?;

    let mut document: toml::Table = match fs::read_to_string(path) {
        Ok(text) => toml::from_str(&text).map_err(|e| CliError::ConfigError {
            message: format!("cannot parse {}", path.display()),
            source: Some(Box::new(e)),
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
        Err(e) => return Err(e.into()),
    };

    let table = document
        .entry(section)
        .or_insert_with(|| toml::Value::Table(toml::Table::new()))
        .as_table_mut()
        .ok_or_else(|| CliError::ConfigError {
            message: format!("'{section}' in {} is not a table", path.display()),
            source: None,
        })?;

    if current.is_boolean() {
        let parsed = value.parse::<bool>().map_err(|_| CliError::InvalidInput {
            message: format!("'{key}' expects true or false, got '{value}'"),
            source: None,
        })?;
        table.insert(field.to_string(), toml::Value::Boolean(parsed));
    } else if value.is_empty() && current.is_null() {
        table.remove(field);
    } else {
        table.insert(field.to_string(), toml::Value::String(value.to_string()));
    }

    let text = toml::to_string_pretty(&document).map_err(|e| CliError::ConfigError {
        message: "cannot serialize configuration".into(),
        source: Some(Box::new(e)),
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        leaf => out.push((prefix.to_string(), leaf.clone())),
    }
}

fn config_error(err: config::ConfigError) -> CliError {
    CliError::ConfigError {
        message: err.to_string(),
        source: Some(Box::new(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_stage_under_target() {
        let cfg = AppConfig::default();
        assert_eq!(
            cfg.defaults.staging_directory,
            PathBuf::from("target").join("azure-functions")
        );
        assert!(!cfg.package.skip_install_extensions);
        assert_eq!(cfg.output.format, "auto");
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("azkit.toml");
        fs::write(
            &path,
            "[defaults]\npackage_name = \"com.contoso\"\n\n[package]\nskip_install_extensions = true\n",
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.defaults.package_name.as_deref(), Some("com.contoso"));
        assert!(cfg.package.skip_install_extensions);
        assert_eq!(cfg.output.format, "auto");
    }

    #[test]
    fn missing_explicit_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn get_reads_dotted_keys() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("output.no_color").unwrap(), Value::Bool(false));
        assert_eq!(cfg.get("defaults.template").unwrap(), Value::Null);
        assert!(matches!(
            cfg.get("defaults.language"),
            Err(CliError::UnknownConfigKey { .. })
        ));
    }

    #[test]
    fn set_value_round_trips_through_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        set_value(&path, "package.final_name", "orders-1.0").unwrap();
        set_value(&path, "package.skip_install_extensions", "true").unwrap();
        set_value(&path, "defaults.template", "TimerTrigger").unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.package.final_name.as_deref(), Some("orders-1.0"));
        assert!(cfg.package.skip_install_extensions);
        assert_eq!(cfg.defaults.template.as_deref(), Some("TimerTrigger"));

        set_value(&path, "defaults.template", "").unwrap();
        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.defaults.template, None);
    }

    #[test]
    fn set_value_rejects_non_boolean_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let err = set_value(&path, "output.no_color", "sometimes").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(!path.exists());
    }
}
