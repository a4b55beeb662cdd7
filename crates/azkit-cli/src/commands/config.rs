//! `azkit config`: read and write configuration values.

use std::path::PathBuf;

use serde_json::Value;

use crate::{
    cli::{ConfigCommands, OutputFormat},
    config::{self, AppConfig},
    error::CliResult,
    output::OutputManager,
};

/// `config_file` is the `--config` override, if any.
pub fn execute(
    cmd: ConfigCommands,
    config: &AppConfig,
    config_file: Option<PathBuf>,
    output: &OutputManager,
) -> CliResult<()> {
    let path = config_file.unwrap_or_else(AppConfig::config_path);

    match cmd {
        ConfigCommands::Get { key } => {
            let value = config.get(&key)?;
            output.data(&display_value(&value))?;
        }

        ConfigCommands::Set { key, value } => {
            config::set_value(&path, &key, &value)?;
            output.success(&format!("Set {key} = {value} in {}", path.display()))?;
        }

        ConfigCommands::List => {
            if output.format() == OutputFormat::Json {
                output.json(config)?;
            } else {
                for (key, value) in config.entries()? {
                    output.data(&format!("{key} = {}", display_value(&value)))?;
                }
            }
        }

        ConfigCommands::Path => {
            output.data(&path.display().to_string())?;
        }
    }

    Ok(())
}

/// Strings print bare, unset values print empty.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_print_without_json_quoting() {
        assert_eq!(display_value(&json!("com.example")), "com.example");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&Value::Null), "");
    }

    #[test]
    fn every_default_key_is_listed() {
        let keys: Vec<_> = AppConfig::default()
            .entries()
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        for expected in [
            "defaults.package_name",
            "defaults.source_root",
            "defaults.staging_directory",
            "defaults.template",
            "output.format",
            "output.no_color",
            "package.final_name",
            "package.skip_install_extensions",
        ] {
            assert!(keys.iter().any(|k| k == expected), "missing {expected}");
        }
    }
}
