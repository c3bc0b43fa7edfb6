//! TOML configuration with `$VAR` environment substitution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NipError, Result};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "NIP_CONFIG";

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "nip.toml";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the `html/` and `templates/` trees.
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("storage"),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct EditorConfig {
    /// How long after its own edit an editor ignores incoming values.
    pub echo_window_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { echo_window_ms: 50 }
    }
}

impl EditorConfig {
    pub fn echo_window(&self) -> Duration {
        Duration::from_millis(self.echo_window_ms)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `nip_renderer=debug`. `RUST_LOG` wins.
    pub level: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub editor: EditorConfig,
    pub log: LogConfig,
}

impl Config {
    /// Load a config file, substituting environment variables.
    pub fn load(config_file: impl AsRef<Path>) -> Result<Config> {
        let config_file = config_file.as_ref();
        let config_string = std::fs::read_to_string(config_file).map_err(|e| {
            NipError::Config(format!(
                "error reading config file {}: {e}",
                config_file.display()
            ))
        })?;
        Self::from_toml_str(&config_string)
    }

    /// Load `path` if given, else `$NIP_CONFIG`, else `nip.toml`.
    ///
    /// Returns the file that was read alongside the config, or `None` when no
    /// default file exists and the defaults were used. A missing file that
    /// was asked for explicitly is an error.
    pub fn discover(path: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
        let found = match path {
            Some(path) => Some(path.to_path_buf()),
            None => match std::env::var(CONFIG_ENV) {
                Ok(path) => Some(PathBuf::from(path)),
                Err(_) => {
                    let default = Path::new(DEFAULT_CONFIG_FILE);
                    default.exists().then(|| default.to_path_buf())
                }
            },
        };
        match found {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Config::default(), None)),
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Config> {
        let substituted = substitute_env(raw, std::env::vars());
        Ok(toml::from_str(&substituted)?)
    }
}

/// Replace `$NAME` with the value of each variable in `vars`.
///
/// Longer names are substituted first so `$NIP_ROOT_DIR` is not clobbered by
/// `$NIP_ROOT`.
pub fn substitute_env(raw: &str, vars: impl IntoIterator<Item = (String, String)>) -> String {
    let mut vars: Vec<(String, String)> = vars.into_iter().collect();
    vars.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = raw.to_owned();
    for (k, v) in vars {
        out = out.replace(&format!("${k}"), &v);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.storage.root, PathBuf::from("storage"));
        assert_eq!(config.editor.echo_window(), Duration::from_millis(50));
        assert_eq!(config.log.level, None);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            r#"
            [editor]
            echo_window_ms = 120

            [log]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.editor.echo_window_ms, 120);
        assert_eq!(config.log.level.as_deref(), Some("debug"));
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_substitution_prefers_longer_names() {
        let vars = [
            ("NIP_ROOT".to_string(), "/short".to_string()),
            ("NIP_ROOT_DIR".to_string(), "/long".to_string()),
        ];
        let out = substitute_env("a = \"$NIP_ROOT_DIR\"\nb = \"$NIP_ROOT\"", vars);
        assert_eq!(out, "a = \"/long\"\nb = \"/short\"");
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(matches!(
            Config::from_toml_str("[storage\nroot = 1"),
            Err(NipError::Serde(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nip.toml");
        std::fs::write(&path, "[storage]\nroot = \"/srv/nip\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/srv/nip"));
        assert!(matches!(
            Config::load(dir.path().join("missing.toml")),
            Err(NipError::Config(_))
        ));
    }

    #[test]
    fn test_discover_reports_the_file_it_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[editor]\necho_window_ms = 80\n").unwrap();

        let (config, found) = Config::discover(Some(&path)).unwrap();
        assert_eq!(found, Some(path));
        assert_eq!(config.editor.echo_window(), Duration::from_millis(80));
        assert!(Config::discover(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
