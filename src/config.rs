use crate::sas::{PermissionLevel, ValidityPreset};
use crate::traits::FileSystem;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Optional user configuration for prompt defaults.
///
/// Lives at `<config dir>/sasgen/config.yaml`; a missing file means
/// built-in defaults. Nothing here is ever written by the tool itself.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Permission level applied without prompting when set
    #[serde(default)]
    pub default_permissions: Option<PermissionLevel>,

    /// Validity presets offered in the select prompt
    #[serde(default = "ValidityPreset::defaults")]
    pub validity_presets: Vec<ValidityPreset>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_permissions: None,
            validity_presets: ValidityPreset::defaults(),
        }
    }
}

impl Config {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sasgen").join("config.yaml"))
    }

    /// Load the user config, falling back to defaults when absent.
    pub fn load(fs: &dyn FileSystem) -> Result<Config> {
        match Self::path() {
            Some(path) if fs.exists(&path) => Self::load_from(fs, &path),
            _ => Ok(Config::default()),
        }
    }

    fn load_from(fs: &dyn FileSystem, path: &Path) -> Result<Config> {
        let raw = fs.read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        if config.validity_presets.is_empty() {
            bail!("config file {:?} must define at least one validity preset", path);
        }
        Ok(config)
    }

    /// Look up a validity preset by its label.
    pub fn preset(&self, label: &str) -> Option<&ValidityPreset> {
        let wanted = label.trim();
        self.validity_presets
            .iter()
            .find(|preset| preset.label.eq_ignore_ascii_case(wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockFileSystem;

    #[test]
    fn test_defaults_when_file_missing() {
        let fs = MockFileSystem::new();
        let config = Config::load(&fs).unwrap();
        assert_eq!(config.validity_presets, ValidityPreset::defaults());
        assert_eq!(config.default_permissions, None);
    }

    #[test]
    fn test_load_from_yaml() {
        let fs = MockFileSystem::new();
        let path = Path::new("/home/user/.config/sasgen/config.yaml");
        fs.seed(
            path,
            "default_permissions: read-write\nvalidity_presets:\n  - label: 2 hours\n    minutes: 120\n",
        );

        let config = Config::load_from(&fs, path).unwrap();
        assert_eq!(config.default_permissions, Some(PermissionLevel::ReadWrite));
        assert_eq!(config.validity_presets.len(), 1);
        assert_eq!(config.preset("2 HOURS").unwrap().minutes, 120);
    }

    #[test]
    fn test_missing_presets_fall_back_to_defaults() {
        let fs = MockFileSystem::new();
        let path = Path::new("/cfg/config.yaml");
        fs.seed(path, "default_permissions: full\n");

        let config = Config::load_from(&fs, path).unwrap();
        assert_eq!(config.validity_presets, ValidityPreset::defaults());
    }

    #[test]
    fn test_empty_preset_list_is_rejected() {
        let fs = MockFileSystem::new();
        let path = Path::new("/cfg/config.yaml");
        fs.seed(path, "validity_presets: []\n");

        assert!(Config::load_from(&fs, path).is_err());
    }

    #[test]
    fn test_unknown_preset_lookup() {
        let config = Config::default();
        assert!(config.preset("1 hour").is_some());
        assert!(config.preset("13 fortnights").is_none());
    }
}
