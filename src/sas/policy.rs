use chrono::Duration;
use clap::ValueEnum;
use serde::Deserialize;

/// Permission level applied to every entry in a run.
///
/// The flag strings follow the canonical service-SAS ordering, so they can
/// be passed to the signer as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionLevel {
    /// Read only
    Read,
    /// Read, add, create and write
    ReadWrite,
    /// Read, add, create, write and delete
    Full,
}

impl PermissionLevel {
    pub fn all() -> [PermissionLevel; 3] {
        [
            PermissionLevel::Read,
            PermissionLevel::ReadWrite,
            PermissionLevel::Full,
        ]
    }

    /// SAS `sp` parameter value.
    pub fn flags(&self) -> &'static str {
        match self {
            PermissionLevel::Read => "r",
            PermissionLevel::ReadWrite => "racw",
            PermissionLevel::Full => "racwd",
        }
    }

    /// Human label used in the select prompt.
    pub fn label(&self) -> &'static str {
        match self {
            PermissionLevel::Read => "Read only (r)",
            PermissionLevel::ReadWrite => "Read & write (racw)",
            PermissionLevel::Full => "Full, including delete (racwd)",
        }
    }
}

/// A named validity duration offered in the select prompt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidityPreset {
    pub label: String,
    pub minutes: u32,
}

impl ValidityPreset {
    pub fn new(label: &str, minutes: u32) -> Self {
        Self {
            label: label.to_string(),
            minutes,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes))
    }

    /// Built-in presets used when no config file overrides them.
    pub fn defaults() -> Vec<ValidityPreset> {
        vec![
            ValidityPreset::new("30 minutes", 30),
            ValidityPreset::new("1 hour", 60),
            ValidityPreset::new("4 hours", 4 * 60),
            ValidityPreset::new("24 hours", 24 * 60),
            ValidityPreset::new("7 days", 7 * 24 * 60),
        ]
    }
}

/// Policy choices collected once per run and applied to all entries.
#[derive(Debug, Clone, Copy)]
pub struct PolicyChoice {
    pub validity: Duration,
    pub permissions: PermissionLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_follow_canonical_order() {
        assert_eq!(PermissionLevel::Read.flags(), "r");
        assert_eq!(PermissionLevel::ReadWrite.flags(), "racw");
        assert_eq!(PermissionLevel::Full.flags(), "racwd");
    }

    #[test]
    fn test_default_presets() {
        let presets = ValidityPreset::defaults();
        assert_eq!(presets.len(), 5);
        assert_eq!(presets[0].duration(), Duration::minutes(30));
        assert_eq!(presets[4].duration(), Duration::days(7));
    }

    #[test]
    fn test_preset_deserializes_from_yaml() {
        let preset: ValidityPreset = serde_yaml::from_str("label: 2 hours\nminutes: 120").unwrap();
        assert_eq!(preset, ValidityPreset::new("2 hours", 120));
    }
}
