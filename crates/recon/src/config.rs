use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::view::ResultView;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// What to do when a key appears more than once within one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with every duplicated key listed.
    Error,
    /// Keep the earliest row for the key.
    FirstWins,
    /// Keep the latest row for the key. The key keeps the position of its
    /// first occurrence.
    #[default]
    LastWins,
    /// Classify the key as ambiguous and list every row carrying it.
    Report,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::FirstWins => "first_wins",
            Self::LastWins => "last_wins",
            Self::Report => "report",
        }
    }
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a row whose key cell is absent or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingKeyPolicy {
    #[default]
    Error,
    Skip,
}

impl MissingKeyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Skip => "skip",
        }
    }
}

impl std::fmt::Display for MissingKeyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconOptions {
    #[serde(default)]
    pub on_duplicate: DuplicatePolicy,
    #[serde(default)]
    pub on_missing_key: MissingKeyPolicy,
}

// ---------------------------------------------------------------------------
// Job file
// ---------------------------------------------------------------------------

/// A reconciliation job loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    pub key: String,
    /// Columns to compare. All common columns except the key when absent.
    #[serde(default)]
    pub compare: Option<Vec<String>>,
    #[serde(default)]
    pub on_duplicate: DuplicatePolicy,
    #[serde(default)]
    pub on_missing_key: MissingKeyPolicy,
    pub left: SourceConfig,
    pub right: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Path, relative to the job file's directory.
    pub file: String,
    #[serde(default)]
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
    Csv,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub view: ResultView,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub file: Option<String>,
}

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: ReconConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation("name must not be empty".into()));
        }
        if self.key.trim().is_empty() {
            return Err(ConfigError::Validation("key must not be empty".into()));
        }
        if let Some(compare) = &self.compare {
            if compare.is_empty() {
                return Err(ConfigError::Validation(
                    "compare must list at least one column (omit it to compare all common columns)".into(),
                ));
            }
            if let Some(blank) = compare.iter().position(|c| c.trim().is_empty()) {
                return Err(ConfigError::Validation(format!("compare[{blank}] is empty")));
            }
        }
        for (side, source) in [("left", &self.left), ("right", &self.right)] {
            if source.file.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{side}.file must not be empty")));
            }
        }
        Ok(())
    }

    pub fn options(&self) -> ReconOptions {
        ReconOptions {
            on_duplicate: self.on_duplicate,
            on_missing_key: self.on_missing_key,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "march close"
key = "id"
compare = ["name", "val"]
on_duplicate = "first_wins"

[left]
file = "ledger.xlsx"
sheet = "March"

[right]
file = "bank.csv"

[output]
view = "mismatches"
format = "text"
"#;

    #[test]
    fn parse_valid() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "march close");
        assert_eq!(config.key, "id");
        assert_eq!(config.compare.as_deref(), Some(&["name".to_string(), "val".to_string()][..]));
        assert_eq!(config.on_duplicate, DuplicatePolicy::FirstWins);
        assert_eq!(config.on_missing_key, MissingKeyPolicy::Error);
        assert_eq!(config.left.sheet.as_deref(), Some("March"));
        assert!(config.right.sheet.is_none());
        assert_eq!(config.output.view, ResultView::Mismatches);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn defaults_apply() {
        let config = ReconConfig::from_toml(
            r#"
name = "n"
key = "id"
[left]
file = "a.csv"
[right]
file = "b.csv"
"#,
        )
        .unwrap();
        assert!(config.compare.is_none());
        assert_eq!(config.options(), ReconOptions::default());
        assert_eq!(config.options().on_duplicate, DuplicatePolicy::LastWins);
        assert_eq!(config.output.view, ResultView::All);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn empty_key_rejected() {
        let err = ReconConfig::from_toml(
            r#"
name = "n"
key = " "
[left]
file = "a.csv"
[right]
file = "b.csv"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("key must not be empty"), "{err}");
    }

    #[test]
    fn empty_compare_rejected() {
        let err = ReconConfig::from_toml(
            r#"
name = "n"
key = "id"
compare = []
[left]
file = "a.csv"
[right]
file = "b.csv"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn unknown_policy_is_parse_error() {
        let err = ReconConfig::from_toml(
            r#"
name = "n"
key = "id"
on_duplicate = "newest"
[left]
file = "a.csv"
[right]
file = "b.csv"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_right_is_parse_error() {
        let err = ReconConfig::from_toml("name = \"n\"\nkey = \"id\"\n[left]\nfile = \"a.csv\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
