//! Pipeline configuration.

use crate::dates::DateZone;
use crate::error::{PipelineError, Result};
use crate::flag::UnparsablePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one pipeline run.
///
/// Every field has a default, so a YAML file only needs the keys it changes:
///
/// ```
/// use lifecycle_core::{DateZone, PipelineConfig};
///
/// let config = PipelineConfig::from_yaml_str("primary_table: Lifecycle\ndate_zone: utc\n").unwrap();
/// assert_eq!(config.primary_table, "Lifecycle");
/// assert_eq!(config.reference_table, "GFE");
/// assert_eq!(config.date_zone, DateZone::Utc);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Table holding the rows to reconcile.
    pub primary_table: String,
    /// Authoritative table the primary rows are joined against.
    pub reference_table: String,
    /// First data row of the primary table (rows above are headers).
    pub start_row: usize,
    /// Header rows skipped at the top of the reference table.
    pub reference_header_rows: usize,
    /// Upper-case season codes during normalization.
    pub uppercase_season: bool,
    /// Wall clock used to read offset-less dates and to format output.
    pub date_zone: DateZone,
    /// How the change flagger treats non-blank text that is not a date.
    pub unparsable: UnparsablePolicy,
    /// Mirror table written by the clean export.
    pub clean_table: String,
    /// Mirror table written by the reference copy.
    pub reference_mirror_table: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            primary_table: "Main".to_string(),
            reference_table: "GFE".to_string(),
            start_row: 2,
            reference_header_rows: 1,
            uppercase_season: true,
            date_zone: DateZone::Local,
            unparsable: UnparsablePolicy::AsBlank,
            clean_table: "Clean".to_string(),
            reference_mirror_table: "GFE_Clean".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Decode a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(text)?;
        Ok(config)
    }

    /// Decode a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Set the primary and reference table names
    #[must_use]
    pub fn with_tables(mut self, primary: &str, reference: &str) -> Self {
        self.primary_table = primary.to_string();
        self.reference_table = reference.to_string();
        self
    }

    /// Set the first data row of the primary table
    #[must_use]
    pub fn with_start_row(mut self, start_row: usize) -> Self {
        self.start_row = start_row;
        self
    }

    /// Set the number of reference header rows
    #[must_use]
    pub fn with_reference_header_rows(mut self, rows: usize) -> Self {
        self.reference_header_rows = rows;
        self
    }

    /// Set whether seasons are upper-cased
    #[must_use]
    pub fn with_uppercase_season(mut self, uppercase: bool) -> Self {
        self.uppercase_season = uppercase;
        self
    }

    /// Set the date zone
    #[must_use]
    pub fn with_date_zone(mut self, zone: DateZone) -> Self {
        self.date_zone = zone;
        self
    }

    /// Set the unparsable-date policy
    #[must_use]
    pub fn with_unparsable(mut self, policy: UnparsablePolicy) -> Self {
        self.unparsable = policy;
        self
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("primary_table", &self.primary_table),
            ("reference_table", &self.reference_table),
            ("clean_table", &self.clean_table),
            ("reference_mirror_table", &self.reference_mirror_table),
        ];
        if let Some((field, _)) = names.iter().find(|(_, name)| name.trim().is_empty()) {
            return Err(PipelineError::Config(format!("{field} must not be empty")));
        }
        if self.primary_table == self.reference_table {
            return Err(PipelineError::Config(format!(
                "primary and reference table are both '{}'",
                self.primary_table
            )));
        }
        for (field, mirror) in [
            ("clean_table", &self.clean_table),
            ("reference_mirror_table", &self.reference_mirror_table),
        ] {
            if *mirror == self.primary_table || *mirror == self.reference_table {
                return Err(PipelineError::Config(format!(
                    "{field} '{mirror}' would overwrite an input table"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_defaults_match_workbook_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.primary_table, "Main");
        assert_eq!(config.reference_table, "GFE");
        assert_eq!(config.start_row, 2);
        assert_eq!(config.reference_header_rows, 1);
        assert!(config.uppercase_season);
        assert_eq!(config.unparsable, UnparsablePolicy::AsBlank);
        config.validate().unwrap();
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = "start_row: 1\nuppercase_season: false\ndate_zone: '+02:00'\nunparsable: distinct\n";
        let config = PipelineConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.start_row, 1);
        assert!(!config.uppercase_season);
        assert_eq!(
            config.date_zone,
            DateZone::Fixed(FixedOffset::east_opt(7200).unwrap())
        );
        assert_eq!(config.unparsable, UnparsablePolicy::Distinct);
        assert_eq!(config.clean_table, "Clean");
    }

    #[test]
    fn test_yaml_rejects_unknown_keys() {
        let result = PipelineConfig::from_yaml_str("start_rwo: 3\n");
        assert!(matches!(result, Err(PipelineError::Yaml(_))));
    }

    #[test]
    fn test_yaml_rejects_bad_zone() {
        let result = PipelineConfig::from_yaml_str("date_zone: mars\n");
        assert!(matches!(result, Err(PipelineError::Yaml(_))));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = PipelineConfig::default()
            .with_tables("Lifecycle", "Master")
            .with_date_zone(DateZone::Utc);
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert_eq!(PipelineConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_same_tables() {
        let config = PipelineConfig::default().with_tables("Main", "Main");
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let config = PipelineConfig::default().with_tables(" ", "GFE");
        assert!(matches!(config.validate(), Err(PipelineError::Config(msg)) if msg.contains("primary_table")));
    }

    #[test]
    fn test_validate_rejects_mirror_over_input() {
        let config = PipelineConfig {
            clean_table: "GFE".to_string(),
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }
}
