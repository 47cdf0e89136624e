use std::path::Path;
use std::time::Duration;

use bbb_io::ReferenceSource;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::RebuildError;

pub const DEFAULT_REFERENCE: &str = "data/bbb.bbt";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration. Every field has a default, so an empty document (or
/// no config file at all) describes the standard run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RebuildConfig {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub dates: DatesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_demographics")]
    pub demographics: String,
    #[serde(default = "default_nonbook")]
    pub nonbook: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_description")]
    pub description: String,
}

fn default_demographics() -> String {
    "data/bbb_demographics.tsv".into()
}

fn default_nonbook() -> String {
    "data/bbb_nonbook.xls".into()
}

fn default_database() -> String {
    "data/bbb.sqlite".into()
}

fn default_description() -> String {
    "data/bbb_description.txt".into()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            demographics: default_demographics(),
            nonbook: default_nonbook(),
            database: default_database(),
            description: default_description(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reference
// ---------------------------------------------------------------------------

/// Where the reference table is read from. `path` pins a local copy; `url`
/// downloads it on every run. Neither set means [`DEFAULT_REFERENCE`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// Download timeout. Unset means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ReferenceConfig {
    pub fn source(&self) -> ReferenceSource {
        match (&self.url, &self.path) {
            (Some(url), _) => ReferenceSource::Url(url.clone()),
            (None, Some(path)) => ReferenceSource::Path(path.into()),
            (None, None) => ReferenceSource::Path(DEFAULT_REFERENCE.into()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Replace the configured location with `location` (URL or path).
    pub fn set_location(&mut self, location: &str) {
        match ReferenceSource::parse(location) {
            ReferenceSource::Url(url) => {
                self.url = Some(url);
                self.path = None;
            }
            ReferenceSource::Path(_) => {
                self.url = None;
                self.path = Some(location.to_string());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DatesConfig {
    /// Day zero for integer purchase dates.
    #[serde(default = "default_epoch")]
    pub epoch: NaiveDate,
    /// "Today" for recency in months.
    #[serde(default = "default_reference_date")]
    pub reference_date: NaiveDate,
}

fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn default_reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 3, 8).unwrap_or_default()
}

impl Default for DatesConfig {
    fn default() -> Self {
        Self {
            epoch: default_epoch(),
            reference_date: default_reference_date(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
}

fn default_output_path() -> String {
    "data/bbb_rec.bbt".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { path: default_output_path() }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RebuildConfig {
    pub fn from_toml(input: &str) -> Result<Self, RebuildError> {
        let config: RebuildConfig =
            toml::from_str(input).map_err(|e| RebuildError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, RebuildError> {
        let input = std::fs::read_to_string(path).map_err(|e| {
            RebuildError::ConfigParse(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&input)
    }

    pub fn validate(&self) -> Result<(), RebuildError> {
        if self.dates.reference_date < self.dates.epoch {
            return Err(RebuildError::ConfigValidation(format!(
                "reference_date {} precedes epoch {}",
                self.dates.reference_date, self.dates.epoch
            )));
        }

        if self.reference.url.is_some() && self.reference.path.is_some() {
            return Err(RebuildError::ConfigValidation(
                "reference: set either url or path, not both".into(),
            ));
        }

        if self.reference.timeout_secs == Some(0) {
            return Err(RebuildError::ConfigValidation(
                "reference.timeout_secs must be greater than 0; omit it for no timeout".into(),
            ));
        }

        let paths = [
            ("sources.demographics", &self.sources.demographics),
            ("sources.nonbook", &self.sources.nonbook),
            ("sources.database", &self.sources.database),
            ("sources.description", &self.sources.description),
            ("output.path", &self.output.path),
        ];
        for (field, value) in paths {
            if value.trim().is_empty() {
                return Err(RebuildError::ConfigValidation(format!("{field} must not be empty")));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
