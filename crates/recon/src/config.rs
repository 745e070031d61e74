use serde::Deserialize;

use crate::engine::ReconOptions;
use crate::error::ReconError;
use crate::keys::DuplicatePolicy;

pub const DEFAULT_MAX_DETAILS: usize = 200;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// One comparison job, loaded from a `.toml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub table: String,
    /// Raw SQL filter applied to both sides.
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
    #[serde(default)]
    pub on_duplicate: DuplicatePolicy,
    pub source: EndpointConfig,
    pub target: EndpointConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// `sqlite:///path.db`, a `.db`/`.sqlite` path, or a `.csv` path.
    pub location: String,
}

/// Omitting both fields means "auto-detect from the source, else fingerprint".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysConfig {
    #[serde(default)]
    pub pk: Option<String>,
    #[serde(default)]
    pub composite: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default = "default_max_details")]
    pub max_details: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            json: None,
            max_details: DEFAULT_MAX_DETAILS,
        }
    }
}

fn default_max_details() -> usize {
    DEFAULT_MAX_DETAILS
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl JobConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: JobConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.table.trim().is_empty() {
            return Err(ReconError::ConfigValidation("table must not be empty".into()));
        }

        for (side, endpoint) in [("source", &self.source), ("target", &self.target)] {
            if endpoint.location.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "{side}.location must not be empty"
                )));
            }
        }

        if let Some(ref cols) = self.keys.composite {
            if cols.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "keys.composite must list at least one column".into(),
                ));
            }
            if let Some(blank) = cols.iter().position(|c| c.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(format!(
                    "keys.composite[{blank}] is empty"
                )));
            }
        }

        if matches!(self.keys.pk.as_deref(), Some(pk) if pk.trim().is_empty()) {
            return Err(ReconError::ConfigValidation("keys.pk must not be empty".into()));
        }

        if self.report.max_details == 0 {
            return Err(ReconError::ConfigValidation(
                "report.max_details must be at least 1".into(),
            ));
        }

        // Rejects pk + composite together.
        self.options().key_spec()?;

        Ok(())
    }

    /// Engine options for the configured keys. Keys absent here may still be
    /// filled in by primary-key auto-detection before the run.
    pub fn options(&self) -> ReconOptions {
        ReconOptions {
            pk_column: self.keys.pk.clone(),
            composite_keys: self.keys.composite.clone(),
            on_duplicate: self.on_duplicate,
        }
    }

    pub fn has_keys(&self) -> bool {
        self.keys.pk.is_some() || self.keys.composite.is_some()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "employees nightly"
table = "employees"
where = "department = 'Engineering'"
on_duplicate = "reject"

[source]
location = "source.db"

[target]
location = "sqlite:///srv/replica/target.db"

[keys]
pk = "id"

[report]
json = "out/report.json"
max_details = 50
"#;

    #[test]
    fn parse_full_config() {
        let config = JobConfig::from_toml(FULL).unwrap();
        assert_eq!(config.display_name(), "employees nightly");
        assert_eq!(config.where_clause.as_deref(), Some("department = 'Engineering'"));
        assert_eq!(config.on_duplicate, DuplicatePolicy::Reject);
        assert_eq!(config.target.location, "sqlite:///srv/replica/target.db");
        assert_eq!(config.report.max_details, 50);
        assert!(config.has_keys());
        assert_eq!(config.options().pk_column.as_deref(), Some("id"));
    }

    #[test]
    fn defaults() {
        let config = JobConfig::from_toml(
            r#"
table = "employees"
[source]
location = "a.db"
[target]
location = "b.db"
"#,
        )
        .unwrap();
        assert_eq!(config.display_name(), "employees");
        assert_eq!(config.on_duplicate, DuplicatePolicy::KeepLast);
        assert_eq!(config.report.max_details, DEFAULT_MAX_DETAILS);
        assert!(config.report.json.is_none());
        assert!(!config.has_keys());
    }

    #[test]
    fn reject_pk_and_composite() {
        let err = JobConfig::from_toml(
            r#"
table = "t"
[source]
location = "a.db"
[target]
location = "b.db"
[keys]
pk = "id"
composite = ["region", "month"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::ConflictingKeySpec { .. }));
    }

    #[test]
    fn reject_empty_composite() {
        let err = JobConfig::from_toml(
            r#"
table = "t"
[source]
location = "a.db"
[target]
location = "b.db"
[keys]
composite = []
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn reject_zero_max_details() {
        let err = JobConfig::from_toml(
            r#"
table = "t"
[source]
location = "a.db"
[target]
location = "b.db"
[report]
max_details = 0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_details"));
    }

    #[test]
    fn unknown_policy_is_parse_error() {
        let err = JobConfig::from_toml(
            r#"
table = "t"
on_duplicate = "merge"
[source]
location = "a.db"
[target]
location = "b.db"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }
}
