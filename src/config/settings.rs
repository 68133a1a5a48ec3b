//! Settings model, loading and validation.

use crate::work_order::services::{
    AutoDraftPolicy, DEFAULT_DESCRIPTION_TEMPLATE, DEFAULT_NUMBERING_RETRIES,
    DEFAULT_TITLE_TEMPLATE,
};
use chrono::TimeDelta;
use minijinja::Environment;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the settings file.
pub const CONFIG_PATH_VARIABLE: &str = "ODT_CONFIG";

/// Settings file read when [`CONFIG_PATH_VARIABLE`] is unset. The extension
/// is resolved by the loader.
pub const DEFAULT_CONFIG_FILE: &str = "config/odt";

/// Prefix of environment variable overrides, e.g.
/// `ODT_WORKFLOW__DEDUP_WINDOW_DAYS=14`.
pub const ENV_PREFIX: &str = "ODT";

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or deserialized.
    #[error("failed to load settings: {0}")]
    Load(#[source] Box<::config::ConfigError>),

    /// The deduplication window is zero days.
    #[error("workflow.dedup_window_days must be at least 1")]
    ZeroDedupWindow,

    /// Numbering collisions would never be retried.
    #[error("workflow.numbering_retry_attempts must be at least 1")]
    ZeroRetryAttempts,

    /// The pool would hold no connections.
    #[error("database.pool_size must be at least 1")]
    ZeroPoolSize,

    /// A template does not compile.
    #[error("workflow.{field} is not a valid template: {source}")]
    InvalidTemplate {
        /// Offending setting.
        field: &'static str,
        /// Compilation error.
        #[source]
        source: minijinja::Error,
    },
}

impl From<::config::ConfigError> for SettingsError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Root settings object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Logging settings.
    pub tracing: TracingSettings,
    /// Database settings.
    pub database: DatabaseSettings,
    /// Work-order workflow settings.
    pub workflow: WorkflowSettings,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TracingSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub log_level: String,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection URL. In-memory adapters are used when unset.
    pub url: Option<String>,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 8,
        }
    }
}

/// Work-order workflow settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Days an open work order suppresses a new automatic draft.
    pub dedup_window_days: u32,
    /// Retries after a numbering collision.
    pub numbering_retry_attempts: u32,
    /// Title template for automatic drafts.
    pub auto_title_template: String,
    /// Description template for automatic drafts.
    pub auto_description_template: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            dedup_window_days: 7,
            numbering_retry_attempts: DEFAULT_NUMBERING_RETRIES,
            auto_title_template: DEFAULT_TITLE_TEMPLATE.to_owned(),
            auto_description_template: DEFAULT_DESCRIPTION_TEMPLATE.to_owned(),
        }
    }
}

impl WorkflowSettings {
    /// Builds the automatic-draft policy these settings describe.
    #[must_use]
    pub fn auto_draft_policy(&self) -> AutoDraftPolicy {
        AutoDraftPolicy::default()
            .with_dedup_window(TimeDelta::days(i64::from(self.dedup_window_days)))
            .with_templates(
                self.auto_title_template.clone(),
                self.auto_description_template.clone(),
            )
            .with_numbering_retries(self.numbering_retry_attempts)
    }
}

impl Settings {
    /// Loads settings from the file named by [`CONFIG_PATH_VARIABLE`] (or
    /// [`DEFAULT_CONFIG_FILE`]) and the environment, then validates them.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when a source is malformed or validation
    /// fails.
    pub fn load() -> Result<Self, SettingsError> {
        let path = std::env::var(CONFIG_PATH_VARIABLE)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_owned());
        Self::load_from(&path)
    }

    /// Loads settings from `path` (missing files are skipped) and the
    /// environment, then validates them.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when a source is malformed or validation
    /// fails.
    pub fn load_from(path: &str) -> Result<Self, SettingsError> {
        let settings: Self = ::config::Config::builder()
            .add_source(::config::File::with_name(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns the first [`SettingsError`] found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.database.pool_size == 0 {
            return Err(SettingsError::ZeroPoolSize);
        }
        let workflow = &self.workflow;
        if workflow.dedup_window_days == 0 {
            return Err(SettingsError::ZeroDedupWindow);
        }
        if workflow.numbering_retry_attempts == 0 {
            return Err(SettingsError::ZeroRetryAttempts);
        }
        check_template("auto_title_template", &workflow.auto_title_template)?;
        check_template(
            "auto_description_template",
            &workflow.auto_description_template,
        )
    }
}

fn check_template(field: &'static str, source: &str) -> Result<(), SettingsError> {
    let environment = Environment::new();
    environment
        .template_from_str(source)
        .map(|_| ())
        .map_err(|err| SettingsError::InvalidTemplate { field, source: err })
}
