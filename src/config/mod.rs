//! Layered application settings.
//!
//! Settings are read from built-in defaults, then an optional file, then
//! `ODT_`-prefixed environment variables, later sources winning.

mod settings;

pub use settings::{
    CONFIG_PATH_VARIABLE, DEFAULT_CONFIG_FILE, DatabaseSettings, ENV_PREFIX, Settings,
    SettingsError, TracingSettings, WorkflowSettings,
};

#[cfg(test)]
mod tests;
