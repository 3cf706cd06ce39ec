use crate::error::{RecurrenceError, RecurrenceResult};
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub expansion: ExpansionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ExpansionSettings {
    /// Most occurrences produced for one event in one query. Unset means
    /// the query range is the only bound.
    #[serde(default)]
    pub max_instances_per_event: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Settings {
    /// Loads settings from defaults, an optional `recurrence.toml` in the
    /// working directory and `RECURRENCE__*` environment variables, later
    /// sources taking precedence.
    pub fn load() -> RecurrenceResult<Self> {
        Self::build(File::with_name("recurrence").required(false))
    }

    /// Like [`Settings::load`], with TOML text in place of `recurrence.toml`.
    pub fn from_toml(text: &str) -> RecurrenceResult<Self> {
        Self::build(File::from_str(text, FileFormat::Toml))
    }

    fn build<S>(file: S) -> RecurrenceResult<Self>
    where
        S: ::config::Source + Send + Sync + 'static,
    {
        Ok(Config::builder()
            .set_default("logging.level", "info")?
            .add_source(file)
            .add_source(
                Environment::with_prefix("RECURRENCE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// Installs a global `tracing` subscriber filtered at the configured level.
/// Fails if a subscriber is already installed.
pub fn init_tracing(logging: &LoggingSettings) -> RecurrenceResult<()> {
    let filter = EnvFilter::try_new(&logging.level).map_err(|err| RecurrenceError::InvalidLogLevel {
        level: logging.level.clone(),
        reason: err.to_string(),
    })?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()?;

    tracing::debug!(level = %logging.level, "Tracing initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn defaults() {
        let settings = Settings::from_toml("").unwrap();
        tracing::debug!(?settings, "Loaded settings");

        assert_eq!(settings.expansion.max_instances_per_event, None);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn toml_overrides_defaults() {
        let settings = Settings::from_toml(
            r#"
            [expansion]
            max_instances_per_event = 50

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(settings.expansion.max_instances_per_event, Some(50));
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn wrong_type_is_an_error() {
        let result = Settings::from_toml(
            r#"
            [expansion]
            max_instances_per_event = "lots"
            "#,
        );
        assert!(matches!(result, Err(RecurrenceError::Config(_))));
    }

    #[test]
    fn invalid_level_is_rejected() {
        let result = init_tracing(&LoggingSettings {
            level: "recurrence=notalevel".to_owned(),
        });
        assert!(matches!(
            result,
            Err(RecurrenceError::InvalidLogLevel { .. })
        ));
    }
}
