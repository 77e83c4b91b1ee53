//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::reconciler::Placement;

/// Default endpoint of the Scaleway Instance API.
pub const DEFAULT_API_URL: &str = "https://api.scaleway.com/instance/v1";

/// Scaleway specific configuration derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "SCW")]
pub struct ScalewayConfig {
    /// Access key assigned to the Scaleway application. Not needed for API
    /// calls; accepted so shared credential files load cleanly.
    pub access_key: Option<String>,
    /// Secret key used for authentication. This value is required.
    pub secret_key: String,
    /// Organisation identifier used by some Scaleway endpoints.
    pub default_organization_id: Option<String>,
    /// Project that owns volumes created without an explicit project.
    pub default_project_id: Option<String>,
    /// Zone used for volumes created without an explicit zone. Defaults to
    /// `fr-par-1`.
    #[ortho_config(default = "fr-par-1".to_owned())]
    pub default_zone: String,
    /// Base URL of the Instance API, overridable for tests and proxies.
    #[ortho_config(default = DEFAULT_API_URL.to_owned())]
    pub api_url: String,
    /// Seconds between two polls of a volume's state.
    #[ortho_config(default = 5)]
    pub retry_interval_secs: u64,
    /// Seconds allowed for a volume to detach before deletion gives up.
    #[ortho_config(default = 600)]
    pub delete_timeout_secs: u64,
    /// Seconds allowed for a volume to settle after a mutation.
    #[ortho_config(default = 300)]
    pub wait_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
    section: &'static str,
}

impl FieldMetadata {
    const fn new(
        description: &'static str,
        env_var: &'static str,
        toml_key: &'static str,
        section: &'static str,
    ) -> Self {
        Self {
            description,
            env_var,
            toml_key,
            section,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to [{}] in scw-volume.toml",
            self.description, self.env_var, self.toml_key, self.section
        ))
    }
}

impl ScalewayConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(metadata.missing());
        }
        Ok(())
    }

    fn require_positive(value: u64, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::InvalidValue(format!(
                "{} must be greater than zero: set {} or {} in [{}] in scw-volume.toml",
                metadata.description, metadata.env_var, metadata.toml_key, metadata.section
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("scw-volume")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Placement defaults handed to the reconciler.
    #[must_use]
    pub fn placement(&self) -> Placement {
        Placement::new(
            self.default_zone.trim(),
            self.default_project_id
                .as_deref()
                .map(str::trim)
                .filter(|project| !project.is_empty())
                .map(str::to_owned),
        )
    }

    /// Interval between two polls of a volume's state.
    #[must_use]
    pub const fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    /// Deadline for a volume to detach before deletion gives up.
    #[must_use]
    pub const fn delete_timeout(&self) -> Duration {
        Duration::from_secs(self.delete_timeout_secs)
    }

    /// Deadline for a volume to settle after a mutation.
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::InvalidValue`] when a duration is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.secret_key,
            &FieldMetadata::new(
                "Scaleway API secret key",
                "SCW_SECRET_KEY",
                "secret_key",
                "scaleway",
            ),
        )?;
        Self::require_field(
            &self.default_zone,
            &FieldMetadata::new(
                "availability zone",
                "SCW_DEFAULT_ZONE",
                "default_zone",
                "scaleway",
            ),
        )?;
        Self::require_field(
            &self.api_url,
            &FieldMetadata::new("Instance API URL", "SCW_API_URL", "api_url", "scaleway"),
        )?;
        Self::require_positive(
            self.retry_interval_secs,
            &FieldMetadata::new(
                "retry interval",
                "SCW_RETRY_INTERVAL_SECS",
                "retry_interval_secs",
                "scaleway",
            ),
        )?;
        Self::require_positive(
            self.wait_timeout_secs,
            &FieldMetadata::new(
                "wait timeout",
                "SCW_WAIT_TIMEOUT_SECS",
                "wait_timeout_secs",
                "scaleway",
            ),
        )?;
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds a value outside its accepted range.
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
