// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Settings persistence: the storage port a host implements and the service
//! that reads and writes [`ExportSettings`] through it.

use thiserror::Error;

use crate::settings::{ExportSettings, SETTINGS_KEY};

/// Storage port for settings documents, one per logical key.
pub trait ConfigStore {
    /// Load the document under `key`. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replace the document under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for settings persistence.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not valid settings JSON.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The settings parse but cannot drive an export session.
    #[error("invalid settings: {0}")]
    Invalid(String),
    /// Store-specific failure.
    #[error("other: {0}")]
    Other(String),
}

/// Loads and saves [`ExportSettings`] as pretty JSON through a [`ConfigStore`].
///
/// Settings are validated in both directions: a broken file is reported
/// instead of starting a session with it, and invalid settings are never
/// written.
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Export settings, falling back to defaults when none were saved.
    ///
    /// Fields missing from an older saved file take their default value.
    pub fn load_settings(&self) -> Result<ExportSettings, ConfigError> {
        let bytes = match self.store.load_raw(SETTINGS_KEY) {
            Ok(bytes) if bytes.is_empty() => return Ok(ExportSettings::default()),
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound) => return Ok(ExportSettings::default()),
            Err(e) => return Err(e),
        };
        let settings: ExportSettings = serde_json::from_slice(&bytes)?;
        settings.validate().map_err(ConfigError::Invalid)?;
        Ok(settings)
    }

    /// Persist export settings.
    pub fn save_settings(&self, settings: &ExportSettings) -> Result<(), ConfigError> {
        settings.validate().map_err(ConfigError::Invalid)?;
        let data = serde_json::to_vec_pretty(settings)?;
        self.store.save_raw(SETTINGS_KEY, &data)
    }
}
