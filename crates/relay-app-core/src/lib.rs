// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for Relay hosts (settings model, config storage).
//! Keeps host adapters thin and renderer-agnostic.

pub mod config;
pub mod settings;

pub use config::{ConfigError, ConfigService, ConfigStore};
pub use settings::{ExportSettings, SETTINGS_KEY};
