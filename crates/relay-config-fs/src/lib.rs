// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` for Relay hosts.
//!
//! Each key is one `<key>.json` file under a base directory, by default the
//! platform config dir (`~/.config/Relay` on Linux). Writes go through a
//! sibling temp file and a rename, so a host crashing mid-save leaves the
//! previous settings intact.

use directories::ProjectDirs;
use relay_app_core::config::{ConfigError, ConfigStore};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Settings files under one directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store rooted at the user config directory.
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "Relay")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Self::at(proj.config_dir())
    }

    /// Store rooted at `base` (project-local settings, tests).
    pub fn at(base: &Path) -> Result<Self, ConfigError> {
        fs::create_dir_all(base)?;
        Ok(Self {
            base: base.to_path_buf(),
        })
    }

    /// Directory holding the settings files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// File backing `key`. Keys are plain file stems.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        let plain = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !plain {
            return Err(ConfigError::Other(format!("invalid config key {key:?}")));
        }
        Ok(self.base.join(format!("{key}.json")))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        let staged = path.with_extension("json.tmp");
        fs::write(&staged, data)?;
        if let Err(err) = fs::rename(&staged, &path) {
            let _ = fs::remove_file(&staged);
            return Err(ConfigError::Io(err));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_app_core::{ConfigService, ExportSettings};

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        assert!(matches!(store.load_raw("absent"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn settings_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::new(FsConfigStore::at(dir.path()).unwrap());
        assert_eq!(service.load_settings().unwrap(), ExportSettings::default());

        let settings = ExportSettings {
            film_width: 800,
            ..ExportSettings::preview()
        };
        service.save_settings(&settings).unwrap();
        assert!(dir.path().join("export.json").exists());
        assert_eq!(service.load_settings().unwrap(), settings);
    }

    #[test]
    fn overwrite_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        store.save_raw("export", b"{}").unwrap();
        store.save_raw("export", br#"{"halt_spp": 4}"#).unwrap();
        assert_eq!(store.load_raw("export").unwrap(), br#"{"halt_spp": 4}"#);
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("export.json")]);
    }

    #[test]
    fn keys_cannot_escape_the_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        for key in ["../export", "a/b", "", "export.json"] {
            assert!(matches!(store.save_raw(key, b"{}"), Err(ConfigError::Other(_))), "{key}");
        }
    }
}
