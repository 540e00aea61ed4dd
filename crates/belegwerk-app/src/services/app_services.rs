// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — loads configuration and builds the storage,
// recognition and capture components the commands run on.

use std::path::{Path, PathBuf};

use belegwerk_bridge::traits::NativeCamera;
use belegwerk_capture::CaptureStateMachine;
use belegwerk_core::AppConfig;
use belegwerk_core::error::Result;
use belegwerk_extract::ConfiguredService;
use belegwerk_store::{LocalStore, MediaArchive, SqliteRecordStore};
use tracing::{debug, info, warn};

use super::data_dir;

const CONFIG_FILE: &str = "config.json";
const RECORDS_DB: &str = "records.db";
const ORIGINALS_DIR: &str = "originals";

pub const RECOGNITION_URL_VAR: &str = "BELEGWERK_RECOGNITION_URL";
pub const API_KEY_VAR: &str = "BELEGWERK_API_KEY";

/// Configuration plus the data directory everything is stored under.
pub struct AppServices {
    data_dir: PathBuf,
    config: AppConfig,
}

impl AppServices {
    /// Load services from the platform data directory and the environment.
    pub fn init() -> Result<Self> {
        let services = Self::with_data_dir(data_dir::data_dir()?, |name| std::env::var(name).ok());
        info!(path = %services.data_dir.display(), "app services initialised");
        Ok(services)
    }

    /// Load from `dir`, reading overrides through `env`.
    pub fn with_data_dir(dir: PathBuf, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = load_config(&dir).unwrap_or_default();
        apply_env_overrides(&mut config, env);
        Self {
            data_dir: dir,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Adjust the configuration for this run only; see [`Self::save_config`].
    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Write the current configuration to `config.json`.
    pub fn save_config(&self) -> Result<()> {
        self.config.capture.validate()?;
        persist_config(&self.data_dir, &self.config)
    }

    /// Open the record database and, when originals are kept, the media
    /// archive next to it.
    pub fn open_store(&self) -> Result<LocalStore> {
        let records = SqliteRecordStore::open(self.data_dir.join(RECORDS_DB))?;
        let media = if self.config.capture.upload_originals {
            Some(MediaArchive::open(self.data_dir.join(ORIGINALS_DIR))?)
        } else {
            None
        };
        Ok(LocalStore::new(records, media))
    }

    pub fn recognizer(&self) -> Result<ConfiguredService> {
        let service = ConfiguredService::from_config(&self.config.recognition)?;
        info!(service = service.name(), "recognition service selected");
        Ok(service)
    }

    /// A capture state machine over `camera`, the configured recogniser and
    /// the local store.
    pub fn capture_machine<C: NativeCamera>(
        &self,
        camera: C,
    ) -> Result<CaptureStateMachine<C, ConfiguredService, LocalStore>> {
        CaptureStateMachine::new(camera, self.recognizer()?, self.open_store()?, &self.config)
    }
}

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable config, using defaults");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    debug!(path = %path.display(), "config written");
    Ok(())
}

fn apply_env_overrides(config: &mut AppConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(url) = env(RECOGNITION_URL_VAR).filter(|v| !v.trim().is_empty()) {
        debug!(%url, "recognition endpoint from environment");
        config.recognition.endpoint = Some(url);
    }
    if let Some(key) = env(API_KEY_VAR).filter(|v| !v.trim().is_empty()) {
        config.recognition.api_key = Some(key);
    }
}
