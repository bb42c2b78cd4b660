//! User settings: account credentials and voice selection.
//!
//! Settings are read before every request, so changes made through the
//! store take effect on the next utterance.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::core::engine::EngineCredentials;
use crate::core::engine::volcengine::DEFAULT_CLUSTER;

/// Persisted engine settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub app_id: String,
    pub access_token: String,
    pub speaker_id: String,
    #[serde(default = "default_cluster")]
    pub cluster: String,
    #[serde(default)]
    pub emotional: bool,
}

fn default_cluster() -> String {
    DEFAULT_CLUSTER.to_string()
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("app_id", &self.app_id)
            .field("access_token", &"<redacted>")
            .field("speaker_id", &self.speaker_id)
            .field("cluster", &self.cluster)
            .field("emotional", &self.emotional)
            .finish()
    }
}

impl Drop for Settings {
    fn drop(&mut self) {
        self.access_token.zeroize();
    }
}

impl Settings {
    pub fn new(
        app_id: impl Into<String>,
        access_token: impl Into<String>,
        speaker_id: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            access_token: access_token.into(),
            speaker_id: speaker_id.into(),
            cluster: default_cluster(),
            emotional: false,
        }
    }

    /// Verify that every required field is non-blank.
    pub fn check(&self) -> Result<(), String> {
        let missing: Vec<&str> = [
            ("app_id", &self.app_id),
            ("access_token", &self.access_token),
            ("speaker_id", &self.speaker_id),
            ("cluster", &self.cluster),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("required settings are empty: {}", missing.join(", ")))
        }
    }

    pub fn is_complete(&self) -> bool {
        self.check().is_ok()
    }

    pub fn credentials(&self) -> EngineCredentials {
        EngineCredentials {
            app_id: self.app_id.trim().to_string(),
            access_token: self.access_token.trim().to_string(),
            speaker_id: self.speaker_id.trim().to_string(),
            cluster: self.cluster.trim().to_string(),
            emotional: self.emotional,
        }
    }

    /// Token with everything but the last four characters hidden.
    pub fn masked_token(&self) -> String {
        let count = self.access_token.chars().count();
        if count <= 4 {
            return "*".repeat(count);
        }
        let tail: String = self.access_token.chars().skip(count - 4).collect();
        format!("{}{}", "*".repeat(count - 4), tail)
    }
}

/// Source of settings consulted at the start of every request.
pub trait SettingsProvider: Send + Sync {
    /// `None` when the engine has not been set up.
    fn load(&self) -> Option<Settings>;
}

/// Provider returning a fixed value.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(Option<Settings>);

impl StaticSettings {
    pub fn new(settings: Option<Settings>) -> Self {
        Self(settings)
    }
}

impl SettingsProvider for StaticSettings {
    fn load(&self) -> Option<Settings> {
        self.0.clone()
    }
}

/// JSON file holding the user's settings.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored settings. A missing file reads as `Ok(None)`.
    pub fn read(&self) -> Result<Option<Settings>, Box<dyn std::error::Error>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            format!("Failed to read settings file {}: {e}", self.path.display())
        })?;
        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse settings file: {e}"))?;
        Ok(Some(settings))
    }

    pub fn save(&self, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                format!("Failed to create settings directory {}: {e}", parent.display())
            })?;
        }
        let contents = serde_json::to_string_pretty(settings)
            .map_err(|e| format!("Failed to serialize settings: {e}"))?;
        std::fs::write(&self.path, contents).map_err(|e| {
            format!("Failed to write settings file {}: {e}", self.path.display())
        })?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

impl SettingsProvider for SettingsStore {
    fn load(&self) -> Option<Settings> {
        match self.read() {
            Ok(None) => {
                debug!(path = %self.path.display(), "No settings file");
                None
            }
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %self.path.display(), "Ignoring unusable settings file: {}", e);
                None
            }
        }
    }
}
