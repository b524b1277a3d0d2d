use crate::app::AppState;
use crate::constants::{CONFIG_DIR_NAME, DEFAULT_SHOW_FILE};
use crate::models::ShowConfig;
use crate::path::StatePath;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// `~/.muse`, falling back to the working directory
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Show config used when none is given on the command line
pub fn default_config_path() -> PathBuf {
    config_dir().join(DEFAULT_SHOW_FILE)
}

impl ShowConfig {
    /// Load a show config; `.json` files are parsed as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read show config {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let config = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }

    /// Load `path` if it exists, otherwise an empty config
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "No show config found, starting empty");
            Ok(ShowConfig::default())
        }
    }

    /// Publish the show definition into the store and declare its channels
    pub fn seed(&self, state: &mut AppState) -> Result<()> {
        // Reject bad channel names before anything is written
        for channel in &self.program.channels {
            channel
                .parse::<StatePath>()
                .with_context(|| format!("Invalid channel in show config: {:?}", channel))?;
        }

        if let Some(controls) = &self.camera_controls {
            state.set("cameraControls", controls.clone())?;
        }
        if let Some(ui) = &self.ui {
            state.set("ui", ui.as_str())?;
        }
        if let Some(venue) = &self.venue {
            state.set("venue", venue.as_str())?;
        }

        state.set("program.duration", self.program.duration)?;
        state.set("program.stages", serde_json::to_value(&self.program.stages)?)?;
        state.set("program.channels", serde_json::to_value(&self.program.channels)?)?;
        if let Some(gss) = &self.program.gss {
            state.set("program.gss", gss.as_str())?;
        }
        if let Some(specs) = &self.specs {
            state.set("specs", specs.clone())?;
        }

        // Channels keep whatever value they already hold
        for channel in &self.program.channels {
            if state.get(channel).is_none() {
                state.set(channel, Value::Null)?;
            }
        }

        tracing::info!(
            stages = self.program.stages.len(),
            channels = self.program.channels.len(),
            "Show config seeded"
        );
        Ok(())
    }
}
