/// Simulator configuration
use crate::error::{Result, SimError};
use mediamix_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "mediamix.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub page: PageSettings,
}

/// Shape of the simulated page at startup
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageSettings {
    #[serde(default)]
    pub audio_elements: usize,

    #[serde(default = "default_video_elements")]
    pub video_elements: usize,

    /// Same-origin frames, each holding one video element
    #[serde(default)]
    pub frames: usize,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            audio_elements: 0,
            video_elements: default_video_elements(),
            frames: 0,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl SimConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `mediamix.toml` is read if
    /// present. Environment variables prefixed with `MEDIAMIX_` override
    /// both, with `__` between sections (`MEDIAMIX_ENGINE__PING_REPLY`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("MEDIAMIX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| SimError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| SimError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.engine.adjust_step.is_finite() || self.engine.adjust_step <= 0.0 {
            return Err(SimError::Config(format!(
                "engine.adjust_step must be a positive number, got {}",
                self.engine.adjust_step
            )));
        }

        if self.page.channel_capacity == 0 {
            return Err(SimError::Config(
                "page.channel_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_video_elements() -> usize {
    1
}

fn default_channel_capacity() -> usize {
    16
}
