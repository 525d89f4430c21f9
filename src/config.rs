use crate::braille::DEFAULT_UNITS_PER_DOT;
use crate::error::Result;
use crate::frame::{MAX_FPS, MIN_FPS};
use crate::settings::FieldSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

/// Complete particle demo configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// All field settings
    pub settings: FieldSettings,
    /// Target frames per second (app-level)
    pub fps: u32,
    /// Field units covered by one Braille dot (app-level)
    pub units_per_dot: f32,
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Import config from a JSON file; out-of-range values are clamped
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&content)?;
        if config.version != CONFIG_VERSION {
            log::warn!(
                "Config {} has version {}, expected {}; loading anyway",
                path.display(),
                config.version,
                CONFIG_VERSION
            );
        }
        config.sanitize();
        Ok(config)
    }

    fn sanitize(&mut self) {
        self.settings.sanitize();
        self.fps = self.fps.clamp(MIN_FPS, MAX_FPS);
        self.units_per_dot = self.units_per_dot.clamp(0.5, 20.0);
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            settings: FieldSettings::default(),
            fps: 60,
            units_per_dot: DEFAULT_UNITS_PER_DOT,
        }
    }
}
