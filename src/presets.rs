use crate::color::Palette;
use crate::error::{Error, Result};
use crate::settings::FieldSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// A named preset containing field settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub settings: FieldSettings,
}

impl Preset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, settings: FieldSettings) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings,
        }
    }
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets that ship with the app
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Built-ins plus user presets from the platform config directory
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    /// Built-ins plus user presets from `dir` (None = built-ins only)
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: Self::builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    fn builtin_presets() -> Vec<Preset> {
        vec![
            // Slider "Light" end
            Preset::new(
                "Light",
                "A sparse scattering of stars",
                FieldSettings {
                    particle_count: 30,
                    ..Default::default()
                },
            ),
            // Default tuning
            Preset::new("Medium", "The standard constellation", FieldSettings::default()),
            // Slider "Dense" end
            Preset::new(
                "Dense",
                "Tightly packed web of links",
                FieldSettings {
                    particle_count: 150,
                    ..Default::default()
                },
            ),
            // Many particles, short links to keep the web readable
            Preset::new(
                "Swarm",
                "Crowded field with short links and a strong push",
                FieldSettings {
                    particle_count: 250,
                    link_threshold_sq: 1600.0,
                    repulsion_force: 0.5,
                    ..Default::default()
                },
            ),
            // Slow drift, gentle pointer
            Preset::new(
                "Calm",
                "Slow drifting particles that barely notice the pointer",
                FieldSettings {
                    speed_range: 0.15,
                    repulsion_force: 0.1,
                    relax_factor: 0.02,
                    palette: Palette::Aurora,
                    ..Default::default()
                },
            ),
            // Bouncier walls, warm colors
            Preset::new(
                "Embers",
                "Fast warm sparks that keep their speed off the walls",
                FieldSettings {
                    speed_range: 1.2,
                    wall_damping: 1.0,
                    palette: Palette::Ember,
                    trails: true,
                    trail_fade: 0.05,
                    ..Default::default()
                },
            ),
        ]
    }

    /// Get the presets directory path
    fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("portfolio-demos").join("presets"))
    }

    /// Load user presets from disk; unreadable files are skipped
    fn load_user_presets(&mut self) {
        let Some(dir) = &self.dir else { return };
        let Ok(entries) = fs::read_dir(dir) else { return };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|content| serde_json::from_str::<Preset>(&content).map_err(Error::from))
            {
                Ok(mut preset) => {
                    preset.settings.sanitize();
                    self.user.push(preset);
                }
                Err(e) => log::warn!("Skipping preset {}: {}", path.display(), e),
            }
        }
        self.user.sort_by(|a, b| a.name.cmp(&b.name));
    }

    fn file_name(name: &str) -> String {
        let stem = name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect::<String>();
        format!("{}.json", stem)
    }

    /// Save a preset to disk, replacing any user preset of the same name.
    /// Built-in names and names that share a file with another preset are refused.
    pub fn save_preset(&mut self, preset: Preset) -> Result<PathBuf> {
        let dir = self.dir.clone().ok_or(Error::NoConfigDir)?;

        let file_name = Self::file_name(&preset.name);
        let conflict = self
            .builtin
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(&preset.name))
            .or_else(|| {
                self.user
                    .iter()
                    .find(|p| p.name != preset.name && Self::file_name(&p.name) == file_name)
            });
        if let Some(existing) = conflict {
            return Err(Error::PresetConflict {
                name: preset.name,
                existing: existing.name.clone(),
            });
        }

        fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);
        fs::write(&path, serde_json::to_string_pretty(&preset)?)?;

        self.user.retain(|p| p.name != preset.name);
        self.user.push(preset);
        log::info!("Saved preset to {}", path.display());
        Ok(path)
    }

    /// Delete a user preset
    pub fn delete_preset(&mut self, name: &str) -> Result<()> {
        let dir = self.dir.clone().ok_or(Error::NoConfigDir)?;
        self.user.retain(|p| p.name != name);

        let path = dir.join(Self::file_name(name));
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    pub fn len(&self) -> usize {
        self.builtin.len() + self.user.len()
    }

    /// Preset by position in `all_presets` order
    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.all_presets().nth(index)
    }

    /// Find a preset by name (case-insensitive)
    pub fn find(&self, name: &str) -> Result<&Preset> {
        self.all_presets()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_cover_density_range() {
        let manager = PresetManager::with_dir(None);
        assert_eq!(manager.find("light").unwrap().settings.particle_count, 30);
        assert_eq!(manager.find("Medium").unwrap().settings, FieldSettings::default());
        assert_eq!(manager.find("DENSE").unwrap().settings.particle_count, 150);
        assert!(matches!(manager.find("nope"), Err(Error::UnknownPreset(_))));
    }

    #[test]
    fn test_save_without_dir_fails() {
        let mut manager = PresetManager::with_dir(None);
        let result = manager.save_preset(Preset::new("x", "", FieldSettings::default()));
        assert!(matches!(result, Err(Error::NoConfigDir)));
    }

    #[test]
    fn test_save_reload_and_delete_user_preset() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        let builtins = manager.len();

        let settings = FieldSettings {
            particle_count: 42,
            ..Default::default()
        };
        let path = manager.save_preset(Preset::new("My Sky!", "mine", settings.clone())).unwrap();
        assert_eq!(path.file_name().unwrap(), "My_Sky_.json");
        assert_eq!(manager.len(), builtins + 1);

        // Saving again under the same name replaces it
        manager.save_preset(Preset::new("My Sky!", "mine", settings)).unwrap();
        assert_eq!(manager.len(), builtins + 1);

        let reloaded = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert_eq!(reloaded.find("my sky!").unwrap().settings.particle_count, 42);
        assert_eq!(reloaded.get(builtins).unwrap().name, "My Sky!");

        manager.delete_preset("My Sky!").unwrap();
        assert!(!path.exists());
        assert_eq!(manager.len(), builtins);
    }

    #[test]
    fn test_colliding_names_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        let settings = FieldSettings {
            particle_count: 42,
            ..Default::default()
        };
        manager.save_preset(Preset::new("My Sky!", "", settings.clone())).unwrap();

        // Same file stem, different preset
        let result = manager.save_preset(Preset::new("My Sky?", "", FieldSettings::default()));
        assert!(matches!(result, Err(Error::PresetConflict { .. })));

        let result = manager.save_preset(Preset::new("dense", "", FieldSettings::default()));
        assert!(matches!(result, Err(Error::PresetConflict { .. })));

        let reloaded = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert_eq!(reloaded.user.len(), 1);
        assert_eq!(reloaded.find("My Sky!").unwrap().settings, settings);
    }

    #[test]
    fn test_broken_preset_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert!(manager.user.is_empty());
    }
}
