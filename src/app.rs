use crate::braille::BrailleCanvas;
use crate::capture::{self, GifRecorder};
use crate::config::AppConfig;
use crate::frame::{FrameDriver, MAX_FPS, MIN_FPS};
use crate::presets::{Preset, PresetManager};
use crate::settings::PARTICLE_STEP;
use crate::simulation::ParticleField;
use crate::surface::draw_field;
use crate::ui;
use ratatui::layout::Rect;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How long a status message stays in the sidebar
const STATUS_TTL: Duration = Duration::from_secs(4);

const FPS_STEP: u32 = 5;

/// Focus state for parameter editing in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    Controls,
    Particles,
    Radius,
    Force,
    Relax,
    Damping,
    Links,
    Palette,
    Trails,
    Fps,
}

impl Focus {
    const PARAMS: [Focus; 9] = [
        Focus::Particles,
        Focus::Radius,
        Focus::Force,
        Focus::Relax,
        Focus::Damping,
        Focus::Links,
        Focus::Palette,
        Focus::Trails,
        Focus::Fps,
    ];

    /// Tab cycles through parameters in sidebar order
    pub fn next(&self) -> Focus {
        match self.line_index() {
            Some(i) => Self::PARAMS[(i + 1) % Self::PARAMS.len()],
            None => Self::PARAMS[0],
        }
    }

    /// Shift+Tab cycles backwards
    pub fn prev(&self) -> Focus {
        match self.line_index() {
            Some(0) | None => Self::PARAMS[Self::PARAMS.len() - 1],
            Some(i) => Self::PARAMS[i - 1],
        }
    }

    /// Line of this parameter in the parameters box
    pub fn line_index(&self) -> Option<usize> {
        Self::PARAMS.iter().position(|f| f == self)
    }

    pub fn is_param(&self) -> bool {
        *self != Focus::Controls
    }
}

/// Particle demo application state
pub struct App {
    pub field: ParticleField,
    pub driver: FrameDriver,
    pub canvas: BrailleCanvas,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub controls_scroll: u16,
    pub presets: PresetManager,
    /// Index into `presets.all_presets()` of the last applied preset
    pub preset_index: Option<usize>,
    pub capture_dir: PathBuf,
    recorder: Option<GifRecorder>,
    status: Option<(String, Instant)>,
    screen: Rect,
    canvas_rect: Rect,
}

impl App {
    /// Build the demo for a terminal of `screen` size; the frame driver starts running
    pub fn new(screen: Rect, config: &AppConfig, seed: Option<u64>, presets: PresetManager) -> Self {
        let canvas_rect = ui::canvas_rect(screen, false);
        let canvas = BrailleCanvas::new(canvas_rect.width, canvas_rect.height, config.units_per_dot);
        let (width, height) = canvas.field_size();
        let field = match seed {
            Some(seed) => ParticleField::with_seed(width, height, config.settings.clone(), seed),
            None => ParticleField::new(width, height, config.settings.clone()),
        };

        let mut driver = FrameDriver::new(config.fps);
        driver.start();

        log::info!(
            "Particle field {:.0}x{:.0} with {} particles",
            width,
            height,
            field.particles().len()
        );

        Self {
            field,
            driver,
            canvas,
            focus: Focus::Controls,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            controls_scroll: 0,
            presets,
            preset_index: None,
            capture_dir: PathBuf::from("."),
            recorder: None,
            status: None,
            screen,
            canvas_rect,
        }
    }

    /// Run one frame: step, draw, and feed an active recording
    pub fn frame(&mut self) {
        self.field.step();
        draw_field(&mut self.canvas, &self.field);

        let Some(recorder) = self.recorder.as_mut() else { return };
        let result = recorder.capture(&self.field).map(|()| recorder.is_full());
        match result {
            Ok(true) => self.stop_recording(),
            Ok(false) => {}
            Err(e) => {
                log::error!("GIF capture failed: {}", e);
                self.recorder = None;
                self.set_status(format!("Recording failed: {}", e));
            }
        }
    }

    /// Cancel pending frames and build a fresh particle set
    pub fn reinitialize(&mut self) {
        self.driver.restart();
        self.field.reset();
        log::info!("Reinitialised with {} particles", self.field.particles().len());
    }

    /// Stop the frame loop and close any open recording
    pub fn teardown(&mut self) {
        self.driver.cancel();
        if self.recorder.is_some() {
            self.stop_recording();
        }
    }

    /// Current settings as a saveable config
    pub fn config(&self) -> AppConfig {
        AppConfig {
            settings: self.field.settings.clone(),
            fps: self.driver.target_fps(),
            units_per_dot: self.canvas.units_per_dot(),
            ..Default::default()
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
    }

    /// Status message, if one was set recently
    pub fn status(&self) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|(_, at)| at.elapsed() < STATUS_TTL)
            .map(|(msg, _)| msg.as_str())
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn recorded_frames(&self) -> usize {
        self.recorder.as_ref().map_or(0, |r| r.frames_written())
    }

    /// Re-layout for a new terminal size, repopulating when the field extent changed
    pub fn resize(&mut self, screen: Rect) {
        self.screen = screen;
        self.canvas_rect = ui::canvas_rect(screen, self.fullscreen_mode);
        self.canvas.resize(self.canvas_rect.width, self.canvas_rect.height);

        let (width, height) = self.canvas.field_size();
        if self.field.resize(width, height) {
            self.driver.restart();
            log::info!("Resized field to {:.0}x{:.0}", width, height);
            if self.recorder.is_some() {
                self.stop_recording();
            }
        }
    }

    /// Map a mouse position to the field; leaving the canvas clears the pointer
    pub fn pointer_moved(&mut self, column: u16, row: u16) {
        let rect = self.canvas_rect;
        let inside = column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height;
        if inside {
            let (x, y) = self.canvas.cell_to_field(column - rect.x, row - rect.y);
            self.field.set_pointer(x, y);
        } else {
            self.field.clear_pointer();
        }
    }

    pub fn pointer_left(&mut self) {
        self.field.clear_pointer();
    }

    pub fn toggle_pause(&mut self) {
        self.field.toggle_pause();
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
        self.resize(self.screen);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    pub fn scroll_controls_up(&mut self) {
        self.controls_scroll = self.controls_scroll.saturating_sub(1);
    }

    pub fn scroll_controls_down(&mut self, max_scroll: u16) {
        self.controls_scroll = (self.controls_scroll + 1).min(max_scroll);
    }

    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Density control; a count change restarts the frame loop
    pub fn adjust_particles(&mut self, delta: i32) {
        if self.field.adjust_particles(delta) {
            self.driver.restart();
            log::info!("Particle count set to {}", self.field.settings.particle_count);
        }
    }

    pub fn adjust_fps(&mut self, delta: i32) {
        let fps = (self.driver.target_fps() as i32 + delta).clamp(MIN_FPS as i32, MAX_FPS as i32);
        self.driver.set_fps(fps as u32);
    }

    /// Palette hues are assigned at initialisation, so switching repopulates
    pub fn cycle_palette(&mut self, forward: bool) {
        let palette = &mut self.field.settings.palette;
        *palette = if forward { palette.next() } else { palette.prev() };
        self.reinitialize();
    }

    pub fn random_palette(&mut self) {
        self.field.randomize_palette();
        self.reinitialize();
        self.set_status("Generated a random palette");
    }

    pub fn toggle_trails(&mut self) {
        self.field.settings.toggle_trails();
    }

    pub fn adjust_focused_up(&mut self) {
        self.adjust_focused(true);
    }

    pub fn adjust_focused_down(&mut self) {
        self.adjust_focused(false);
    }

    fn adjust_focused(&mut self, up: bool) {
        let sign = if up { 1.0 } else { -1.0 };
        match self.focus {
            Focus::Controls => {}
            Focus::Particles => self.adjust_particles(if up { PARTICLE_STEP } else { -PARTICLE_STEP }),
            Focus::Radius => self.field.settings.adjust_interaction_radius(10.0 * sign),
            Focus::Force => self.field.settings.adjust_repulsion_force(0.05 * sign),
            Focus::Relax => self.field.settings.adjust_relax_factor(0.01 * sign),
            Focus::Damping => self.field.settings.adjust_wall_damping(0.05 * sign),
            Focus::Links => self.field.settings.adjust_link_distance(5.0 * sign),
            Focus::Palette => self.cycle_palette(up),
            Focus::Trails => self.toggle_trails(),
            Focus::Fps => self.adjust_fps(if up { FPS_STEP as i32 } else { -(FPS_STEP as i32) }),
        }
    }

    /// Apply the preset after the last applied one (wrapping)
    pub fn next_preset(&mut self) {
        let count = self.presets.len();
        if count == 0 {
            return;
        }
        let index = self.preset_index.map_or(0, |i| (i + 1) % count);
        self.apply_preset(index);
    }

    pub fn apply_preset(&mut self, index: usize) {
        let Some(preset) = self.presets.get(index) else { return };
        let (name, settings) = (preset.name.clone(), preset.settings.clone());

        self.driver.restart();
        self.field.apply_settings(settings);
        self.preset_index = Some(index);
        log::info!("Applied preset {}", name);
        self.set_status(format!("Preset: {}", name));
    }

    pub fn current_preset_name(&self) -> Option<&str> {
        self.preset_index
            .and_then(|i| self.presets.get(i))
            .map(|p| p.name.as_str())
    }

    /// Store the current settings as a new user preset under the first free "Custom N"
    pub fn save_current_preset(&mut self) {
        let name = (1..)
            .map(|n| format!("Custom {}", n))
            .find(|name| self.presets.find(name).is_err())
            .unwrap_or_default();
        let preset = Preset::new(name.clone(), "Saved from the sidebar", self.field.settings.clone());
        match self.presets.save_preset(preset) {
            Ok(_) => self.set_status(format!("Saved preset {}", name)),
            Err(e) => {
                log::error!("Saving preset failed: {}", e);
                self.set_status(format!("Preset not saved: {}", e));
            }
        }
    }

    /// Remove the last applied preset if it is a user preset
    pub fn delete_current_preset(&mut self) {
        let Some(index) = self.preset_index else { return };
        if index < self.presets.builtin.len() {
            self.set_status("Built-in presets can't be deleted");
            return;
        }
        let Some(name) = self.presets.get(index).map(|p| p.name.clone()) else { return };
        match self.presets.delete_preset(&name) {
            Ok(()) => {
                self.preset_index = None;
                self.set_status(format!("Deleted preset {}", name));
            }
            Err(e) => {
                log::error!("Deleting preset failed: {}", e);
                self.set_status(format!("Preset not deleted: {}", e));
            }
        }
    }

    pub fn snapshot(&mut self) {
        match capture::save_snapshot(&self.field, &self.capture_dir) {
            Ok(path) => self.set_status(format!("Saved {}", file_name(&path))),
            Err(e) => {
                log::error!("Snapshot failed: {}", e);
                self.set_status(format!("Snapshot failed: {}", e));
            }
        }
    }

    pub fn toggle_recording(&mut self) {
        if self.recorder.is_some() {
            self.stop_recording();
            return;
        }
        match GifRecorder::start(&self.field, &self.capture_dir, self.driver.target_fps()) {
            Ok(recorder) => {
                self.recorder = Some(recorder);
                self.set_status("Recording GIF");
            }
            Err(e) => {
                log::error!("Could not start recording: {}", e);
                self.set_status(format!("Recording failed: {}", e));
            }
        }
    }

    fn stop_recording(&mut self) {
        let Some(recorder) = self.recorder.take() else { return };
        match recorder.finish() {
            Ok(path) => self.set_status(format!("Saved {}", file_name(&path))),
            Err(e) => {
                log::error!("Finishing GIF failed: {}", e);
                self.set_status(format!("Recording failed: {}", e));
            }
        }
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Palette;
    use crate::settings::FieldSettings;
    use crate::simulation::Pointer;

    const SCREEN: Rect = Rect {
        x: 0,
        y: 0,
        width: 80,
        height: 30,
    };

    fn test_app() -> App {
        let config = AppConfig {
            settings: FieldSettings {
                particle_count: 40,
                ..Default::default()
            },
            ..Default::default()
        };
        App::new(SCREEN, &config, Some(3), PresetManager::with_dir(None))
    }

    #[test]
    fn test_field_matches_canvas() {
        let app = test_app();
        let rect = app.canvas_rect;
        assert_eq!((app.canvas.cols(), app.canvas.rows()), (rect.width, rect.height));
        assert_eq!((app.field.width, app.field.height), app.canvas.field_size());
        assert_eq!(app.field.particles().len(), 40);
        assert!(app.driver.is_running());
    }

    #[test]
    fn test_resize_stales_pending_frame() {
        let mut app = test_app();
        let ticket = app.driver.request_frame().unwrap();
        app.resize(Rect::new(0, 0, 120, 40));

        assert!(!app.driver.begin(ticket, Instant::now()));
        assert_eq!(app.driver.stats().stale_dropped, 1);
        for p in app.field.particles() {
            assert!(p.x >= 0.0 && p.x <= app.field.width);
            assert!(p.y >= 0.0 && p.y <= app.field.height);
        }
    }

    #[test]
    fn test_same_size_keeps_tickets_valid() {
        let mut app = test_app();
        let ticket = app.driver.request_frame().unwrap();
        app.resize(SCREEN);
        assert!(app.driver.begin(ticket, Instant::now()));
    }

    #[test]
    fn test_pointer_mapping() {
        let mut app = test_app();
        let rect = app.canvas_rect;
        app.pointer_moved(rect.x, rect.y);
        let (x, y) = app.canvas.cell_to_field(0, 0);
        assert_eq!(app.field.pointer, Pointer::At { x, y });

        // Sidebar is outside the canvas
        app.pointer_moved(0, 0);
        assert_eq!(app.field.pointer, Pointer::Away);
    }

    #[test]
    fn test_focus_cycles_through_params() {
        let mut focus = Focus::Controls;
        for _ in 0..Focus::PARAMS.len() {
            focus = focus.next();
            assert!(focus.is_param());
        }
        assert_eq!(focus, Focus::Fps);
        assert_eq!(focus.next(), Focus::Particles);
        assert_eq!(Focus::Particles.prev(), Focus::Fps);
    }

    #[test]
    fn test_adjust_particles_restarts_driver() {
        let mut app = test_app();
        app.focus = Focus::Particles;
        let ticket = app.driver.request_frame().unwrap();
        app.adjust_focused_up();
        assert_eq!(app.field.particles().len(), 50);
        assert!(!app.driver.begin(ticket, Instant::now()));

        app.adjust_focused_down();
        app.adjust_focused_down();
        assert_eq!(app.field.particles().len(), 30);
    }

    #[test]
    fn test_fps_is_clamped() {
        let mut app = test_app();
        app.focus = Focus::Fps;
        for _ in 0..50 {
            app.adjust_focused_up();
        }
        assert_eq!(app.driver.target_fps(), MAX_FPS);
    }

    #[test]
    fn test_presets_cycle_and_apply() {
        let mut app = test_app();
        app.next_preset();
        assert_eq!(app.current_preset_name(), Some("Light"));
        assert_eq!(app.field.particles().len(), 30);
        app.next_preset();
        assert_eq!(app.current_preset_name(), Some("Medium"));
        assert_eq!(app.field.particles().len(), 80);
    }

    #[test]
    fn test_save_and_delete_user_preset() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app();
        app.presets = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        app.field.settings.particle_count = 70;
        app.save_current_preset();
        assert_eq!(app.presets.user.len(), 1);

        // Built-ins stay put
        app.apply_preset(0);
        app.delete_current_preset();
        assert_eq!(app.presets.builtin.len(), 6);

        let user_index = app.presets.builtin.len();
        app.apply_preset(user_index);
        assert_eq!(app.field.particles().len(), 70);
        app.delete_current_preset();
        assert!(app.presets.user.is_empty());
        assert_eq!(app.current_preset_name(), None);
    }

    #[test]
    fn test_saving_after_delete_keeps_other_presets() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app();
        app.presets = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        let first_user = app.presets.builtin.len();

        for count in [10, 20] {
            app.field.settings.particle_count = count;
            app.save_current_preset();
        }
        app.apply_preset(first_user);
        assert_eq!(app.current_preset_name(), Some("Custom 1"));
        app.delete_current_preset();

        app.field.settings.particle_count = 30;
        app.save_current_preset();

        let reloaded = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        let mut saved: Vec<_> = reloaded
            .user
            .iter()
            .map(|p| (p.name.as_str(), p.settings.particle_count))
            .collect();
        saved.sort();
        assert_eq!(saved, vec![("Custom 1", 30), ("Custom 2", 20)]);
    }

    #[test]
    fn test_random_palette_repopulates() {
        let mut app = test_app();
        let ticket = app.driver.request_frame().unwrap();
        app.random_palette();
        assert!(matches!(app.field.settings.palette, Palette::Custom(_)));
        assert!(!app.driver.begin(ticket, Instant::now()));
        assert_eq!(app.field.particles().len(), 40);
    }

    #[test]
    fn test_teardown_stops_frames() {
        let mut app = test_app();
        let ticket = app.driver.request_frame().unwrap();
        app.teardown();
        assert!(app.driver.request_frame().is_none());
        assert!(!app.driver.begin(ticket, Instant::now()));
    }

    #[test]
    fn test_snapshot_and_recording() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app();
        app.capture_dir = dir.path().to_path_buf();

        app.snapshot();
        assert!(app.status().unwrap().ends_with(".png"));

        app.toggle_recording();
        assert!(app.is_recording());
        for _ in 0..4 {
            app.frame();
        }
        assert_eq!(app.recorded_frames(), 2);
        app.teardown();
        assert!(!app.is_recording());
        assert!(app.status().unwrap().ends_with(".gif"));

        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 2);
    }

    #[test]
    fn test_config_reflects_live_settings() {
        let mut app = test_app();
        app.toggle_trails();
        let config = app.config();
        assert!(!config.settings.trails);
        assert_eq!(config.fps, 60);
    }
}
