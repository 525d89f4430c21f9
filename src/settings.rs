use crate::color::Palette;
use serde::{Deserialize, Serialize};

/// Smallest particle count the density control allows
pub const MIN_PARTICLES: usize = 0;
/// Largest particle count the density control allows (pair pass is O(n^2))
pub const MAX_PARTICLES: usize = 300;
/// Density control step
pub const PARTICLE_STEP: i32 = 10;

/// All field settings consolidated into one struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    // === Population ===
    /// Number of particles in the field (0-300)
    pub particle_count: usize,
    /// Half-width of the uniform range each velocity component is drawn from
    pub speed_range: f32,
    /// Smallest particle radius
    pub min_radius: f32,
    /// Largest particle radius (exclusive)
    pub max_radius: f32,
    /// Hue band particles are colored from
    pub palette: Palette,

    // === Pointer interaction ===
    /// Distance within which the pointer repels particles (20-300)
    pub interaction_radius: f32,
    /// Repulsion strength at zero distance (0.0-1.0)
    pub repulsion_force: f32,
    /// Per-frame blend back toward baseline velocity (0.01-0.5)
    pub relax_factor: f32,

    // === Walls ===
    /// Fraction of speed kept when bouncing off a wall (0.1-1.0)
    pub wall_damping: f32,

    // === Links ===
    /// Squared distance below which two particles are linked
    pub link_threshold_sq: f32,
    /// Opacity of a link between coincident particles
    pub link_max_opacity: f32,

    // === Visual ===
    /// Leave fading trails instead of clearing every frame
    pub trails: bool,
    /// Background wash opacity per frame when trails are on
    pub trail_fade: f32,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            particle_count: 80,
            speed_range: 0.4,
            min_radius: 1.0,
            max_radius: 3.0,
            palette: Palette::default(),

            interaction_radius: 100.0,
            repulsion_force: 0.3,
            relax_factor: 0.05,

            wall_damping: 0.9,

            link_threshold_sq: 4000.0, // ~63.2 units
            link_max_opacity: 0.3,

            trails: true,
            trail_fade: 0.1,
        }
    }
}

impl FieldSettings {
    /// Distance at which link opacity reaches zero
    pub fn link_distance(&self) -> f32 {
        self.link_threshold_sq.max(0.0).sqrt()
    }

    /// Adjust particle count within the density control bounds
    pub fn adjust_particle_count(&mut self, delta: i32) {
        let new_val = (self.particle_count as i32 + delta).clamp(MIN_PARTICLES as i32, MAX_PARTICLES as i32);
        self.particle_count = new_val as usize;
    }

    /// Adjust interaction radius within bounds
    pub fn adjust_interaction_radius(&mut self, delta: f32) {
        self.interaction_radius = (self.interaction_radius + delta).clamp(20.0, 300.0);
    }

    /// Adjust repulsion force within bounds
    pub fn adjust_repulsion_force(&mut self, delta: f32) {
        self.repulsion_force = (self.repulsion_force + delta).clamp(0.0, 1.0);
    }

    /// Adjust relax factor within bounds
    pub fn adjust_relax_factor(&mut self, delta: f32) {
        self.relax_factor = (self.relax_factor + delta).clamp(0.01, 0.5);
    }

    /// Adjust wall damping within bounds
    pub fn adjust_wall_damping(&mut self, delta: f32) {
        self.wall_damping = (self.wall_damping + delta).clamp(0.1, 1.0);
    }

    /// Adjust link distance, keeping the threshold squared
    pub fn adjust_link_distance(&mut self, delta: f32) {
        let dist = (self.link_distance() + delta).clamp(10.0, 150.0);
        self.link_threshold_sq = dist * dist;
    }

    /// Toggle trails on/off
    pub fn toggle_trails(&mut self) {
        self.trails = !self.trails;
    }

    /// Clamp every field into its valid range (used after loading from disk)
    pub fn sanitize(&mut self) {
        self.particle_count = self.particle_count.clamp(MIN_PARTICLES, MAX_PARTICLES);
        self.speed_range = self.speed_range.clamp(0.0, 5.0);
        self.min_radius = self.min_radius.clamp(0.5, 10.0);
        self.max_radius = self.max_radius.clamp(self.min_radius, 10.0);
        self.interaction_radius = self.interaction_radius.clamp(20.0, 300.0);
        self.repulsion_force = self.repulsion_force.clamp(0.0, 1.0);
        self.relax_factor = self.relax_factor.clamp(0.01, 0.5);
        self.wall_damping = self.wall_damping.clamp(0.1, 1.0);
        self.link_threshold_sq = self.link_threshold_sq.clamp(100.0, 22500.0);
        self.link_max_opacity = self.link_max_opacity.clamp(0.0, 1.0);
        self.trail_fade = self.trail_fade.clamp(0.01, 1.0);
    }
}
