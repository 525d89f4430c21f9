use crate::color::Palette;
use crate::links::{proximity_links, Link};
use crate::particle::Particle;
use crate::settings::FieldSettings;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Where the pointer is, as far as the field is concerned
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Pointer {
    /// Pointer left the canvas (or never entered); no interaction
    #[default]
    Away,
    /// Pointer position in field units
    At { x: f32, y: f32 },
}

/// Constellation field state: the particle set plus everything a frame needs
pub struct ParticleField {
    pub width: f32,
    pub height: f32,
    particles: Vec<Particle>,
    pub pointer: Pointer,
    pub paused: bool,
    /// Frames stepped since the last re-initialisation
    pub frames: u64,
    pub settings: FieldSettings,
    rng: StdRng,
}

impl ParticleField {
    pub fn new(width: f32, height: f32, settings: FieldSettings) -> Self {
        Self::with_rng(width, height, settings, StdRng::from_entropy())
    }

    /// Field whose initialisations are reproducible
    pub fn with_seed(width: f32, height: f32, settings: FieldSettings, seed: u64) -> Self {
        Self::with_rng(width, height, settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: f32, height: f32, settings: FieldSettings, rng: StdRng) -> Self {
        let mut field = Self {
            width: width.max(0.0),
            height: height.max(0.0),
            particles: Vec::new(),
            pointer: Pointer::Away,
            paused: false,
            frames: 0,
            settings,
            rng,
        };
        field.reset();
        field
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Recreate the whole particle set for the current count and extent
    pub fn reset(&mut self) {
        let count = self.settings.particle_count;
        let (width, height) = (self.width, self.height);
        let settings = &self.settings;
        let rng = &mut self.rng;
        self.particles = (0..count)
            .map(|_| Particle::random(&mut *rng, width, height, settings))
            .collect();
        self.frames = 0;
    }

    /// Advance every particle by one frame
    pub fn step(&mut self) {
        if self.paused {
            return;
        }

        let pointer = self.active_pointer();
        for particle in &mut self.particles {
            step_particle(particle, pointer, self.width, self.height, &self.settings);
        }
        self.frames += 1;
    }

    /// Links for the current positions
    pub fn links(&self) -> Vec<Link> {
        proximity_links(
            &self.particles,
            self.settings.link_threshold_sq,
            self.settings.link_max_opacity,
        )
    }

    /// Pointer position if it is inside the field, else None
    fn active_pointer(&self) -> Option<(f32, f32)> {
        match self.pointer {
            Pointer::At { x, y } if (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y) => {
                Some((x, y))
            }
            _ => None,
        }
    }

    /// Switch to freshly generated hues drawn from the field's RNG
    pub fn randomize_palette(&mut self) {
        self.settings.palette = Palette::random(&mut self.rng);
    }

    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = Pointer::At { x, y };
    }

    pub fn clear_pointer(&mut self) {
        self.pointer = Pointer::Away;
    }

    /// Resize the field; repopulates when the extent actually changed
    pub fn resize(&mut self, new_width: f32, new_height: f32) -> bool {
        let (new_width, new_height) = (new_width.max(0.0), new_height.max(0.0));
        if new_width != self.width || new_height != self.height {
            self.width = new_width;
            self.height = new_height;
            self.reset();
            true
        } else {
            false
        }
    }

    /// Change the particle count; repopulates when the count actually changed
    pub fn adjust_particles(&mut self, delta: i32) -> bool {
        let before = self.settings.particle_count;
        self.settings.adjust_particle_count(delta);
        if self.settings.particle_count != before {
            self.reset();
            true
        } else {
            false
        }
    }

    /// Replace settings wholesale (preset or config load) and repopulate
    pub fn apply_settings(&mut self, settings: FieldSettings) {
        self.settings = settings;
        self.reset();
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}

/// Per-frame velocity and position update for one particle.
///
/// `pointer` is `None` when interaction is disabled.
pub fn step_particle(
    particle: &mut Particle,
    pointer: Option<(f32, f32)>,
    width: f32,
    height: f32,
    settings: &FieldSettings,
) {
    let radius = settings.interaction_radius;

    let repelled = match pointer {
        Some((px, py)) => {
            let dx = px - particle.x;
            let dy = py - particle.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance < radius {
                let force = settings.repulsion_force * (1.0 - distance / radius);
                particle.vx = particle.base_vx - dx * force;
                particle.vy = particle.base_vy - dy * force;
                true
            } else {
                false
            }
        }
        None => false,
    };

    if !repelled {
        particle.vx += (particle.base_vx - particle.vx) * settings.relax_factor;
        particle.vy += (particle.base_vy - particle.vy) * settings.relax_factor;
    }

    particle.x += particle.vx;
    particle.y += particle.vy;

    if particle.x < 0.0 || particle.x > width {
        particle.vx *= -settings.wall_damping;
        particle.x = if particle.x < 0.0 { 0.0 } else { width };
    }
    if particle.y < 0.0 || particle.y > height {
        particle.vy *= -settings.wall_damping;
        particle.y = if particle.y < 0.0 { 0.0 } else { height };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(width: f32, height: f32, count: usize) -> ParticleField {
        let settings = FieldSettings {
            particle_count: count,
            ..Default::default()
        };
        ParticleField::with_seed(width, height, settings, 42)
    }

    fn assert_in_bounds(field: &ParticleField) {
        for p in field.particles() {
            assert!(p.x >= 0.0 && p.x <= field.width, "x out of bounds: {}", p.x);
            assert!(p.y >= 0.0 && p.y <= field.height, "y out of bounds: {}", p.y);
        }
    }

    #[test]
    fn test_positions_stay_in_bounds() {
        let mut f = field(120.0, 80.0, 150);
        // Strong pointer in a corner flings particles into walls
        f.settings.repulsion_force = 1.0;
        for frame in 0..2000 {
            if frame % 50 < 25 {
                f.set_pointer(5.0, 5.0);
            } else {
                f.set_pointer(115.0, 40.0);
            }
            f.step();
            assert_in_bounds(&f);
        }
    }

    #[test]
    fn test_velocity_relaxes_geometrically_when_pointer_away() {
        let settings = FieldSettings::default();
        let mut p = Particle::new(500.0, 500.0, 0.1, -0.2, 2.0, 200.0);
        p.vx = 10.0;
        p.vy = -6.0;

        let initial_dx = (p.vx - p.base_vx).abs();
        let initial_dy = (p.vy - p.base_vy).abs();
        let ratio = 1.0 - settings.relax_factor;

        for k in 1..=60 {
            step_particle(&mut p, None, 10_000.0, 10_000.0, &settings);
            let bound = ratio.powi(k);
            assert!((p.vx - p.base_vx).abs() <= initial_dx * bound + 1e-4);
            assert!((p.vy - p.base_vy).abs() <= initial_dy * bound + 1e-4);
        }
        assert!((p.vx - p.base_vx).abs() < 0.5);
    }

    #[test]
    fn test_single_bounce_damps_exactly() {
        let settings = FieldSettings::default();
        let v = 0.4_f32;

        // Moving right into the right wall, velocity already at baseline
        let mut p = Particle::new(99.9, 50.0, v, 0.0, 2.0, 200.0);
        step_particle(&mut p, None, 100.0, 100.0, &settings);
        assert_eq!(p.vx, -0.9 * v);
        assert_eq!(p.x, 100.0);

        // Moving up into the top wall
        let mut p = Particle::new(50.0, 0.1, 0.0, -v, 2.0, 200.0);
        step_particle(&mut p, None, 100.0, 100.0, &settings);
        assert_eq!(p.vy, -0.9 * -v);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn test_pointer_repels_nearby_particle() {
        let settings = FieldSettings::default();
        let mut p = Particle::new(50.0, 50.0, 0.0, 0.0, 2.0, 200.0);
        // Pointer to the right of the particle pushes it left
        step_particle(&mut p, Some((60.0, 50.0)), 200.0, 200.0, &settings);
        let expected = -10.0 * settings.repulsion_force * (1.0 - 10.0 / settings.interaction_radius);
        assert!((p.vx - expected).abs() < 1e-5);
        assert!(p.x < 50.0);
        assert_eq!(p.vy, 0.0);
    }

    #[test]
    fn test_pointer_outside_radius_or_field_has_no_effect() {
        let mut f = field(200.0, 200.0, 0);
        f.particles = vec![Particle::new(50.0, 50.0, 0.0, 0.0, 2.0, 200.0)];

        f.set_pointer(190.0, 190.0); // > 100 units away
        f.step();
        assert_eq!(f.particles()[0].vx, 0.0);

        f.set_pointer(-5.0, 50.0); // off-canvas sentinel
        f.step();
        assert_eq!(f.particles()[0].vx, 0.0);

        f.clear_pointer();
        f.step();
        assert_eq!(f.particles()[0].x, 50.0);
    }

    #[test]
    fn test_zero_particles_is_noop() {
        let mut f = field(100.0, 100.0, 0);
        assert!(f.particles().is_empty());
        f.set_pointer(50.0, 50.0);
        f.step();
        assert!(f.particles().is_empty());
        assert!(f.links().is_empty());
    }

    #[test]
    fn test_resize_repopulates_inside_new_extent() {
        let mut f = field(800.0, 600.0, 120);
        assert!(f.resize(90.0, 40.0));
        assert_eq!(f.particles().len(), 120);
        assert_in_bounds(&f);
        assert!(!f.resize(90.0, 40.0));
    }

    #[test]
    fn test_adjust_particles_reinitialises() {
        let mut f = field(100.0, 100.0, 80);
        f.step();
        assert!(f.adjust_particles(10));
        assert_eq!(f.particles().len(), 90);
        assert_eq!(f.frames, 0);
        assert!(!f.adjust_particles(0));
    }

    #[test]
    fn test_seeded_fields_are_reproducible() {
        let a = field(100.0, 100.0, 20);
        let b = field(100.0, 100.0, 20);
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_paused_field_does_not_move() {
        let mut f = field(100.0, 100.0, 10);
        let before = f.particles().to_vec();
        f.toggle_pause();
        f.step();
        assert_eq!(f.particles(), &before[..]);
        assert_eq!(f.frames, 0);
    }
}
