//! Simulation construction parameters.

use crate::particle::{ParticleColor, ParticleCount};

/// Everything the engine needs to build a simulation.
///
/// Width and height fix the canvas; the remaining fields are starting
/// values for knobs that stay writable on the running engine.
#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Arena size tier.
    pub count: ParticleCount,
    /// Per-step velocity multiplier.
    pub drag_factor: f32,
    /// Whether out-of-bounds lanes are relocated to a random spot.
    pub respawn_out_of_bounds: bool,
    /// Whether the canvas is wiped before each step.
    pub clear_on_step: bool,
    /// Base color for rendered lanes.
    pub particle_color: ParticleColor,
}

impl SimulationConfig {
    /// A config with the long-standing defaults: drag `0.97`, respawn
    /// and per-step clearing on, warm orange particles.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(width: u32, height: u32, count: ParticleCount) -> Self {
        assert!(width > 0 && height > 0, "canvas dimensions must be non-zero");
        Self {
            width,
            height,
            count,
            drag_factor: 0.97,
            respawn_out_of_bounds: true,
            clear_on_step: true,
            particle_color: ParticleColor::default(),
        }
    }

    pub fn with_drag_factor(mut self, drag_factor: f32) -> Self {
        self.drag_factor = drag_factor;
        self
    }

    pub fn with_respawn_out_of_bounds(mut self, respawn: bool) -> Self {
        self.respawn_out_of_bounds = respawn;
        self
    }

    pub fn with_clear_on_step(mut self, clear: bool) -> Self {
        self.clear_on_step = clear;
        self
    }

    pub fn with_particle_color(mut self, color: ParticleColor) -> Self {
        self.particle_color = color;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::new(1280, 720, ParticleCount::TwoMillion);
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert_eq!(config.drag_factor, 0.97);
        assert!(config.respawn_out_of_bounds);
        assert!(config.clear_on_step);
        assert_eq!(config.particle_color, ParticleColor::default());
    }

    #[test]
    fn test_builders_chain() {
        let config = SimulationConfig::new(640, 480, ParticleCount::HalfMillion)
            .with_drag_factor(0.8)
            .with_respawn_out_of_bounds(false)
            .with_clear_on_step(false)
            .with_particle_color(ParticleColor::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(config.drag_factor, 0.8);
        assert!(!config.respawn_out_of_bounds);
        assert!(!config.clear_on_step);
        assert_eq!(config.particle_color.g, 1.0);
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn test_zero_dimension_panics() {
        SimulationConfig::new(0, 480, ParticleCount::HalfMillion);
    }
}
