//! # Gravwell
//!
//! GPU gravity-well particle simulator: millions of packed point
//! particles integrated and rasterized by one compute dispatch per
//! frame.
//!
//! Particles live in a single aligned arena of 64-byte records, four
//! independent lanes per record, so a thread steps four particles and
//! the arena never reallocates. Four movable gravity wells pull (or
//! push, with negative mass) and swirl (spin) every lane each frame;
//! the kernel then splats each lane into an RGBA canvas texture.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gravwell::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SimulationConfig::new(1280, 720, ParticleCount::FourMillion);
//!     let mut sim = Simulation::headless(config);
//!
//!     sim.set_gravity_well(GravityWell::One, 0.5, 0.5, 12.0, 0.6);
//!     for _ in 0..300 {
//!         sim.step();
//!     }
//!
//!     sim.canvas_image()?.save("gravwell.png")?;
//!     Ok(())
//! }
//! ```
//!
//! For a window, build the engine with [`Simulation::for_window`] and
//! call [`Simulation::step`] from the redraw handler; each step then
//! presents the canvas to the surface.
//!
//! ## Core Concepts
//!
//! ### Records and lanes
//!
//! A [`Particle`] record is four `vec4` lanes; each lane packs
//! `(position.xy, velocity.zw)` in pixel coordinates. Arena sizes come
//! from the [`ParticleCount`] ladder, where the on-screen count is
//! four times the record count.
//!
//! ### Gravity wells
//!
//! Four wells, addressed by [`GravityWell`] or by index, each with a
//! normalised position, a mass (negative repels), and a spin that adds
//! a tangential swirl. Moves take effect on the next step.
//!
//! ### Events
//!
//! The engine publishes [`Event`]s on an in-process channel:
//! [`Event::Updated`] after every step, periodic
//! [`Event::Statistics`], and [`Event::DeviceUnavailable`] when no
//! GPU exists. Constructors never fail; an engine without a device is
//! inert rather than absent.
//!
//! ### Canvas
//!
//! The kernel rasterizes into an internal RGBA texture the size given
//! at construction. Windowed engines blit it to the surface each step;
//! any engine can read it back via [`Simulation::read_canvas`] or
//! [`Simulation::canvas_image`].

mod buffer;
mod config;
pub mod cpu;
mod engine;
mod error;
mod events;
mod gpu;
pub mod kernel;
mod particle;
pub mod stats;
mod wells;

pub use buffer::{Distribution, ParticleBuffer, ARENA_ALIGN};
pub use bytemuck;
pub use config::SimulationConfig;
pub use engine::{EngineState, Simulation};
pub use error::EngineError;
pub use events::Event;
pub use glam::{Vec2, Vec4};
pub use particle::{Particle, ParticleColor, ParticleCount};
pub use wells::{GravityWell, GravityWellModel};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use gravwell::prelude::*;
/// ```
pub mod prelude {
    pub use crate::buffer::Distribution;
    pub use crate::config::SimulationConfig;
    pub use crate::engine::{EngineState, Simulation};
    pub use crate::error::EngineError;
    pub use crate::events::Event;
    pub use crate::particle::{Particle, ParticleColor, ParticleCount};
    pub use crate::wells::{GravityWell, GravityWellModel};
    pub use crate::{Vec2, Vec4};
}
