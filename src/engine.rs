//! The engine: construction, stepping, and the control surface.
//!
//! A [`Simulation`] owns the CPU arena, the gravity well model, and
//! (when a device exists) the GPU resources. Constructors never fail:
//! a machine without a usable GPU gets an inert engine that reports
//! [`Event::DeviceUnavailable`] and ignores [`Simulation::step`].

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use winit::window::Window;

use crate::buffer::{Distribution, ParticleBuffer};
use crate::config::SimulationConfig;
use crate::error::EngineError;
use crate::events::{Event, EventQueue};
use crate::gpu::GpuState;
use crate::kernel::KernelParams;
use crate::particle::{Particle, ParticleColor};
use crate::stats::FrameClock;
use crate::wells::{GravityWell, GravityWellModel};

/// Lifecycle of a [`Simulation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Construction has not finished.
    Uninitialized,
    /// Device and resources exist; no step has run yet.
    DeviceReady,
    /// At least one step has run.
    Running,
    /// No usable device was found. Terminal; every step is a no-op.
    DeviceUnavailable,
}

/// A gravity-well particle simulation.
///
/// The public fields are live knobs: writes take effect on the next
/// [`Simulation::step`], no rebuild needed.
pub struct Simulation {
    /// Base color for rendered lanes.
    pub particle_color: ParticleColor,
    /// Per-step velocity multiplier.
    pub drag_factor: f32,
    /// Whether out-of-bounds lanes are relocated to a random spot.
    pub respawn_out_of_bounds: bool,
    /// Whether the canvas is wiped before each step. Leaving it off
    /// accumulates trails.
    pub clear_on_step: bool,
    config: SimulationConfig,
    wells: GravityWellModel,
    particles: ParticleBuffer,
    state: EngineState,
    gpu: Option<GpuState>,
    clock: FrameClock,
    frame_index: u32,
    rng: SmallRng,
    events: EventQueue,
    receiver: Option<Receiver<Event>>,
}

impl Simulation {
    /// Builds a simulation with no window; frames land in the canvas
    /// texture and can be read back.
    pub fn headless(config: SimulationConfig) -> Self {
        Self::build(config, None)
    }

    /// Builds a simulation that presents each frame to `window`.
    pub fn for_window(config: SimulationConfig, window: Arc<Window>) -> Self {
        Self::build(config, Some(window))
    }

    fn build(config: SimulationConfig, window: Option<Arc<Window>>) -> Self {
        let mut rng = SmallRng::from_entropy();
        let mut particles = ParticleBuffer::new(config.count);
        particles.seed(
            Distribution::Uniform,
            true,
            config.width,
            config.height,
            &mut rng,
        );

        let wells = GravityWellModel::new(config.width, config.height);
        let (events, receiver) = EventQueue::channel();

        let (gpu, state) = match GpuState::new(&config, particles.as_bytes(), window) {
            Ok(gpu) => (Some(gpu), EngineState::DeviceReady),
            Err(e) => {
                log::error!("device acquisition failed: {e}");
                events.emit(Event::DeviceUnavailable);
                (None, EngineState::DeviceUnavailable)
            }
        };

        Self {
            particle_color: config.particle_color,
            drag_factor: config.drag_factor,
            respawn_out_of_bounds: config.respawn_out_of_bounds,
            clear_on_step: config.clear_on_step,
            config,
            wells,
            particles,
            state,
            gpu,
            clock: FrameClock::new(),
            frame_index: 0,
            rng,
            events,
            receiver: Some(receiver),
        }
    }

    /// Runs one frame: dispatches the kernel over the whole arena and,
    /// for windowed simulations, presents the canvas.
    ///
    /// Without a device this is a no-op. A failed present is logged
    /// and skipped; the dispatch still runs, so simulation state keeps
    /// advancing and [`Event::Updated`] still fires.
    pub fn step(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        if let Some(fps) = self.clock.tick() {
            let description = format!(
                "{} particles at {} fps",
                self.config.count.effective(),
                fps
            );
            log::info!("{description}");
            self.events.emit(Event::Statistics { fps, description });
        }

        self.state = EngineState::Running;
        self.frame_index = self.frame_index.wrapping_add(1);

        let params = KernelParams::new(
            self.wells.lanes(),
            self.particle_color,
            self.config.width,
            self.config.height,
            self.drag_factor,
            self.respawn_out_of_bounds,
            self.frame_index,
            self.particles.records() as u32,
        );

        if let Err(e) = gpu.step(params, self.clear_on_step) {
            log::warn!("frame skipped: {e}");
        }

        self.events.emit(Event::Updated);
    }

    /// Moves `well` to a normalised position with the given mass and
    /// spin; takes effect next step.
    pub fn set_gravity_well(&mut self, well: GravityWell, x: f32, y: f32, mass: f32, spin: f32) {
        self.wells.set(well, x, y, mass, spin);
    }

    /// [`Simulation::set_gravity_well`] with the index-to-well mapping
    /// applied first.
    pub fn set_gravity_well_at(&mut self, index: usize, x: f32, y: f32, mass: f32, spin: f32) {
        self.wells.set_at(index, x, y, mass, spin);
    }

    /// Returns all four wells to their standard quarter positions.
    pub fn reset_gravity_wells(&mut self) {
        self.wells.reset();
    }

    /// Normalised position of `well`.
    pub fn gravity_well_normalised_position(&self, well: GravityWell) -> (f32, f32) {
        self.wells.normalised_position(well)
    }

    /// Reseeds every record and uploads the fresh arena.
    ///
    /// The upload is queue-ordered against any in-flight dispatch, so
    /// calling this mid-run is safe.
    pub fn reset_particles(&mut self, edges_only: bool, distribution: Distribution) {
        self.particles.seed(
            distribution,
            edges_only,
            self.config.width,
            self.config.height,
            &mut self.rng,
        );
        if let Some(gpu) = self.gpu.as_ref() {
            gpu.write_particles(self.particles.as_bytes());
        }
        log::debug!(
            "reseeded {} records ({:?}, edges_only: {edges_only})",
            self.particles.records(),
            distribution
        );
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Records in the arena; each record carries four lanes.
    #[inline]
    pub fn record_count(&self) -> usize {
        self.particles.records()
    }

    /// Particles on screen, i.e. records times four.
    #[inline]
    pub fn effective_particle_count(&self) -> u32 {
        self.config.count.effective()
    }

    /// Canvas width and height in pixels.
    #[inline]
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Takes the next pending event, if any.
    pub fn poll_event(&self) -> Option<Event> {
        self.receiver.as_ref().and_then(|rx| rx.try_recv().ok())
    }

    /// Takes ownership of the event receiver, for draining on another
    /// thread. Later calls return `None`.
    pub fn take_events(&mut self) -> Option<Receiver<Event>> {
        self.receiver.take()
    }

    /// Copies the canvas back as tightly packed RGBA bytes.
    pub fn read_canvas(&self) -> Result<Vec<u8>, EngineError> {
        match &self.gpu {
            Some(gpu) => gpu.read_canvas(),
            None => Err(EngineError::DeviceUnavailable("engine is inert".into())),
        }
    }

    /// Copies the canvas back as an image, e.g. for saving a PNG.
    pub fn canvas_image(&self) -> Result<image::RgbaImage, EngineError> {
        let pixels = self.read_canvas()?;
        image::RgbaImage::from_raw(self.config.width, self.config.height, pixels)
            .ok_or_else(|| EngineError::Readback("canvas byte length mismatch".into()))
    }

    /// Copies the particle arena back from the GPU.
    pub fn read_particles(&self) -> Result<Vec<Particle>, EngineError> {
        match &self.gpu {
            Some(gpu) => gpu.read_particles(),
            None => Err(EngineError::DeviceUnavailable("engine is inert".into())),
        }
    }

    /// Reconfigures the window surface after a resize. The canvas
    /// keeps its size; headless engines ignore this.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(width, height);
        }
    }
}
