//! Steps the same arena on the GPU and on the CPU mirror and reports
//! how far the two drift apart.
//!
//! Run with: `cargo run --example parity`

use gravwell::cpu::{CpuCanvas, CpuKernel};
use gravwell::prelude::*;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const STEPS: u32 = 3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = SimulationConfig::new(WIDTH, HEIGHT, ParticleCount::HalfMillion);
    let mut sim = Simulation::headless(config);
    if sim.state() == EngineState::DeviceUnavailable {
        eprintln!("no usable GPU, exiting");
        return Ok(());
    }

    // the freshly seeded arena, read straight back from the GPU, is
    // the shared starting state for both sides
    let mut cpu_particles = sim.read_particles()?;
    let mut kernel = CpuKernel::new(WIDTH, HEIGHT);
    let mut canvas = CpuCanvas::new(WIDTH, HEIGHT);

    for _ in 0..STEPS {
        sim.step();
        canvas.clear();
        kernel.step(&mut cpu_particles, &mut canvas);
    }

    let gpu_particles = sim.read_particles()?;
    let total = gpu_particles.len() * 4;
    let mut within_half_pixel = 0usize;
    let mut max_drift = 0.0f32;
    for (gpu, cpu) in gpu_particles.iter().zip(&cpu_particles) {
        for (g, c) in [
            (gpu.a, cpu.a),
            (gpu.b, cpu.b),
            (gpu.c, cpu.c),
            (gpu.d, cpu.d),
        ] {
            let drift = ((g.x - c.x).powi(2) + (g.y - c.y).powi(2)).sqrt();
            max_drift = max_drift.max(drift);
            if drift <= 0.5 {
                within_half_pixel += 1;
            }
        }
    }

    println!(
        "{within_half_pixel} of {total} lanes within half a pixel after {STEPS} steps, \
         max drift {max_drift:.6}px"
    );
    Ok(())
}
