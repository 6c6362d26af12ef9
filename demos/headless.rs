//! Renders 300 frames without a window and saves the canvas as a PNG.
//!
//! Run with: `cargo run --example headless`

use gravwell::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = SimulationConfig::new(960, 540, ParticleCount::OneMillion)
        .with_clear_on_step(false);
    let mut sim = Simulation::headless(config);
    if sim.state() == EngineState::DeviceUnavailable {
        eprintln!("no usable GPU, exiting");
        return Ok(());
    }

    // cluster the arena around the center instead of the default edges
    sim.reset_particles(false, Distribution::Gaussian);
    for _ in 0..300 {
        sim.step();
    }

    let image = sim.canvas_image()?;
    let lit = image.pixels().filter(|p| p.0 != [0, 0, 0, 0]).count();
    image.save("gravwell.png")?;
    println!(
        "saved gravwell.png: {} particles lit {} of {} pixels",
        sim.effective_particle_count(),
        lit,
        image.width() * image.height()
    );
    Ok(())
}
