//! Four wells orbiting the center of the screen, drawing trails.
//!
//! Run with: `cargo run --example orbit`

use std::sync::Arc;

use gravwell::prelude::*;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

struct App {
    window: Option<Arc<Window>>,
    sim: Option<Simulation>,
    phase: f32,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title("Gravwell")
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

            let window = Arc::new(event_loop.create_window(window_attrs).unwrap());
            self.window = Some(window.clone());

            let config = SimulationConfig::new(1280, 720, ParticleCount::FourMillion)
                .with_clear_on_step(false);
            self.sim = Some(Simulation::for_window(config, window));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(sim) = &mut self.sim {
                    sim.resize_surface(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(sim) = &mut self.sim {
                    self.phase += 0.004;
                    for i in 0..4 {
                        let angle = self.phase + i as f32 * std::f32::consts::FRAC_PI_2;
                        let spin = if i % 2 == 0 { 0.8 } else { -0.8 };
                        sim.set_gravity_well_at(
                            i,
                            0.5 + 0.3 * angle.cos(),
                            0.5 + 0.3 * angle.sin(),
                            11.0,
                            spin,
                        );
                    }
                    sim.step();

                    while let Some(event) = sim.poll_event() {
                        match event {
                            Event::Statistics { description, .. } => println!("{description}"),
                            Event::DeviceUnavailable => {
                                eprintln!("no usable GPU, exiting");
                                event_loop.exit();
                            }
                            Event::Updated => {}
                        }
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        window: None,
        sim: None,
        phase: 0.0,
    };
    event_loop.run_app(&mut app).unwrap();
}
