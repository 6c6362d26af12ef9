//! Engine notifications.
//!
//! The engine publishes lifecycle news on an in-process channel rather
//! than through callbacks. Callers drain it between steps with
//! [`crate::Simulation::poll_event`] or
//! [`crate::Simulation::take_events`]; an undrained queue costs memory
//! but never blocks the engine.

use std::sync::mpsc::{self, Receiver, Sender};

/// A notification published by the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A step finished and the canvas holds the new frame.
    Updated,
    /// Periodic throughput report.
    Statistics {
        /// Frames per second over the last report window.
        fps: u32,
        /// Human-readable summary, e.g. `"2097152 particles at 60 fps"`.
        description: String,
    },
    /// No usable GPU was found; the engine is permanently inert.
    DeviceUnavailable,
}

/// Sending half of the engine's notification channel.
pub(crate) struct EventQueue {
    tx: Sender<Event>,
}

impl EventQueue {
    pub(crate) fn channel() -> (Self, Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    /// Publishes an event. A dropped receiver is not an error; the
    /// engine keeps running without an audience.
    pub(crate) fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}
