//! Frame counting and throughput reporting.

use std::time::Instant;

/// Frames between throughput reports.
pub const REPORT_INTERVAL: u32 = 100;

/// Counts frames and measures the frame rate over a fixed window.
///
/// [`FrameClock::tick`] returns `Some(fps)` once every
/// [`REPORT_INTERVAL`] frames and `None` otherwise.
pub struct FrameClock {
    frame: u32,
    window_start: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            frame: 0,
            window_start: Instant::now(),
        }
    }

    /// Records one frame. On the frame that completes the window this
    /// returns the rate over the window, rounded and never below one.
    pub fn tick(&mut self) -> Option<u32> {
        self.frame += 1;
        if self.frame < REPORT_INTERVAL {
            return None;
        }
        let elapsed = self.window_start.elapsed().as_secs_f64();
        let fps = ((REPORT_INTERVAL as f64 / elapsed).round() as u32).max(1);
        self.frame = 0;
        self.window_start = Instant::now();
        Some(fps)
    }

    /// Frames counted in the current window.
    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_reports_once_per_window() {
        let mut clock = FrameClock::new();
        for _ in 0..REPORT_INTERVAL - 1 {
            assert_eq!(clock.tick(), None);
        }
        let fps = clock.tick();
        assert!(matches!(fps, Some(f) if f >= 1));
    }

    #[test]
    fn test_window_resets_after_report() {
        let mut clock = FrameClock::new();
        for _ in 0..REPORT_INTERVAL {
            clock.tick();
        }
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.frame(), 1);
    }
}
