//! Cooperative frame scheduling.
//!
//! The driver hands out one [`FrameTicket`] at a time. The event loop waits
//! until the ticket is due (draining input in the meantime) and then asks the
//! driver whether the ticket is still current before running the frame.
//! Cancelling or restarting bumps the generation, so any ticket issued
//! earlier becomes stale and its frame is dropped instead of touching state
//! that was torn down or re-initialised in between.

use std::time::{Duration, Instant};

/// Slowest and fastest frame rates accepted
pub const MIN_FPS: u32 = 10;
pub const MAX_FPS: u32 = 120;

/// Permission to run one frame, valid only for the generation it was issued in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTicket {
    generation: u64,
    pub due: Instant,
}

impl FrameTicket {
    /// Time left until the frame should run (zero if overdue)
    pub fn remaining(&self, now: Instant) -> Duration {
        self.due.saturating_duration_since(now)
    }
}

/// Frame statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    /// Frames run since the driver was created
    pub frames_run: u64,
    /// Tickets rejected because they outlived a cancel/restart
    pub stale_dropped: u64,
    /// Measured frames per second (updated twice a second)
    pub fps: f32,
}

/// Single-threaded frame loop controller
#[derive(Debug)]
pub struct FrameDriver {
    interval: Duration,
    generation: u64,
    running: bool,
    last_frame: Option<Instant>,
    stats: FrameStats,
    fps_window_start: Instant,
    fps_window_frames: u32,
}

impl FrameDriver {
    const FPS_WINDOW: Duration = Duration::from_millis(500);

    /// Create a stopped driver targeting `fps` frames per second
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Self::interval_for(fps),
            generation: 0,
            running: false,
            last_frame: None,
            stats: FrameStats::default(),
            fps_window_start: Instant::now(),
            fps_window_frames: 0,
        }
    }

    fn interval_for(fps: u32) -> Duration {
        Duration::from_secs_f64(1.0 / fps.clamp(MIN_FPS, MAX_FPS) as f64)
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.interval = Self::interval_for(fps);
    }

    pub fn target_fps(&self) -> u32 {
        (1.0 / self.interval.as_secs_f64()).round() as u32
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Start (or keep) running without invalidating outstanding tickets
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop the loop; every outstanding ticket becomes stale
    pub fn cancel(&mut self) {
        self.running = false;
        self.generation = self.generation.wrapping_add(1);
        self.last_frame = None;
    }

    /// Cancel then start again, used around re-initialisation
    pub fn restart(&mut self) {
        self.cancel();
        self.start();
    }

    /// Schedule the next frame, one interval after the previous one ran.
    ///
    /// Returns `None` once the driver has been cancelled.
    pub fn request_frame(&self) -> Option<FrameTicket> {
        if !self.running {
            return None;
        }
        let due = match self.last_frame {
            Some(last) => last + self.interval,
            None => Instant::now(),
        };
        Some(FrameTicket {
            generation: self.generation,
            due,
        })
    }

    /// Claim a ticket for execution.
    ///
    /// Returns false (and counts a dropped frame) when the ticket was issued
    /// before the most recent cancel/restart; the caller must then skip the
    /// frame entirely.
    pub fn begin(&mut self, ticket: FrameTicket, now: Instant) -> bool {
        if !self.running || ticket.generation != self.generation {
            self.stats.stale_dropped += 1;
            return false;
        }

        // A long stall must not turn into a burst of catch-up frames
        let anchor = now
            .checked_sub(self.interval)
            .map_or(ticket.due, |earliest| ticket.due.max(earliest));
        self.last_frame = Some(anchor);
        self.stats.frames_run += 1;
        self.record_fps(now);
        true
    }

    fn record_fps(&mut self, now: Instant) {
        self.fps_window_frames += 1;
        let elapsed = now.saturating_duration_since(self.fps_window_start);
        if elapsed >= Self::FPS_WINDOW {
            self.stats.fps = self.fps_window_frames as f32 / elapsed.as_secs_f32();
            self.fps_window_frames = 0;
            self.fps_window_start = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_driver_issues_no_tickets() {
        let driver = FrameDriver::new(60);
        assert!(!driver.is_running());
        assert!(driver.request_frame().is_none());
    }

    #[test]
    fn test_current_ticket_runs() {
        let mut driver = FrameDriver::new(60);
        driver.start();
        let ticket = driver.request_frame().unwrap();
        assert!(driver.begin(ticket, Instant::now()));
        assert_eq!(driver.stats().frames_run, 1);
    }

    #[test]
    fn test_ticket_is_stale_after_cancel() {
        let mut driver = FrameDriver::new(60);
        driver.start();
        let ticket = driver.request_frame().unwrap();
        driver.cancel();
        assert!(!driver.begin(ticket, Instant::now()));
        assert!(driver.request_frame().is_none());
        assert_eq!(driver.stats().stale_dropped, 1);
        assert_eq!(driver.stats().frames_run, 0);
    }

    #[test]
    fn test_ticket_is_stale_after_restart() {
        let mut driver = FrameDriver::new(60);
        driver.start();
        let old = driver.request_frame().unwrap();
        driver.restart();
        assert!(!driver.begin(old, Instant::now()));

        let fresh = driver.request_frame().unwrap();
        assert!(driver.begin(fresh, Instant::now()));
    }

    #[test]
    fn test_next_ticket_is_one_interval_later() {
        let mut driver = FrameDriver::new(50);
        driver.start();
        let first = driver.request_frame().unwrap();
        assert!(driver.begin(first, first.due));
        let second = driver.request_frame().unwrap();
        assert_eq!(second.due - first.due, Duration::from_millis(20));
    }

    #[test]
    fn test_stall_does_not_schedule_in_the_past_forever() {
        let mut driver = FrameDriver::new(50);
        driver.start();
        let first = driver.request_frame().unwrap();
        let late = first.due + Duration::from_secs(2);
        assert!(driver.begin(first, late));
        let next = driver.request_frame().unwrap();
        // Next frame is at most one interval behind "now"
        assert!(next.due + Duration::from_millis(20) >= late);
    }

    #[test]
    fn test_fps_is_clamped() {
        assert_eq!(FrameDriver::new(1).target_fps(), MIN_FPS);
        assert_eq!(FrameDriver::new(1000).target_fps(), MAX_FPS);
        assert_eq!(FrameDriver::new(60).target_fps(), 60);
    }
}
