//! Continuous eye-closure timing

use std::time::{Duration, Instant};

/// Tracks how long the eyes have been continuously closed while a face is
/// visible. Durations are measured from the recorded start instant, so late
/// or coalesced sampling never skews them.
#[derive(Debug, Clone, Default)]
pub struct ClosureTimer {
    started_at: Option<Instant>,
}

impl ClosureTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one observation and return the current closure duration.
    ///
    /// An open-eye or no-face observation ends the episode and reports zero.
    pub fn update(&mut self, face_detected: bool, eyes_closed: bool, now: Instant) -> Duration {
        if face_detected && eyes_closed {
            self.started_at.get_or_insert(now);
        } else {
            self.started_at = None;
        }
        self.duration(now)
    }

    /// Duration of the active episode at `now`, zero when none is active
    pub fn duration(&self, now: Instant) -> Duration {
        self.started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn reset(&mut self) {
        self.started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_starts_on_first_closed_frame() {
        let t0 = Instant::now();
        let mut timer = ClosureTimer::new();

        assert_eq!(timer.update(true, true, t0), Duration::ZERO);
        assert!(timer.is_active());
        assert_eq!(timer.update(true, true, t0 + ms(500)), ms(500));

        // Later closed frames do not move the start
        assert_eq!(timer.started_at(), Some(t0));
    }

    #[test]
    fn test_open_resets_immediately() {
        let t0 = Instant::now();
        let mut timer = ClosureTimer::new();

        timer.update(true, true, t0);
        assert_eq!(timer.update(true, true, t0 + ms(2100)), ms(2100));

        assert_eq!(timer.update(true, false, t0 + ms(2133)), Duration::ZERO);
        assert!(!timer.is_active());
        assert_eq!(timer.duration(t0 + ms(3000)), Duration::ZERO);
    }

    #[test]
    fn test_face_loss_ends_episode() {
        let t0 = Instant::now();
        let mut timer = ClosureTimer::new();

        timer.update(true, true, t0);
        assert_eq!(timer.update(false, true, t0 + ms(800)), Duration::ZERO);

        // A fresh episode starts from the next closed frame
        timer.update(true, true, t0 + ms(900));
        assert_eq!(timer.duration(t0 + ms(1000)), ms(100));
    }

    #[test]
    fn test_duration_monotonic_within_episode() {
        let t0 = Instant::now();
        let mut timer = ClosureTimer::new();
        timer.update(true, true, t0);

        let mut last = Duration::ZERO;
        for step in 1..=30 {
            let d = timer.duration(t0 + ms(step * 100));
            assert!(d >= last);
            last = d;
        }
    }

    #[test]
    fn test_sample_before_start_is_zero() {
        let t0 = Instant::now();
        let mut timer = ClosureTimer::new();
        timer.update(true, true, t0 + ms(100));

        // Out-of-order sample never goes negative
        assert_eq!(timer.duration(t0), Duration::ZERO);
    }
}
