use std::time::{Duration, Instant};

/// Frame clock - tracks delta time and reports frame rate once per interval
#[derive(Debug)]
pub struct Clock {
    last_tick: Instant,
    frames: u32,
    accumulated: f32,
    report_interval: f32,
}

impl Clock {
    /// Create new clock starting now, reporting every `report_interval` seconds
    pub fn new(report_interval: f32) -> Self {
        Self {
            last_tick: Instant::now(),
            frames: 0,
            accumulated: 0.0,
            report_interval,
        }
    }

    /// Advance one frame. Returns the average FPS when an interval completes.
    pub fn tick(&mut self) -> Option<f32> {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.record(delta)
    }

    fn record(&mut self, delta: f32) -> Option<f32> {
        self.frames += 1;
        self.accumulated += delta;

        if self.accumulated >= self.report_interval && self.accumulated > 0.0 {
            let fps = self.frames as f32 / self.accumulated;
            self.frames = 0;
            self.accumulated = 0.0;
            Some(fps)
        } else {
            None
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Elapsed-time counter for the loading indicator
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
    reported: u64,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            reported: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whole seconds elapsed, only when the count moved past the last report
    pub fn next_report(&mut self) -> Option<u64> {
        self.report_at(self.elapsed())
    }

    fn report_at(&mut self, elapsed: Duration) -> Option<u64> {
        let seconds = elapsed.as_secs();
        if seconds > self.reported {
            self.reported = seconds;
            Some(seconds)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_reports_after_interval() {
        let mut clock = Clock::new(1.0);
        for _ in 0..59 {
            assert_eq!(clock.record(1.0 / 60.0), None);
        }
        let fps = clock.record(1.0 / 60.0 + 0.001).unwrap();
        assert!((fps - 60.0).abs() < 0.1);
        assert_eq!(clock.record(0.01), None);
    }

    #[test]
    fn stopwatch_reports_each_second_once() {
        let mut watch = Stopwatch::start();
        assert_eq!(watch.report_at(Duration::from_millis(400)), None);
        assert_eq!(watch.report_at(Duration::from_millis(1100)), Some(1));
        assert_eq!(watch.report_at(Duration::from_millis(1900)), None);
        assert_eq!(watch.report_at(Duration::from_millis(3050)), Some(3));
    }

    #[test]
    fn stopwatch_starts_near_zero() {
        let mut watch = Stopwatch::start();
        assert!(watch.elapsed() < Duration::from_secs(1));
        assert_eq!(watch.next_report(), None);
    }
}
