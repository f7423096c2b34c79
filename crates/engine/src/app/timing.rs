use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    frames: u32,
    ticks: u32,
    frame_time: Duration,
}

/// Frame and tick counters reported once per `window`.
#[derive(Debug)]
pub(crate) struct LoopMetrics {
    window: Duration,
    window_start: Instant,
    counts: Counts,
}

impl LoopMetrics {
    pub(crate) fn new(window: Duration, now: Instant) -> Self {
        Self {
            window,
            window_start: now,
            counts: Counts::default(),
        }
    }

    pub(crate) fn frame(&mut self, frame_dt: Duration) {
        self.counts.frames = self.counts.frames.saturating_add(1);
        self.counts.frame_time = self.counts.frame_time.saturating_add(frame_dt);
    }

    pub(crate) fn tick(&mut self) {
        self.counts.ticks = self.counts.ticks.saturating_add(1);
    }

    /// Closes the window and returns its rates once `window` has elapsed.
    pub(crate) fn take_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }
        let counts = std::mem::take(&mut self.counts);
        self.window_start = now;

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match counts.frames {
            0 => 0.0,
            frames => counts.frame_time.as_secs_f32() * 1000.0 / frames as f32,
        };
        Some(LoopMetricsSnapshot {
            fps: counts.frames as f32 / seconds,
            tps: counts.ticks as f32 / seconds,
            frame_time_ms,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Steps {
    pub(crate) ticks: u32,
    /// Backlog thrown away because the per-frame tick limit was hit.
    pub(crate) dropped: Duration,
}

/// Fixed-timestep accumulator. Frame time goes in, a number of `dt`-sized
/// world updates comes out.
#[derive(Debug)]
pub(crate) struct FixedStep {
    dt: Duration,
    max_frame_delta: Duration,
    max_ticks: u32,
    accumulator: Duration,
}

impl FixedStep {
    pub(crate) fn new(target_tps: u32, max_frame_delta: Duration, max_ticks: u32) -> Self {
        Self {
            dt: Duration::from_secs_f64(1.0 / target_tps.max(1) as f64),
            max_frame_delta: non_zero(max_frame_delta, Duration::from_millis(250)),
            max_ticks: max_ticks.max(1),
            accumulator: Duration::ZERO,
        }
    }

    pub(crate) fn dt(&self) -> Duration {
        self.dt
    }

    pub(crate) fn max_ticks(&self) -> u32 {
        self.max_ticks
    }

    pub(crate) fn max_frame_delta(&self) -> Duration {
        self.max_frame_delta
    }

    pub(crate) fn advance(&mut self, frame_dt: Duration) -> Steps {
        self.accumulator = self
            .accumulator
            .saturating_add(frame_dt.min(self.max_frame_delta));

        let mut ticks = 0;
        while self.accumulator >= self.dt && ticks < self.max_ticks {
            self.accumulator -= self.dt;
            ticks += 1;
        }
        let dropped = if self.accumulator >= self.dt {
            std::mem::take(&mut self.accumulator)
        } else {
            Duration::ZERO
        };
        Steps { ticks, dropped }
    }
}

/// Render pacing: an optional FPS cap plus a fixed minimum pause per frame.
#[derive(Debug)]
pub(crate) struct FramePacer {
    frame_budget: Option<Duration>,
    min_delay: Duration,
    last_present: Instant,
}

impl FramePacer {
    /// A cap of `Some(0)` means uncapped.
    pub(crate) fn new(max_fps: Option<u32>, min_delay: Duration, now: Instant) -> Self {
        Self {
            frame_budget: max_fps
                .filter(|fps| *fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / fps as f64)),
            min_delay,
            last_present: now,
        }
    }

    /// How long to sleep before presenting at `now`.
    pub(crate) fn delay(&self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.last_present);
        let remaining = self
            .frame_budget
            .map_or(Duration::ZERO, |budget| budget.saturating_sub(elapsed));
        remaining.max(self.min_delay)
    }

    pub(crate) fn presented(&mut self, now: Instant) {
        self.last_present = now;
    }

    pub(crate) fn cap_label(&self) -> String {
        match self.frame_budget {
            Some(budget) => format!("{:.0}", 1.0 / budget.as_secs_f64()),
            None => "off".to_string(),
        }
    }
}

pub(crate) fn non_zero(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn metrics_report_rates_after_window() {
        let start = Instant::now();
        let mut metrics = LoopMetrics::new(Duration::from_secs(1), start);
        metrics.frame(ms(20));
        metrics.frame(ms(30));
        for _ in 0..6 {
            metrics.tick();
        }

        assert!(metrics.take_snapshot(start + ms(400)).is_none());
        let snapshot = metrics
            .take_snapshot(start + Duration::from_secs(1))
            .expect("window elapsed");
        assert!((snapshot.fps - 2.0).abs() < 0.05);
        assert!((snapshot.tps - 6.0).abs() < 0.05);
        assert!((snapshot.frame_time_ms - 25.0).abs() < 0.001);

        let empty = metrics
            .take_snapshot(start + Duration::from_secs(2))
            .expect("second window");
        assert_eq!(empty.frame_time_ms, 0.0);
    }

    #[test]
    fn fixed_step_carries_remainder_between_frames() {
        let mut step = FixedStep::new(50, ms(250), 5);
        assert_eq!(step.dt(), ms(20));

        assert_eq!(step.advance(ms(50)).ticks, 2);
        assert_eq!(step.advance(ms(10)).ticks, 1);
        assert_eq!(step.advance(ms(10)).ticks, 0);
    }

    #[test]
    fn fixed_step_clamps_long_frames_and_drops_backlog() {
        let mut step = FixedStep::new(50, ms(100), 3);
        let steps = step.advance(Duration::from_secs(2));
        assert_eq!(
            steps,
            Steps {
                ticks: 3,
                dropped: ms(40),
            }
        );
        assert_eq!(step.advance(ms(0)).ticks, 0);
    }

    #[test]
    fn pacer_sleeps_out_the_frame_budget() {
        let start = Instant::now();
        let pacer = FramePacer::new(Some(50), Duration::ZERO, start);
        assert_eq!(pacer.delay(start + ms(5)), ms(15));
        assert_eq!(pacer.delay(start + ms(40)), Duration::ZERO);
        assert_eq!(pacer.cap_label(), "50");
    }

    #[test]
    fn pacer_never_sleeps_less_than_min_delay() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(Some(0), ms(3), start);
        assert_eq!(pacer.cap_label(), "off");
        assert_eq!(pacer.delay(start + ms(100)), ms(3));

        pacer.presented(start + ms(100));
        assert_eq!(pacer.delay(start + ms(100)), ms(3));
    }
}
