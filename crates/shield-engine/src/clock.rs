//! Impact countdown clock
//!
//! Converts the feed's absolute impact prediction into a monotonically
//! decreasing countdown. The clock is a pure state machine: the coordinator
//! feeds it observation instants, so every invariant is testable without
//! real timers. A fresh prediction (forward or backward) starts a new
//! episode and re-arms the one-shot events.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Events surfaced by one clock observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// Countdown recomputed; fires on every observation with a deadline set
    Tick { seconds_remaining: u64 },
    /// Remaining time entered the launch window; once per episode
    LaunchWindow { seconds_remaining: u64 },
    /// Countdown reached zero; exactly once per episode
    Impact,
}

/// Countdown state for one disaster episode
#[derive(Debug)]
pub struct SimulationClock {
    /// Monotonic deadline derived from the feed's prediction
    deadline: Option<Instant>,
    /// The prediction that produced the deadline; identity for episode change
    source: Option<DateTime<Utc>>,
    seconds_remaining: Option<u64>,
    launch_window_secs: u64,
    window_announced: bool,
    impact_fired: bool,
}

impl SimulationClock {
    pub fn new(launch_window_secs: u64) -> Self {
        Self {
            deadline: None,
            source: None,
            seconds_remaining: None,
            launch_window_secs,
            window_announced: false,
            impact_fired: false,
        }
    }

    /// Adopt the latest accepted prediction.
    ///
    /// An unchanged prediction is a no-op. A changed one (later, earlier,
    /// or newly absent) is a new episode: the deadline is recomputed from
    /// wall-clock "now" and the one-shot flags are re-armed.
    pub fn sync_impact(
        &mut self,
        impact_at: Option<DateTime<Utc>>,
        now_wall: DateTime<Utc>,
        now_mono: Instant,
    ) {
        if impact_at == self.source {
            return;
        }

        self.source = impact_at;
        self.window_announced = false;
        self.impact_fired = false;
        self.seconds_remaining = None;

        self.deadline = impact_at.map(|at| {
            let until = (at - now_wall).to_std().unwrap_or(Duration::ZERO);
            now_mono + until
        });
    }

    /// Recompute the countdown at `now` and surface due one-shot events.
    pub fn observe(&mut self, now: Instant) -> Vec<ClockEvent> {
        let Some(deadline) = self.deadline else {
            return Vec::new();
        };

        let remaining = deadline.saturating_duration_since(now);
        let secs = remaining.as_secs();
        self.seconds_remaining = Some(secs);

        let mut events = vec![ClockEvent::Tick {
            seconds_remaining: secs,
        }];

        if secs > 0 && secs <= self.launch_window_secs && !self.window_announced {
            self.window_announced = true;
            events.push(ClockEvent::LaunchWindow {
                seconds_remaining: secs,
            });
        }

        if remaining.is_zero() && !self.impact_fired {
            self.impact_fired = true;
            events.push(ClockEvent::Impact);
        }

        events
    }

    pub fn seconds_remaining(&self) -> Option<u64> {
        self.seconds_remaining
    }

    pub fn impact_fired(&self) -> bool {
        self.impact_fired
    }

    /// Countdown rendered the way the panel shows it, e.g. "00:07"
    pub fn display_time(&self) -> String {
        match self.seconds_remaining {
            None => String::new(),
            Some(s) => format!("{:02}:{:02}", s / 60, s % 60),
        }
    }

    /// Full reset; the clock has no memory across episodes
    pub fn reset(&mut self) {
        self.deadline = None;
        self.source = None;
        self.seconds_remaining = None;
        self.window_announced = false;
        self.impact_fired = false;
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn clock_at(horizon_secs: i64, now_mono: Instant) -> SimulationClock {
        let mut clock = SimulationClock::new(10);
        let now_wall = Utc::now();
        clock.sync_impact(
            Some(now_wall + ChronoDuration::seconds(horizon_secs)),
            now_wall,
            now_mono,
        );
        clock
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_is_non_increasing_and_non_negative() {
        let start = Instant::now();
        let mut clock = clock_at(12, start);

        let mut last = u64::MAX;
        for step in 0..40 {
            let events = clock.observe(start + Duration::from_millis(step * 500));
            let Some(ClockEvent::Tick { seconds_remaining }) = events.first().copied() else {
                panic!("tick missing");
            };
            assert!(seconds_remaining <= last);
            last = seconds_remaining;
        }
        assert_eq!(last, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_impact_fires_exactly_once() {
        let start = Instant::now();
        let mut clock = clock_at(2, start);

        let mut impacts = 0;
        for step in 0..20 {
            let events = clock.observe(start + Duration::from_millis(step * 500));
            impacts += events.iter().filter(|e| **e == ClockEvent::Impact).count();
        }
        assert_eq!(impacts, 1);
        assert_eq!(clock.seconds_remaining(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_launch_window_announced_once_inside_window() {
        let start = Instant::now();
        let mut clock = clock_at(12, start);

        // Outside the window: nothing but ticks
        let events = clock.observe(start);
        assert_eq!(events.len(), 1);

        let mut windows = 0;
        for step in 0..30 {
            let events = clock.observe(start + Duration::from_millis(step * 500));
            windows += events
                .iter()
                .filter(|e| matches!(e, ClockEvent::LaunchWindow { .. }))
                .count();
        }
        assert_eq!(windows, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_prediction_rearms_fired_impact() {
        let start = Instant::now();
        let mut clock = clock_at(1, start);

        let events = clock.observe(start + Duration::from_secs(2));
        assert!(events.contains(&ClockEvent::Impact));
        assert!(clock.impact_fired());

        // Corrected prediction arrives after impact: new episode
        let now_wall = Utc::now();
        clock.sync_impact(
            Some(now_wall + ChronoDuration::seconds(8)),
            now_wall,
            start + Duration::from_secs(2),
        );
        assert!(!clock.impact_fired());

        let events = clock.observe(start + Duration::from_secs(11));
        assert!(events.contains(&ClockEvent::Impact));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backward_jump_starts_new_episode() {
        let start = Instant::now();
        let now_wall = Utc::now();
        let mut clock = SimulationClock::new(10);
        clock.sync_impact(Some(now_wall + ChronoDuration::seconds(30)), now_wall, start);
        clock.observe(start);

        // Prediction corrected to the past: impact is immediate
        clock.sync_impact(Some(now_wall - ChronoDuration::seconds(5)), now_wall, start);
        let events = clock.observe(start);
        assert!(events.contains(&ClockEvent::Impact));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_all_state() {
        let start = Instant::now();
        let mut clock = clock_at(1, start);
        clock.observe(start + Duration::from_secs(2));

        clock.reset();
        assert!(!clock.impact_fired());
        assert_eq!(clock.seconds_remaining(), None);
        assert!(clock.observe(start + Duration::from_secs(10)).is_empty());
        assert_eq!(clock.display_time(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_time_formats() {
        let start = Instant::now();
        let mut clock = clock_at(7, start);
        clock.observe(start);
        assert_eq!(clock.display_time(), "00:07");

        let mut long = clock_at(90, start);
        long.observe(start);
        assert_eq!(long.display_time(), "01:30");
    }
}
