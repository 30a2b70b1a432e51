//! Flight-path interpolation
//!
//! A lazy, time-parameterized position sequence between two captured
//! endpoints. Progress advances by a fixed step per frame; the path is a
//! pure step function driven by the coordinator's frame timer, so tick
//! counts and the exact terminal position are testable without timers.

use crate::dispatch::FlightEndpoints;
use shield_core::GeoPoint;

/// One frame of flight progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightTick {
    /// Still en route at the interpolated position
    Airborne(GeoPoint),
    /// Snapped exactly onto the end point; the path is finished
    Arrived(GeoPoint),
}

/// Interpolation state for one mission
#[derive(Debug, Clone)]
pub struct FlightPath {
    endpoints: FlightEndpoints,
    progress: f64,
    step: f64,
}

impl FlightPath {
    pub fn new(endpoints: FlightEndpoints, step: f64) -> Self {
        Self {
            endpoints,
            progress: 0.0,
            step,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    /// Frames left until arrival: ceil((1 - progress) / step)
    pub fn ticks_remaining(&self) -> u64 {
        if self.is_complete() {
            return 0;
        }
        ((1.0 - self.progress) / self.step).ceil() as u64
    }

    /// Advance one frame. On the final frame the position snaps exactly to
    /// the end point, never an overshoot.
    pub fn advance(&mut self) -> FlightTick {
        self.progress += self.step;

        if self.progress >= 1.0 {
            self.progress = 1.0;
            FlightTick::Arrived(self.endpoints.end)
        } else {
            FlightTick::Airborne(
                self.endpoints
                    .start
                    .interpolate(&self.endpoints.end, self.progress),
            )
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
