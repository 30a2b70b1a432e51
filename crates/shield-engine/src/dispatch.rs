//! Drone dispatch state machine
//!
//! PREPARING → READY → ARMED → EN_ROUTE → ARRIVED, forward-only within one
//! disaster episode. Guard violations are typed no-op outcomes, never
//! errors: the machine itself rejects an early arm, it is not left to the
//! button being disabled.

use shield_core::{GeoPoint, MissionPhase, Topology};

/// Flight endpoints captured at mission launch.
///
/// Immutable for the mission: replacing the topology mid-flight does not
/// retarget an airborne drone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightEndpoints {
    pub start: GeoPoint,
    pub end: GeoPoint,
}

/// Result of an arm request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Newly armed
    Armed,
    /// Already armed; arming is idempotent
    AlreadyArmed,
    /// Launch window not open (or mission already launched); no state change
    NotReady,
}

/// The dispatch state machine for one episode
#[derive(Debug, Default)]
pub struct DroneDispatch {
    phase: MissionPhase,
    endpoints: Option<FlightEndpoints>,
}

impl DroneDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> MissionPhase {
        self.phase
    }

    pub fn endpoints(&self) -> Option<FlightEndpoints> {
        self.endpoints
    }

    /// Launch window opened; PREPARING → READY, once per episode
    pub fn on_launch_window(&mut self) -> bool {
        if self.phase == MissionPhase::Preparing {
            self.phase = MissionPhase::Ready;
            true
        } else {
            false
        }
    }

    /// Operator arm request
    pub fn arm(&mut self) -> ArmOutcome {
        match self.phase {
            MissionPhase::Ready => {
                self.phase = MissionPhase::Armed;
                ArmOutcome::Armed
            }
            MissionPhase::Armed => ArmOutcome::AlreadyArmed,
            _ => ArmOutcome::NotReady,
        }
    }

    /// Impact reached. An armed mission launches if the topology offers
    /// distinct launch and landfall sites; endpoints are captured here and
    /// never change for the mission.
    pub fn on_impact(&mut self, topology: &Topology) -> Option<FlightEndpoints> {
        if self.phase != MissionPhase::Armed || !topology.can_launch() {
            return None;
        }

        let start = topology.hub()?.position();
        let end = topology.terminal()?.position();
        let endpoints = FlightEndpoints { start, end };

        self.phase = MissionPhase::EnRoute;
        self.endpoints = Some(endpoints);
        Some(endpoints)
    }

    /// Flight completed; EN_ROUTE → ARRIVED, terminal for the episode
    pub fn on_arrived(&mut self) -> bool {
        if self.phase == MissionPhase::EnRoute {
            self.phase = MissionPhase::Arrived;
            true
        } else {
            false
        }
    }

    /// Episode ended; full reset back to PREPARING
    pub fn reset(&mut self) {
        self.phase = MissionPhase::Preparing;
        self.endpoints = None;
    }
}

// ============================================================================
// TESTS
// ============================================================================
