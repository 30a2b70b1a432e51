//! Event types emitted by the simulation engine
//!
//! These events are the engine's outward face: the rendering layer
//! subscribes to them instead of reaching into component state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Link, MissionPhase, ResilienceSnapshot, TowerId};

/// Event envelope for all engine events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(event_type: EventType, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            payload,
        }
    }

    pub fn countdown(seconds_remaining: u64, display: String) -> Self {
        Self::new(
            EventType::CountdownTick,
            EventPayload::Countdown(CountdownEvent {
                seconds_remaining,
                display,
            }),
        )
    }

    pub fn launch_window_open(seconds_remaining: u64) -> Self {
        Self::new(
            EventType::LaunchWindowOpen,
            EventPayload::Countdown(CountdownEvent {
                seconds_remaining,
                display: format!("00:{seconds_remaining:02}"),
            }),
        )
    }

    pub fn impact(condition: Option<String>) -> Self {
        Self::new(
            EventType::ImpactConfirmed,
            EventPayload::Impact(ImpactEvent { condition }),
        )
    }

    pub fn phase_changed(from: MissionPhase, to: MissionPhase) -> Self {
        Self::new(
            EventType::MissionPhaseChanged,
            EventPayload::Phase(PhaseEvent { from, to }),
        )
    }

    pub fn drone_position(lat: f64, lng: f64, progress: f64) -> Self {
        Self::new(
            EventType::DronePositionUpdated,
            EventPayload::DronePosition(DronePositionEvent { lat, lng, progress }),
        )
    }

    pub fn drone_arrived(lat: f64, lng: f64) -> Self {
        Self::new(
            EventType::DroneArrived,
            EventPayload::DronePosition(DronePositionEvent {
                lat,
                lng,
                progress: 1.0,
            }),
        )
    }

    pub fn blast_radius(radius: f64) -> Self {
        Self::new(
            EventType::BlastRadiusUpdated,
            EventPayload::Blast(BlastEvent { radius }),
        )
    }

    pub fn snapshot_accepted(snapshot: ResilienceSnapshot, log_line: Option<String>) -> Self {
        Self::new(
            EventType::SnapshotAccepted,
            EventPayload::Snapshot(SnapshotEvent { snapshot, log_line }),
        )
    }

    pub fn node_killed(node: TowerId) -> Self {
        Self::new(EventType::NodeKilled, EventPayload::Kill(KillEvent { node }))
    }

    pub fn mesh_rerouted(node: TowerId, links: Vec<Link>) -> Self {
        Self::new(
            EventType::MeshRerouted,
            EventPayload::Reroute(RerouteEvent { node, links }),
        )
    }

    pub fn healing_failed(node: TowerId) -> Self {
        Self::new(EventType::HealingFailed, EventPayload::Kill(KillEvent { node }))
    }

    pub fn deactivated() -> Self {
        Self::new(EventType::SimulationDeactivated, EventPayload::None)
    }
}

/// Type of engine event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Countdown events
    CountdownTick,
    LaunchWindowOpen,
    ImpactConfirmed,

    // Mission events
    MissionPhaseChanged,
    DronePositionUpdated,
    DroneArrived,

    // Ambient effect events
    BlastRadiusUpdated,

    // Resilience feed events
    SnapshotAccepted,

    // Healing events
    NodeKilled,
    MeshRerouted,
    HealingFailed,

    // Lifecycle events
    SimulationDeactivated,
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventPayload {
    Countdown(CountdownEvent),
    Impact(ImpactEvent),
    Phase(PhaseEvent),
    DronePosition(DronePositionEvent),
    Blast(BlastEvent),
    Snapshot(SnapshotEvent),
    Kill(KillEvent),
    Reroute(RerouteEvent),
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownEvent {
    pub seconds_remaining: u64,
    /// Countdown rendered for the panel, e.g. "00:07"
    pub display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactEvent {
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEvent {
    pub from: MissionPhase,
    pub to: MissionPhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DronePositionEvent {
    pub lat: f64,
    pub lng: f64,
    pub progress: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlastEvent {
    pub radius: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEvent {
    pub snapshot: ResilienceSnapshot,
    /// Log-trail line appended for this acceptance, if any
    pub log_line: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KillEvent {
    pub node: TowerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerouteEvent {
    pub node: TowerId,
    pub links: Vec<Link>,
}

// ============================================================================
// TESTS
// ============================================================================
