//! # Shield Core
//!
//! Core domain models and types for the Storm Shield simulation engine.
//! This crate provides the shared vocabulary used across the planner,
//! resilience, and engine crates.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
pub mod events;
pub mod geo;
pub mod resilience;

pub use error::CoreError;
pub use events::*;
pub use geo::*;
pub use resilience::*;

// ============================================================================
// TOPOLOGY MODELS
// ============================================================================

/// Unique identifier for a mesh tower
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TowerId(pub String);

impl TowerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TowerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TowerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Role of a tower within the planned mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Primary uplink site, preferred flight origin
    MasterHub,
    /// Placed to serve a critical anchor point (hospital, shelter)
    Anchor,
    /// Gap-fill relay for area coverage
    Relay,
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TowerKind::MasterHub => write!(f, "master_hub"),
            TowerKind::Anchor => write!(f, "anchor"),
            TowerKind::Relay => write!(f, "relay"),
        }
    }
}

/// A planned tower site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tower {
    pub id: TowerId,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "type")]
    pub kind: TowerKind,
    pub range_km: f64,
    pub cost: u64,
    pub tech: String,
}

impl Tower {
    pub fn new(id: impl Into<TowerId>, lat: f64, lng: f64, kind: TowerKind) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            kind,
            range_km: 0.0,
            cost: 0,
            tech: String::new(),
        }
    }

    pub fn with_spec(mut self, range_km: f64, cost: u64, tech: impl Into<String>) -> Self {
        self.range_km = range_km;
        self.cost = cost;
        self.tech = tech.into();
        self
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// A rendered mesh link between two positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub from: [f64; 2],
    pub to: [f64; 2],
}

impl Link {
    pub fn new(from: [f64; 2], to: [f64; 2]) -> Self {
        Self { from, to }
    }

    pub fn between(from: GeoPoint, to: GeoPoint) -> Self {
        Self {
            from: from.to_array(),
            to: to.to_array(),
        }
    }
}

/// Planned towers and links for a selected region.
///
/// Produced once by the planner, immutable for the duration of a simulation
/// run, replaced wholesale on re-plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topology {
    pub towers: Vec<Tower>,
    pub links: Vec<Link>,
}

impl Topology {
    pub fn new(towers: Vec<Tower>, links: Vec<Link>) -> Self {
        Self { towers, links }
    }

    /// Preferred flight origin: master hub, then anchor, then first tower
    pub fn hub(&self) -> Option<&Tower> {
        self.towers
            .iter()
            .find(|t| t.kind == TowerKind::MasterHub)
            .or_else(|| self.towers.iter().find(|t| t.kind == TowerKind::Anchor))
            .or_else(|| self.towers.first())
    }

    /// The last tower in planning order; the disaster's landfall site
    pub fn terminal(&self) -> Option<&Tower> {
        self.towers.last()
    }

    pub fn tower(&self, id: &TowerId) -> Option<&Tower> {
        self.towers.iter().find(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TowerId) -> bool {
        self.tower(id).is_some()
    }

    pub fn tower_count(&self) -> usize {
        self.towers.len()
    }

    /// A mission needs distinct launch and landfall sites
    pub fn can_launch(&self) -> bool {
        self.towers.len() >= 2
    }

    pub fn total_cost(&self) -> u64 {
        self.towers.iter().map(|t| t.cost).sum()
    }
}

// ============================================================================
// MISSION MODELS
// ============================================================================

/// Drone mission phase, forward-only within one disaster episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionPhase {
    /// Countdown running, launch window not yet open
    Preparing,
    /// Launch window open, waiting on operator arm
    Ready,
    /// Armed, auto-deploys on impact
    Armed,
    /// Flight interpolation in progress
    EnRoute,
    /// Terminal reached; episode's terminal phase
    Arrived,
}

impl fmt::Display for MissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissionPhase::Preparing => write!(f, "PREPARING"),
            MissionPhase::Ready => write!(f, "READY"),
            MissionPhase::Armed => write!(f, "ARMED"),
            MissionPhase::EnRoute => write!(f, "EN_ROUTE"),
            MissionPhase::Arrived => write!(f, "ARRIVED"),
        }
    }
}

impl Default for MissionPhase {
    fn default() -> Self {
        Self::Preparing
    }
}

// ============================================================================
// FAILURE / HEALING MODELS
// ============================================================================

/// Healing state of the mesh after a simulated node kill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealingStatus {
    Idle,
    Healing,
    Healed,
    Error,
}

impl fmt::Display for HealingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealingStatus::Idle => write!(f, "IDLE"),
            HealingStatus::Healing => write!(f, "HEALING"),
            HealingStatus::Healed => write!(f, "HEALED"),
            HealingStatus::Error => write!(f, "ERROR"),
        }
    }
}

impl Default for HealingStatus {
    fn default() -> Self {
        Self::Idle
    }
}

/// One node-failure episode: the dead node, the healing state machine,
/// the rerouted link set, and a newest-first log trail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureEpisode {
    pub dead_node: Option<TowerId>,
    pub status: HealingStatus,
    pub rerouted: Vec<Link>,
    pub log: Vec<String>,
}

impl FailureEpisode {
    pub fn is_healing(&self) -> bool {
        self.status == HealingStatus::Healing
    }
}

// ============================================================================
// TESTS
// ============================================================================
