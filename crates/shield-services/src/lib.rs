//! # Shield Services
//!
//! The simulation engine's three external collaborators, expressed as
//! transport-agnostic async contracts, plus in-process reference
//! implementations used in simulation mode and in tests:
//!
//! - [`NetworkPlanner`] turns drawn zones and anchor points into a
//!   topology with a cost summary ([`GeometricPlanner`])
//! - [`ResilienceFeed`] serves weather/resilience predictions on a poll
//!   cadence ([`ScenarioFeed`])
//! - [`MeshRerouter`] computes replacement links around a dead node
//!   ([`NearestNeighborRerouter`])

pub mod error;
pub mod planner;
pub mod reroute;
pub mod scenario;

pub use error::{ServiceError, ServiceResult};
pub use planner::{AnchorReport, CostSummary, GeometricPlanner, PlanOutcome, TerrainKind};
pub use reroute::NearestNeighborRerouter;
pub use scenario::ScenarioFeed;

use async_trait::async_trait;
use shield_core::{GeoPoint, Link, ResilienceSnapshot, Tower, TowerId};

/// Turns drawn coverage zones and anchor points into a planned topology.
///
/// Called once per "calculate" action; a failure leaves prior state
/// untouched on the caller's side.
#[async_trait]
pub trait NetworkPlanner: Send + Sync {
    async fn plan(
        &self,
        zones: Vec<Vec<GeoPoint>>,
        anchors: Vec<GeoPoint>,
        terrain: TerrainKind,
    ) -> ServiceResult<PlanOutcome>;
}

/// Weather/resilience prediction feed, polled on a fixed cadence.
///
/// `simulate` selects the feed's disaster-drill mode over live readings.
#[async_trait]
pub trait ResilienceFeed: Send + Sync {
    async fn poll(
        &self,
        village_id: String,
        tech_type: String,
        simulate: bool,
    ) -> ServiceResult<ResilienceSnapshot>;
}

/// Computes replacement mesh links around a dead node.
#[async_trait]
pub trait MeshRerouter: Send + Sync {
    async fn reroute(&self, towers: Vec<Tower>, dead_node: TowerId) -> ServiceResult<Vec<Link>>;
}
