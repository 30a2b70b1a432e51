//! Nearest-neighbor mesh rerouter
//!
//! Reference implementation of [`MeshRerouter`]: bridges a dead node back
//! into the mesh through its closest surviving tower.

use crate::{MeshRerouter, ServiceError, ServiceResult};
use shield_core::{Link, Tower, TowerId};

use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Rerouter with optional simulated service latency
pub struct NearestNeighborRerouter {
    latency: Duration,
}

impl NearestNeighborRerouter {
    pub fn new() -> Self {
        Self {
            latency: Duration::ZERO,
        }
    }

    /// Simulated round-trip latency before the reroute result lands
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for NearestNeighborRerouter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MeshRerouter for NearestNeighborRerouter {
    async fn reroute(&self, towers: Vec<Tower>, dead_node: TowerId) -> ServiceResult<Vec<Link>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let dead = towers
            .iter()
            .find(|t| t.id == dead_node)
            .ok_or_else(|| ServiceError::not_found(dead_node.as_str()))?;

        let nearest = towers
            .iter()
            .filter(|t| t.id != dead_node)
            .min_by(|a, b| {
                a.position()
                    .distance_to(&dead.position())
                    .total_cmp(&b.position().distance_to(&dead.position()))
            });

        let links = match nearest {
            Some(neighbor) => {
                info!("Rerouting {} via neighbor {}", dead.id, neighbor.id);
                vec![Link::between(neighbor.position(), dead.position())]
            }
            None => Vec::new(),
        };

        Ok(links)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shield_core::TowerKind;

    fn towers() -> Vec<Tower> {
        vec![
            Tower::new("TWR-01", 31.350, 78.430, TowerKind::MasterHub),
            Tower::new("TWR-02", 31.351, 78.431, TowerKind::Anchor),
            Tower::new("TWR-03", 31.360, 78.440, TowerKind::Relay),
        ]
    }

    #[tokio::test]
    async fn test_reroute_bridges_via_closest_neighbor() {
        let rerouter = NearestNeighborRerouter::new();
        let links = rerouter
            .reroute(towers(), TowerId::new("TWR-01"))
            .await
            .unwrap();

        assert_eq!(links.len(), 1);
        // TWR-02 is closest to the dead TWR-01
        assert_eq!(links[0].from, [31.351, 78.431]);
        assert_eq!(links[0].to, [31.350, 78.430]);
    }

    #[tokio::test]
    async fn test_reroute_unknown_node_is_not_found() {
        let rerouter = NearestNeighborRerouter::new();
        let result = rerouter.reroute(towers(), TowerId::new("TWR-99")).await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reroute_lone_tower_yields_no_links() {
        let rerouter = NearestNeighborRerouter::new();
        let lone = vec![Tower::new("TWR-01", 31.35, 78.43, TowerKind::MasterHub)];

        let links = rerouter.reroute(lone, TowerId::new("TWR-01")).await.unwrap();
        assert!(links.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated() {
        let rerouter = NearestNeighborRerouter::with_latency(Duration::from_millis(300));
        let start = tokio::time::Instant::now();

        rerouter
            .reroute(towers(), TowerId::new("TWR-02"))
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
