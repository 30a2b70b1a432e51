//! Geometric network planner
//!
//! Reference implementation of [`NetworkPlanner`]: samples each drawn zone
//! into a coverage grid, places anchor-serving towers with a "slide toward
//! the zone centroid" heuristic, then greedily fills coverage gaps until
//! the residual uncovered fraction drops below 5%.

use crate::{NetworkPlanner, ServiceError, ServiceResult};
use shield_core::{centroid, polygon_contains, GeoPoint, Link, Topology, Tower, TowerId, TowerKind};

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Grid sampling step in degrees
const GRID_STEP_DEG: f64 = 0.0005;

/// Towers are slid to 95% of their range so anchors sit safely inside it
const RANGE_MARGIN: f64 = 0.95;

/// Gap filling stops once fewer than 5% of grid points remain uncovered
const COVERAGE_RESIDUAL: f64 = 0.05;

/// Candidate sample cap per fill round
const CANDIDATE_CAP: usize = 50;

/// Legacy trenched-infrastructure cost multiplier for the savings KPI
const LEGACY_COST_FACTOR: f64 = 1.65;

/// Terrain class of the target region, selects the deployed technology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    Flat,
    Hilly,
    Forest,
    Valley,
    Snow,
}

/// Technology parameters for one terrain class
#[derive(Debug, Clone, Copy)]
pub struct TechSpec {
    pub tech: &'static str,
    pub range_km: f64,
    pub unit_cost: u64,
}

impl TerrainKind {
    /// Per-terrain technology matrix
    pub fn spec(&self) -> TechSpec {
        match self {
            TerrainKind::Flat => TechSpec {
                tech: "Macro Tower (700MHz)",
                range_km: 10.0,
                unit_cost: 50_000,
            },
            TerrainKind::Hilly => TechSpec {
                tech: "High-Site Macro",
                range_km: 4.0,
                unit_cost: 80_000,
            },
            TerrainKind::Forest => TechSpec {
                tech: "Telescopic Mast",
                range_km: 3.0,
                unit_cost: 60_000,
            },
            TerrainKind::Valley => TechSpec {
                tech: "Small Cell / Micro",
                range_km: 0.8,
                unit_cost: 20_000,
            },
            TerrainKind::Snow => TechSpec {
                tech: "L-Band Satellite Mesh",
                range_km: 4.0,
                unit_cost: 2_500_000,
            },
        }
    }
}

/// Cost and coverage summary for a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSummary {
    pub total_towers: usize,
    pub anchor_towers: usize,
    pub relay_towers: usize,
    pub capex: u64,
    pub legacy_capex: u64,
    pub area_km2: f64,
    pub tech: String,
    pub range_km: f64,
}

/// Connectivity report for one anchor point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorReport {
    pub name: String,
    pub tower: Option<TowerId>,
    pub distance_km: Option<f64>,
    pub connected: bool,
}

/// Complete result of one planning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub topology: Topology,
    pub kpis: CostSummary,
    pub critical_analysis: Vec<AnchorReport>,
    pub build_log: Vec<String>,
}

/// A sampled coverage point
struct GridNode {
    point: GeoPoint,
    critical: bool,
    name: String,
    covered: bool,
}

/// Reference geometric planner
#[derive(Debug, Default)]
pub struct GeometricPlanner;

impl GeometricPlanner {
    pub fn new() -> Self {
        Self
    }

    fn sample_grid(zones: &[Vec<GeoPoint>], anchors: &[GeoPoint]) -> Vec<GridNode> {
        let mut nodes = Vec::new();

        for (i, anchor) in anchors.iter().enumerate() {
            nodes.push(GridNode {
                point: *anchor,
                critical: true,
                name: format!("Critical #{}", i + 1),
                covered: false,
            });
        }

        for zone in zones {
            if zone.len() < 3 {
                continue;
            }
            // Centroid first, so every zone has a "center" candidate
            if let Some(center) = centroid(zone) {
                nodes.push(GridNode {
                    point: center,
                    critical: false,
                    name: "Area Point".into(),
                    covered: false,
                });
            }

            let min_lat = zone.iter().map(|p| p.lat).fold(f64::MAX, f64::min);
            let max_lat = zone.iter().map(|p| p.lat).fold(f64::MIN, f64::max);
            let min_lng = zone.iter().map(|p| p.lng).fold(f64::MAX, f64::min);
            let max_lng = zone.iter().map(|p| p.lng).fold(f64::MIN, f64::max);

            let mut lat = min_lat;
            while lat < max_lat {
                let mut lng = min_lng;
                while lng < max_lng {
                    let candidate = GeoPoint::new(lat, lng);
                    if polygon_contains(zone, &candidate) {
                        nodes.push(GridNode {
                            point: candidate,
                            critical: false,
                            name: "Area Point".into(),
                            covered: false,
                        });
                    }
                    lng += GRID_STEP_DEG;
                }
                lat += GRID_STEP_DEG;
            }
        }

        nodes
    }

    fn mark_covered(nodes: &mut [GridNode], site: GeoPoint, range_km: f64) {
        for node in nodes.iter_mut() {
            if site.distance_to(&node.point) <= range_km {
                node.covered = true;
            }
        }
    }

    /// Anchor placement: put the tower at the closest zone centroid when the
    /// anchor can still reach it, otherwise slide it out along the
    /// anchor-to-centroid line to the edge of range.
    fn place_anchor_towers(
        zones: &[Vec<GeoPoint>],
        nodes: &mut Vec<GridNode>,
        range_km: f64,
        log: &mut Vec<String>,
    ) -> Vec<GeoPoint> {
        let anchors: Vec<(usize, GeoPoint)> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.critical)
            .map(|(i, n)| (i, n.point))
            .collect();

        let mut sites = Vec::new();

        for (idx, anchor) in anchors {
            if nodes[idx].covered {
                continue;
            }

            let target = zones
                .iter()
                .filter(|z| z.len() >= 3)
                .filter_map(|z| centroid(z))
                .map(|c| (anchor.distance_to(&c), c))
                .min_by(|a, b| a.0.total_cmp(&b.0));

            let site = match target {
                Some((dist, center)) if dist <= range_km * RANGE_MARGIN => {
                    log.push(format!(
                        "GEOMETRY: Anchor {} allows center placement. Optimal.",
                        nodes[idx].name
                    ));
                    center
                }
                Some((dist, center)) => {
                    let ratio = (range_km * RANGE_MARGIN) / dist;
                    log.push(format!(
                        "GEOMETRY: Center too far ({dist:.2}km). Slid tower to edge of range."
                    ));
                    anchor.interpolate(&center, ratio)
                }
                None => anchor,
            };

            Self::mark_covered(nodes, site, range_km);
            nodes[idx].covered = true;
            sites.push(site);
        }

        sites
    }

    /// Greedy gap filling over the residual uncovered grid
    fn place_fill_towers(
        nodes: &mut Vec<GridNode>,
        range_km: f64,
        log: &mut Vec<String>,
    ) -> Vec<GeoPoint> {
        let mut sites = Vec::new();
        let mut rng = rand::thread_rng();

        loop {
            let uncovered: Vec<GeoPoint> = nodes
                .iter()
                .filter(|n| !n.critical && !n.covered)
                .map(|n| n.point)
                .collect();

            let area_points = nodes.iter().filter(|n| !n.critical).count();
            if uncovered.is_empty()
                || (area_points > 0
                    && (uncovered.len() as f64 / area_points as f64) < COVERAGE_RESIDUAL)
            {
                break;
            }

            let candidates: Vec<GeoPoint> = if uncovered.len() > CANDIDATE_CAP {
                uncovered
                    .choose_multiple(&mut rng, CANDIDATE_CAP)
                    .copied()
                    .collect()
            } else {
                uncovered.clone()
            };

            let best = candidates
                .iter()
                .map(|c| {
                    let hits = uncovered
                        .iter()
                        .filter(|u| c.distance_to(u) <= range_km)
                        .count();
                    (hits, *c)
                })
                .max_by_key(|(hits, _)| *hits);

            match best {
                Some((hits, site)) if hits > 0 => {
                    log.push(format!("FILL: Added tower covering {hits} points."));
                    Self::mark_covered(nodes, site, range_km);
                    sites.push(site);
                }
                _ => break,
            }
        }

        sites
    }

    /// Link every anchor to its closest in-range tower
    fn link_anchors(nodes: &[GridNode], towers: &[Tower]) -> (Vec<Link>, Vec<AnchorReport>) {
        let mut links = Vec::new();
        let mut reports = Vec::new();

        for node in nodes.iter().filter(|n| n.critical) {
            let closest = towers
                .iter()
                .map(|t| (node.point.distance_to(&t.position()), t))
                .filter(|(d, t)| *d <= t.range_km * 1.1)
                .min_by(|a, b| a.0.total_cmp(&b.0));

            match closest {
                Some((dist, tower)) => {
                    links.push(Link::between(node.point, tower.position()));
                    reports.push(AnchorReport {
                        name: node.name.clone(),
                        tower: Some(tower.id.clone()),
                        distance_km: Some(dist),
                        connected: true,
                    });
                }
                None => reports.push(AnchorReport {
                    name: node.name.clone(),
                    tower: None,
                    distance_km: None,
                    connected: false,
                }),
            }
        }

        (links, reports)
    }
}

#[async_trait]
impl NetworkPlanner for GeometricPlanner {
    async fn plan(
        &self,
        zones: Vec<Vec<GeoPoint>>,
        anchors: Vec<GeoPoint>,
        terrain: TerrainKind,
    ) -> ServiceResult<PlanOutcome> {
        if zones.iter().all(|z| z.len() < 3) {
            return Err(ServiceError::backend("no usable coverage zones"));
        }

        let spec = terrain.spec();
        let mut log = vec![format!(
            "INIT: Geometric Analysis (R={}km)...",
            spec.range_km
        )];

        let mut nodes = Self::sample_grid(&zones, &anchors);
        debug!("Sampled {} grid nodes", nodes.len());

        let anchor_sites = Self::place_anchor_towers(&zones, &mut nodes, spec.range_km, &mut log);
        let fill_sites = Self::place_fill_towers(&mut nodes, spec.range_km, &mut log);

        let mut towers = Vec::new();
        for (i, site) in anchor_sites.iter().chain(fill_sites.iter()).enumerate() {
            // The first placed site carries the uplink and is the flight origin
            let kind = if i == 0 {
                TowerKind::MasterHub
            } else if i < anchor_sites.len() {
                TowerKind::Anchor
            } else {
                TowerKind::Relay
            };
            towers.push(
                Tower::new(format!("TWR-{:02}", i + 1), site.lat, site.lng, kind).with_spec(
                    spec.range_km,
                    spec.unit_cost,
                    spec.tech,
                ),
            );
        }

        if towers.is_empty() {
            return Err(ServiceError::backend("no tower sites could be placed"));
        }

        let (links, critical_analysis) = Self::link_anchors(&nodes, &towers);

        let capex: u64 = towers.iter().map(|t| t.cost).sum();
        let area_points = nodes.iter().filter(|n| !n.critical).count();
        let kpis = CostSummary {
            total_towers: towers.len(),
            anchor_towers: anchor_sites.len(),
            relay_towers: fill_sites.len(),
            capex,
            legacy_capex: (capex as f64 * LEGACY_COST_FACTOR) as u64,
            area_km2: area_points as f64 * 0.008,
            tech: spec.tech.to_string(),
            range_km: spec.range_km,
        };

        info!(
            "Planned {} towers ({} anchor, {} fill) for capex {}",
            kpis.total_towers, kpis.anchor_towers, kpis.relay_towers, kpis.capex
        );

        Ok(PlanOutcome {
            topology: Topology::new(towers, links),
            kpis,
            critical_analysis,
            build_log: log,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn square_zone(center: GeoPoint, half: f64) -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(center.lat - half, center.lng - half),
            GeoPoint::new(center.lat - half, center.lng + half),
            GeoPoint::new(center.lat + half, center.lng + half),
            GeoPoint::new(center.lat + half, center.lng - half),
        ]
    }

    #[tokio::test]
    async fn test_plan_rejects_empty_zones() {
        let planner = GeometricPlanner::new();
        let result = planner.plan(Vec::new(), Vec::new(), TerrainKind::Valley).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_plan_places_towers_and_hub() {
        let planner = GeometricPlanner::new();
        let center = GeoPoint::new(31.3526, 78.4379);
        let zone = square_zone(center, 0.002);
        let anchor = GeoPoint::new(31.3530, 78.4380);

        let outcome = planner
            .plan(vec![zone], vec![anchor], TerrainKind::Hilly)
            .await
            .unwrap();

        assert!(!outcome.topology.towers.is_empty());
        assert_eq!(outcome.topology.hub().unwrap().kind, TowerKind::MasterHub);
        assert_eq!(outcome.kpis.total_towers, outcome.topology.towers.len());
        assert!(outcome.kpis.legacy_capex > outcome.kpis.capex);
    }

    #[tokio::test]
    async fn test_anchor_within_range_is_connected() {
        let planner = GeometricPlanner::new();
        let center = GeoPoint::new(31.3526, 78.4379);
        let zone = square_zone(center, 0.002);
        // Anchor sits essentially at the centroid, well within hilly range
        let anchor = center;

        let outcome = planner
            .plan(vec![zone], vec![anchor], TerrainKind::Hilly)
            .await
            .unwrap();

        assert_eq!(outcome.critical_analysis.len(), 1);
        assert!(outcome.critical_analysis[0].connected);
        assert!(!outcome.topology.links.is_empty());
    }

    #[tokio::test]
    async fn test_plan_covers_grid() {
        let planner = GeometricPlanner::new();
        let center = GeoPoint::new(32.2656, 78.0643);
        let zone = square_zone(center, 0.003);

        let outcome = planner
            .plan(vec![zone], Vec::new(), TerrainKind::Valley)
            .await
            .unwrap();

        // Valley small cells (0.8 km range) over a ~600 m square: one or two
        // sites cover everything
        assert!(outcome.kpis.total_towers >= 1);
        assert!(outcome
            .build_log
            .iter()
            .any(|line| line.starts_with("INIT")));
    }

    #[test]
    fn test_terrain_matrix() {
        assert_eq!(TerrainKind::Valley.spec().range_km, 0.8);
        assert_eq!(TerrainKind::Snow.spec().unit_cost, 2_500_000);
        assert!(TerrainKind::Snow.spec().tech.contains("Satellite"));
    }
}
