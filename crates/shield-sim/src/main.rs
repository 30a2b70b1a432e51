//! # Storm Shield Simulation Runner
//!
//! Plans a topology for the configured village, then drives one full
//! disaster episode against the reference services: countdown, arm, impact,
//! drone flight, ambient effect, and a node-kill healing pass once the
//! mission lands. Events stream to the log as they happen.

mod config;

use crate::config::SimConfig;

use shield_core::{Event, EventPayload, EventType, GeoPoint, MissionPhase};
use shield_engine::{EngineConfig, PollTarget, SimulationEngine};
use shield_services::{
    GeometricPlanner, NearestNeighborRerouter, NetworkPlanner, ScenarioFeed,
};

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Demo village centers
fn village_center(village_id: &str) -> GeoPoint {
    match village_id {
        "kalpa" => GeoPoint::new(31.5372, 78.2562),
        "langza" => GeoPoint::new(32.2656, 78.0643),
        _ => GeoPoint::new(31.3526, 78.4379),
    }
}

/// A square coverage zone around the village center
fn demo_zone(center: GeoPoint) -> Vec<GeoPoint> {
    let half = 0.003;
    vec![
        GeoPoint::new(center.lat - half, center.lng - half),
        GeoPoint::new(center.lat - half, center.lng + half),
        GeoPoint::new(center.lat + half, center.lng + half),
        GeoPoint::new(center.lat + half, center.lng - half),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("Starting Storm Shield simulation runner v0.1.0");

    let config = SimConfig::from_env();
    info!("Configuration loaded");
    info!("   Village: {}", config.village_id);
    info!("   Terrain: {:?}", config.terrain);
    info!("   Drill mode: {}", config.simulate);

    // Plan the mesh once, the way the dashboard's "calculate" action does
    let center = village_center(&config.village_id);
    let anchor = GeoPoint::new(center.lat + 0.001, center.lng + 0.001);
    let planner = GeometricPlanner::new();
    let outcome = planner
        .plan(vec![demo_zone(center)], vec![anchor], config.terrain)
        .await
        .map_err(|e| anyhow::anyhow!("network planning failed: {e}"))?;

    for line in &outcome.build_log {
        info!("   {line}");
    }
    info!(
        "Planned {} towers, capex {} ({} km2 covered)",
        outcome.kpis.total_towers, outcome.kpis.capex, outcome.kpis.area_km2
    );

    let engine = Arc::new(SimulationEngine::new(
        EngineConfig::default(),
        Arc::new(ScenarioFeed::new()),
        Arc::new(NearestNeighborRerouter::with_latency(Duration::from_millis(
            300,
        ))),
    ));
    engine.set_topology(Some(outcome.topology.clone()));

    // Stream engine events into the log
    let mut events = BroadcastStream::new(engine.subscribe());
    tokio::spawn(async move {
        while let Some(item) = events.next().await {
            // A lagged receiver just skips ahead; the log is best-effort
            if let Ok(event) = item {
                log_event(&event);
            }
        }
    });

    if !engine.activate(PollTarget {
        village_id: config.village_id.clone(),
        tech_type: outcome.kpis.tech.clone(),
        simulate: config.simulate,
    }) {
        anyhow::bail!("simulation failed to activate");
    }

    // Arm as soon as the launch window opens
    let arm_engine = engine.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(500)).await;
            if arm_engine.snapshot().phase == MissionPhase::Ready {
                arm_engine.arm();
                return;
            }
        }
    });

    // Once the mission lands, exercise the healing flow on the landfall tower
    let kill_engine = engine.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            if kill_engine.snapshot().phase == MissionPhase::Arrived {
                let terminal = kill_engine
                    .topology()
                    .and_then(|t| t.terminal().map(|tower| tower.id.clone()));
                if let Some(node) = terminal {
                    let outcome = kill_engine.kill_node(node);
                    info!("Kill request: {outcome:?}");
                }
                return;
            }
        }
    });

    tokio::select! {
        _ = shutdown_signal() => info!("Shutdown requested"),
        _ = tokio::time::sleep(Duration::from_secs(config.run_for_secs)) => {
            info!("Run horizon reached")
        }
    }

    engine.deactivate();

    let snapshot = engine.snapshot();
    info!(
        "Final state: phase={} healing={} log_lines={}",
        snapshot.phase,
        snapshot.failure.status,
        snapshot.shield_log.len() + snapshot.failure.log.len()
    );

    info!("Runner shutdown complete");
    Ok(())
}

/// Initialize logging with tracing
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shield_engine=debug,shield_services=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

fn log_event(event: &Event) {
    match &event.payload {
        EventPayload::Countdown(c) => {
            // Per-tick countdown chatter stays at debug level
            tracing::debug!("T-{} ({})", c.seconds_remaining, c.display);
        }
        EventPayload::Impact(i) => {
            warn!("IMPACT CONFIRMED ({:?})", i.condition);
        }
        EventPayload::Phase(p) => info!("Mission phase: {} -> {}", p.from, p.to),
        EventPayload::DronePosition(p) => {
            tracing::debug!("Drone at [{:.5}, {:.5}] ({:.0}%)", p.lat, p.lng, p.progress * 100.0)
        }
        EventPayload::Blast(b) => tracing::debug!("Blast radius {}", b.radius),
        EventPayload::Snapshot(s) => info!(
            "Snapshot accepted: {} severity {} (SOS: {})",
            s.snapshot.condition, s.snapshot.severity_score, s.snapshot.is_sos_triggered
        ),
        EventPayload::Kill(k) => {
            if event.event_type == EventType::HealingFailed {
                warn!("Healing failed for node {}", k.node);
            } else {
                warn!("Node {} reported dead", k.node);
            }
        }
        EventPayload::Reroute(r) => info!("Mesh healed around {} ({} new links)", r.node, r.links.len()),
        EventPayload::None => info!("Simulation deactivated"),
    }
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
