//! Engine state snapshots for the rendering layer

use shield_core::{FailureEpisode, MissionPhase, ResilienceSnapshot};
use serde::{Deserialize, Serialize};

/// Complete engine state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Simulation active flag
    pub active: bool,
    /// Countdown seconds, None before the first prediction
    pub seconds_remaining: Option<u64>,
    /// Countdown rendered as "MM:SS", empty before the first prediction
    pub display_time: String,
    /// Impact already confirmed this episode
    pub impact_fired: bool,
    /// Drone mission phase
    pub phase: MissionPhase,
    /// Current drone position [lat, lng], None until airborne
    pub drone_position: Option<[f64; 2]>,
    /// Disaster-effect radius
    pub effect_radius: f64,
    /// Landfall tower blacked out (impact through arrival)
    pub terminal_blackout: bool,
    /// Landfall tower reconnected by the arrived drone
    pub terminal_restored: bool,
    /// Last accepted resilience snapshot
    pub resilience: Option<ResilienceSnapshot>,
    /// Rolling shield log, newest first
    pub shield_log: Vec<String>,
    /// Current node-failure episode
    pub failure: FailureEpisode,
    /// Snapshot time
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl EngineSnapshot {
    /// State of a fully reset engine
    pub fn inactive() -> Self {
        Self {
            active: false,
            seconds_remaining: None,
            display_time: String::new(),
            impact_fired: false,
            phase: MissionPhase::Preparing,
            drone_position: None,
            effect_radius: 0.0,
            terminal_blackout: false,
            terminal_restored: false,
            resilience: None,
            shield_log: Vec::new(),
            failure: FailureEpisode::default(),
            timestamp: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_snapshot_is_fully_reset() {
        let snapshot = EngineSnapshot::inactive();

        assert!(!snapshot.active);
        assert_eq!(snapshot.phase, MissionPhase::Preparing);
        assert_eq!(snapshot.effect_radius, 0.0);
        assert!(snapshot.drone_position.is_none());
        assert!(snapshot.shield_log.is_empty());
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = EngineSnapshot::inactive();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"PREPARING\""));
    }
}
