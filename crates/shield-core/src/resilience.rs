//! Weather-resilience snapshot and QoS policy models
//!
//! A snapshot is replaced wholesale on each accepted poll; the opaque
//! `timestamp` field is the only identity used for change detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network policy tier applied under the current severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    Optimal,
    Throttled,
    Sos,
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyStatus::Optimal => write!(f, "OPTIMAL"),
            PolicyStatus::Throttled => write!(f, "THROTTLED"),
            PolicyStatus::Sos => write!(f, "CRITICAL / SOS"),
        }
    }
}

/// Traffic-shaping policy derived from disaster severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkPolicy {
    pub status: PolicyStatus,
    pub bandwidth_cap_pct: u8,
    pub allowed_apps: Vec<String>,
    pub blocked_apps: Vec<String>,
    pub priority_msg: String,
}

impl NetworkPolicy {
    /// Policy tiering: severity < 40 runs open, < 80 shapes non-essential
    /// traffic, anything above locks bandwidth for emergencies.
    pub fn for_severity(severity: u8) -> Self {
        if severity < 40 {
            Self {
                status: PolicyStatus::Optimal,
                bandwidth_cap_pct: 100,
                allowed_apps: to_strings(&["Voice", "4K Video", "Social Media", "Gaming"]),
                blocked_apps: Vec::new(),
                priority_msg: "Standard Routing Active.".into(),
            }
        } else if severity < 80 {
            Self {
                status: PolicyStatus::Throttled,
                bandwidth_cap_pct: 50,
                allowed_apps: to_strings(&["Voice", "WhatsApp", "Browsing"]),
                blocked_apps: to_strings(&["Netflix", "Gaming", "Downloads"]),
                priority_msg: "High latency detected. Non-essential traffic shaped.".into(),
            }
        } else {
            Self {
                status: PolicyStatus::Sos,
                bandwidth_cap_pct: 10,
                allowed_apps: to_strings(&["SOS Calls", "Medical Data", "Govt Alerts"]),
                blocked_apps: to_strings(&["All Entertainment", "Social Media", "Video"]),
                priority_msg: "LIFE-LINE PROTOCOL. BANDWIDTH LOCKED FOR EMERGENCIES.".into(),
            }
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// One weather-resilience reading from the external feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceSnapshot {
    pub village_id: String,
    /// Human-readable condition, e.g. "Blizzard"
    pub condition: String,
    /// Disaster severity, 0..=100
    pub severity_score: u8,
    pub is_sos_triggered: bool,
    /// How well the deployed technology holds up under this severity
    pub resilience_score: u8,
    pub alert_message: String,
    /// Predicted disaster landfall; drives the countdown when set
    pub impact_at: Option<DateTime<Utc>>,
    pub policy: NetworkPolicy,
    /// Opaque identity stamp; equality here means "no new reading"
    pub timestamp: String,
}

impl ResilienceSnapshot {
    /// Log-trail line announced when this snapshot is accepted
    pub fn detection_line(&self) -> String {
        format!("{} DETECTED", self.condition.to_uppercase())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_tiers() {
        assert_eq!(NetworkPolicy::for_severity(10).status, PolicyStatus::Optimal);
        assert_eq!(NetworkPolicy::for_severity(39).status, PolicyStatus::Optimal);
        assert_eq!(NetworkPolicy::for_severity(40).status, PolicyStatus::Throttled);
        assert_eq!(NetworkPolicy::for_severity(79).status, PolicyStatus::Throttled);
        assert_eq!(NetworkPolicy::for_severity(80).status, PolicyStatus::Sos);
        assert_eq!(NetworkPolicy::for_severity(100).status, PolicyStatus::Sos);
    }

    #[test]
    fn test_sos_policy_caps_bandwidth() {
        let policy = NetworkPolicy::for_severity(95);
        assert_eq!(policy.bandwidth_cap_pct, 10);
        assert!(!policy.blocked_apps.is_empty());
    }

    #[test]
    fn test_detection_line() {
        let snapshot = ResilienceSnapshot {
            village_id: "chitkul".into(),
            condition: "Blizzard".into(),
            severity_score: 90,
            is_sos_triggered: true,
            resilience_score: 95,
            alert_message: String::new(),
            impact_at: None,
            policy: NetworkPolicy::for_severity(90),
            timestamp: "12:00:00".into(),
        };
        assert_eq!(snapshot.detection_line(), "BLIZZARD DETECTED");
    }
}
