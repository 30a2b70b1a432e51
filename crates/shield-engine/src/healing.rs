//! Node-failure and mesh-healing state machine
//!
//! At most one failure episode is in flight at a time: a kill while healing
//! is a typed no-op. The async orchestration (reroute call, minimum visible
//! delay) lives in the coordinator; completions carry the kill sequence
//! number so a stale completion lands as a silent discard.

use crate::poller::RollingLog;
use shield_core::{FailureEpisode, HealingStatus, Link, Topology, TowerId};

/// Result of a kill request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    /// Kill accepted; healing started
    Accepted,
    /// Node id was empty
    EmptyNodeId,
    /// No topology has been planned yet
    NoTopology,
    /// Node is not part of the current topology
    UnknownNode,
    /// A healing episode is already in progress
    HealingInProgress,
}

/// Failure-episode owner
#[derive(Debug)]
pub struct NodeFailureSimulator {
    dead_node: Option<TowerId>,
    status: HealingStatus,
    rerouted: Vec<Link>,
    log: RollingLog,
    /// Bumped on every accepted kill and every reset; completions must match
    kill_seq: u64,
}

impl NodeFailureSimulator {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            dead_node: None,
            status: HealingStatus::Idle,
            rerouted: Vec::new(),
            log: RollingLog::new(log_capacity),
            kill_seq: 0,
        }
    }

    pub fn status(&self) -> HealingStatus {
        self.status
    }

    pub fn kill_seq(&self) -> u64 {
        self.kill_seq
    }

    /// Guard-check and start a kill. On acceptance the node is considered
    /// dead immediately, before the reroute call resolves.
    pub fn begin_kill(&mut self, node: &TowerId, topology: &Topology) -> KillOutcome {
        if node.is_empty() {
            return KillOutcome::EmptyNodeId;
        }
        if self.status == HealingStatus::Healing {
            return KillOutcome::HealingInProgress;
        }
        if !topology.contains(node) {
            return KillOutcome::UnknownNode;
        }

        self.dead_node = Some(node.clone());
        self.status = HealingStatus::Healing;
        self.rerouted.clear();
        self.kill_seq += 1;
        KillOutcome::Accepted
    }

    /// Reroute result landed for kill `seq`. Returns false when the episode
    /// has moved on and the completion is discarded.
    pub fn complete(&mut self, seq: u64, links: Vec<Link>) -> bool {
        if seq != self.kill_seq || self.status != HealingStatus::Healing {
            return false;
        }

        let node = self
            .dead_node
            .as_ref()
            .map(|n| n.to_string())
            .unwrap_or_default();

        self.status = HealingStatus::Healed;
        let failed = format!("NODE {node} FAILED");
        self.log.push_block(&[
            failed.as_str(),
            "REROUTING MESH...",
            "PATH RESTORED VIA NEIGHBORS",
        ]);
        self.rerouted = links;
        true
    }

    /// Reroute call failed for kill `seq`; links stay untouched.
    pub fn fail(&mut self, seq: u64) -> bool {
        if seq != self.kill_seq || self.status != HealingStatus::Healing {
            return false;
        }
        self.status = HealingStatus::Error;
        true
    }

    /// A different node was selected. While IDLE or HEALED (or after an
    /// error) this resets the episode and clears prior rerouted links; it
    /// never interrupts an in-flight healing.
    pub fn select(&mut self) -> bool {
        if self.status == HealingStatus::Healing {
            return false;
        }
        self.dead_node = None;
        self.status = HealingStatus::Idle;
        self.rerouted.clear();
        self.kill_seq += 1;
        true
    }

    /// Topology replaced; the episode is meaningless against the new mesh.
    pub fn reset(&mut self) {
        self.dead_node = None;
        self.status = HealingStatus::Idle;
        self.rerouted.clear();
        self.log.clear();
        self.kill_seq += 1;
    }

    pub fn episode(&self) -> FailureEpisode {
        FailureEpisode {
            dead_node: self.dead_node.clone(),
            status: self.status,
            rerouted: self.rerouted.clone(),
            log: self.log.lines(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
