//! # Shield Engine - Simulation Coordination
//!
//! Central coordinator for the disaster-response and self-healing-mesh
//! simulation. Owns the lifecycles of every time-driven process:
//!
//! - Impact countdown synchronized against the resilience feed
//! - Resilience polling with change detection
//! - Drone dispatch state machine gated by the countdown
//! - Flight-path interpolation after launch
//! - Disaster-effect expansion after impact
//! - Node-failure and mesh-healing simulation (independent flow)
//!
//! Every tick source is an independently cancellable tokio task guarded by
//! an episode generation counter: a timer that fires after its episode has
//! ended is discarded silently. Impact is delivered to the dispatch machine
//! and the effect animator inside the clock tick that detects it, before
//! control returns to the scheduler.

pub mod blast;
pub mod clock;
pub mod dispatch;
pub mod events;
pub mod flight;
pub mod healing;
pub mod poller;
pub mod state;

pub use blast::BlastEffect;
pub use clock::{ClockEvent, SimulationClock};
pub use dispatch::{ArmOutcome, DroneDispatch, FlightEndpoints};
pub use events::EventBus;
pub use flight::{FlightPath, FlightTick};
pub use healing::{KillOutcome, NodeFailureSimulator};
pub use poller::{should_accept, PollerState, RollingLog};
pub use state::EngineSnapshot;

use shield_core::{Event, FailureEpisode, GeoPoint, MissionPhase, Topology, TowerId};
use shield_services::{MeshRerouter, ResilienceFeed};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{info, warn};

/// Shield-log lines, kept verbatim from the operator panel
const READY_LOG: &str = "[SYSTEM] DRONE FLIGHT SYSTEMS ONLINE. READY TO LAUNCH.";
const ARMED_LOG: &str = "[SYSTEM] DRONE SQUADRON ARMED. AUTO-DEPLOY ON IMPACT.";
const IMPACT_LOG: &str = "[CRITICAL] IMPACT CONFIRMED. NODE FAILURE DETECTED.";

/// Engine timing and sizing configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Countdown recompute cadence
    pub clock_tick: Duration,
    /// Resilience poll cadence
    pub poll_interval: Duration,
    /// Countdown seconds at which the launch window opens
    pub launch_window_secs: u64,
    /// Delay between mission launch and the first flight frame
    pub launch_delay: Duration,
    /// Flight frame cadence
    pub frame_interval: Duration,
    /// Flight progress advanced per frame
    pub progress_step: f64,
    /// Disaster-effect tick cadence
    pub blast_tick: Duration,
    /// Radius grown per effect tick
    pub blast_step: f64,
    /// Radius ceiling
    pub blast_max: f64,
    /// Minimum time the HEALING state stays visible
    pub heal_visible_delay: Duration,
    /// Shield log capacity
    pub log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clock_tick: Duration::from_millis(500),
            poll_interval: Duration::from_secs(2),
            launch_window_secs: 10,
            launch_delay: Duration::from_secs(1),
            frame_interval: Duration::from_millis(3),
            progress_step: 0.015,
            blast_tick: Duration::from_millis(50),
            blast_step: 15.0,
            blast_max: 800.0,
            heal_visible_delay: Duration::from_millis(1500),
            log_capacity: 6,
        }
    }
}

impl EngineConfig {
    /// The simpler legacy flow polled at 1.5 s
    pub fn legacy_cadence(mut self) -> Self {
        self.poll_interval = Duration::from_millis(1500);
        self
    }
}

/// What the poller asks the resilience feed for
#[derive(Debug, Clone)]
pub struct PollTarget {
    pub village_id: String,
    pub tech_type: String,
    /// Drives the feed's disaster-drill mode over live readings
    pub simulate: bool,
}

/// Mutable state of one disaster episode, behind a single lock so Impact
/// handling is atomic with respect to every other tick.
struct EpisodeState {
    clock: SimulationClock,
    dispatch: DroneDispatch,
    flight: Option<FlightPath>,
    drone_position: Option<GeoPoint>,
    blast: BlastEffect,
    poller: PollerState,
    shield_log: RollingLog,
    terminal_blackout: bool,
    terminal_restored: bool,
    blast_running: bool,
}

impl EpisodeState {
    fn new(config: &EngineConfig) -> Self {
        Self {
            clock: SimulationClock::new(config.launch_window_secs),
            dispatch: DroneDispatch::new(),
            flight: None,
            drone_position: None,
            blast: BlastEffect::new(config.blast_step, config.blast_max),
            poller: PollerState::new(),
            shield_log: RollingLog::new(config.log_capacity),
            terminal_blackout: false,
            terminal_restored: false,
            blast_running: false,
        }
    }

    fn reset(&mut self, config: &EngineConfig) {
        *self = Self::new(config);
    }
}

/// Shared handles cloned into every spawned tick task
#[derive(Clone)]
struct TaskCtx {
    config: EngineConfig,
    episode: Arc<Mutex<EpisodeState>>,
    topology: Arc<RwLock<Option<Arc<Topology>>>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    bus: EventBus,
    active: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    /// Generation this task family belongs to
    task_gen: u64,
}

impl TaskCtx {
    /// Guard for every tick callback: is this still the active episode?
    fn is_current(&self) -> bool {
        self.active.load(Ordering::SeqCst)
            && self.generation.load(Ordering::SeqCst) == self.task_gen
    }
}

/// The simulation coordinator
pub struct SimulationEngine {
    config: EngineConfig,
    topology: Arc<RwLock<Option<Arc<Topology>>>>,
    episode: Arc<Mutex<EpisodeState>>,
    healer: Arc<Mutex<NodeFailureSimulator>>,
    bus: EventBus,
    feed: Arc<dyn ResilienceFeed>,
    rerouter: Arc<dyn MeshRerouter>,
    active: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SimulationEngine {
    pub fn new(
        config: EngineConfig,
        feed: Arc<dyn ResilienceFeed>,
        rerouter: Arc<dyn MeshRerouter>,
    ) -> Self {
        let episode = EpisodeState::new(&config);
        let healer = NodeFailureSimulator::new(config.log_capacity);

        Self {
            config,
            topology: Arc::new(RwLock::new(None)),
            episode: Arc::new(Mutex::new(episode)),
            healer: Arc::new(Mutex::new(healer)),
            bus: EventBus::default(),
            feed,
            rerouter,
            active: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Recent events, oldest first
    pub fn recent_events(&self, count: usize) -> Vec<Event> {
        self.bus.recent(count)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Replace the planned topology wholesale.
    ///
    /// An airborne mission is not retargeted (its endpoints were captured at
    /// launch); the failure episode is reset because it is meaningless
    /// against the new mesh. Clearing the topology tears the simulation
    /// down, since the poller is gated on a plan existing.
    pub fn set_topology(&self, topology: Option<Topology>) {
        if topology.is_none() {
            self.deactivate();
        }
        *self.topology.write() = topology.map(Arc::new);
        self.healer.lock().reset();
    }

    pub fn topology(&self) -> Option<Arc<Topology>> {
        self.topology.read().clone()
    }

    /// Start an episode: countdown clock plus resilience poller. Returns
    /// false when no topology is planned or the simulation already runs.
    pub fn activate(&self, target: PollTarget) -> bool {
        if self.topology.read().is_none() {
            warn!("Cannot activate simulation without a planned topology");
            return false;
        }
        if self.active.swap(true, Ordering::SeqCst) {
            return false;
        }

        let ctx = TaskCtx {
            config: self.config.clone(),
            episode: self.episode.clone(),
            topology: self.topology.clone(),
            tasks: self.tasks.clone(),
            bus: self.bus.clone(),
            active: self.active.clone(),
            generation: self.generation.clone(),
            task_gen: self.generation.load(Ordering::SeqCst),
        };

        info!(
            village = %target.village_id,
            simulate = target.simulate,
            "Simulation activated"
        );

        let clock_task = spawn_clock_task(ctx.clone());
        let poll_task = spawn_poll_task(ctx, self.feed.clone(), target);

        let mut tasks = self.tasks.lock();
        tasks.push(clock_task);
        tasks.push(poll_task);
        true
    }

    /// Tear the episode down: cancel every outstanding periodic task and
    /// reset countdown, dispatch, flight, effect, and poll state. A timer
    /// that already fired keeps its hands off the new episode via the
    /// generation guard.
    pub fn deactivate(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.episode.lock().reset(&self.config);
        self.bus.publish(Event::deactivated());
        info!("Simulation deactivated; all timers cancelled");
    }

    /// Operator arm request; a no-op unless the launch window is open
    pub fn arm(&self) -> ArmOutcome {
        let mut st = self.episode.lock();
        let outcome = st.dispatch.arm();
        if outcome == ArmOutcome::Armed {
            st.shield_log.push(ARMED_LOG);
            self.bus
                .publish(Event::phase_changed(MissionPhase::Ready, MissionPhase::Armed));
            info!("Drone squadron armed");
        }
        outcome
    }

    /// Kill a node and heal the mesh around it. The dead-node marker is
    /// published before the reroute call resolves; at most one healing
    /// episode runs at a time.
    pub fn kill_node(&self, node: TowerId) -> KillOutcome {
        let Some(topology) = self.topology.read().clone() else {
            return KillOutcome::NoTopology;
        };

        let (outcome, seq) = {
            let mut healer = self.healer.lock();
            let outcome = healer.begin_kill(&node, &topology);
            (outcome, healer.kill_seq())
        };
        if outcome != KillOutcome::Accepted {
            return outcome;
        }

        self.bus.publish(Event::node_killed(node.clone()));
        info!("Node {node} killed, rerouting mesh");

        let healer = self.healer.clone();
        let rerouter = self.rerouter.clone();
        let bus = self.bus.clone();
        let delay = self.config.heal_visible_delay;
        let towers = topology.towers.clone();

        // Guarded by the kill sequence, not the episode generation: healing
        // is independent of the disaster episode lifecycle.
        tokio::spawn(async move {
            match rerouter.reroute(towers, node.clone()).await {
                Ok(links) => {
                    // Keep HEALING on screen long enough to be perceptible
                    time::sleep(delay).await;
                    if healer.lock().complete(seq, links.clone()) {
                        bus.publish(Event::mesh_rerouted(node, links));
                        info!("Mesh healed via neighbor links");
                    }
                }
                Err(e) => {
                    warn!("Mesh reroute failed: {e}");
                    if healer.lock().fail(seq) {
                        bus.publish(Event::healing_failed(node));
                    }
                }
            }
        });

        outcome
    }

    /// A different kill target was selected; resets a finished episode
    pub fn select_kill_target(&self) -> bool {
        self.healer.lock().select()
    }

    pub fn failure_episode(&self) -> FailureEpisode {
        self.healer.lock().episode()
    }

    /// Complete engine state for the rendering layer
    pub fn snapshot(&self) -> EngineSnapshot {
        let st = self.episode.lock();
        let healer = self.healer.lock();

        EngineSnapshot {
            active: self.is_active(),
            seconds_remaining: st.clock.seconds_remaining(),
            display_time: st.clock.display_time(),
            impact_fired: st.clock.impact_fired(),
            phase: st.dispatch.phase(),
            drone_position: st.drone_position.map(|p| p.to_array()),
            effect_radius: st.blast.radius(),
            terminal_blackout: st.terminal_blackout,
            terminal_restored: st.terminal_restored,
            resilience: st.poller.latest().cloned(),
            shield_log: st.shield_log.lines(),
            failure: healer.episode(),
            timestamp: Utc::now(),
        }
    }
}

impl Drop for SimulationEngine {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

/// Countdown clock task. Impact is handled inside the tick that detects it,
/// under the episode lock, so dispatch and the effect animator see it
/// before any of their own ticks run.
fn spawn_clock_task(ctx: TaskCtx) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = time::interval(ctx.config.clock_tick);
        loop {
            tick.tick().await;
            if !ctx.is_current() {
                return;
            }

            let mut st = ctx.episode.lock();
            if !ctx.is_current() {
                return;
            }

            for event in st.clock.observe(Instant::now()) {
                match event {
                    ClockEvent::Tick { seconds_remaining } => {
                        ctx.bus
                            .publish(Event::countdown(seconds_remaining, st.clock.display_time()));
                    }
                    ClockEvent::LaunchWindow { seconds_remaining } => {
                        if st.dispatch.on_launch_window() {
                            st.shield_log.push(READY_LOG);
                            ctx.bus.publish(Event::launch_window_open(seconds_remaining));
                            ctx.bus.publish(Event::phase_changed(
                                MissionPhase::Preparing,
                                MissionPhase::Ready,
                            ));
                            info!("Launch window open at T-{seconds_remaining}s");
                        }
                    }
                    ClockEvent::Impact => handle_impact(&ctx, &mut st),
                }
            }
        }
    })
}

/// Impact reached: blackout the landfall tower, start the ambient effect,
/// and auto-deploy an armed mission.
fn handle_impact(ctx: &TaskCtx, st: &mut EpisodeState) {
    let condition = st.poller.latest().map(|s| s.condition.clone());
    st.shield_log.push(IMPACT_LOG);
    st.terminal_blackout = true;
    ctx.bus.publish(Event::impact(condition));
    info!("Impact confirmed");

    if !st.blast_running {
        st.blast_running = true;
        let handle = spawn_blast_task(ctx.clone());
        ctx.tasks.lock().push(handle);
    }

    let topology = ctx.topology.read().clone();
    if let Some(topology) = topology {
        let from = st.dispatch.phase();
        if let Some(endpoints) = st.dispatch.on_impact(&topology) {
            st.flight = Some(FlightPath::new(endpoints, ctx.config.progress_step));
            ctx.bus
                .publish(Event::phase_changed(from, MissionPhase::EnRoute));
            info!("Drone en route to landfall tower");

            let handle = spawn_flight_task(ctx.clone());
            ctx.tasks.lock().push(handle);
        }
    }
}

/// Ambient blast-radius growth; runs until the episode is torn down
fn spawn_blast_task(ctx: TaskCtx) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            time::sleep(ctx.config.blast_tick).await;
            if !ctx.is_current() {
                return;
            }

            let mut st = ctx.episode.lock();
            if !ctx.is_current() {
                return;
            }
            let radius = st.blast.advance();
            ctx.bus.publish(Event::blast_radius(radius));
        }
    })
}

/// Flight interpolation frames; finite, stops at arrival
fn spawn_flight_task(ctx: TaskCtx) -> JoinHandle<()> {
    tokio::spawn(async move {
        time::sleep(ctx.config.launch_delay).await;

        loop {
            time::sleep(ctx.config.frame_interval).await;
            if !ctx.is_current() {
                return;
            }

            let mut st = ctx.episode.lock();
            if !ctx.is_current() {
                return;
            }
            let Some(flight) = st.flight.as_mut() else {
                return;
            };

            match flight.advance() {
                FlightTick::Airborne(position) => {
                    let progress = flight.progress();
                    st.drone_position = Some(position);
                    ctx.bus
                        .publish(Event::drone_position(position.lat, position.lng, progress));
                }
                FlightTick::Arrived(position) => {
                    st.drone_position = Some(position);
                    st.terminal_restored = true;
                    let transitioned = st.dispatch.on_arrived();

                    ctx.bus.publish(Event::drone_arrived(position.lat, position.lng));
                    if transitioned {
                        ctx.bus.publish(Event::phase_changed(
                            MissionPhase::EnRoute,
                            MissionPhase::Arrived,
                        ));
                    }
                    info!("Drone arrived; landfall tower reconnected");
                    return;
                }
            }
        }
    })
}

/// Resilience poll loop: immediate first poll, then the configured cadence.
/// Failures are swallowed and retried on schedule; an unchanged snapshot
/// identity produces zero downstream updates.
fn spawn_poll_task(
    ctx: TaskCtx,
    feed: Arc<dyn ResilienceFeed>,
    target: PollTarget,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = time::interval(ctx.config.poll_interval);
        loop {
            tick.tick().await;
            if !ctx.is_current() {
                return;
            }
            if ctx.topology.read().is_none() {
                return;
            }

            let result = feed
                .poll(
                    target.village_id.clone(),
                    target.tech_type.clone(),
                    target.simulate,
                )
                .await;

            // The episode may have ended while the fetch was in flight
            if !ctx.is_current() {
                return;
            }

            match result {
                Err(e) => warn!("Resilience poll failed (will retry): {e}"),
                Ok(snapshot) => {
                    let mut st = ctx.episode.lock();
                    if !st.poller.should_accept(&snapshot) {
                        continue;
                    }

                    let line = (!st.clock.impact_fired()).then(|| {
                        format!("[{}] {}", snapshot.timestamp, snapshot.detection_line())
                    });
                    if let Some(line) = &line {
                        st.shield_log.push(line.clone());
                    }

                    st.clock
                        .sync_impact(snapshot.impact_at, Utc::now(), Instant::now());
                    st.poller.accept(snapshot.clone());
                    ctx.bus.publish(Event::snapshot_accepted(snapshot, line));
                }
            }
        }
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration};
    use mockall::mock;
    use shield_core::{EventType, HealingStatus, Link, NetworkPolicy, ResilienceSnapshot, Tower, TowerKind};
    use shield_services::{NearestNeighborRerouter, ServiceError, ServiceResult};
    use std::sync::atomic::AtomicU64;

    /// Deterministic feed: one stable impact prediction scheduled at the
    /// first poll, fresh or frozen identity stamps per poll.
    struct TestFeed {
        horizon: Option<Duration>,
        impact_at: Mutex<Option<DateTime<Utc>>>,
        polls: AtomicU64,
        frozen_stamp: bool,
    }

    impl TestFeed {
        fn with_horizon(horizon: Duration) -> Self {
            Self {
                horizon: Some(horizon),
                impact_at: Mutex::new(None),
                polls: AtomicU64::new(0),
                frozen_stamp: false,
            }
        }

        fn frozen() -> Self {
            Self {
                horizon: None,
                impact_at: Mutex::new(None),
                polls: AtomicU64::new(0),
                frozen_stamp: true,
            }
        }

        fn poll_count(&self) -> u64 {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ResilienceFeed for TestFeed {
        async fn poll(
            &self,
            village_id: String,
            _tech_type: String,
            _simulate: bool,
        ) -> ServiceResult<ResilienceSnapshot> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            let timestamp = if self.frozen_stamp {
                "frozen".to_string()
            } else {
                format!("stamp-{n}")
            };

            let impact_at = self.horizon.map(|h| {
                *self
                    .impact_at
                    .lock()
                    .get_or_insert_with(|| Utc::now() + ChronoDuration::from_std(h).unwrap())
            });

            Ok(ResilienceSnapshot {
                village_id,
                condition: "Blizzard".into(),
                severity_score: 90,
                is_sos_triggered: true,
                resilience_score: 95,
                alert_message: String::new(),
                impact_at,
                policy: NetworkPolicy::for_severity(90),
                timestamp,
            })
        }
    }

    mock! {
        pub Rerouter {}

        #[async_trait]
        impl MeshRerouter for Rerouter {
            async fn reroute(
                &self,
                towers: Vec<Tower>,
                dead_node: TowerId,
            ) -> ServiceResult<Vec<Link>>;
        }
    }

    fn topology(count: usize) -> Topology {
        let lats = [31.35, 31.36, 31.37, 31.38, 31.39];
        let towers = (0..count)
            .map(|i| {
                let kind = if i == 0 { TowerKind::MasterHub } else { TowerKind::Relay };
                Tower::new(format!("TWR-{:02}", i + 1), lats[i], 78.43, kind)
            })
            .collect();
        Topology::new(towers, Vec::new())
    }

    fn target() -> PollTarget {
        PollTarget {
            village_id: "chitkul".into(),
            tech_type: "L-Band Satellite Mesh".into(),
            simulate: true,
        }
    }

    fn engine_with_feed(feed: Arc<TestFeed>) -> SimulationEngine {
        let engine = SimulationEngine::new(
            EngineConfig::default(),
            feed,
            Arc::new(NearestNeighborRerouter::new()),
        );
        engine.set_topology(Some(topology(3)));
        engine
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_requires_topology() {
        let engine = SimulationEngine::new(
            EngineConfig::default(),
            Arc::new(TestFeed::frozen()),
            Arc::new(NearestNeighborRerouter::new()),
        );
        assert!(!engine.activate(target()));
        assert!(!engine.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_disaster_scenario() {
        let feed = Arc::new(TestFeed::with_horizon(Duration::from_secs(12)));
        let engine = engine_with_feed(feed);

        assert!(engine.activate(target()));

        // Prediction accepted, countdown running, launch window still closed
        time::sleep(Duration::from_millis(600)).await;
        let snap = engine.snapshot();
        assert_eq!(snap.phase, MissionPhase::Preparing);
        assert!(snap.seconds_remaining.unwrap() > 10);
        assert!(snap.resilience.is_some());

        // Arming before READY is rejected by the machine itself
        assert_eq!(engine.arm(), ArmOutcome::NotReady);

        // Ten seconds out the window opens
        time::sleep(Duration::from_millis(1600)).await;
        let snap = engine.snapshot();
        assert_eq!(snap.phase, MissionPhase::Ready);

        assert_eq!(engine.arm(), ArmOutcome::Armed);
        assert_eq!(engine.arm(), ArmOutcome::AlreadyArmed);

        // Ride through impact
        time::sleep(Duration::from_secs(10)).await;
        let snap = engine.snapshot();
        assert!(snap.impact_fired);
        assert_eq!(snap.phase, MissionPhase::EnRoute);
        assert_eq!(snap.seconds_remaining, Some(0));
        assert_eq!(snap.display_time, "00:00");
        assert!(snap.terminal_blackout);
        assert!(!snap.terminal_restored);

        // Effect radius grows while the drone is still on its launch delay
        time::sleep(Duration::from_millis(200)).await;
        let radius_enroute = engine.snapshot().effect_radius;
        assert!(radius_enroute > 0.0);

        // Flight: 1 s launch delay + 67 frames at 3 ms
        time::sleep(Duration::from_millis(1300)).await;
        let snap = engine.snapshot();
        assert_eq!(snap.phase, MissionPhase::Arrived);
        assert!(snap.terminal_restored);
        // Exactly the landfall tower position, never an overshoot
        assert_eq!(snap.drone_position, Some([31.37, 78.43]));
        // The ambient effect keeps growing after arrival
        assert!(snap.effect_radius >= radius_enroute);

        engine.deactivate();
        let snap = engine.snapshot();
        assert!(!snap.active);
        assert_eq!(snap.phase, MissionPhase::Preparing);
        assert_eq!(snap.effect_radius, 0.0);
        assert_eq!(snap.seconds_remaining, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_snapshot_produces_zero_updates() {
        let feed = Arc::new(TestFeed::frozen());
        let engine = engine_with_feed(feed.clone());

        engine.activate(target());
        time::sleep(Duration::from_secs(10)).await;

        // Several polls happened, exactly one was accepted
        assert!(feed.poll_count() >= 4);
        let accepted = engine
            .recent_events(256)
            .iter()
            .filter(|e| e.event_type == EventType::SnapshotAccepted)
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(engine.snapshot().shield_log.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivation_cancels_every_timer() {
        let feed = Arc::new(TestFeed::with_horizon(Duration::from_secs(5)));
        let engine = engine_with_feed(feed);

        engine.activate(target());
        time::sleep(Duration::from_secs(2)).await;
        engine.deactivate();

        let before = engine.snapshot();
        let events_before = engine.recent_events(1024).len();

        // Advance far past impact, flight, and many poll cadences: nothing
        // may fire after the episode ended
        time::sleep(Duration::from_secs(60)).await;

        let after = engine.snapshot();
        assert_eq!(after.phase, MissionPhase::Preparing);
        assert_eq!(after.seconds_remaining, None);
        assert_eq!(after.effect_radius, 0.0);
        assert!(after.drone_position.is_none());
        assert!(after.shield_log.is_empty());
        assert_eq!(after.phase, before.phase);
        assert_eq!(engine.recent_events(1024).len(), events_before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_kill_while_healing_makes_one_reroute_call() {
        let mut rerouter = MockRerouter::new();
        rerouter
            .expect_reroute()
            .times(1)
            .returning(|_, _| Ok(vec![Link::new([31.36, 78.43], [31.37, 78.43])]));

        let engine = SimulationEngine::new(
            EngineConfig::default(),
            Arc::new(TestFeed::frozen()),
            Arc::new(rerouter),
        );
        engine.set_topology(Some(topology(3)));

        assert_eq!(engine.kill_node(TowerId::new("TWR-03")), KillOutcome::Accepted);
        // Dead marker shows immediately, before the reroute resolves
        let episode = engine.failure_episode();
        assert_eq!(episode.status, HealingStatus::Healing);
        assert_eq!(episode.dead_node, Some(TowerId::new("TWR-03")));

        // Second kill while healing: rejected, no second reroute call
        assert_eq!(
            engine.kill_node(TowerId::new("TWR-02")),
            KillOutcome::HealingInProgress
        );

        time::sleep(Duration::from_secs(2)).await;
        let episode = engine.failure_episode();
        assert_eq!(episode.status, HealingStatus::Healed);
        assert_eq!(episode.rerouted.len(), 1);
        assert_eq!(
            episode.log,
            vec![
                "NODE TWR-03 FAILED",
                "REROUTING MESH...",
                "PATH RESTORED VIA NEIGHBORS"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reroute_failure_sets_error_and_keeps_links() {
        let mut rerouter = MockRerouter::new();
        rerouter
            .expect_reroute()
            .times(1)
            .returning(|_, _| Err(ServiceError::backend("reroute service down")));

        let engine = SimulationEngine::new(
            EngineConfig::default(),
            Arc::new(TestFeed::frozen()),
            Arc::new(rerouter),
        );
        engine.set_topology(Some(topology(3)));

        engine.kill_node(TowerId::new("TWR-02"));
        time::sleep(Duration::from_secs(2)).await;

        let episode = engine.failure_episode();
        assert_eq!(episode.status, HealingStatus::Error);
        assert!(episode.rerouted.is_empty());

        // A fresh selection recovers to IDLE
        assert!(engine.select_kill_target());
        assert_eq!(engine.failure_episode().status, HealingStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_kill_guards_reject_bad_nodes() {
        let engine = SimulationEngine::new(
            EngineConfig::default(),
            Arc::new(TestFeed::frozen()),
            Arc::new(NearestNeighborRerouter::new()),
        );

        assert_eq!(engine.kill_node(TowerId::new("TWR-01")), KillOutcome::NoTopology);

        engine.set_topology(Some(topology(2)));
        assert_eq!(engine.kill_node(TowerId::new("")), KillOutcome::EmptyNodeId);
        assert_eq!(engine.kill_node(TowerId::new("TWR-09")), KillOutcome::UnknownNode);
    }

    #[tokio::test(start_paused = true)]
    async fn test_topology_swap_does_not_retarget_airborne_mission() {
        let feed = Arc::new(TestFeed::with_horizon(Duration::from_secs(3)));
        let engine = engine_with_feed(feed);

        engine.activate(target());
        // Horizon below the window: READY on the first clock tick
        time::sleep(Duration::from_millis(600)).await;
        assert_eq!(engine.arm(), ArmOutcome::Armed);

        // Impact at 3 s, launch delay ends at 4 s; swap mid-flight at 4.1 s
        time::sleep(Duration::from_millis(3550)).await;
        assert_eq!(engine.snapshot().phase, MissionPhase::EnRoute);

        let replacement = Topology::new(
            vec![
                Tower::new("ALT-01", 40.0, 70.0, TowerKind::MasterHub),
                Tower::new("ALT-02", 41.0, 71.0, TowerKind::Relay),
            ],
            Vec::new(),
        );
        engine.set_topology(Some(replacement));

        time::sleep(Duration::from_secs(1)).await;
        let snap = engine.snapshot();
        assert_eq!(snap.phase, MissionPhase::Arrived);
        // Captured endpoints, not the replacement topology
        assert_eq!(snap.drone_position, Some([31.37, 78.43]));
    }
}
