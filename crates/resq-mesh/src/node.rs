//! Node actor and scheduling loop
//!
//! A [`Node`] owns an inbound [`Mailbox`], its links to neighbors, a
//! [`DecisionEngine`], and a delivered-message sink. Once started it runs as
//! an independent tokio task that wakes every `tick_interval` and:
//!
//! 1. records the current queue length
//! 2. drains up to `batch_size` messages in FIFO order, processing each fully
//! 3. scores anomalies (informational only, never enforced)
//! 4. decays the rolling traffic counters by `decay_factor`
//!
//! A stop request is observed between ticks only; the batch in flight always
//! completes. Await the [`JoinHandle`] returned by [`Node::start`] before
//! treating the node as quiesced.
//!
//! ## Delivery semantics
//!
//! Forwarding is best-effort with no acknowledgment or retry. A message is
//! terminal on delivery, or when it is dropped by loop detection, an empty
//! candidate set, or simulated transmission loss. Drops are reported through
//! [`Node::subscribe`] and [`Node::stats`] on the dropping node only; the
//! sender never learns about them. Messages left in a mailbox after shutdown
//! stay there undelivered.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use resq_core::{
    ConfigError, DISTRESS_FLAG, DropReason, MeshError, MeshEvent, Message, MessageId, MessageKind,
    NodeId, Position,
};
use resq_engine::{DecisionEngine, LinkStats, PriorityContext, RouteContext};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::config::NodeConfig;
use crate::counters::{NodeStats, TrafficCounters};
use crate::link::Link;
use crate::mailbox::Mailbox;

/// Classification confidence above which a distress message is tagged
pub const DISTRESS_TAG_CONFIDENCE: f64 = 0.7;

/// Lifecycle state of a node's scheduling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Constructed, loop not yet started
    Idle,
    Running,
    /// Terminal; the loop exits at its next tick boundary
    Stopped,
}

/// Terminal result of processing one message at one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Delivered,
    Forwarded { to: NodeId },
    Dropped(DropReason),
}

/// Summary of a single tick
#[derive(Debug, Clone)]
pub struct TickReport {
    /// Queue length observed before draining
    pub queue_len: usize,
    /// Outcome of each message processed this tick, in FIFO order
    pub outcomes: Vec<(MessageId, ProcessOutcome)>,
    pub anomaly_score: f64,
}

impl TickReport {
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }
}

/// What a node knows about one neighbor
#[derive(Debug, Clone)]
struct Neighbor {
    link: Arc<Link>,
    position: Position,
    mailbox: Arc<Mailbox>,
}

/// State touched only while processing
struct NodeRuntime {
    engine: DecisionEngine,
    rng: StdRng,
    counters: TrafficCounters,
    stats: NodeStats,
}

enum Lifecycle {
    Idle,
    Running { stop_tx: watch::Sender<bool> },
    Stopped,
}

struct NodeShared {
    id: NodeId,
    position: Position,
    config: NodeConfig,
    mailbox: Arc<Mailbox>,
    neighbors: RwLock<BTreeMap<NodeId, Neighbor>>,
    runtime: Mutex<NodeRuntime>,
    delivered: RwLock<Vec<Message>>,
    events: broadcast::Sender<MeshEvent>,
    lifecycle: Mutex<Lifecycle>,
}

/// Handle to a mesh node; clones share the same node
#[derive(Clone)]
pub struct Node {
    shared: Arc<NodeShared>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.shared.id)
            .field("position", &self.shared.position)
            .field("state", &self.state())
            .finish()
    }
}

impl Node {
    /// Create an idle node
    pub fn new(id: impl Into<NodeId>, position: Position, config: NodeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let id = id.into();

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (events, _) = broadcast::channel(config.event_capacity);

        Ok(Self {
            shared: Arc::new(NodeShared {
                position,
                mailbox: Arc::new(Mailbox::new()),
                neighbors: RwLock::new(BTreeMap::new()),
                runtime: Mutex::new(NodeRuntime {
                    engine: DecisionEngine::new(id.clone()),
                    rng,
                    counters: TrafficCounters::default(),
                    stats: NodeStats::default(),
                }),
                delivered: RwLock::new(Vec::new()),
                events,
                lifecycle: Mutex::new(Lifecycle::Idle),
                config,
                id,
            }),
        })
    }

    pub fn id(&self) -> &NodeId {
        &self.shared.id
    }

    pub fn position(&self) -> Position {
        self.shared.position
    }

    pub fn config(&self) -> &NodeConfig {
        &self.shared.config
    }

    pub fn distance_to(&self, other: &Node) -> f64 {
        self.shared.position.distance_to(&other.shared.position)
    }

    /// Link this node and `other` in both directions
    ///
    /// Replaces any existing link between the pair.
    pub fn connect(&self, other: &Node, base_loss: f64) -> Result<Arc<Link>, MeshError> {
        let link = Arc::new(Link::new(self.id().clone(), other.id().clone(), base_loss)?);

        self.shared.neighbors.write().insert(
            other.id().clone(),
            Neighbor {
                link: Arc::clone(&link),
                position: other.position(),
                mailbox: Arc::clone(&other.shared.mailbox),
            },
        );
        other.shared.neighbors.write().insert(
            self.id().clone(),
            Neighbor {
                link: Arc::clone(&link),
                position: self.position(),
                mailbox: Arc::clone(&self.shared.mailbox),
            },
        );

        debug!(a = %self.id(), b = %other.id(), base_loss, "Connected nodes");
        Ok(link)
    }

    /// Ids of all connected neighbors, ascending
    pub fn neighbors(&self) -> Vec<NodeId> {
        self.shared.neighbors.read().keys().cloned().collect()
    }

    /// The link to `neighbor`, if connected
    pub fn link_to(&self, neighbor: &NodeId) -> Option<Arc<Link>> {
        self.shared
            .neighbors
            .read()
            .get(neighbor)
            .map(|n| Arc::clone(&n.link))
    }

    /// Queue a message for processing; callable from any task or thread
    pub fn enqueue(&self, message: Message) {
        trace!(node = %self.id(), message = %message.id, "Enqueued message");
        self.shared.mailbox.push(message);
    }

    pub fn queue_len(&self) -> usize {
        self.shared.mailbox.len()
    }

    /// Messages still waiting in the inbound queue
    pub fn pending_snapshot(&self) -> Vec<Message> {
        self.shared.mailbox.snapshot()
    }

    /// Point-in-time copy of the delivered sink
    pub fn delivered_snapshot(&self) -> Vec<Message> {
        self.shared.delivered.read().clone()
    }

    pub fn stats(&self) -> NodeStats {
        self.shared.runtime.lock().stats.clone()
    }

    pub fn counters(&self) -> TrafficCounters {
        self.shared.runtime.lock().counters
    }

    /// Receive every event this node emits from now on
    pub fn subscribe(&self) -> broadcast::Receiver<MeshEvent> {
        self.shared.events.subscribe()
    }

    pub fn state(&self) -> NodeState {
        match *self.shared.lifecycle.lock() {
            Lifecycle::Idle => NodeState::Idle,
            Lifecycle::Running { .. } => NodeState::Running,
            Lifecycle::Stopped => NodeState::Stopped,
        }
    }

    /// Spawn the scheduling loop on the current tokio runtime
    pub fn start(&self) -> Result<JoinHandle<()>, MeshError> {
        let mut lifecycle = self.shared.lifecycle.lock();
        match *lifecycle {
            Lifecycle::Running { .. } => return Err(MeshError::AlreadyRunning(self.id().clone())),
            Lifecycle::Stopped => return Err(MeshError::Stopped(self.id().clone())),
            Lifecycle::Idle => {}
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        *lifecycle = Lifecycle::Running { stop_tx };

        let node = self.clone();
        Ok(tokio::spawn(async move {
            node.run(stop_rx).await;
        }))
    }

    /// Request a graceful stop; takes effect at the next tick boundary
    pub fn stop(&self) {
        let mut lifecycle = self.shared.lifecycle.lock();
        if let Lifecycle::Running { stop_tx } = &*lifecycle {
            let _ = stop_tx.send(true);
        }
        *lifecycle = Lifecycle::Stopped;
    }

    async fn run(self, mut stop_rx: watch::Receiver<bool>) {
        info!(
            node = %self.id(),
            interval_ms = self.shared.config.tick_interval_ms,
            batch_size = self.shared.config.batch_size,
            "Node loop started"
        );

        let mut interval = tokio::time::interval(self.shared.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.tick();
                }
            }
        }

        info!(
            node = %self.id(),
            pending = self.queue_len(),
            "Node loop stopped"
        );
    }

    /// Run one scheduling tick synchronously
    pub fn tick(&self) -> TickReport {
        let queue_len = self.shared.mailbox.len();
        let batch = self.shared.mailbox.drain_batch(self.shared.config.batch_size);

        let mut runtime = self.shared.runtime.lock();
        let mut outcomes = Vec::with_capacity(batch.len());
        for message in batch {
            let id = message.id;
            let outcome = self.process(&mut runtime, message);
            outcomes.push((id, outcome));
        }

        let ctx = runtime.counters.to_anomaly_context(queue_len);
        let anomaly_score = runtime.engine.anomaly_score(&ctx);
        if anomaly_score > self.shared.config.anomaly_threshold {
            warn!(node = %self.id(), score = anomaly_score, queue_len, "Anomalous traffic");
            self.emit(MeshEvent::anomaly(self.id().clone(), anomaly_score));
        }

        runtime.counters.decay(self.shared.config.decay_factor);

        TickReport {
            queue_len,
            outcomes,
            anomaly_score,
        }
    }

    /// Process a single message outside the scheduling loop
    pub fn process_message(&self, message: Message) -> ProcessOutcome {
        let mut runtime = self.shared.runtime.lock();
        self.process(&mut runtime, message)
    }

    fn process(&self, runtime: &mut NodeRuntime, mut message: Message) -> ProcessOutcome {
        let node_id = self.id().clone();
        runtime.counters.record_inbound();
        runtime.stats.received += 1;
        self.emit(MeshEvent::received(node_id.clone(), message.id));

        if message.was_visited(&node_id) {
            return self.drop_message(runtime, &message, DropReason::LoopDetected);
        }
        message.mark_visited(node_id.clone());

        let classification = runtime.engine.classify(&message);
        message.kind = classification.kind;
        if classification.kind == MessageKind::Distress && classification.confidence > DISTRESS_TAG_CONFIDENCE {
            message.set_flag(DISTRESS_FLAG, true);
        }

        let queue_len = self.shared.mailbox.len();
        message.priority = runtime
            .engine
            .prioritize(&message, &PriorityContext::new(queue_len));

        if message.is_deliverable_at(&node_id) {
            info!(
                node = %node_id,
                message = %message.id,
                kind = %message.kind,
                priority = message.priority,
                hops = message.hops,
                "Delivered message"
            );
            runtime.stats.delivered += 1;
            self.emit(MeshEvent::delivered(
                node_id,
                message.id,
                message.kind,
                message.priority,
                message.hops,
            ));
            self.shared.delivered.write().push(message);
            return ProcessOutcome::Delivered;
        }

        // Neighbors already on the path could only bounce the message back
        let candidates: BTreeMap<NodeId, Neighbor> = self
            .shared
            .neighbors
            .read()
            .iter()
            .filter(|(id, _)| !message.was_visited(id))
            .map(|(id, n)| (id.clone(), n.clone()))
            .collect();

        let stats: BTreeMap<NodeId, LinkStats> = candidates
            .iter()
            .map(|(id, n)| {
                let distance = self.shared.position.distance_to(&n.position);
                (id.clone(), n.link.stats_for(distance, n.mailbox.len(), &mut runtime.rng))
            })
            .collect();

        let next_hop = runtime
            .engine
            .route(&stats, &RouteContext { queue_len }, &message);
        let Some((next_id, neighbor)) = next_hop.and_then(|id| candidates.get(&id).map(|n| (id, n))) else {
            return self.drop_message(runtime, &message, DropReason::NoRoute);
        };

        runtime.counters.record_attempt();
        if !neighbor.link.transmit(&mut runtime.rng) {
            runtime.counters.record_failure();
            return self.drop_message(runtime, &message, DropReason::TransmissionLoss);
        }

        message.hops += 1;
        debug!(
            from = %node_id,
            to = %next_id,
            message = %message.id,
            hops = message.hops,
            "Forwarded message"
        );
        self.emit(MeshEvent::forwarded(node_id, next_id.clone(), message.id));
        neighbor.mailbox.push(message);
        runtime.counters.record_outbound();
        runtime.stats.forwarded += 1;

        ProcessOutcome::Forwarded { to: next_id }
    }

    fn drop_message(&self, runtime: &mut NodeRuntime, message: &Message, reason: DropReason) -> ProcessOutcome {
        debug!(
            node = %self.id(),
            message = %message.id,
            %reason,
            "Dropped message"
        );
        runtime.stats.record_drop(reason);
        self.emit(MeshEvent::dropped(self.id().clone(), message.id, reason));
        ProcessOutcome::Dropped(reason)
    }

    fn emit(&self, event: MeshEvent) {
        // No subscribers is fine
        let _ = self.shared.events.send(event);
    }
}
