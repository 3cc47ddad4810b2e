//! # ResQ Engine
//!
//! Per-node heuristic decision functions for the ResQ mesh.
//!
//! A [`DecisionEngine`] is constructed for each node and exposes four
//! capabilities:
//!
//! - [`DecisionEngine::classify`]: keyword/coordinate classification
//! - [`DecisionEngine::prioritize`]: kind, recency and congestion blend
//! - [`DecisionEngine::route`]: priority-weighted next-hop scoring
//! - [`DecisionEngine::anomaly_score`]: rolling failure/queue detector
//!
//! The scorers are fixed heuristics, not a trained model. Only the anomaly
//! detector keeps state between calls (the time of its previous tick).
//!
//! ```rust,ignore
//! use resq_engine::{DecisionEngine, PriorityContext};
//!
//! let mut engine = DecisionEngine::new("B");
//! let classification = engine.classify(&message);
//! message.kind = classification.kind;
//! message.priority = engine.prioritize(&message, &PriorityContext::new(queue_len));
//! ```

pub mod anomaly;
pub mod classifier;
pub mod priority;
pub mod router;

pub use anomaly::{AnomalyContext, AnomalyDetector};
pub use classifier::{Classification, KeywordScores};
pub use priority::PriorityContext;
pub use router::{LinkStats, RouteContext};

use std::collections::BTreeMap;
use std::time::Instant;

use resq_core::{Message, NodeId};
use tracing::debug;

/// Clamp `x` into `[lo, hi]`
pub(crate) fn clip(x: f64, lo: f64, hi: f64) -> f64 {
    x.max(lo).min(hi)
}

/// Heuristic decision engine owned by a single node
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    node_id: NodeId,
    anomaly: AnomalyDetector,
}

impl DecisionEngine {
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            anomaly: AnomalyDetector::new(),
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn classify(&self, message: &Message) -> Classification {
        let classification = classifier::classify(message);
        debug!(
            node = %self.node_id,
            message = %message.id,
            kind = %classification.kind,
            confidence = classification.confidence,
            "Classified message"
        );
        classification
    }

    pub fn prioritize(&self, message: &Message, ctx: &PriorityContext) -> f64 {
        priority::prioritize(message, ctx)
    }

    pub fn route(
        &self,
        candidates: &BTreeMap<NodeId, LinkStats>,
        ctx: &RouteContext,
        message: &Message,
    ) -> Option<NodeId> {
        let chosen = router::route(candidates, ctx, message);
        debug!(
            node = %self.node_id,
            message = %message.id,
            candidates = candidates.len(),
            next_hop = ?chosen,
            "Selected next hop"
        );
        chosen
    }

    /// Score traffic since the previous call; advances the tick marker
    pub fn anomaly_score(&mut self, ctx: &AnomalyContext) -> f64 {
        self.anomaly.score(ctx)
    }

    pub fn anomaly_score_at(&mut self, ctx: &AnomalyContext, now: Instant) -> f64 {
        self.anomaly.score_at(ctx, now)
    }
}
