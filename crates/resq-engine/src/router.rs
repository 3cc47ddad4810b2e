//! Next-hop selection
//!
//! Each candidate neighbor is scored from its freshly sampled link
//! statistics. Distance and reliability weights grow with message priority,
//! so urgent traffic leans harder on short, dependable links:
//!
//! | term         | value                     | weight      |
//! |--------------|---------------------------|-------------|
//! | distance     | 1 / (1 + distance) or 0   | 0.4 + 0.3p  |
//! | reliability  | 1 - clip(loss, 0, 0.9)    | 0.3 + 0.2p  |
//! | link quality | (signal + 100) / 60       | 0.2         |
//! | queue        | 1 / (1 + queue_len)       | 0.1         |
//!
//! Candidates are visited in ascending id order and only a strictly higher
//! score displaces the current best, so the lexicographically smallest id
//! wins a tie.

use std::collections::BTreeMap;

use resq_core::{Message, NodeId};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::clip;

/// Per-direction link statistics sampled for one candidate neighbor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkStats {
    /// Signal strength proxy in dBm (higher is better)
    pub signal_dbm: f64,
    /// Instantaneous loss estimate in [0, 1]
    pub loss: f64,
    /// Depth of the neighbor's inbound queue
    pub queue_len: usize,
    /// Distance term input; `None` when unknown
    pub distance: Option<f64>,
}

/// Node-local inputs for routing
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteContext {
    /// Current length of the routing node's own queue
    pub queue_len: usize,
}

/// Weighted score of a single candidate for a message of priority `priority`
pub fn score_candidate(stats: &LinkStats, priority: f64) -> f64 {
    let p = clip(priority, 0.0, 1.0);

    let distance_term = stats.distance.map(|d| 1.0 / (1.0 + d)).unwrap_or(0.0);
    let reliability = 1.0 - clip(stats.loss, 0.0, 0.9);
    let link_quality = (stats.signal_dbm + 100.0) / 60.0;
    let queue_penalty = 1.0 / (1.0 + stats.queue_len as f64);

    let weight_distance = 0.4 + 0.3 * p;
    let weight_reliability = 0.3 + 0.2 * p;
    let weight_link_quality = 0.2;
    let weight_queue = 0.1;

    weight_distance * distance_term
        + weight_reliability * reliability
        + weight_link_quality * link_quality
        + weight_queue * queue_penalty
}

/// Pick the best next hop, or `None` if there are no candidates
pub fn route(candidates: &BTreeMap<NodeId, LinkStats>, _ctx: &RouteContext, message: &Message) -> Option<NodeId> {
    let mut best: Option<(&NodeId, f64)> = None;

    for (id, stats) in candidates {
        let score = score_candidate(stats, message.priority);
        trace!(candidate = %id, score, "Scored next-hop candidate");

        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((id, score)),
        }
    }

    best.map(|(id, _)| id.clone())
}
