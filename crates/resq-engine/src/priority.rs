//! Priority scoring
//!
//! Priority is a weighted blend of the message kind, how fresh the message
//! is, and how congested the scoring node's queue is:
//!
//! ```text
//! priority = 0.70 * base(kind) + 0.25 * recency + 0.05 * congestion
//! recency    = clip(1 - age_secs / 600, 0, 1)
//! congestion = clip(1 - queue_len / 50, 0.2, 1)
//! ```
//!
//! GPS messages that carry a distress tag or mention "help" are raised to
//! at least [`GPS_DISTRESS_FLOOR`].

use chrono::{DateTime, Utc};
use resq_core::{Message, MessageKind};

use crate::clip;

pub const KIND_WEIGHT: f64 = 0.70;
pub const RECENCY_WEIGHT: f64 = 0.25;
pub const CONGESTION_WEIGHT: f64 = 0.05;

/// Age at which the recency term reaches zero
pub const RECENCY_HORIZON_SECS: f64 = 600.0;

/// Queue length at which the congestion term bottoms out
pub const CONGESTION_QUEUE_LEN: f64 = 50.0;

pub const GPS_DISTRESS_FLOOR: f64 = 0.85;

/// Node-local inputs for priority scoring
#[derive(Debug, Clone, Copy)]
pub struct PriorityContext {
    /// Current length of the scoring node's queue
    pub queue_len: usize,
    /// Reference time for message age
    pub now: DateTime<Utc>,
}

impl PriorityContext {
    pub fn new(queue_len: usize) -> Self {
        Self {
            queue_len,
            now: Utc::now(),
        }
    }

    pub fn at(queue_len: usize, now: DateTime<Utc>) -> Self {
        Self { queue_len, now }
    }
}

/// Compute a priority in [0, 1] for an already classified message
pub fn prioritize(message: &Message, ctx: &PriorityContext) -> f64 {
    let base = message.kind.base_priority();

    let age = message.age_at(ctx.now);
    let recency = clip(1.0 - age / RECENCY_HORIZON_SECS, 0.0, 1.0);

    let congestion = clip(1.0 - ctx.queue_len as f64 / CONGESTION_QUEUE_LEN, 0.2, 1.0);

    let mut priority = KIND_WEIGHT * base + RECENCY_WEIGHT * recency + CONGESTION_WEIGHT * congestion;

    if message.kind == MessageKind::Gps
        && (message.distress_tagged() || message.text.to_lowercase().contains("help"))
    {
        priority = priority.max(GPS_DISTRESS_FLOOR);
    }

    clip(priority, 0.0, 1.0)
}
