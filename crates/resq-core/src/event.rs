//! Mesh events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{MessageId, NodeId};
use crate::message::MessageKind;

/// Events emitted by a node while it processes traffic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MeshEvent {
    /// A message was taken off the node's queue
    Received {
        node: NodeId,
        message: MessageId,
        timestamp: DateTime<Utc>,
    },

    /// A message reached a terminal node
    Delivered {
        node: NodeId,
        message: MessageId,
        kind: MessageKind,
        priority: f64,
        hops: u32,
        timestamp: DateTime<Utc>,
    },

    /// A message was handed to a neighbor's queue
    Forwarded {
        from: NodeId,
        to: NodeId,
        message: MessageId,
        timestamp: DateTime<Utc>,
    },

    /// A message was dropped
    Dropped {
        node: NodeId,
        message: MessageId,
        reason: DropReason,
        timestamp: DateTime<Utc>,
    },

    /// The node's anomaly score crossed its configured threshold
    Anomaly {
        node: NodeId,
        score: f64,
        timestamp: DateTime<Utc>,
    },
}

impl MeshEvent {
    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Received { timestamp, .. } => *timestamp,
            Self::Delivered { timestamp, .. } => *timestamp,
            Self::Forwarded { timestamp, .. } => *timestamp,
            Self::Dropped { timestamp, .. } => *timestamp,
            Self::Anomaly { timestamp, .. } => *timestamp,
        }
    }

    pub fn received(node: NodeId, message: MessageId) -> Self {
        Self::Received {
            node,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn delivered(node: NodeId, message: MessageId, kind: MessageKind, priority: f64, hops: u32) -> Self {
        Self::Delivered {
            node,
            message,
            kind,
            priority,
            hops,
            timestamp: Utc::now(),
        }
    }

    pub fn forwarded(from: NodeId, to: NodeId, message: MessageId) -> Self {
        Self::Forwarded {
            from,
            to,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn dropped(node: NodeId, message: MessageId, reason: DropReason) -> Self {
        Self::Dropped {
            node,
            message,
            reason,
            timestamp: Utc::now(),
        }
    }

    pub fn anomaly(node: NodeId, score: f64) -> Self {
        Self::Anomaly {
            node,
            score,
            timestamp: Utc::now(),
        }
    }
}

/// Reasons a message might be dropped
///
/// Every drop is terminal and invisible to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropReason {
    /// The node already appears on the message path
    LoopDetected,
    /// No candidate neighbor was available
    NoRoute,
    /// The simulated transmission was lost
    TransmissionLoss,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoopDetected => write!(f, "Loop detected"),
            Self::NoRoute => write!(f, "No route available"),
            Self::TransmissionLoss => write!(f, "Transmission lost"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_reason_display() {
        assert!(DropReason::LoopDetected.to_string().contains("Loop"));
        assert!(DropReason::NoRoute.to_string().contains("No route"));
        assert!(DropReason::TransmissionLoss.to_string().contains("lost"));
    }

    #[test]
    fn test_event_timestamp() {
        let before = Utc::now();
        let event = MeshEvent::dropped(NodeId::from("B"), MessageId::generate(), DropReason::NoRoute);
        assert!(event.timestamp() >= before);
        assert!(matches!(
            event,
            MeshEvent::Dropped {
                reason: DropReason::NoRoute,
                ..
            }
        ));
    }
}
