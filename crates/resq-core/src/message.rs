//! Messages relayed through the mesh
//!
//! A [`Message`] carries an immutable identity (id, source, destination,
//! text, coordinates, creation time) plus routing fields that every node
//! overwrites as it processes the message. Classification and priority are
//! last-writer-wins; hop count and path only grow.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{MessageId, NodeId};

/// Flag key set when a node classifies a message as high-confidence distress
pub const DISTRESS_FLAG: &str = "tag_distress";

/// Fixed classification categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MessageKind {
    Distress,
    Gps,
    Supply,
    Status,
    #[default]
    Unknown,
}

impl MessageKind {
    /// All kinds in tie-break order, strongest first.
    ///
    /// When two kinds score equally, the one appearing earlier wins.
    pub const ALL_RANKED: [MessageKind; 5] = [
        MessageKind::Distress,
        MessageKind::Gps,
        MessageKind::Supply,
        MessageKind::Status,
        MessageKind::Unknown,
    ];

    /// Base priority score for this kind
    pub fn base_priority(&self) -> f64 {
        match self {
            MessageKind::Distress => 0.95,
            MessageKind::Gps => 0.75,
            MessageKind::Supply => 0.60,
            MessageKind::Status => 0.40,
            MessageKind::Unknown => 0.30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Distress => "DISTRESS",
            MessageKind::Gps => "GPS",
            MessageKind::Supply => "SUPPLY",
            MessageKind::Status => "STATUS",
            MessageKind::Unknown => "UNKNOWN",
        }
    }
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A latitude/longitude pair attached by the sending device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Planar position of a node, in arbitrary distance units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A message travelling through the mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier
    pub id: MessageId,
    /// Originating node
    pub source: NodeId,
    /// Final destination; `None` means any responder node may accept it
    pub destination: Option<NodeId>,
    /// Free text as typed by the sender
    pub text: String,
    /// Optional coordinate attached by the sender
    pub coordinates: Option<GeoPoint>,
    /// When the message was created
    pub created_at: DateTime<Utc>,
    /// Classification assigned by the most recent node
    pub kind: MessageKind,
    /// Priority in [0, 1] assigned by the most recent node
    pub priority: f64,
    /// Number of successful transmissions so far
    pub hops: u32,
    /// Nodes that processed this message, in order
    pub path: Vec<NodeId>,
    /// Auxiliary flags (e.g. [`DISTRESS_FLAG`])
    pub flags: BTreeMap<String, bool>,
}

impl Message {
    /// Create a message addressed to a specific node
    pub fn new(source: impl Into<NodeId>, destination: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self::build(source.into(), Some(destination.into()), text.into())
    }

    /// Create a message deliverable to whichever node processes it first
    pub fn to_any_responder(source: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self::build(source.into(), None, text.into())
    }

    fn build(source: NodeId, destination: Option<NodeId>, text: String) -> Self {
        Self {
            id: MessageId::generate(),
            source,
            destination,
            text,
            coordinates: None,
            created_at: Utc::now(),
            kind: MessageKind::Unknown,
            priority: 0.0,
            hops: 0,
            path: Vec::new(),
            flags: BTreeMap::new(),
        }
    }

    /// Attach a coordinate
    pub fn with_coordinates(mut self, lat: f64, lon: f64) -> Self {
        self.coordinates = Some(GeoPoint::new(lat, lon));
        self
    }

    /// Override the creation time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Check whether a node already processed this message
    pub fn was_visited(&self, node: &NodeId) -> bool {
        self.path.contains(node)
    }

    /// Append a node to the path
    pub fn mark_visited(&mut self, node: NodeId) {
        self.path.push(node);
    }

    /// Whether the message is terminal at `node`
    pub fn is_deliverable_at(&self, node: &NodeId) -> bool {
        match &self.destination {
            None => true,
            Some(dest) => dest == node,
        }
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.flags.insert(key.into(), value);
    }

    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    /// Whether some node tagged this message as distress
    pub fn distress_tagged(&self) -> bool {
        self.flag(DISTRESS_FLAG)
    }

    /// Age of the message in seconds at `now` (negative if created in the future)
    pub fn age_at(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created_at).num_milliseconds() as f64 / 1000.0
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dest = self
            .destination
            .as_ref()
            .map(|d| d.as_str())
            .unwrap_or("ANY");
        write!(
            f,
            "<Message {} {} prio={:.2} hops={} from {} to {}>",
            self.id, self.kind, self.priority, self.hops, self.source, dest
        )
    }
}
