//! # ResQ Mesh
//!
//! Store-and-forward node actors for the ResQ disaster-response mesh.
//!
//! Each [`Node`] owns an inbound queue and a [`DecisionEngine`] and runs an
//! independent tokio task. Messages hop from queue to queue across lossy
//! [`Link`]s until they reach their destination or are dropped.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use resq_core::{Message, NodeId};
//! use resq_mesh::{MeshBuilder, NodeConfig};
//!
//! let mut mesh = MeshBuilder::new(NodeConfig::default())
//!     .seed(42)
//!     .node("A", 0.0, 0.0)
//!     .node("B", 0.8, 0.0)
//!     .link("A", "B", 0.05)
//!     .build()?;
//!
//! mesh.start_all()?;
//! mesh.inject(Message::new("A", "B", "SOS trapped").with_coordinates(40.7, -74.0))?;
//! tokio::time::sleep(std::time::Duration::from_millis(200)).await;
//! mesh.stop_all().await;
//!
//! let delivered = mesh.require(&NodeId::from("B"))?.delivered_snapshot();
//! ```
//!
//! ## Modules
//!
//! - [`link`]: pairwise lossy channels and link statistics sampling
//! - [`mailbox`]: thread-safe FIFO inbound queue
//! - [`counters`]: decaying traffic counters and lifetime drop statistics
//! - [`config`]: node tuning and validation
//! - [`node`]: the node actor and its scheduling loop
//! - [`topology`]: building and driving a whole mesh
//!
//! [`DecisionEngine`]: resq_engine::DecisionEngine

pub mod config;
pub mod counters;
pub mod link;
pub mod mailbox;
pub mod node;
pub mod topology;

pub use config::NodeConfig;
pub use counters::{NodeStats, TrafficCounters};
pub use link::Link;
pub use mailbox::Mailbox;
pub use node::{Node, NodeState, ProcessOutcome, TickReport};
pub use topology::{Edge, Mesh, MeshBuilder, derive_node_seed};
