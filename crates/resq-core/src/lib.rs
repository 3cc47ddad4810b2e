//! # ResQ Core
//!
//! Core types, events, and errors for the ResQ delay-tolerant mesh.
//!
//! Every other crate in the workspace builds on these definitions:
//!
//! - [`NodeId`] / [`MessageId`]: identities of devices and messages
//! - [`Message`]: the unit of work relayed hop-by-hop through the mesh
//! - [`MessageKind`]: the fixed classification categories
//! - [`MeshEvent`] / [`DropReason`]: observable per-node outcomes
//! - [`ResqError`]: the error taxonomy
//!
//! ## Delivery semantics
//!
//! The mesh is strictly best-effort. A message can be dropped by loop
//! detection, by an empty candidate set, or by simulated transmission loss,
//! and none of these is reported back to the sender. Drops are visible only
//! through the dropping node's [`MeshEvent`] stream and statistics.

pub mod error;
pub mod event;
pub mod identity;
pub mod message;

pub use error::*;
pub use event::*;
pub use identity::*;
pub use message::*;
