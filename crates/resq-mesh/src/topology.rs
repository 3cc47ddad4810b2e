//! Mesh assembly
//!
//! [`MeshBuilder`] declares nodes and lossy links and wires them into a
//! [`Mesh`]. The mesh owns the node handles, drives their loops as a group,
//! and can step every node deterministically for tests.

use std::collections::BTreeMap;
use std::fmt::Write;

use resq_core::{MeshError, Message, NodeId, Position, ResqResult};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::NodeConfig;
use crate::node::{Node, TickReport};

/// Golden-ratio increment used to spread per-node seeds
const SEED_SPREAD: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed for the node at `index` in a mesh seeded with `mesh_seed`
pub fn derive_node_seed(mesh_seed: u64, index: usize) -> u64 {
    mesh_seed ^ (index as u64 + 1).wrapping_mul(SEED_SPREAD)
}

/// An undirected edge as declared to the builder
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
    pub base_loss: f64,
}

/// Builder for a [`Mesh`]
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    config: NodeConfig,
    seed: Option<u64>,
    nodes: Vec<(NodeId, Position)>,
    links: Vec<Edge>,
}

impl MeshBuilder {
    /// Start a mesh whose nodes share `config`
    pub fn new(config: NodeConfig) -> Self {
        Self {
            seed: config.seed,
            config,
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Seed every node's RNG from this mesh-wide seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn node(mut self, id: impl Into<NodeId>, x: f64, y: f64) -> Self {
        self.nodes.push((id.into(), Position::new(x, y)));
        self
    }

    pub fn link(mut self, a: impl Into<NodeId>, b: impl Into<NodeId>, base_loss: f64) -> Self {
        self.links.push(Edge {
            a: a.into(),
            b: b.into(),
            base_loss,
        });
        self
    }

    /// Create every node and connect the declared links
    pub fn build(self) -> ResqResult<Mesh> {
        let mut nodes: BTreeMap<NodeId, Node> = BTreeMap::new();

        for (index, (id, position)) in self.nodes.into_iter().enumerate() {
            if nodes.contains_key(&id) {
                return Err(MeshError::DuplicateNode(id).into());
            }
            let mut config = self.config.clone();
            config.seed = self.seed.map(|seed| derive_node_seed(seed, index));
            let node = Node::new(id.clone(), position, config)?;
            nodes.insert(id, node);
        }

        for edge in &self.links {
            let a = nodes
                .get(&edge.a)
                .ok_or_else(|| MeshError::UnknownNode(edge.a.clone()))?;
            let b = nodes
                .get(&edge.b)
                .ok_or_else(|| MeshError::UnknownNode(edge.b.clone()))?;
            a.connect(b, edge.base_loss)?;
        }

        info!(
            nodes = nodes.len(),
            edges = self.links.len(),
            seed = ?self.seed,
            "Built mesh"
        );

        Ok(Mesh {
            nodes,
            edges: self.links,
            handles: Vec::new(),
        })
    }
}

/// A set of connected nodes
#[derive(Debug)]
pub struct Mesh {
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    handles: Vec<(NodeId, JoinHandle<()>)>,
}

impl Mesh {
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Like [`Mesh::node`], failing with [`MeshError::UnknownNode`]
    pub fn require(&self, id: &NodeId) -> Result<&Node, MeshError> {
        self.nodes
            .get(id)
            .ok_or_else(|| MeshError::UnknownNode(id.clone()))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().cloned().collect()
    }

    /// Links in declaration order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Enqueue a message at its source node
    pub fn inject(&self, message: Message) -> Result<(), MeshError> {
        let source = self.require(&message.source)?;
        source.enqueue(message);
        Ok(())
    }

    /// Spawn every node's loop
    pub fn start_all(&mut self) -> Result<(), MeshError> {
        for (id, node) in &self.nodes {
            let handle = node.start()?;
            self.handles.push((id.clone(), handle));
        }
        info!(nodes = self.nodes.len(), "Started mesh");
        Ok(())
    }

    /// Stop every node and wait for all loops to exit
    pub async fn stop_all(&mut self) {
        for node in self.nodes.values() {
            node.stop();
        }
        for (id, handle) in self.handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(node = %id, error = %e, "Node task failed");
            }
        }
        info!("Stopped mesh");
    }

    /// Tick every node `rounds` times in id order, without the async loop
    pub fn run_ticks(&self, rounds: usize) -> Vec<TickReport> {
        let mut reports = Vec::with_capacity(rounds * self.nodes.len());
        for _ in 0..rounds {
            for node in self.nodes.values() {
                reports.push(node.tick());
            }
        }
        reports
    }

    /// Total messages still queued across the mesh
    pub fn pending(&self) -> usize {
        self.nodes.values().map(Node::queue_len).sum()
    }

    /// Text view of the edges and the hop path of each message
    pub fn render_paths(&self, messages: &[Message]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Mesh: {} nodes, {} edges", self.nodes.len(), self.edges.len());
        for node in self.nodes.values() {
            let p = node.position();
            let _ = writeln!(out, "  {} @ ({:.2}, {:.2})", node.id(), p.x, p.y);
        }
        for edge in &self.edges {
            let _ = writeln!(out, "  {} -- {} (loss {:.2})", edge.a, edge.b, edge.base_loss);
        }

        if messages.is_empty() {
            out.push_str("No delivered messages\n");
            return out;
        }

        out.push_str("Paths:\n");
        for message in messages {
            let path = message
                .path
                .iter()
                .map(NodeId::as_str)
                .collect::<Vec<_>>()
                .join(" -> ");
            let _ = writeln!(
                out,
                "  {} {} prio={:.2}: {} ({} hops)",
                message.id, message.kind, message.priority, path, message.hops
            );
        }
        out
    }
}

/// Signals stop to every node whose loop this mesh started
///
/// Loops exit at their next tick boundary; the tasks are not awaited. Use
/// [`Mesh::stop_all`] to wait for them.
impl Drop for Mesh {
    fn drop(&mut self) {
        for (id, _) in &self.handles {
            if let Some(node) = self.nodes.get(id) {
                node.stop();
            }
        }
    }
}
