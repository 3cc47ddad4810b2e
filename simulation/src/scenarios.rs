//! Pre-built simulation scenarios

use resq_core::{Message, NodeId, ResqResult};
use resq_mesh::{Mesh, MeshBuilder, NodeStats};
use tracing::info;

use crate::config::SimulationConfig;

/// The responder node in the disaster scenario
pub const RESPONDER: &str = "D";

/// Four devices in a rough line with a lossy B-D shortcut
///
/// ```text
///   A --- B --- C --- D
///          \_________/
/// ```
pub fn disaster_mesh(config: &SimulationConfig) -> ResqResult<Mesh> {
    let mut builder = MeshBuilder::new(config.node.clone())
        .node("A", 0.0, 0.0)
        .node("B", 0.8, 0.0)
        .node("C", 1.6, 0.2)
        .node(RESPONDER, 2.4, 0.0)
        .link("A", "B", 0.05)
        .link("B", "C", 0.08)
        .link("C", RESPONDER, 0.12)
        .link("B", RESPONDER, 0.25);
    if let Some(seed) = config.seed {
        builder = builder.seed(seed);
    }
    builder.build()
}

/// Mixed traffic from field devices to the responder
pub fn field_reports() -> Vec<Message> {
    vec![
        Message::new("A", RESPONDER, "HELP trapped under debris near school").with_coordinates(40.1, -74.2),
        Message::new("B", RESPONDER, "status ok at clinic, minor injuries"),
        Message::new("C", RESPONDER, "need water and medicine at shelter"),
        Message::new("A", RESPONDER, "GPS coordinates lat 40.12 lon -74.25").with_coordinates(40.12, -74.25),
        Message::new("B", RESPONDER, "smoke and fire spreading to east"),
    ]
}

/// Outcome of a scenario run
#[derive(Debug)]
pub struct ScenarioReport {
    pub delivered: Vec<Message>,
    pub injected: usize,
    pub stats: Vec<(NodeId, NodeStats)>,
    pub rendered: String,
}

impl ScenarioReport {
    pub fn summary(&self) -> String {
        let mut out = format!("Delivered at {RESPONDER}: {}/{}\n", self.delivered.len(), self.injected);
        for message in &self.delivered {
            let path: Vec<&str> = message.path.iter().map(NodeId::as_str).collect();
            out.push_str(&format!(" - {message} | path={path:?}\n"));
        }
        out.push_str("\nNode stats:\n");
        for (id, stats) in &self.stats {
            out.push_str(&format!(
                "  {id}: received={} delivered={} forwarded={} dropped(loop={}, no_route={}, loss={})\n",
                stats.received,
                stats.delivered,
                stats.forwarded,
                stats.dropped_loop,
                stats.dropped_no_route,
                stats.dropped_loss
            ));
        }
        out
    }
}

/// Run the disaster scenario on live node loops
pub async fn run_disaster_scenario(config: &SimulationConfig) -> ResqResult<ScenarioReport> {
    let mut mesh = disaster_mesh(config)?;
    mesh.start_all()?;

    let reports = field_reports();
    let injected = reports.len();
    for message in reports {
        info!(source = %message.source, message = %message.id, "Injecting field report");
        mesh.inject(message)?;
    }

    tokio::time::sleep(config.wait()).await;
    mesh.stop_all().await;

    let delivered = mesh.require(&NodeId::from(RESPONDER))?.delivered_snapshot();
    let stats = mesh.nodes().map(|n| (n.id().clone(), n.stats())).collect();
    let rendered = mesh.render_paths(&delivered);

    info!(delivered = delivered.len(), injected, "Scenario complete");

    Ok(ScenarioReport {
        delivered,
        injected,
        stats,
        rendered,
    })
}
