//! End-to-end relay tests
//!
//! Uses the four-node disaster scenario: a chain A-B-C-D plus a direct B-D
//! shortcut. Deterministic tests step the mesh with `run_ticks`; the async
//! tests run the real node loops.

use std::time::Duration;

use resq_core::{DropReason, MeshEvent, Message, MessageKind, NodeId};
use resq_mesh::{Mesh, MeshBuilder, NodeConfig, NodeState};
use tokio_test::{assert_err, assert_ok};

// ============================================================================
// Helpers
// ============================================================================

fn disaster_mesh(seed: u64) -> Mesh {
    MeshBuilder::new(NodeConfig::testing())
        .seed(seed)
        .node("A", 0.0, 0.0)
        .node("B", 0.8, 0.0)
        .node("C", 1.6, 0.2)
        .node("D", 2.4, 0.0)
        .link("A", "B", 0.05)
        .link("B", "C", 0.08)
        .link("C", "D", 0.12)
        .link("B", "D", 0.25)
        .build()
        .unwrap()
}

fn distress_with_gps() -> Message {
    Message::new("A", "D", "Need help trapped under rubble").with_coordinates(40.7128, -74.0060)
}

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn total_drops(mesh: &Mesh, reason: DropReason) -> u64 {
    mesh.nodes().map(|n| n.stats().dropped(reason)).sum()
}

// ============================================================================
// Deterministic stepping
// ============================================================================

#[test]
fn test_distress_reaches_destination_or_is_lost() {
    let mut delivered_runs = 0;

    for seed in 0..200 {
        let mesh = disaster_mesh(seed);
        mesh.inject(distress_with_gps()).unwrap();
        mesh.run_ticks(10);

        assert_eq!(mesh.pending(), 0, "seed {seed}: message still queued");
        assert_eq!(total_drops(&mesh, DropReason::LoopDetected), 0, "seed {seed}");
        assert_eq!(total_drops(&mesh, DropReason::NoRoute), 0, "seed {seed}");

        let delivered = mesh.require(&id("D")).unwrap().delivered_snapshot();
        match delivered.as_slice() {
            [msg] => {
                delivered_runs += 1;
                assert!((2..=4).contains(&msg.path.len()), "seed {seed}: path {:?}", msg.path);
                assert_eq!(msg.path.first(), Some(&id("A")));
                assert_eq!(msg.path.last(), Some(&id("D")));
                assert_eq!(msg.hops as usize, msg.path.len() - 1);
                assert!(msg.priority >= 0.75, "seed {seed}: priority {}", msg.priority);
                assert!(matches!(msg.kind, MessageKind::Distress | MessageKind::Gps));
            }
            [] => {
                assert_eq!(total_drops(&mesh, DropReason::TransmissionLoss), 1, "seed {seed}");
            }
            other => panic!("seed {seed}: delivered {} copies", other.len()),
        }
    }

    // Per-hop loss is at most 0.25, so most runs get through
    assert!(delivered_runs > 100, "only {delivered_runs} of 200 delivered");
}

#[test]
fn test_same_seed_same_outcome() {
    let run = |seed| {
        let mesh = disaster_mesh(seed);
        for text in ["SOS fire", "water and food", "status ok", "lat lon grid", "hello"] {
            mesh.inject(Message::new("A", "D", text)).unwrap();
        }
        mesh.run_ticks(10);
        let paths: Vec<Vec<NodeId>> = mesh
            .require(&id("D"))
            .unwrap()
            .delivered_snapshot()
            .into_iter()
            .map(|m| m.path)
            .collect();
        let stats: Vec<_> = mesh.nodes().map(|n| n.stats()).collect();
        (paths, stats)
    };

    for seed in [1, 17, 99] {
        assert_eq!(run(seed), run(seed));
    }
}

#[test]
fn test_any_responder_delivered_at_source() {
    let mesh = disaster_mesh(3);
    mesh.inject(Message::to_any_responder("A", "status ok")).unwrap();
    mesh.run_ticks(1);

    let delivered = mesh.require(&id("A")).unwrap().delivered_snapshot();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].path, vec![id("A")]);
    assert_eq!(delivered[0].hops, 0);
}

#[test]
fn test_unreachable_destination_is_dropped() {
    let mesh = disaster_mesh(5);
    let mut events = mesh.require(&id("A")).unwrap().subscribe();
    mesh.inject(Message::new("A", "Z", "help")).unwrap();
    mesh.run_ticks(10);

    assert_eq!(mesh.pending(), 0);
    let dropped = total_drops(&mesh, DropReason::NoRoute) + total_drops(&mesh, DropReason::TransmissionLoss);
    assert_eq!(dropped, 1);

    let mut saw_received = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, MeshEvent::Received { .. }) {
            saw_received = true;
        }
    }
    assert!(saw_received);
}

#[test]
fn test_loop_prevention_on_revisit() {
    let mesh = disaster_mesh(11);
    let b = mesh.require(&id("B")).unwrap();

    let mut msg = Message::new("A", "D", "help");
    msg.path = vec![id("A"), id("B")];
    b.enqueue(msg);
    let report = b.tick();

    assert_eq!(report.processed(), 1);
    assert_eq!(b.stats().dropped_loop, 1);
    assert_eq!(mesh.pending(), 0);
    for other in ["A", "C", "D"] {
        assert_eq!(mesh.require(&id(other)).unwrap().stats().received, 0);
    }
}

#[test]
fn test_idle_counters_decay() {
    let mesh = disaster_mesh(2);
    let a = mesh.require(&id("A")).unwrap();
    for i in 0..5 {
        a.enqueue(Message::to_any_responder("A", format!("checkin {i}")));
    }

    let expected = [4.0, 3.2, 2.56];
    for want in expected {
        a.tick();
        assert!((a.counters().inbound - want).abs() < 1e-9);
    }
}

// ============================================================================
// Async node loops
// ============================================================================

#[tokio::test]
async fn test_live_mesh_delivers() {
    let mut delivered_runs = 0;

    for seed in 0..5 {
        let mut mesh = disaster_mesh(seed);
        assert_ok!(mesh.start_all());
        assert_ok!(mesh.inject(distress_with_gps()));

        tokio::time::sleep(Duration::from_millis(150)).await;
        mesh.stop_all().await;

        for node in mesh.nodes() {
            assert_eq!(node.state(), NodeState::Stopped);
        }
        assert_eq!(total_drops(&mesh, DropReason::LoopDetected), 0);
        assert_eq!(total_drops(&mesh, DropReason::NoRoute), 0);

        let delivered = mesh.require(&id("D")).unwrap().delivered_snapshot();
        if let Some(msg) = delivered.first() {
            delivered_runs += 1;
            assert!(msg.priority >= 0.75);
            assert!((2..=4).contains(&msg.path.len()));
        } else {
            assert_eq!(total_drops(&mesh, DropReason::TransmissionLoss), 1);
        }
    }

    assert!(delivered_runs >= 1);
}

#[tokio::test]
async fn test_concurrent_injection() {
    let mut mesh = disaster_mesh(8);
    assert_ok!(mesh.start_all());
    // every node is already running
    assert_err!(mesh.require(&id("A")).unwrap().start());

    let a = mesh.require(&id("A")).unwrap().clone();
    let injector = tokio::spawn(async move {
        for i in 0..20 {
            a.enqueue(Message::new("A", "D", format!("water {i}")));
            tokio::task::yield_now().await;
        }
    });
    injector.await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    mesh.stop_all().await;

    let delivered = mesh.require(&id("D")).unwrap().delivered_snapshot().len() as u64;
    let lost = total_drops(&mesh, DropReason::TransmissionLoss);
    assert_eq!(delivered + lost, 20);
    assert_eq!(total_drops(&mesh, DropReason::LoopDetected), 0);
}
