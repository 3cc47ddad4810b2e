//! Pairwise lossy links
//!
//! A [`Link`] is immutable once built and shared as `Arc<Link>` by both
//! endpoints, so either side can sample it concurrently without locking.
//! All randomness comes from the caller's RNG.

use rand::Rng;
use resq_core::{MeshError, NodeId};
use resq_engine::LinkStats;

/// Endpoints closer than this get the strong signal band
pub const NEAR_RANGE: f64 = 1.0;

/// Upper bound on the additive loss noise
pub const LOSS_NOISE: f64 = 0.05;

/// Ceiling on the reported instantaneous loss
pub const MAX_REPORTED_LOSS: f64 = 0.9;

/// Undirected channel between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    a: NodeId,
    b: NodeId,
    base_loss: f64,
}

impl Link {
    /// Create a link; `base_loss` must lie in [0, 1]
    pub fn new(a: NodeId, b: NodeId, base_loss: f64) -> Result<Self, MeshError> {
        if a == b {
            return Err(MeshError::SelfLink(a));
        }
        if !(0.0..=1.0).contains(&base_loss) {
            return Err(MeshError::InvalidLoss(base_loss));
        }
        Ok(Self { a, b, base_loss })
    }

    pub fn endpoints(&self) -> (&NodeId, &NodeId) {
        (&self.a, &self.b)
    }

    pub fn base_loss(&self) -> f64 {
        self.base_loss
    }

    pub fn connects(&self, node: &NodeId) -> bool {
        &self.a == node || &self.b == node
    }

    /// The endpoint opposite `node`, if `node` is on this link
    pub fn other(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.a == node {
            Some(&self.b)
        } else if &self.b == node {
            Some(&self.a)
        } else {
            None
        }
    }

    /// Sample directional statistics for a transmission across this link
    ///
    /// `distance` is the geometric length of the link and `dest_queue_len`
    /// the depth of the receiving node's queue.
    pub fn stats_for<R: Rng>(&self, distance: f64, dest_queue_len: usize, rng: &mut R) -> LinkStats {
        let signal_dbm = if distance < NEAR_RANGE {
            -40.0 - 5.0 * rng.random::<f64>()
        } else {
            -70.0 - 10.0 * rng.random::<f64>()
        };
        let loss = (self.base_loss + LOSS_NOISE * rng.random::<f64>()).min(MAX_REPORTED_LOSS);

        LinkStats {
            signal_dbm,
            loss,
            queue_len: dest_queue_len,
            distance: Some(distance),
        }
    }

    /// Draw a single transmission; `true` means the message got through
    pub fn transmit<R: Rng>(&self, rng: &mut R) -> bool {
        rng.random::<f64>() >= self.base_loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn link(loss: f64) -> Link {
        Link::new(NodeId::from("A"), NodeId::from("B"), loss).unwrap()
    }

    #[test]
    fn test_invalid_links() {
        assert!(matches!(
            Link::new(NodeId::from("A"), NodeId::from("A"), 0.1),
            Err(MeshError::SelfLink(_))
        ));
        assert!(matches!(
            Link::new(NodeId::from("A"), NodeId::from("B"), 1.5),
            Err(MeshError::InvalidLoss(_))
        ));
        assert!(matches!(
            Link::new(NodeId::from("A"), NodeId::from("B"), f64::NAN),
            Err(MeshError::InvalidLoss(_))
        ));
    }

    #[test]
    fn test_other_endpoint() {
        let l = link(0.1);
        assert_eq!(l.other(&NodeId::from("A")), Some(&NodeId::from("B")));
        assert_eq!(l.other(&NodeId::from("B")), Some(&NodeId::from("A")));
        assert_eq!(l.other(&NodeId::from("C")), None);
        assert!(l.connects(&NodeId::from("A")));
        assert!(!l.connects(&NodeId::from("C")));
    }

    #[test]
    fn test_stats_bands() {
        let l = link(0.2);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let near = l.stats_for(0.5, 3, &mut rng);
            assert!((-45.0..=-40.0).contains(&near.signal_dbm));
            assert!((0.2..=0.25).contains(&near.loss));
            assert_eq!(near.queue_len, 3);
            assert_eq!(near.distance, Some(0.5));

            let far = l.stats_for(1.6, 0, &mut rng);
            assert!((-80.0..=-70.0).contains(&far.signal_dbm));
        }
    }

    #[test]
    fn test_reported_loss_is_capped() {
        let l = link(0.89);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            assert!(l.stats_for(0.5, 0, &mut rng).loss <= MAX_REPORTED_LOSS);
        }
    }

    #[test]
    fn test_transmit_extremes() {
        let mut rng = StdRng::seed_from_u64(3);
        let perfect = link(0.0);
        let dead = link(1.0);
        for _ in 0..100 {
            assert!(perfect.transmit(&mut rng));
            assert!(!dead.transmit(&mut rng));
        }
    }

    #[test]
    fn test_same_seed_same_samples() {
        let l = link(0.3);
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(l.stats_for(1.2, 1, &mut a), l.stats_for(1.2, 1, &mut b));
            assert_eq!(l.transmit(&mut a), l.transmit(&mut b));
        }
    }
}
