//! Per-node traffic accounting
//!
//! [`TrafficCounters`] feed the anomaly detector and decay every tick, so
//! they describe recent traffic only. [`NodeStats`] are monotonic totals,
//! including one counter per drop reason.

use resq_core::DropReason;
use resq_engine::AnomalyContext;
use serde::{Deserialize, Serialize};

/// Rolling counters, decayed geometrically once per tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficCounters {
    pub inbound: f64,
    pub outbound: f64,
    pub failed: f64,
    pub attempted: f64,
}

impl TrafficCounters {
    pub fn record_inbound(&mut self) {
        self.inbound += 1.0;
    }

    pub fn record_outbound(&mut self) {
        self.outbound += 1.0;
    }

    pub fn record_attempt(&mut self) {
        self.attempted += 1.0;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1.0;
    }

    /// Multiply every counter by `factor`
    pub fn decay(&mut self, factor: f64) {
        self.inbound *= factor;
        self.outbound *= factor;
        self.failed *= factor;
        self.attempted *= factor;
    }

    pub fn to_anomaly_context(&self, queue_len: usize) -> AnomalyContext {
        AnomalyContext {
            inbound: self.inbound,
            outbound: self.outbound,
            failed: self.failed,
            attempted: self.attempted,
            queue_len,
        }
    }
}

/// Lifetime totals for a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    pub received: u64,
    pub delivered: u64,
    pub forwarded: u64,
    pub dropped_loop: u64,
    pub dropped_no_route: u64,
    pub dropped_loss: u64,
}

impl NodeStats {
    pub fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::LoopDetected => self.dropped_loop += 1,
            DropReason::NoRoute => self.dropped_no_route += 1,
            DropReason::TransmissionLoss => self.dropped_loss += 1,
        }
    }

    pub fn dropped(&self, reason: DropReason) -> u64 {
        match reason {
            DropReason::LoopDetected => self.dropped_loop,
            DropReason::NoRoute => self.dropped_no_route,
            DropReason::TransmissionLoss => self.dropped_loss,
        }
    }

    pub fn dropped_total(&self) -> u64 {
        self.dropped_loop + self.dropped_no_route + self.dropped_loss
    }
}
