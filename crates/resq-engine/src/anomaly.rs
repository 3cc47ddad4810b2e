//! Rolling anomaly detection
//!
//! Evaluated once per scheduling tick from the traffic counted since the
//! previous evaluation. Failures dominate the score; queue build-up and an
//! inbound/outbound imbalance contribute the rest.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::clip;

/// Floor on elapsed time between evaluations, in seconds
pub const MIN_ELAPSED_SECS: f64 = 1e-3;

/// Queue length at which the queue term saturates
pub const QUEUE_SATURATION: f64 = 50.0;

/// Traffic observed since the previous evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyContext {
    pub inbound: f64,
    pub outbound: f64,
    pub failed: f64,
    pub attempted: f64,
    pub queue_len: usize,
}

/// Tracks the time of the previous evaluation
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    last_tick: Instant,
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    pub fn starting_at(last_tick: Instant) -> Self {
        Self { last_tick }
    }

    pub fn last_tick(&self) -> Instant {
        self.last_tick
    }

    /// Score `ctx` against the wall-clock time elapsed since the last call
    pub fn score(&mut self, ctx: &AnomalyContext) -> f64 {
        self.score_at(ctx, Instant::now())
    }

    /// Score with an explicit clock reading; advances the last-tick marker
    pub fn score_at(&mut self, ctx: &AnomalyContext, now: Instant) -> f64 {
        let elapsed = now
            .saturating_duration_since(self.last_tick)
            .as_secs_f64()
            .max(MIN_ELAPSED_SECS);
        self.last_tick = now;

        let inbound_rate = ctx.inbound / elapsed;
        let outbound_rate = ctx.outbound / elapsed;
        let failure_rate = ctx.failed / ctx.attempted.max(1.0) / elapsed;
        let queue_term = clip(ctx.queue_len as f64 / QUEUE_SATURATION, 0.0, 1.0);

        let imbalance = (inbound_rate - outbound_rate).abs() / (1.0 + inbound_rate + outbound_rate);

        clip(0.6 * failure_rate + 0.3 * queue_term + 0.1 * imbalance, 0.0, 1.0)
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_idle_node_scores_zero() {
        let start = Instant::now();
        let mut detector = AnomalyDetector::starting_at(start);
        let score = detector.score_at(&AnomalyContext::default(), start + Duration::from_secs(1));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_zero_attempts_does_not_fail() {
        let start = Instant::now();
        let mut detector = AnomalyDetector::starting_at(start);
        let ctx = AnomalyContext {
            failed: 3.0,
            attempted: 0.0,
            ..Default::default()
        };
        let score = detector.score_at(&ctx, start + Duration::from_secs(10));
        assert!(score.is_finite());
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_zero_elapsed_is_floored() {
        let start = Instant::now();
        let mut detector = AnomalyDetector::starting_at(start);
        let ctx = AnomalyContext {
            inbound: 100.0,
            failed: 5.0,
            attempted: 5.0,
            queue_len: 500,
            ..Default::default()
        };
        // same instant: elapsed floors to 1ms instead of dividing by zero
        let score = detector.score_at(&ctx, start);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_queue_term() {
        let start = Instant::now();
        let mut detector = AnomalyDetector::starting_at(start);
        let ctx = AnomalyContext {
            queue_len: 25,
            ..Default::default()
        };
        let score = detector.score_at(&ctx, start + Duration::from_secs(1));
        assert!((score - 0.3 * 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_imbalance_term() {
        let start = Instant::now();
        let mut detector = AnomalyDetector::starting_at(start);
        let ctx = AnomalyContext {
            inbound: 4.0,
            outbound: 0.0,
            ..Default::default()
        };
        // rates over 1s: |4 - 0| / (1 + 4) = 0.8
        let score = detector.score_at(&ctx, start + Duration::from_secs(1));
        assert!((score - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_advances_last_tick() {
        let start = Instant::now();
        let mut detector = AnomalyDetector::starting_at(start);
        let later = start + Duration::from_millis(250);
        detector.score_at(&AnomalyContext::default(), later);
        assert_eq!(detector.last_tick(), later);
    }

    #[test]
    fn test_clock_going_backwards_is_safe() {
        let start = Instant::now() + Duration::from_secs(5);
        let mut detector = AnomalyDetector::starting_at(start);
        let score = detector.score_at(&AnomalyContext::default(), Instant::now());
        assert_eq!(score, 0.0);
    }
}
