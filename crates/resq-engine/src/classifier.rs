//! Keyword-based message classification
//!
//! Each category owns a fixed keyword list. The lowercased text is scanned
//! for literal substring matches (one point per keyword present), and an
//! attached coordinate adds [`COORDINATE_BONUS`] to the geo score so that
//! structured location data outweighs typical keyword evidence.

use resq_core::{Message, MessageKind};
use serde::{Deserialize, Serialize};

use crate::clip;

pub const DISTRESS_KEYWORDS: &[&str] = &[
    "help", "mayday", "sos", "emergency", "trapped", "injury", "bleeding", "collapsed", "fire",
    "danger", "earthquake", "flood", "hurricane", "wildfire", "bomb", "attack",
];

pub const GEO_KEYWORDS: &[&str] = &["lat", "lon", "gps", "coordinates", "location", "pos", "grid"];

pub const SUPPLY_KEYWORDS: &[&str] = &[
    "water", "food", "medicine", "insulin", "tent", "blanket", "generator", "fuel",
];

pub const STATUS_KEYWORDS: &[&str] = &["ok", "alive", "safe", "status", "update", "checkin", "fine"];

/// Score added to the geo category when a coordinate is attached
pub const COORDINATE_BONUS: f64 = 2.5;

/// Confidence reported for empty text without a coordinate
pub const EMPTY_CONFIDENCE: f64 = 0.20;

pub const MIN_CONFIDENCE: f64 = 0.10;
pub const MAX_CONFIDENCE: f64 = 0.99;

/// Result of classifying a message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub kind: MessageKind,
    pub confidence: f64,
}

/// Per-category raw scores
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KeywordScores {
    pub distress: f64,
    pub geo: f64,
    pub supply: f64,
    pub status: f64,
}

impl KeywordScores {
    /// Score lowercased text plus an optional coordinate bonus
    pub fn from_text(text: &str, has_coordinates: bool) -> Self {
        let count = |keywords: &[&str]| keywords.iter().filter(|k| text.contains(*k)).count() as f64;

        let mut scores = Self {
            distress: count(DISTRESS_KEYWORDS),
            geo: count(GEO_KEYWORDS),
            supply: count(SUPPLY_KEYWORDS),
            status: count(STATUS_KEYWORDS),
        };
        if has_coordinates {
            scores.geo += COORDINATE_BONUS;
        }
        scores
    }

    /// Raw score for a kind (always zero for `Unknown`)
    pub fn get(&self, kind: MessageKind) -> f64 {
        match kind {
            MessageKind::Distress => self.distress,
            MessageKind::Gps => self.geo,
            MessageKind::Supply => self.supply,
            MessageKind::Status => self.status,
            MessageKind::Unknown => 0.0,
        }
    }

    /// Highest-scoring kind, ties resolved by [`MessageKind::ALL_RANKED`].
    ///
    /// Returns `Unknown` when no category scored at all.
    pub fn winner(&self) -> (MessageKind, f64) {
        let mut best = (MessageKind::Unknown, 0.0);
        for kind in MessageKind::ALL_RANKED {
            let score = self.get(kind);
            // Strict comparison: the earlier-ranked kind keeps a tie
            if score > best.1 {
                best = (kind, score);
            }
        }
        best
    }
}

/// Classify a message from its text and coordinate
pub fn classify(message: &Message) -> Classification {
    let text = message.text.to_lowercase();
    let has_coordinates = message.coordinates.is_some();

    if text.trim().is_empty() && !has_coordinates {
        return Classification {
            kind: MessageKind::Unknown,
            confidence: EMPTY_CONFIDENCE,
        };
    }

    let scores = KeywordScores::from_text(&text, has_coordinates);
    let (kind, score) = scores.winner();

    let mut confidence = clip(score / 3.0, MIN_CONFIDENCE, MAX_CONFIDENCE);
    if kind == MessageKind::Distress && score >= 2.0 {
        confidence = clip(confidence + 0.20, MIN_CONFIDENCE, MAX_CONFIDENCE);
    }

    Classification { kind, confidence }
}
