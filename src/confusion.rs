//! Confusion counts under the flexible matching rule.
//!
//! A positive prediction does not have to land exactly on an event id to
//! count: it matches when any event lies within `flex_width` ids of it.
//! Matched predictions are credited for the whole window they could have
//! hit, so with a nonzero flex width the four counts can total more than
//! the table size. That inflation is intentional; it is how windowed credit
//! is scored. At `flex_width == 0` the rule degrades to the classic
//! confusion matrix and the counts partition the table exactly.

use crate::events::EventTable;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Outcome counts for one `(threshold, flex_width)` operating point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: u64,
    pub false_positives: u64,
    pub true_negatives: u64,
    pub false_negatives: u64,
}

impl ConfusionCounts {
    /// Sum of all four counts.
    ///
    /// Equals the table size when `flex_width == 0`; may exceed it
    /// otherwise.
    pub fn total(&self) -> u64 {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    /// FP / (TN + FP). NaN when nothing was counted negative.
    pub fn false_positive_rate(&self) -> f64 {
        self.false_positives as f64 / (self.true_negatives + self.false_positives) as f64
    }

    /// TP / (TP + FN). NaN when nothing was counted positive.
    pub fn true_positive_rate(&self) -> f64 {
        self.true_positives as f64 / (self.true_positives + self.false_negatives) as f64
    }
}

/// Evaluate the table at one threshold under the flexible matching rule.
///
/// Two passes. First, every observation with score strictly above
/// `threshold` is a positive prediction: if any id in its inclusive window
/// `[id - flex_width, id + flex_width]` carries an event, the prediction
/// credits `2 * flex_width + 1` true positives and claims every table id in
/// the window; otherwise it credits one false positive and claims only its
/// own id. Second, every id left unclaimed counts as a false negative if it
/// carries an event, else a true negative.
///
/// Claims only shield ids from the second pass; they never stop a later
/// prediction from being scored.
pub fn count(table: &EventTable, threshold: f64, flex_width: u64) -> ConfusionCounts {
    let mut counts = ConfusionCounts::default();
    let mut claimed: HashSet<u64> = HashSet::new();

    for (&id, observation) in table.iter() {
        // Strict comparison: a NaN score never counts as a prediction.
        if observation.score > threshold {
            if table.window(id, flex_width).any(|(_, o)| o.is_event) {
                counts.true_positives += 2 * flex_width + 1;
                claimed.extend(table.window(id, flex_width).map(|(&window_id, _)| window_id));
            } else {
                counts.false_positives += 1;
                claimed.insert(id);
            }
        }
    }

    for (&id, observation) in table.iter() {
        if claimed.contains(&id) {
            continue;
        }
        if observation.is_event {
            counts.false_negatives += 1;
        } else {
            counts.true_negatives += 1;
        }
    }

    counts
}
