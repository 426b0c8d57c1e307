//! Flexible ROC curve and AUC computation.
//!
//! Scores a table of labeled observations where a positive prediction does
//! not have to land exactly on an event id to count: it matches when any
//! true event lies within `flex_width` ids of it. Sweeping a threshold grid
//! over the scores yields an ROC curve; the area under a cubic-spline
//! interpolant of that curve is the summary statistic.
//!
//! # Pipeline
//!
//! ```text
//! datafile ──▶ EventTable ──▶ curve::sweep (threshold grid, rayon)
//!                                   │ confusion::count per threshold
//!                                   ▼
//!                             RocCurve (max TPR per FPR)
//!                               │              │
//!                               ▼              ▼
//!                         roc artifact   integrate::area
//!                                        (natural cubic spline +
//!                                         adaptive Simpson) ──▶ AUC
//! ```
//!
//! # Windowed credit
//!
//! A matched prediction is credited for every id its window could have hit
//! (`2 * flex_width + 1` true positives) and claims the whole window, so
//! with a nonzero flex width the four confusion counts may total more than
//! the table size. At `flex_width == 0` the scoring degrades to the classic
//! confusion matrix and the counts partition the table exactly.

pub mod config;
pub mod confusion;
pub mod curve;
pub mod events;
pub mod integrate;

pub use config::{RocConfig, ThresholdGrid};
pub use confusion::ConfusionCounts;
pub use curve::{RocCurve, RocPoint};
pub use events::{EventTable, Observation, TableSummary};
pub use integrate::IntegrationError;
