//! ROC curve assembly: the threshold sweep and the FPR-keyed point map.
//!
//! The sweep evaluates the confusion counts at every grid threshold and
//! folds the resulting (FPR, TPR) operating points into a curve. The curve
//! keeps at most one point per FPR, retaining the maximum TPR seen there.
//! That upsert is commutative and associative, so sweep chunks can be merged
//! in any order; the sweep runs on a rayon pool and reduces partial curves
//! without affecting the result.
//!
//! Indeterminate operating points (a 0/0 rate, e.g. a threshold where
//! nothing is counted negative) are dropped before insertion and tallied.

use crate::config::RocConfig;
use crate::confusion;
use crate::events::EventTable;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

// =============================================================================
// ROC POINT
// =============================================================================

/// One stored operating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub false_positive_rate: f64,
    pub true_positive_rate: f64,
}

/// Curve key: an FPR ordered by `total_cmp`.
///
/// Keys are only built from values `insert_max` has verified finite, so the
/// total order coincides with numeric order.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FprKey(f64);

impl Eq for FprKey {}

impl PartialOrd for FprKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FprKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

// =============================================================================
// ROC CURVE
// =============================================================================

/// ROC curve: TPR keyed by FPR, unique keys, ascending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RocCurve {
    points: BTreeMap<FprKey, f64>,
}

impl RocCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert keeping the maximum TPR per FPR.
    ///
    /// An existing point is replaced only by a strictly greater TPR.
    /// Non-finite coordinates are rejected; returns false when the point
    /// was dropped.
    pub fn insert_max(&mut self, false_positive_rate: f64, true_positive_rate: f64) -> bool {
        if !false_positive_rate.is_finite() || !true_positive_rate.is_finite() {
            return false;
        }
        match self.points.entry(FprKey(false_positive_rate)) {
            Entry::Vacant(slot) => {
                slot.insert(true_positive_rate);
            }
            Entry::Occupied(mut slot) => {
                if true_positive_rate > *slot.get() {
                    slot.insert(true_positive_rate);
                }
            }
        }
        true
    }

    /// Fold another curve in under the same max-per-FPR rule.
    pub fn merge(&mut self, other: RocCurve) {
        for (key, true_positive_rate) in other.points {
            self.insert_max(key.0, true_positive_rate);
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in ascending FPR order.
    pub fn points(&self) -> impl Iterator<Item = RocPoint> + '_ {
        self.points.iter().map(|(key, &tpr)| RocPoint {
            false_positive_rate: key.0,
            true_positive_rate: tpr,
        })
    }

    /// Knot vectors (ascending FPR, matching TPR) for interpolation.
    pub fn coordinates(&self) -> (Vec<f64>, Vec<f64>) {
        let mut xs = Vec::with_capacity(self.len());
        let mut ys = Vec::with_capacity(self.len());
        for point in self.points() {
            xs.push(point.false_positive_rate);
            ys.push(point.true_positive_rate);
        }
        (xs, ys)
    }

    /// Write the curve artifact: one `<FPR> <TPR>` line per point,
    /// ascending FPR.
    ///
    /// Content goes to a temp file first and is renamed over the
    /// destination (atomic on POSIX), so a crash mid-write never leaves a
    /// partial artifact at `path`.
    pub fn write_atomic(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = path.with_extension("tmp");
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        for point in self.points() {
            writeln!(
                writer,
                "{} {}",
                point.false_positive_rate, point.true_positive_rate
            )?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&temp_path, path)
    }

    /// Read a curve artifact back.
    ///
    /// Strict counterpart of [`RocCurve::write_atomic`]: every non-blank
    /// line must be exactly two finite floats, anything else is
    /// `InvalidData`. The writer only emits finite points, so a non-finite
    /// row means the file is not one of ours.
    pub fn read_from(path: &Path) -> io::Result<RocCurve> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut curve = RocCurve::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let (Some(fpr_token), Some(tpr_token)) = (tokens.next(), tokens.next()) else {
                return Err(malformed_line(index));
            };
            if tokens.next().is_some() {
                return Err(malformed_line(index));
            }
            let (Ok(fpr), Ok(tpr)) = (
                fast_float::parse::<f64, _>(fpr_token),
                fast_float::parse::<f64, _>(tpr_token),
            ) else {
                return Err(malformed_line(index));
            };
            if !curve.insert_max(fpr, tpr) {
                return Err(malformed_line(index));
            }
        }
        Ok(curve)
    }
}

fn malformed_line(index: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("malformed curve line {}", index + 1),
    )
}

// =============================================================================
// THRESHOLD SWEEP
// =============================================================================

/// Sweep the threshold grid and assemble the ROC curve.
///
/// Thresholds are evaluated on the rayon pool; partial curves are merged
/// per FPR with the max rule, so the parallel reduction matches a
/// sequential fold over the same grid exactly.
pub fn sweep(table: &EventTable, config: &RocConfig) -> RocCurve {
    let thresholds: Vec<f64> = config.grid.thresholds().collect();
    let flex_width = config.flex_width;

    let (curve, dropped) = thresholds
        .par_iter()
        .map(|&threshold| {
            let counts = confusion::count(table, threshold, flex_width);
            (counts.false_positive_rate(), counts.true_positive_rate())
        })
        .fold(
            || (RocCurve::new(), 0u64),
            |(mut curve, mut dropped), (fpr, tpr)| {
                if !curve.insert_max(fpr, tpr) {
                    dropped += 1;
                }
                (curve, dropped)
            },
        )
        .reduce(
            || (RocCurve::new(), 0u64),
            |(mut left, dropped_left), (right, dropped_right)| {
                left.merge(right);
                (left, dropped_left + dropped_right)
            },
        );

    debug!(
        thresholds = thresholds.len(),
        points = curve.len(),
        dropped_indeterminate = dropped,
        "threshold sweep complete"
    );
    curve
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdGrid;

    fn table_from(line: &str) -> EventTable {
        let mut table = EventTable::new();
        table.ingest_line(line);
        table
    }

    #[test]
    fn test_insert_keeps_maximum_tpr() {
        let mut curve = RocCurve::new();
        assert!(curve.insert_max(0.5, 0.3));
        assert!(curve.insert_max(0.5, 0.7));
        assert!(curve.insert_max(0.5, 0.2));
        assert_eq!(curve.len(), 1);
        let point = curve.points().next().unwrap();
        assert_eq!(point.true_positive_rate, 0.7);
    }

    #[test]
    fn test_non_finite_points_rejected() {
        let mut curve = RocCurve::new();
        assert!(!curve.insert_max(f64::NAN, 1.0));
        assert!(!curve.insert_max(0.1, f64::NAN));
        assert!(!curve.insert_max(f64::INFINITY, 0.5));
        assert!(curve.is_empty());
    }

    #[test]
    fn test_points_ascending_and_unique() {
        let mut curve = RocCurve::new();
        for &(fpr, tpr) in &[(0.9, 0.95), (0.1, 0.4), (0.5, 0.8), (0.1, 0.2), (0.5, 0.9)] {
            curve.insert_max(fpr, tpr);
        }
        let points: Vec<RocPoint> = curve.points().collect();
        assert_eq!(points.len(), 3);
        for pair in points.windows(2) {
            assert!(pair[0].false_positive_rate < pair[1].false_positive_rate);
        }
        assert_eq!(points[0].true_positive_rate, 0.4);
        assert_eq!(points[1].true_positive_rate, 0.9);
    }

    #[test]
    fn test_merge_order_does_not_matter() {
        let build = |pairs: &[(f64, f64)]| {
            let mut curve = RocCurve::new();
            for &(fpr, tpr) in pairs {
                curve.insert_max(fpr, tpr);
            }
            curve
        };
        let a = build(&[(0.0, 0.2), (0.3, 0.6), (1.0, 1.0)]);
        let b = build(&[(0.0, 0.5), (0.3, 0.1), (0.7, 0.9)]);

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_sweep_small_table() {
        let table = table_from("1 1 0.9 2 0 0.1 3 1 0.8 4 0 0.2");
        let config = RocConfig {
            flex_width: 0,
            grid: ThresholdGrid::new(0.1, 9),
            tolerance: 1e-3,
        };
        let curve = sweep(&table, &config);
        let points: Vec<RocPoint> = curve.points().collect();
        // Thresholds 0.1..=0.9: FPR 0.5 only at 0.1; everything else lands
        // on FPR 0 where the max TPR is 1.0.
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].false_positive_rate, 0.0);
        assert_eq!(points[0].true_positive_rate, 1.0);
        assert_eq!(points[1].false_positive_rate, 0.5);
        assert_eq!(points[1].true_positive_rate, 1.0);
    }

    #[test]
    fn test_sweep_matches_sequential_fold() {
        let table = table_from(
            "1 1 0.91 2 0 0.15 3 1 0.72 4 0 0.33 5 1 0.58 6 0 0.07 7 1 0.88 8 0 0.46",
        );
        for flex_width in [0, 1, 3] {
            let config = RocConfig {
                flex_width,
                grid: ThresholdGrid::new(0.01, 98),
                tolerance: 1e-3,
            };
            let parallel = sweep(&table, &config);

            let mut sequential = RocCurve::new();
            for threshold in config.grid.thresholds() {
                let counts = confusion::count(&table, threshold, flex_width);
                sequential.insert_max(
                    counts.false_positive_rate(),
                    counts.true_positive_rate(),
                );
            }
            assert_eq!(parallel, sequential);
        }
    }

    #[test]
    fn test_sweep_empty_table_yields_empty_curve() {
        let table = EventTable::new();
        let config = RocConfig::default();
        let curve = sweep(&table, &config);
        assert!(curve.is_empty());
    }

    #[test]
    fn test_artifact_round_trip() {
        let mut curve = RocCurve::new();
        curve.insert_max(0.25, 0.75);
        curve.insert_max(0.0, 1.0 / 3.0);
        curve.insert_max(0.5, 0.9);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roc.dat");
        curve.write_atomic(&path).unwrap();
        let read_back = RocCurve::read_from(&path).unwrap();
        assert_eq!(read_back, curve);
        // No leftover temp file.
        assert!(!dir.path().join("roc.tmp").exists());
    }

    #[test]
    fn test_write_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/roc.dat");
        let mut curve = RocCurve::new();
        curve.insert_max(0.0, 0.0);
        curve.write_atomic(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_read_rejects_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        for bad in ["0.1 0.2 0.3", "abc 0.2", "0.5", "nan 0.5", "0.1 inf"] {
            let path = dir.path().join("bad.dat");
            std::fs::write(&path, format!("{}\n", bad)).unwrap();
            let err = RocCurve::read_from(&path).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        }
    }

    #[test]
    fn test_read_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roc.dat");
        std::fs::write(&path, "0 0.5\n\n1 1\n").unwrap();
        let curve = RocCurve::read_from(&path).unwrap();
        assert_eq!(curve.len(), 2);
    }

    #[test]
    fn test_empty_curve_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roc.dat");
        RocCurve::new().write_atomic(&path).unwrap();
        let curve = RocCurve::read_from(&path).unwrap();
        assert!(curve.is_empty());
    }
}
