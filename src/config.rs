//! Sweep and integration configuration.
//!
//! All tuning knobs for a flexible ROC run live here as explicit values
//! passed down the pipeline. There is no global state: the flex width, the
//! threshold grid, and the quadrature tolerance are fields on [`RocConfig`],
//! constructed once (by the CLI or a library caller) and borrowed by the
//! sweep and the integrator.

use serde::{Deserialize, Serialize};

/// Default threshold spacing for the sweep grid.
pub const DEFAULT_THRESHOLD_STEP: f64 = 1e-4;

/// Default number of thresholds in the sweep grid.
///
/// Covers 0.0001 ..= 0.9899 at the default step.
pub const DEFAULT_THRESHOLD_STEPS: usize = 9899;

/// Default absolute tolerance for the AUC quadrature.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

// =============================================================================
// THRESHOLD GRID
// =============================================================================

/// Evenly spaced score thresholds swept when building a ROC curve.
///
/// Threshold `i` (1-based) is `i * step`; the grid never includes 0.0, so a
/// prediction always requires a strictly positive score at the lowest
/// threshold. Values are derived by integer multiplication rather than
/// repeated addition, so the grid is identical across runs and across
/// sequential/parallel sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdGrid {
    /// Spacing between consecutive thresholds.
    pub step: f64,
    /// Number of thresholds (the last is `steps * step`).
    pub steps: usize,
}

impl Default for ThresholdGrid {
    fn default() -> Self {
        Self {
            step: DEFAULT_THRESHOLD_STEP,
            steps: DEFAULT_THRESHOLD_STEPS,
        }
    }
}

impl ThresholdGrid {
    /// Grid with `steps` thresholds spaced `step` apart, starting at `step`.
    pub fn new(step: f64, steps: usize) -> Self {
        Self { step, steps }
    }

    /// Threshold values in ascending order.
    pub fn thresholds(&self) -> impl Iterator<Item = f64> + '_ {
        let step = self.step;
        (1..=self.steps).map(move |i| i as f64 * step)
    }

    /// Number of thresholds in the grid.
    pub fn len(&self) -> usize {
        self.steps
    }

    /// True when the grid holds no thresholds.
    pub fn is_empty(&self) -> bool {
        self.steps == 0
    }
}

// =============================================================================
// RUN CONFIGURATION
// =============================================================================

/// Parameters for one flexible ROC computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocConfig {
    /// Matching half-window: a positive prediction at id `i` matches any
    /// event in `[i - flex_width, i + flex_width]`.
    pub flex_width: u64,
    /// Threshold grid for the sweep.
    pub grid: ThresholdGrid,
    /// Absolute tolerance for the AUC quadrature.
    pub tolerance: f64,
}

impl Default for RocConfig {
    fn default() -> Self {
        Self {
            flex_width: 0,
            grid: ThresholdGrid::default(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl RocConfig {
    /// Default configuration with the given flex width.
    pub fn with_flex_width(flex_width: u64) -> Self {
        Self {
            flex_width,
            ..Self::default()
        }
    }
}
