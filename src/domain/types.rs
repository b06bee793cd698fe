//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum observations required before a logistic fit is attempted.
pub const DEFAULT_MIN_POINTS: usize = 6;

/// Last projected year.
pub const DEFAULT_HORIZON_YEAR: i32 = 2100;

/// Number of evenly spaced samples between the first observed year and the horizon.
pub const DEFAULT_SAMPLE_COUNT: usize = 100;

/// Optimizer evaluation budget (calls to the residual function).
pub const DEFAULT_MAX_EVALUATIONS: usize = 10_000;

/// How many entities are selected when the user doesn't pick any.
pub const DEFAULT_SELECTION: usize = 5;

/// Sector columns of the emissions-by-sector dataset, in display order.
pub const SECTOR_COLUMNS: [&str; 9] = [
    "Buildings",
    "Industry",
    "Land use change and forestry",
    "Other fuel combustion",
    "Transport",
    "Manufacturing and construction",
    "Energy production",
    "Electricity and heat",
    "Bunker fuels",
];

/// One row of an annual emissions table.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionRecord {
    pub entity: String,
    pub year: i32,
    pub value: f64,
}

/// One observation of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub year: i32,
    pub value: f64,
}

/// Observations for one named entity, in source order.
///
/// Years need not be contiguous and duplicate years are kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub entity: String,
    pub points: Vec<Observation>,
}

impl TimeSeries {
    pub fn new(entity: impl Into<String>, points: Vec<Observation>) -> Self {
        Self {
            entity: entity.into(),
            points,
        }
    }

    /// Build a series from parallel `(year, value)` pairs.
    pub fn from_pairs(entity: impl Into<String>, pairs: &[(i32, f64)]) -> Self {
        let points = pairs
            .iter()
            .map(|&(year, value)| Observation { year, value })
            .collect();
        Self::new(entity, points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn years(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.year as f64).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn min_year(&self) -> Option<i32> {
        self.points.iter().map(|p| p.year).min()
    }

    pub fn max_year(&self) -> Option<i32> {
        self.points.iter().map(|p| p.year).max()
    }

    /// Most recent observation (largest year; first one wins on ties).
    pub fn latest(&self) -> Option<Observation> {
        let mut best: Option<Observation> = None;
        for p in &self.points {
            match best {
                Some(b) if b.year >= p.year => {}
                _ => best = Some(*p),
            }
        }
        best
    }
}

/// Fitted logistic curve parameters `(L, x0, k, b)`.
///
/// `y(x) = L / (1 + exp(-k (x - x0))) + b`
///
/// No sign or magnitude invariants are enforced; the optimizer may land anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Height of the S-curve (carrying capacity above the baseline).
    #[serde(rename = "L")]
    pub l: f64,
    /// Midpoint year.
    pub x0: f64,
    /// Growth rate.
    pub k: f64,
    /// Baseline offset.
    pub b: f64,
}

impl LogisticParams {
    pub fn new(l: f64, x0: f64, k: f64, b: f64) -> Self {
        Self { l, x0, k, b }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.l, self.x0, self.k, self.b]
    }

    pub fn from_slice(p: &[f64]) -> Self {
        Self::new(p[0], p[1], p[2], p[3])
    }

    /// Limit as `x → +∞` for `k > 0` (`L + b`).
    pub fn upper_asymptote(&self) -> f64 {
        self.l + self.b
    }

    /// Limit as `x → -∞` for `k > 0` (`b`).
    pub fn lower_asymptote(&self) -> f64 {
        self.b
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
    /// Residual function evaluations spent by the optimizer.
    pub evaluations: usize,
}

/// Output of a successful logistic fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticFit {
    pub params: LogisticParams,
    pub quality: FitQuality,
}

/// One projected point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub year: i32,
    pub value: f64,
}

/// Projected values for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub entity: String,
    pub params: LogisticParams,
    pub quality: FitQuality,
    pub points: Vec<ProjectionPoint>,
}

impl Projection {
    /// Projected value at the first sampled year `>= year`.
    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.points.iter().find(|p| p.year >= year).map(|p| p.value)
    }
}

/// Non-fatal fit failure for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FitWarning {
    pub entity: String,
    pub reason: String,
}

impl FitWarning {
    pub fn message(&self) -> String {
        format!(
            "Could not fit logistic regression for {}: {}",
            self.entity, self.reason
        )
    }
}

/// Informational message (not a warning), e.g. a series too short to fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub entity: String,
    pub message: String,
}

/// Knobs of the projection engine.
///
/// Derived from CLI flags (plus defaults).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    pub min_points: usize,
    pub horizon_year: i32,
    pub sample_count: usize,
    pub max_evaluations: usize,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            min_points: DEFAULT_MIN_POINTS,
            horizon_year: DEFAULT_HORIZON_YEAR,
            sample_count: DEFAULT_SAMPLE_COUNT,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
        }
    }
}

/// One row of the busiest-airports table.
#[derive(Debug, Clone, PartialEq)]
pub struct Airport {
    pub name: String,
    pub country: String,
    pub location: String,
    pub passengers: u64,
    /// Coordinates, when the file carries them (`lat`, `long`).
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// A saved projection file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub value_label: String,
    pub horizon_year: i32,
    pub projections: Vec<Projection>,
}
