//! Normalized input series and metrics.

use crate::error::{SonifyError, SonifyResult};
use serde::{Deserialize, Serialize};

/// An ordered sequence of floats in `[0,1]`. Normalization is the caller's
/// responsibility; this type only validates the invariant. Immutable once
/// constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series(Vec<f64>);

impl Series {
    /// Validates and wraps a raw float vector.
    ///
    /// Fails with [`SonifyError::InvalidSeries`] if `len < 2`, any value is
    /// non-finite, or any value falls outside `[0,1]`.
    pub fn new(values: Vec<f64>) -> SonifyResult<Self> {
        if values.len() < 2 {
            return Err(SonifyError::InvalidSeries {
                reason: format!("length {} < 2", values.len()),
            });
        }
        for (i, v) in values.iter().enumerate() {
            if !v.is_finite() {
                return Err(SonifyError::InvalidSeries {
                    reason: format!("value at index {i} is not finite: {v}"),
                });
            }
            if !(0.0..=1.0).contains(v) {
                return Err(SonifyError::InvalidSeries {
                    reason: format!("value at index {i} out of [0,1]: {v}"),
                });
            }
        }
        Ok(Series(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalized metrics, each in `[0,1]`. Missing fields default to `0.5` per
/// the data model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub ctr: Option<f64>,
    pub impressions: Option<f64>,
    pub position: Option<f64>,
    pub clicks: Option<f64>,
    pub volatility_index: Option<f64>,
}

impl Metrics {
    pub const MISSING_DEFAULT: f64 = 0.5;

    pub fn ctr(&self) -> f64 {
        self.ctr.unwrap_or(Self::MISSING_DEFAULT)
    }
    pub fn impressions(&self) -> f64 {
        self.impressions.unwrap_or(Self::MISSING_DEFAULT)
    }
    pub fn position(&self) -> f64 {
        self.position.unwrap_or(Self::MISSING_DEFAULT)
    }
    pub fn clicks(&self) -> f64 {
        self.clicks.unwrap_or(Self::MISSING_DEFAULT)
    }
    pub fn volatility_index(&self) -> f64 {
        self.volatility_index.unwrap_or(Self::MISSING_DEFAULT)
    }

    /// Validates every present field is finite and within `[0,1]`.
    pub fn validate(&self) -> SonifyResult<()> {
        for (name, value) in [
            ("ctr", self.ctr),
            ("impressions", self.impressions),
            ("position", self.position),
            ("clicks", self.clicks),
            ("volatility_index", self.volatility_index),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                    return Err(SonifyError::InvalidMetric {
                        name: name.to_string(),
                        value: v,
                    });
                }
            }
        }
        Ok(())
    }

    /// The fixed feature-vector schema used by the optional learned label
    /// model: `[ctr, impressions, position, clicks, volatility_index]`.
    pub fn feature_vector(&self) -> [f64; 5] {
        [
            self.ctr(),
            self.impressions(),
            self.position(),
            self.clicks(),
            self.volatility_index(),
        ]
    }
}
