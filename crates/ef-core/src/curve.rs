//! Fixed-length hourly curves.
//!
//! Every time-resolved quantity in the model is a curve of exactly one value
//! per hour of a simulated year. A curve of any other length is a defect and
//! is rejected at the boundary, never truncated or padded.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::numeric::Real;

/// Hours in a simulated (non-leap) year; one frame per hour.
pub const FRAMES_PER_YEAR: usize = 8760;

/// An hourly curve: exactly [`FRAMES_PER_YEAR`] values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Real>", into = "Vec<Real>")]
pub struct Curve(Vec<Real>);

impl Curve {
    /// A curve of all zeroes.
    pub fn zeroes() -> Self {
        Self(vec![0.0; FRAMES_PER_YEAR])
    }

    /// A curve holding the same value in every frame.
    pub fn constant(value: Real) -> Self {
        Self(vec![value; FRAMES_PER_YEAR])
    }

    /// Build a curve from raw values, rejecting any length other than 8760.
    pub fn from_values(what: &str, values: Vec<Real>) -> CoreResult<Self> {
        if values.len() != FRAMES_PER_YEAR {
            return Err(CoreError::CurveLength {
                what: what.to_string(),
                len: values.len(),
                expected: FRAMES_PER_YEAR,
            });
        }
        Ok(Self(values))
    }

    pub fn get(&self, frame: usize) -> Real {
        self.0[frame]
    }

    pub fn set(&mut self, frame: usize, value: Real) {
        self.0[frame] = value;
    }

    pub fn add(&mut self, frame: usize, value: Real) {
        self.0[frame] += value;
    }

    pub fn values(&self) -> &[Real] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Real> + '_ {
        self.0.iter().copied()
    }

    pub fn sum(&self) -> Real {
        self.0.iter().sum()
    }

    pub fn max(&self) -> Real {
        self.0.iter().copied().fold(Real::NEG_INFINITY, Real::max)
    }

    pub fn min(&self) -> Real {
        self.0.iter().copied().fold(Real::INFINITY, Real::min)
    }

    /// Add another curve element-wise.
    pub fn add_curve(&mut self, other: &Curve) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a += b;
        }
    }

    /// Subtract another curve element-wise.
    pub fn subtract_curve(&mut self, other: &Curve) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a -= b;
        }
    }

    /// Multiply every frame by a factor, returning a new curve.
    pub fn scaled(&self, factor: Real) -> Curve {
        Curve(self.0.iter().map(|v| v * factor).collect())
    }

    /// Running (cumulative) sum of the curve.
    pub fn cumulative(&self) -> Curve {
        let mut total = 0.0;
        Curve(
            self.0
                .iter()
                .map(|v| {
                    total += v;
                    total
                })
                .collect(),
        )
    }
}

impl TryFrom<Vec<Real>> for Curve {
    type Error = CoreError;

    fn try_from(values: Vec<Real>) -> Result<Self, Self::Error> {
        Curve::from_values("deserialized curve", values)
    }
}

impl From<Curve> for Vec<Real> {
    fn from(curve: Curve) -> Self {
        curve.0
    }
}
