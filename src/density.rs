//! Particle density lookup and the stochastic particle count.
//!
//! The density map converts the per-step absorption probability of the opacity
//! map into particles per unit volume, so that splatting the expected number of
//! particles reproduces the transfer function's opacity along a ray:
//!
//! ```text
//! max_opacity = 1 - exp(-dt / l)
//! density[i]  = -ln(1 - opacity[i]) / (l² dt)   if opacity[i] < max_opacity
//!             =  1 / l³                          otherwise (saturated)
//! ```
//!
//! where `l` is the object-space pixel length and `dt` the sampling step.

use crate::{
    error::{Result, SamplingError},
    interp::lerp,
    random::RandomSource,
    transfer::{OpacityMap, ScalarRange},
    types::Value,
};

/// Piecewise-linear scalar → particle density table.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMap {
    table: Vec<Value>,
    range: ScalarRange,
    max_density: Value,
}

impl DensityMap {
    /// Builds the table for one (opacity map, sampling step, pixel length) triple.
    ///
    /// Returns [`SamplingError::InvalidParameter`] when `sampling_step` or
    /// `pixel_length` is not a positive finite number.
    pub fn build(
        opacity_map: &OpacityMap,
        range: ScalarRange,
        sampling_step: Value,
        pixel_length: Value,
    ) -> Result<Self> {
        if !(sampling_step.is_finite() && sampling_step > 0.) {
            return Err(SamplingError::InvalidParameter("sampling step"));
        }
        if !(pixel_length.is_finite() && pixel_length > 0.) {
            return Err(SamplingError::InvalidParameter("pixel length"));
        }
        if opacity_map.resolution() < 2 {
            return Err(SamplingError::InvalidTable(opacity_map.resolution()));
        }

        let max_opacity = 1. - (-sampling_step / pixel_length).exp();
        let max_density = 1. / (pixel_length * pixel_length * pixel_length);
        let inv_volume = 1. / (pixel_length * pixel_length * sampling_step);

        let table = opacity_map
            .table()
            .iter()
            .map(|&opacity| {
                if opacity < max_opacity {
                    -(1. - opacity).ln() * inv_volume
                } else {
                    max_density
                }
            })
            .collect();

        Ok(Self {
            table,
            range,
            max_density,
        })
    }

    pub fn table(&self) -> &[Value] {
        &self.table
    }

    pub fn range(&self) -> &ScalarRange {
        &self.range
    }

    pub fn resolution(&self) -> usize {
        self.table.len()
    }

    /// Saturation density `1 / l³`; no table entry exceeds it.
    pub fn max_density(&self) -> Value {
        self.max_density
    }

    /// Density at `scalar`, clamped to the table range and linearly interpolated.
    pub fn at(&self, scalar: Value) -> Value {
        let v = self.range.table_position(scalar, self.table.len());
        let s0 = v as usize;
        let s1 = (s0 + 1).min(self.table.len() - 1);
        lerp(self.table[s0], self.table[s1], v - s0 as Value)
    }

    /// Largest table entry over the slots covering `[s0, s1]`.
    ///
    /// Used as the rejection sampling envelope: every density returned by
    /// [`at`](DensityMap::at) for a scalar in `[s0, s1]` is bounded by it.
    pub fn max_density_in_range(&self, s0: Value, s1: Value) -> Value {
        let (lo, hi) = if s0 <= s1 { (s0, s1) } else { (s1, s0) };
        let dims = self.table.len() - 1;
        let width = self.range.width();
        let scale = if width > 0. { dims as Value / width } else { 0. };
        let index = |s: Value| ((s - self.range.min()) * scale).max(0.) as usize;

        let i0 = index(lo).min(dims);
        let i1 = (index(hi) + 1).min(dims);
        self.table[i0..=i1]
            .iter()
            .copied()
            .fold(Value::NEG_INFINITY, Value::max)
    }
}

/// Stochastically rounded particle count for a cell.
///
/// Returns `floor(N)` plus one more with probability `N - floor(N)`, where
/// `N = density * volume`, so the expected count equals `N` exactly. Counts
/// beyond `usize::MAX` saturate.
#[inline]
pub fn number_of_particles(density: Value, volume: Value, rng: &mut RandomSource) -> usize {
    let n = density * volume;
    if !n.is_finite() || n <= 0. {
        return 0;
    }
    let base = n as usize;
    if n - base as Value > rng.next() {
        base.saturating_add(1)
    } else {
        base
    }
}
