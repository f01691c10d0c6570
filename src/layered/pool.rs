use rayon::prelude::*;

use crate::{
    density::{DensityMap, number_of_particles},
    random::RandomSource,
    types::{Point, Value},
};

/// First random stream used by pool bins. Counting tasks use streams from 0
/// upwards and filling passes from `u64::MAX` downwards.
pub const POOL_STREAMS: u64 = u64::MAX / 2;

/// Points in the unit cube whose `z` follows the density table.
///
/// `z` is a normalized scalar; `x` and `y` are uniform. The table is split
/// into bins between adjacent slots, each bin receives its share of the pool
/// by trapezoidal mass, and `z` is drawn inside the bin by rejection against
/// the linear segment joining the two slots:
///
/// ```text
/// density
///   │      p1
///   │     ╱│
///   │ p0 ╱ │    g(s) = a·s + b, accepted when g(s) > max(p0, p1)·R
///   │ │ ╱  │
///   └─┴────┴── s
///     s0   s1
/// ```
///
/// Points are kept sorted by `z`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticlePool {
    points: Vec<Point>,
}

impl ParticlePool {
    /// Builds a pool of about `size` points. Bin `i` draws from stream
    /// `POOL_STREAMS + i` of `seed`.
    ///
    /// An all-zero table gives an empty pool.
    pub fn generate(density_map: &DensityMap, size: usize, seed: u64) -> Self {
        let table = density_map.table();
        let bins = table.len().saturating_sub(1);
        if bins == 0 {
            return Self::default();
        }
        let width = 1. / bins as Value;
        let mass: Vec<Value> = table
            .windows(2)
            .map(|p| 0.5 * (p[0] + p[1]) * width)
            .collect();
        let total: Value = mass.iter().sum();
        if total <= 0. {
            return Self::default();
        }

        let per_bin: Vec<Vec<Point>> = (0..bins)
            .into_par_iter()
            .map(|i| {
                let mut rng = RandomSource::from_stream(seed, POOL_STREAMS + i as u64);
                let count = number_of_particles(mass[i] / total, size as Value, &mut rng);
                let (p0, p1) = (table[i], table[i + 1]);
                let bound = p0.max(p1);
                let s0 = i as Value * width;
                let slope = (p1 - p0) / width;

                let mut local = Vec::with_capacity(count);
                while local.len() < count {
                    let s = s0 + rng.next() * width;
                    let g = p0 + slope * (s - s0);
                    if g > bound * rng.next() {
                        local.push(Point::new(rng.next(), rng.next(), s));
                    }
                }
                local.sort_unstable_by(|a, b| a.z.total_cmp(&b.z));
                local
            })
            .collect();

        // Merge per-bin pools; bins are already in ascending z
        let total: usize = per_bin.iter().map(|v| v.len()).sum();
        let mut points = Vec::with_capacity(total);
        for mut v in per_bin {
            points.append(&mut v);
        }
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Index range of the points with `lo <= z <= hi`.
    pub fn band(&self, lo: Value, hi: Value) -> std::ops::Range<usize> {
        let start = self.points.partition_point(|p| p.z < lo);
        let end = self.points.partition_point(|p| p.z <= hi);
        start..end.max(start)
    }
}
