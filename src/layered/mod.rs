//! Layered sampling: particles are selected from one precomputed pool instead
//! of being drawn per cell.
//!
//! ```text
//! ParticlePool::generate   once per run, z ~ density(normalized scalar)
//! LayeredTransform::new    per cell, object space → pool space
//! band + contains          pool points that fall inside the cell
//! roulette                 n of them, mapped back with the inverse transform
//! ```
//!
//! Only linear tetrahedra have a constant gradient, which the transform relies on.

pub mod pool;
pub mod transform;

pub use pool::ParticlePool;
pub use transform::LayeredTransform;

use crate::{
    buffer::ParticleWriter,
    cell::CellSupport,
    random::RandomSource,
    sampler::Sampler,
    strategy,
    transfer::ScalarRange,
    types::{Particle, Point},
};

/// Per-worker layered sampling state.
pub struct LayeredSampling<'a> {
    pool: &'a ParticlePool,
    range: &'a ScalarRange,
    inside: Vec<usize>,
    fallbacks: usize,
}

impl<'a> LayeredSampling<'a> {
    /// `range` is the transfer function range the pool's `z` is normalized to.
    pub fn new(pool: &'a ParticlePool, range: &'a ScalarRange) -> Self {
        Self {
            pool,
            range,
            inside: Vec::new(),
            fallbacks: 0,
        }
    }

    /// Cells sampled by rejection because they had no valid transform.
    pub fn fallbacks(&self) -> usize {
        self.fallbacks
    }

    /// Writes `n` particles for the sampler's bound cell.
    ///
    /// Pool points inside the cell are picked by roulette, with replacement,
    /// `min(n, Nin)` times; the rest is topped up by rejection sampling. Cells
    /// without a valid transform fall back to rejection sampling entirely.
    pub fn sample_cell<S: CellSupport>(
        &mut self,
        sampler: &mut Sampler<'_, S>,
        n: usize,
        rng: &mut RandomSource,
        writer: &mut ParticleWriter<'_>,
    ) -> usize {
        let transform = sampler
            .support()
            .linear_tetrahedron()
            .and_then(|tet| LayeredTransform::new(&tet, self.range));
        let Some(transform) = transform else {
            self.fallbacks += 1;
            return strategy::rejection(sampler, n, rng, writer);
        };

        let points = self.pool.points();
        let (lo, hi) = transform.band();
        self.inside.clear();
        self.inside
            .extend(self.pool.band(lo, hi).filter(|&i| transform.contains(&points[i])));

        let normal = -transform.direction();
        let range = self.range;
        let particle = |q: &Point| Particle {
            position: transform.inverse(q),
            normal,
            scalar: range.denormalize(q.z),
        };

        let nin = self.inside.len();
        let picks = n.min(nin);
        for _ in 0..picks {
            writer.push(&particle(&points[self.inside[rng.index(nin)]]));
        }
        if picks == n {
            return n;
        }
        picks + strategy::rejection(sampler, n - picks, rng, writer)
    }
}
