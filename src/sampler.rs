use crate::{
    cell::CellSupport,
    density::{DensityMap, number_of_particles},
    interp::min_max,
    random::RandomSource,
    types::{Particle, Value},
};

/// Draws particles inside one bound cell.
///
/// Holds two particle slots: the *current* particle, written by
/// [`sample`](Sampler::sample), and a *trial* particle, written by
/// [`try_sample`](Sampler::try_sample) and promoted with
/// [`accept_trial`](Sampler::accept_trial). Each slot remembers the density
/// at its position.
///
/// ```text
/// bind(i) → number_of_particles → { sample | try_sample → accept_trial }*
/// ```
#[derive(Debug, Clone)]
pub struct Sampler<'a, S> {
    support: S,
    density_map: &'a DensityMap,
    current: Particle,
    current_density: Value,
    trial: Particle,
    trial_density: Value,
}

impl<'a, S: CellSupport> Sampler<'a, S> {
    pub fn new(support: S, density_map: &'a DensityMap) -> Self {
        Self {
            support,
            density_map,
            current: Particle::default(),
            current_density: 0.,
            trial: Particle::default(),
            trial_density: 0.,
        }
    }

    pub fn bind(&mut self, index: usize) {
        self.support.bind(index);
    }

    pub fn support(&self) -> &S {
        &self.support
    }

    /// Stochastic particle count of the bound cell.
    pub fn number_of_particles(&self, rng: &mut RandomSource) -> usize {
        let density = self.density_map.at(self.support.representative_scalar());
        number_of_particles(density, self.support.volume(), rng)
    }

    fn draw(&mut self, rng: &mut RandomSource) -> (Particle, Value) {
        let position = self.support.set_random_point(rng);
        let scalar = self.support.scalar();
        let particle = Particle {
            position,
            normal: -self.support.gradient(),
            scalar,
        };
        (particle, self.density_map.at(scalar))
    }

    /// Replaces the current particle with a uniformly drawn one; returns its density.
    pub fn sample(&mut self, rng: &mut RandomSource) -> Value {
        (self.current, self.current_density) = self.draw(rng);
        self.current_density
    }

    /// Like [`sample`](Sampler::sample), but redraws up to `max_loops` times
    /// while the density is exactly zero.
    pub fn sample_with_retries(&mut self, rng: &mut RandomSource, max_loops: usize) -> Value {
        let mut density = self.sample(rng);
        let mut loops = 0;
        while density == 0. && loops < max_loops {
            density = self.sample(rng);
            loops += 1;
        }
        density
    }

    /// Draws into the trial slot, leaving the current particle untouched.
    pub fn try_sample(&mut self, rng: &mut RandomSource) -> Value {
        (self.trial, self.trial_density) = self.draw(rng);
        self.trial_density
    }

    /// Promotes the trial particle to current and returns it.
    pub fn accept_trial(&mut self) -> Particle {
        self.current = self.trial;
        self.current_density = self.trial_density;
        self.current
    }

    /// The current particle.
    pub fn accept(&self) -> Particle {
        self.current
    }

    pub fn current_density(&self) -> Value {
        self.current_density
    }

    /// Min and max node scalar of the bound cell.
    pub fn scalar_range(&self) -> (Value, Value) {
        min_max(self.support.node_values())
    }

    /// Upper bound of the density over the bound cell's node scalar range.
    pub fn max_density(&self) -> Value {
        let (lo, hi) = self.scalar_range();
        self.density_map.max_density_in_range(lo, hi)
    }

    /// True when all node scalars are equal or span less than `tiny`.
    pub fn is_uniform(&self, tiny: Value) -> bool {
        let (lo, hi) = self.scalar_range();
        lo == hi || hi - lo < tiny
    }
}
