use crate::{
    error::{Result, SamplingError},
    types::Value,
};

pub use crate::strategy::{DuplicationPolicy, SamplingMethod};

/// Default seed of every random stream.
pub const DEFAULT_SEED: u64 = 0x5EED_CE11;

/// Default number of points in the layered sampling pool.
pub const DEFAULT_POOL_SIZE: usize = 800_000;

/// Settings for one [`ParticleGenerator`](crate::generator::ParticleGenerator).
///
/// ```rust,ignore
/// let config = GeneratorConfig::default()
///     .with_method(SamplingMethod::Rejection)
///     .with_repetition_level(4)
///     .with_seed(7);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Strategy used for cells whose node scalars vary. Default: Metropolis.
    pub method: SamplingMethod,

    /// Ray-integration step the opacities are defined for, in object units. Default: `0.5`.
    pub sampling_step: Value,

    /// Number of independent particle sets generated into one buffer. Default: `1`.
    pub repetition_level: usize,

    /// Divides the pixel length; higher levels give denser, finer particles. Default: `1`.
    pub subpixel_level: usize,

    /// Seed of every random stream; the same seed reproduces the same buffer.
    pub seed: u64,

    /// Metropolis behaviour on rejected proposals. Default: stop short.
    pub duplication: DuplicationPolicy,

    /// Points in the layered sampling pool. Default: `800_000`.
    pub pool_size: usize,

    /// Runs on a dedicated rayon pool of this many threads instead of the global one.
    pub num_threads: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            method: SamplingMethod::default(),
            sampling_step: 0.5,
            repetition_level: 1,
            subpixel_level: 1,
            seed: DEFAULT_SEED,
            duplication: DuplicationPolicy::default(),
            pool_size: DEFAULT_POOL_SIZE,
            num_threads: None,
        }
    }
}

impl GeneratorConfig {
    pub fn with_method(mut self, method: SamplingMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_sampling_step(mut self, sampling_step: Value) -> Self {
        self.sampling_step = sampling_step;
        self
    }

    pub fn with_repetition_level(mut self, repetition_level: usize) -> Self {
        self.repetition_level = repetition_level;
        self
    }

    pub fn with_subpixel_level(mut self, subpixel_level: usize) -> Self {
        self.subpixel_level = subpixel_level;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_duplication(mut self, duplication: DuplicationPolicy) -> Self {
        self.duplication = duplication;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Returns [`SamplingError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if !(self.sampling_step.is_finite() && self.sampling_step > 0.) {
            return Err(SamplingError::InvalidParameter("sampling step"));
        }
        if self.repetition_level == 0 {
            return Err(SamplingError::InvalidParameter("repetition level"));
        }
        if self.subpixel_level == 0 {
            return Err(SamplingError::InvalidParameter("subpixel level"));
        }
        if self.method == SamplingMethod::Layered && self.pool_size == 0 {
            return Err(SamplingError::InvalidParameter("pool size"));
        }
        if self.num_threads == Some(0) {
            return Err(SamplingError::InvalidParameter("thread count"));
        }
        Ok(())
    }
}
