use std::borrow::Cow;

use derive_more::Display;
use log::{debug, error, warn};
use rayon::{ThreadPoolBuilder, prelude::*};
use tracing::info_span;

use crate::{
    buffer::{ParticleBuffer, ParticleWriter},
    camera::{Camera, PixelLength},
    cell::{Cell, CellSupport, Voxel},
    config::GeneratorConfig,
    density::DensityMap,
    error::{Result, SamplingError},
    layered::{LayeredSampling, ParticlePool},
    random::RandomSource,
    sampler::Sampler,
    strategy::{SamplingMethod, Strategy},
    transfer::{ScalarRange, TransferFunction},
    types::Value,
    volume::{CellType, Volume},
};

/// Cells per counting task; each task owns one random stream.
const COUNT_CHUNK: usize = 1024;

/// Progress of one [`ParticleGenerator::generate`] call.
///
/// ```text
/// Idle → CountingPass → Allocating → FillingPass → Done
/// ```
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    #[display("idle")]
    Idle,
    #[display("counting pass")]
    CountingPass,
    #[display("allocating")]
    Allocating,
    #[display("filling pass")]
    FillingPass,
    #[display("done")]
    Done,
}

/// Everything derived from the inputs before the parallel passes start.
struct Prepared<'v> {
    volume: &'v Volume,
    values: Cow<'v, [Value]>,
    range: ScalarRange,
    density_map: DensityMap,
}

/// Generates particles cell by cell, in parallel.
///
/// ```text
/// validate → density map → counting pass   rayon over chunks of cells,
///                                          one random stream per chunk
///                        → allocate        exact size, counts × repetitions
///                        → filling pass    rayon over repetitions, each writing
///                                          its own buffer segment
/// ```
///
/// The result depends only on the inputs and [`GeneratorConfig::seed`], not on
/// how many threads run it.
#[derive(Debug, Clone, Default)]
pub struct ParticleGenerator {
    config: GeneratorConfig,
}

impl ParticleGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates particles for `volume`.
    ///
    /// `camera` supplies the object-space pixel length; `None` uses
    /// [`Camera::default`]. Errors are reported before any particle is
    /// generated and abort the whole call.
    #[tracing::instrument(level = "info", skip_all, fields(method = self.config.method.name()))]
    pub fn generate(
        &self,
        volume: Option<&Volume>,
        transfer_function: &TransferFunction,
        camera: Option<&dyn PixelLength>,
    ) -> Result<ParticleBuffer> {
        let result = self
            .prepare(volume, transfer_function, camera)
            .and_then(|prepared| match self.config.num_threads {
                Some(threads) => ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?
                    .install(|| self.run(&prepared, transfer_function)),
                None => self.run(&prepared, transfer_function),
            });
        if let Err(e) = &result {
            error!("particle generation failed: {e}");
        }
        result
    }

    fn prepare<'v>(
        &self,
        volume: Option<&'v Volume>,
        transfer_function: &TransferFunction,
        camera: Option<&dyn PixelLength>,
    ) -> Result<Prepared<'v>> {
        let volume = volume.ok_or(SamplingError::NullVolume)?;
        self.config.validate()?;
        volume.validate()?;
        if self.config.method == SamplingMethod::Layered
            && !matches!(volume, Volume::Unstructured(v) if v.cell_type == CellType::Tetrahedra)
        {
            return Err(SamplingError::UnsupportedCellType {
                method: self.config.method.name(),
                cell_type: volume.cell_type_name(),
            });
        }

        let values = volume.values().to_values()?;
        let range = match transfer_function.range {
            Some(range) => range,
            None => volume.default_range(&values)?,
        };
        let bounds = volume.bounds();
        let pixel_length = match camera {
            Some(camera) => camera.pixel_length(&bounds),
            None => Camera::default().pixel_length(&bounds),
        } / self.config.subpixel_level as Value;
        let density_map = DensityMap::build(
            &transfer_function.opacity_map,
            range,
            self.config.sampling_step,
            pixel_length,
        )?;
        debug!(
            "{}: {} cells, scalar range [{}, {}], pixel length {pixel_length}",
            GenerationStage::Idle,
            volume.number_of_cells(),
            range.min(),
            range.max(),
        );

        Ok(Prepared {
            volume,
            values,
            range,
            density_map,
        })
    }

    fn run(&self, prepared: &Prepared<'_>, transfer_function: &TransferFunction) -> Result<ParticleBuffer> {
        let pool = (self.config.method == SamplingMethod::Layered).then(|| {
            let _span = info_span!("particle_pool", size = self.config.pool_size).entered();
            let pool =
                ParticlePool::generate(&prepared.density_map, self.config.pool_size, self.config.seed);
            debug!("layered pool: {} points", pool.len());
            pool
        });

        match prepared.volume {
            Volume::Structured(grid) => {
                let voxel = Voxel::new(grid, &prepared.values)?;
                self.fill(voxel, prepared, transfer_function, pool.as_ref())
            }
            Volume::Unstructured(mesh) => {
                let cell = Cell::new(mesh, &prepared.values);
                self.fill(cell, prepared, transfer_function, pool.as_ref())
            }
        }
    }

    /// Stochastic particle count of every cell.
    fn count_particles<S>(&self, support: &S, density_map: &DensityMap) -> Vec<usize>
    where
        S: CellSupport + Clone + Sync,
    {
        let mut counts = vec![0; support.number_of_cells()];
        counts
            .par_chunks_mut(COUNT_CHUNK)
            .enumerate()
            .for_each(|(chunk, counts)| {
                let mut sampler = Sampler::new(support.clone(), density_map);
                let mut rng = RandomSource::from_stream(self.config.seed, chunk as u64);
                let first = chunk * COUNT_CHUNK;
                for (offset, count) in counts.iter_mut().enumerate() {
                    sampler.bind(first + offset);
                    *count = sampler.number_of_particles(&mut rng);
                }
            });
        counts
    }

    fn fill<S>(
        &self,
        support: S,
        prepared: &Prepared<'_>,
        transfer_function: &TransferFunction,
        pool: Option<&ParticlePool>,
    ) -> Result<ParticleBuffer>
    where
        S: CellSupport + Clone + Sync,
    {
        let counts = {
            let _span = info_span!("counting_pass").entered();
            debug!("{}", GenerationStage::CountingPass);
            self.count_particles(&support, &prepared.density_map)
        };
        let repetitions = self.config.repetition_level;
        // three components per particle must stay addressable
        let (per_repetition, expected) = counts
            .iter()
            .try_fold(0usize, |total, &n| total.checked_add(n))
            .and_then(|per_repetition| {
                let expected = per_repetition.checked_mul(repetitions)?;
                expected.checked_mul(3)?;
                Some((per_repetition, expected))
            })
            .ok_or(SamplingError::InvalidParameter("particle count"))?;

        let mut buffer = {
            let _span = info_span!("allocating", particles = expected).entered();
            debug!(
                "{}: {per_repetition} particles × {repetitions} repetitions",
                GenerationStage::Allocating
            );
            ParticleBuffer::zeroed(per_repetition, repetitions)
        };
        if expected == 0 {
            debug!("{}: nothing to generate", GenerationStage::Done);
            return Ok(buffer);
        }

        let strategy = Strategy {
            method: self.config.method,
            duplication: self.config.duplication,
            tiny: 1. / transfer_function.resolution() as Value,
        };
        let written: Vec<usize> = {
            let _span = info_span!("filling_pass", repetitions).entered();
            debug!("{}", GenerationStage::FillingPass);
            buffer
                .segments_mut()
                .enumerate()
                .map(|(rep, ((coords, normals), colors))| {
                    let mut writer = ParticleWriter::new(
                        coords,
                        normals,
                        colors,
                        &transfer_function.color_map,
                        &prepared.range,
                    );
                    let mut sampler = Sampler::new(support.clone(), &prepared.density_map);
                    let mut layered = pool.map(|pool| LayeredSampling::new(pool, &prepared.range));
                    // counting streams count up from 0, filling streams down from u64::MAX
                    let mut rng = RandomSource::from_stream(self.config.seed, u64::MAX - rep as u64);
                    for (index, &n) in counts.iter().enumerate() {
                        if n == 0 {
                            continue;
                        }
                        sampler.bind(index);
                        strategy.sample_cell(&mut sampler, layered.as_mut(), n, &mut rng, &mut writer);
                    }
                    let fallbacks = layered.as_ref().map_or(0, LayeredSampling::fallbacks);
                    if fallbacks > 0 {
                        warn!(
                            "repetition {rep}: {fallbacks} cells without a layered transform \
                             used rejection sampling"
                        );
                    }
                    writer.len()
                })
                .collect()
        };

        let total: usize = written.iter().sum();
        if total < expected {
            warn!("metropolis sampling stopped short: {total} of {expected} particles written");
            buffer.compact(&written);
        }
        debug!("{}: {} particles", GenerationStage::Done, buffer.len());
        Ok(buffer)
    }
}

/// Generates particles with the default configuration, overriding the
/// sampling step and repetition level.
pub fn generate(
    volume: Option<&Volume>,
    sampling_step: Value,
    transfer_function: &TransferFunction,
    repetition_level: usize,
    camera: Option<&dyn PixelLength>,
) -> Result<ParticleBuffer> {
    let config = GeneratorConfig::default()
        .with_sampling_step(sampling_step)
        .with_repetition_level(repetition_level);
    ParticleGenerator::new(config).generate(volume, transfer_function, camera)
}
