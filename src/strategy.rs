//! Per-cell sampling strategies.
//!
//! Every strategy is handed a bound [`Sampler`], a target count `n > 0` and a
//! [`ParticleWriter`], and returns how many particles it wrote. Uniform,
//! Rejection and Layered always write exactly `n`; Metropolis under the
//! default [`DuplicationPolicy::StopShort`] may write fewer.

use crate::{
    buffer::ParticleWriter,
    cell::CellSupport,
    layered::LayeredSampling,
    random::RandomSource,
    sampler::Sampler,
};

/// How particles are placed inside a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SamplingMethod {
    /// Uniform positions; only the count follows the density.
    Uniform,
    /// Uniform proposals accepted against the cell's density envelope.
    Rejection,
    /// Markov chain of uniform proposals, accepted with probability `min(1, trial / current)`.
    #[default]
    Metropolis,
    /// Precomputed particle pool mapped into each tetrahedron.
    Layered,
}

impl SamplingMethod {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Rejection => "rejection",
            Self::Metropolis => "metropolis",
            Self::Layered => "layered",
        }
    }
}

/// What Metropolis sampling does with a rejected proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DuplicationPolicy {
    /// Count the rejection; give up on the cell after `10 n` of them.
    #[default]
    StopShort,
    /// Write the current particle again.
    Duplicate,
}

/// Strategy selection for one generation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strategy {
    pub method: SamplingMethod,
    pub duplication: DuplicationPolicy,
    /// Node scalar spread below which a cell is treated as constant.
    pub tiny: f32,
}

impl Strategy {
    /// Writes `n` particles for the sampler's bound cell.
    ///
    /// Near-constant cells always go through [`uniform`]; the rejection
    /// envelope is never evaluated for them.
    pub fn sample_cell<S: CellSupport>(
        &self,
        sampler: &mut Sampler<'_, S>,
        layered: Option<&mut LayeredSampling<'_>>,
        n: usize,
        rng: &mut RandomSource,
        writer: &mut ParticleWriter<'_>,
    ) -> usize {
        if sampler.is_uniform(self.tiny) {
            return uniform(sampler, n, rng, writer);
        }
        match (self.method, layered) {
            (SamplingMethod::Uniform, _) => uniform(sampler, n, rng, writer),
            (SamplingMethod::Rejection, _) => rejection(sampler, n, rng, writer),
            (SamplingMethod::Metropolis, _) => metropolis(sampler, n, self.duplication, rng, writer),
            (SamplingMethod::Layered, Some(layered)) => layered.sample_cell(sampler, n, rng, writer),
            (SamplingMethod::Layered, None) => rejection(sampler, n, rng, writer),
        }
    }
}

pub fn uniform<S: CellSupport>(
    sampler: &mut Sampler<'_, S>,
    n: usize,
    rng: &mut RandomSource,
    writer: &mut ParticleWriter<'_>,
) -> usize {
    for _ in 0..n {
        sampler.sample(rng);
        writer.push(&sampler.accept());
    }
    n
}

/// Accepts a proposal with density `d` when `d / n > pmax · R`, `pmax = envelope / n`.
///
/// Retries are unbounded. A zero envelope means nothing could ever be
/// accepted, so the cell falls back to [`uniform`].
pub fn rejection<S: CellSupport>(
    sampler: &mut Sampler<'_, S>,
    n: usize,
    rng: &mut RandomSource,
    writer: &mut ParticleWriter<'_>,
) -> usize {
    let envelope = sampler.max_density();
    if envelope <= 0. {
        return uniform(sampler, n, rng, writer);
    }
    let inv_n = 1. / n as f32;
    let pmax = envelope * inv_n;
    let mut written = 0;
    while written < n {
        let density = sampler.sample(rng);
        if density * inv_n > pmax * rng.next() {
            writer.push(&sampler.accept());
            written += 1;
        }
    }
    written
}

pub fn metropolis<S: CellSupport>(
    sampler: &mut Sampler<'_, S>,
    n: usize,
    duplication: DuplicationPolicy,
    rng: &mut RandomSource,
    writer: &mut ParticleWriter<'_>,
) -> usize {
    let max_loops = 10 * n;
    let mut current = sampler.sample_with_retries(rng, max_loops);
    let mut written = 0;
    let mut rejected = 0;
    while written < n {
        let trial = sampler.try_sample(rng);
        // NaN when both densities are zero: rejected
        let ratio = trial / current;
        if ratio >= 1. || ratio >= rng.next() {
            current = trial;
            writer.push(&sampler.accept_trial());
            written += 1;
            continue;
        }
        match duplication {
            DuplicationPolicy::StopShort => {
                rejected += 1;
                if rejected > max_loops {
                    break;
                }
            }
            DuplicationPolicy::Duplicate => {
                writer.push(&sampler.accept());
                written += 1;
            }
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cell::Cell,
        density::DensityMap,
        transfer::{ColorMap, OpacityMap, ScalarRange},
        types::{Particle, Point, Value, Vector},
        volume::{CellType, ScalarArray, UnstructuredVolume},
    };

    // unit tetrahedron with f = z
    fn tet() -> UnstructuredVolume {
        UnstructuredVolume::new(
            CellType::Tetrahedra,
            vec![0., 0., 0., 1., 0., 0., 0., 1., 0., 0., 0., 1.],
            vec![0, 1, 2, 3],
            ScalarArray::F32(vec![0., 0., 0., 1.]),
        )
    }

    /// Runs `f` on a fresh sampler and writer sized for `n`; returns the
    /// count it reported and the particles it wrote.
    fn run(
        values: &[Value],
        omap: OpacityMap,
        n: usize,
        f: impl FnOnce(&mut Sampler<'_, Cell<'_>>, &mut RandomSource, &mut ParticleWriter<'_>) -> usize,
    ) -> (usize, Vec<Particle>) {
        let volume = tet();
        let range = ScalarRange::new(0., 1.).unwrap();
        let map = DensityMap::build(&omap, range, 1., 1.).unwrap();
        let color_map = ColorMap::default();
        let mut sampler = Sampler::new(Cell::new(&volume, values), &map);
        sampler.bind(0);
        let mut rng = RandomSource::new(77);
        let (mut coords, mut normals, mut colors) = (vec![0.; 3 * n], vec![0.; 3 * n], vec![0; 3 * n]);
        let mut writer = ParticleWriter::new(&mut coords, &mut normals, &mut colors, &color_map, &range);
        let count = f(&mut sampler, &mut rng, &mut writer);
        assert_eq!(count, writer.len());
        let particles = coords
            .chunks(3)
            .zip(normals.chunks(3))
            .take(count)
            .map(|(c, nrm)| Particle {
                position: Point::from_slice(c),
                normal: Vector::from_column_slice(nrm),
                scalar: c[2],
            })
            .collect();
        (count, particles)
    }

    fn inside_tet(p: &Particle) -> bool {
        let q = p.position;
        q.x >= 0. && q.y >= 0. && q.z >= 0. && q.x + q.y + q.z <= 1. + 1e-5
    }

    #[test]
    fn uniform_writes_exactly_n_inside_the_cell() {
        let (count, particles) = run(&[0., 0., 0., 1.], OpacityMap::default(), 500, |s, r, w| {
            uniform(s, 500, r, w)
        });
        assert_eq!(count, 500);
        assert!(particles.iter().all(inside_tet));
    }

    #[test]
    fn rejection_skips_transparent_region() {
        // zero density for scalars up to 0.5
        let omap = OpacityMap::new(vec![0., 0., 0.8]).unwrap();
        let (count, particles) = run(&[0., 0., 0., 1.], omap, 200, |s, r, w| rejection(s, 200, r, w));
        assert_eq!(count, 200);
        assert!(particles.iter().all(|p| inside_tet(p) && p.position.z > 0.5));
    }

    #[test]
    fn rejection_with_zero_envelope_falls_back_to_uniform() {
        let (count, _) = run(&[0., 0., 0., 1.], OpacityMap::constant(8, 0.), 50, |s, r, w| {
            rejection(s, 50, r, w)
        });
        assert_eq!(count, 50);
    }

    #[test]
    fn metropolis_policies() {
        let omap = OpacityMap::new(vec![0., 0., 0.8]).unwrap();
        let (count, particles) = run(&[0., 0., 0., 1.], omap.clone(), 300, |s, r, w| {
            metropolis(s, 300, DuplicationPolicy::Duplicate, r, w)
        });
        assert_eq!(count, 300);
        assert!(particles.iter().all(inside_tet));

        let (count, _) = run(&[0., 0., 0., 1.], omap, 300, |s, r, w| {
            metropolis(s, 300, DuplicationPolicy::StopShort, r, w)
        });
        assert!(count > 0);
    }

    #[test]
    fn metropolis_follows_the_density() {
        // zero density for scalars up to 0.5
        let omap = OpacityMap::new(vec![0., 0., 0.8]).unwrap();
        let (count, particles) = run(&[0., 0., 0., 1.], omap, 300, |s, r, w| {
            metropolis(s, 300, DuplicationPolicy::Duplicate, r, w)
        });
        assert_eq!(count, 300);
        assert!(particles.iter().all(|p| p.position.z > 0.5));
        let mean_z = particles.iter().map(|p| p.position.z).sum::<Value>() / count as Value;
        assert!(mean_z > 0.5, "mean z {mean_z}");
    }

    #[test]
    fn metropolis_stops_short_on_nearly_transparent_cells() {
        // opaque only in the top slot, a sliver at the apex
        let mut opacities = vec![0.; 100];
        opacities[99] = 0.9;
        let omap = OpacityMap::new(opacities).unwrap();
        let n = 50;
        let (count, _) = run(&[0., 0., 0., 1.], omap.clone(), n, |s, r, w| {
            metropolis(s, n, DuplicationPolicy::StopShort, r, w)
        });
        assert!(count < n, "wrote {count} of {n}");

        let (count, _) = run(&[0., 0., 0., 1.], omap, n, |s, r, w| {
            metropolis(s, n, DuplicationPolicy::Duplicate, r, w)
        });
        assert_eq!(count, n);
    }

    #[test]
    fn constant_cells_take_the_uniform_path() {
        let strategy = Strategy {
            method: SamplingMethod::Rejection,
            duplication: DuplicationPolicy::StopShort,
            tiny: 1. / 256.,
        };
        // rejection would draw an extra acceptance number per proposal and
        // diverge from the uniform sequence
        let values = [0.5; 4];
        let (count, sampled) = run(&values, OpacityMap::default(), 40, |s, r, w| {
            strategy.sample_cell(s, None, 40, r, w)
        });
        let (_, expected) = run(&values, OpacityMap::default(), 40, |s, r, w| uniform(s, 40, r, w));
        assert_eq!(count, 40);
        assert!(sampled.iter().all(inside_tet));
        assert_eq!(sampled, expected);

        let (_, rejected) = run(&values, OpacityMap::default(), 40, |s, r, w| rejection(s, 40, r, w));
        assert_ne!(rejected, expected);
    }
}
