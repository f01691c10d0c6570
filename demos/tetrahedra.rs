use std::time::Instant;

use cell_particles::{
    CellType, GeneratorConfig, ParticleGenerator, SamplingMethod, ScalarArray, TransferFunction,
    UnstructuredVolume, Volume,
};

/// Splits an `n³` block of unit cubes into six tetrahedra each.
fn tetrahedral_block(n: u32) -> UnstructuredVolume {
    let nodes = n + 1;
    let index = |x: u32, y: u32, z: u32| x + nodes * (y + nodes * z);

    let mut coords = Vec::new();
    let mut values = Vec::new();
    for z in 0..nodes {
        for y in 0..nodes {
            for x in 0..nodes {
                let p = [x, y, z].map(|c| c as f32);
                coords.extend(p);
                // Saddle, so neighbouring cells have different gradients
                values.push((p[0] - 0.5 * n as f32) * (p[1] - 0.5 * n as f32) + p[2]);
            }
        }
    }

    let mut connections = Vec::new();
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let corner = |bits: u32| index(x + (bits & 1), y + ((bits >> 1) & 1), z + (bits >> 2));
                for [a, b] in [[1, 2], [1, 4], [2, 1], [2, 4], [4, 1], [4, 2]] {
                    connections.extend([corner(0), corner(a), corner(a | b), corner(7)]);
                }
            }
        }
    }

    UnstructuredVolume::new(CellType::Tetrahedra, coords, connections, ScalarArray::F32(values))
}

fn main() {
    env_logger::init();
    log::info!("Tetrahedra Example");

    let volume: Volume = tetrahedral_block(16).into();
    log::info!("{} tetrahedra", volume.number_of_cells());
    let transfer_function = TransferFunction::default();

    for method in [SamplingMethod::Metropolis, SamplingMethod::Rejection, SamplingMethod::Layered] {
        let generator = ParticleGenerator::new(
            GeneratorConfig::default()
                .with_method(method)
                .with_sampling_step(0.25),
        );
        let start = Instant::now();
        match generator.generate(Some(&volume), &transfer_function, None) {
            Ok(buffer) => log::info!(
                "{}: {} particles in {:.1?}",
                method.name(),
                buffer.len(),
                start.elapsed()
            ),
            Err(e) => log::error!("{}: {e}", method.name()),
        }
    }
}
