use cell_particles::{
    CellType, ColorMap, DuplicationPolicy, GeneratorConfig, OpacityMap, ParticleBuffer,
    ParticleGenerator, PixelLength, SamplingError, SamplingMethod, ScalarArray, ScalarRange,
    StructuredVolume, TransferFunction, UnstructuredVolume, Volume, generate,
};
use proptest::prelude::*;

// f = x + y + z on an n³ node grid
fn ramp_grid(n: usize) -> Volume {
    let mut values = Vec::with_capacity(n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                values.push((x + y + z) as f32);
            }
        }
    }
    StructuredVolume::new([n, n, n], ScalarArray::F32(values)).into()
}

// cube [0, size]³ split into six tetrahedra around its main diagonal, f = x + y + z
fn tetrahedral_cube(size: f32) -> Volume {
    let mut coords = Vec::new();
    let mut values = Vec::new();
    for corner in 0..8u32 {
        let p = [corner & 1, (corner >> 1) & 1, (corner >> 2) & 1].map(|b| b as f32 * size);
        coords.extend(p);
        values.push(p.iter().sum::<f32>());
    }
    let mut connections = Vec::new();
    for [a, b, _] in [[1, 2, 4], [1, 4, 2], [2, 1, 4], [2, 4, 1], [4, 1, 2], [4, 2, 1]] {
        connections.extend([0, a, a | b, 7]);
    }
    UnstructuredVolume::new(CellType::Tetrahedra, coords, connections, ScalarArray::F32(values)).into()
}

fn single_tetrahedron(values: [f32; 4]) -> Volume {
    UnstructuredVolume::new(
        CellType::Tetrahedra,
        vec![0., 0., 0., 6., 0., 0., 0., 6., 0., 0., 0., 6.],
        vec![0, 1, 2, 3],
        ScalarArray::F32(values.to_vec()),
    )
    .into()
}

// fixed object-space pixel lengths
const HALF: Option<&dyn PixelLength> = Some(&0.5_f32);
const UNIT: Option<&dyn PixelLength> = Some(&1.0_f32);

fn run(volume: &Volume, config: GeneratorConfig, tf: &TransferFunction) -> ParticleBuffer {
    ParticleGenerator::new(config)
        .generate(Some(volume), tf, HALF)
        .unwrap()
}

#[test]
fn constant_tetrahedron_gets_expected_count_inside_the_cell() {
    let volume = single_tetrahedron([1.; 4]);
    let tf = TransferFunction::new(OpacityMap::constant(256, 0.5), ColorMap::default());
    // volume 36, density ln 2 → 24.95 expected particles
    let buffer = generate(Some(&volume), 1., &tf, 1, UNIT).unwrap();
    assert!(buffer.len() == 24 || buffer.len() == 25, "len {}", buffer.len());
    for i in 0..buffer.len() {
        let p = buffer.position(i);
        assert!(p.x >= 0. && p.y >= 0. && p.z >= 0.);
        assert!(p.x + p.y + p.z <= 6. + 1e-4);
        assert_eq!(buffer.normal(i).norm(), 0.);
    }
}

#[test]
fn repetitions_multiply_the_count() {
    let volume = ramp_grid(6);
    let tf = TransferFunction::default();
    let config = GeneratorConfig::default()
        .with_method(SamplingMethod::Rejection)
        .with_seed(3);
    let one = run(&volume, config.clone(), &tf);
    let three = run(&volume, config.with_repetition_level(3), &tf);
    assert!(!one.is_empty());
    assert_eq!(three.len(), 3 * one.len());
    assert_eq!(three.repetitions(), 3);
}

#[test]
fn same_seed_same_buffer_for_any_thread_count() {
    let volume = ramp_grid(6);
    let tf = TransferFunction::default();
    for method in [SamplingMethod::Rejection, SamplingMethod::Metropolis] {
        let config = GeneratorConfig::default()
            .with_method(method)
            .with_repetition_level(2)
            .with_seed(11);
        let a = run(&volume, config.clone().with_num_threads(1), &tf);
        let b = run(&volume, config.clone().with_num_threads(4), &tf);
        let c = run(&volume, config.clone(), &tf);
        assert_eq!(a, b);
        assert_eq!(a, c);

        let other = run(&volume, config.with_seed(12), &tf);
        assert_ne!(a, other);
    }
}

#[test]
fn duplicating_metropolis_fills_every_slot() {
    let volume = ramp_grid(5);
    let tf = TransferFunction::default();
    let base = GeneratorConfig::default().with_seed(5);
    let rejection = run(&volume, base.clone().with_method(SamplingMethod::Rejection), &tf);
    let duplicate = run(
        &volume,
        base.clone().with_duplication(DuplicationPolicy::Duplicate),
        &tf,
    );
    let stop_short = run(&volume, base, &tf);
    // counting uses the same streams whatever the method
    assert_eq!(duplicate.len(), rejection.len());
    assert!(stop_short.len() <= rejection.len());
}

#[test]
fn stopped_short_repetitions_are_packed_together() {
    // f = z / 6; only scalars near 0.25, the cell average, are visible
    let volume = single_tetrahedron([0., 0., 0., 1.]);
    let mut opacities = vec![0.; 101];
    opacities[25] = 0.9;
    let tf = TransferFunction::new(OpacityMap::new(opacities).unwrap(), ColorMap::default());
    let base = GeneratorConfig::default().with_repetition_level(3).with_seed(21);
    let duplicate = run(
        &volume,
        base.clone().with_duplication(DuplicationPolicy::Duplicate),
        &tf,
    );
    let stop_short = run(&volume, base, &tf);

    assert_eq!(duplicate.len() % 3, 0);
    assert!(!stop_short.is_empty());
    assert!(
        stop_short.len() < duplicate.len(),
        "{} of {}",
        stop_short.len(),
        duplicate.len()
    );
    assert_eq!(stop_short.coords().len(), 3 * stop_short.len());
    // unwritten slots would still hold zero normals
    for i in 0..stop_short.len() {
        let n = stop_short.normal(i);
        assert!((n - nalgebra::Vector3::new(0., 0., -1. / 6.)).norm() < 1e-5);
    }
}

#[test]
fn particles_stay_inside_the_grid_and_carry_colors() {
    let volume = ramp_grid(6);
    let tf = TransferFunction::new(OpacityMap::linear(256), ColorMap::grayscale(256));
    let buffer = run(&volume, GeneratorConfig::default(), &tf);
    assert!(!buffer.is_empty());
    assert_eq!(buffer.coords().len(), 3 * buffer.len());
    assert_eq!(buffer.colors().len(), 3 * buffer.len());
    for i in 0..buffer.len() {
        let p = buffer.position(i);
        assert!([p.x, p.y, p.z].iter().all(|c| (0. ..=5.).contains(c)));
        // f = x + y + z, so the gray level follows the position
        let expected = (255. * (p.x + p.y + p.z) / 15.).round();
        assert!((buffer.color(i)[0] as f32 - expected).abs() <= 1.5);
        // normal = -gradient = -(1, 1, 1) in index space
        assert!((buffer.normal(i) + nalgebra::Vector3::new(1., 1., 1.)).norm() < 1e-3);
    }
}

#[test]
fn layered_sampling_on_tetrahedra() {
    let volume = tetrahedral_cube(4.);
    let tf = TransferFunction::default();
    let config = GeneratorConfig::default()
        .with_method(SamplingMethod::Layered)
        .with_pool_size(100_000);
    let buffer = run(&volume, config.clone(), &tf);
    assert!(!buffer.is_empty());
    for i in 0..buffer.len() {
        let p = buffer.position(i);
        assert!([p.x, p.y, p.z].iter().all(|c| (-1e-3..=4. + 1e-3).contains(c)));
    }
    // same inputs, same output
    assert_eq!(buffer, run(&volume, config, &tf));
}

#[test]
fn small_layered_pool_still_fills_every_cell() {
    let volume = tetrahedral_cube(4.);
    let tf = TransferFunction::default();
    let base = GeneratorConfig::default().with_seed(8);
    let layered = run(
        &volume,
        base.clone().with_method(SamplingMethod::Layered).with_pool_size(50),
        &tf,
    );
    let rejection = run(&volume, base.with_method(SamplingMethod::Rejection), &tf);
    // counting is the same for every method
    assert_eq!(layered.len(), rejection.len());
    for i in 0..layered.len() {
        let p = layered.position(i);
        assert!([p.x, p.y, p.z].iter().all(|c| (-1e-3..=4. + 1e-3).contains(c)));
        assert!(layered.normal(i).norm() > 0.);
    }
}

#[test]
fn overflowing_particle_counts_are_rejected() {
    let volume = single_tetrahedron([1.; 4]);
    let tf = TransferFunction::new(OpacityMap::constant(256, 0.5), ColorMap::default());
    let tiny: &dyn PixelLength = &1e-12_f32;
    assert!(matches!(
        ParticleGenerator::default().generate(Some(&volume), &tf, Some(tiny)),
        Err(SamplingError::InvalidParameter("particle count"))
    ));
}

#[test]
fn every_cell_type_generates() {
    let tf = TransferFunction::new(OpacityMap::constant(16, 0.3), ColorMap::default());
    let cube = |scale: f32| -> Vec<f32> {
        [[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 0.], [0., 0., 1.], [1., 0., 1.], [1., 1., 1.], [0., 1., 1.]]
            .iter()
            .flatten()
            .map(|c| c * scale)
            .collect()
    };
    let mut meshes = vec![
        (CellType::Hexahedra, cube(3.)),
        (
            CellType::Prism,
            vec![0., 0., 0., 3., 0., 0., 0., 3., 0., 0., 0., 3., 3., 0., 3., 0., 3., 3.],
        ),
        (
            CellType::Pyramid,
            vec![0., 0., 0., 3., 0., 0., 3., 3., 0., 0., 3., 0., 1.5, 1.5, 3.],
        ),
    ];
    // quadratic cells: corners plus straight edge midpoints
    let tet_corners: [[f32; 3]; 4] = [[0., 0., 0.], [3., 0., 0.], [0., 3., 0.], [0., 0., 3.]];
    let tet_edges: [[usize; 2]; 6] = [[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]];
    let hex = cube(3.);
    let hex_corners: Vec<[f32; 3]> = hex.chunks(3).map(|c| [c[0], c[1], c[2]]).collect();
    let hex_edges: [[usize; 2]; 12] = [
        [0, 1], [1, 2], [2, 3], [3, 0], [4, 5], [5, 6], [6, 7], [7, 4], [0, 4], [1, 5], [2, 6], [3, 7],
    ];
    let with_midpoints = |corners: &[[f32; 3]], edges: &[[usize; 2]]| -> Vec<f32> {
        let mut nodes: Vec<f32> = corners.iter().flatten().copied().collect();
        for &[a, b] in edges {
            nodes.extend((0..3).map(|k| 0.5 * (corners[a][k] + corners[b][k])));
        }
        nodes
    };
    meshes.push((CellType::QuadraticTetrahedra, with_midpoints(&tet_corners, &tet_edges)));
    meshes.push((CellType::QuadraticHexahedra, with_midpoints(&hex_corners, &hex_edges)));

    for (cell_type, coords) in meshes {
        let n = cell_type.node_count();
        assert_eq!(coords.len(), 3 * n);
        // constant scalars: the count follows density × volume exactly in expectation
        let volume: Volume = UnstructuredVolume::new(
            cell_type,
            coords,
            (0..n as u32).collect(),
            ScalarArray::F32(vec![2.; n]),
        )
        .into();
        let buffer = run(&volume, GeneratorConfig::default(), &tf);
        assert!(!buffer.is_empty(), "{cell_type:?}");
        let bounds = volume.bounds();
        for i in 0..buffer.len() {
            let p = buffer.position(i);
            assert!(
                (0..3).all(|k| p[k] >= bounds.min[k] - 1e-3 && p[k] <= bounds.max[k] + 1e-3),
                "{cell_type:?} particle {p} outside"
            );
        }
    }
}

#[test]
fn integer_storage_uses_type_range() {
    let values: Vec<u8> = (0..27).map(|i| (i * 9) as u8).collect();
    let volume: Volume = StructuredVolume::new([3, 3, 3], ScalarArray::U8(values)).into();
    let tf = TransferFunction::default();
    let pinned = tf.clone().with_range(ScalarRange::new(0., 255.).unwrap());
    let config = GeneratorConfig::default().with_seed(1);
    assert_eq!(run(&volume, config.clone(), &tf), run(&volume, config, &pinned));
}

#[test]
fn invalid_inputs_are_rejected() {
    let tf = TransferFunction::default();
    let generator = ParticleGenerator::default();

    let wide: Volume = StructuredVolume::new([2, 2, 2], ScalarArray::I64(vec![0; 8])).into();
    assert!(matches!(
        generator.generate(Some(&wide), &tf, None),
        Err(SamplingError::UnsupportedScalarType("i64"))
    ));

    let mut vectors = StructuredVolume::new([2, 2, 2], ScalarArray::F32(vec![0.; 24]));
    vectors.veclen = 3;
    assert!(matches!(
        generator.generate(Some(&vectors.into()), &tf, None),
        Err(SamplingError::UnsupportedVectorLength(3))
    ));

    let broken: Volume = UnstructuredVolume::new(
        CellType::Tetrahedra,
        vec![0.; 9],
        vec![0, 1, 2, 3],
        ScalarArray::F32(vec![0.; 3]),
    )
    .into();
    assert!(matches!(
        generator.generate(Some(&broken), &tf, None),
        Err(SamplingError::InvalidConnectivity(_))
    ));

    let hexes: Volume = UnstructuredVolume::new(
        CellType::Hexahedra,
        vec![0.; 24],
        (0..8).collect(),
        ScalarArray::F32(vec![0.; 8]),
    )
    .into();
    let layered = ParticleGenerator::new(GeneratorConfig::default().with_method(SamplingMethod::Layered));
    assert!(matches!(
        layered.generate(Some(&hexes), &tf, None),
        Err(SamplingError::UnsupportedCellType { .. })
    ));

    let grid = ramp_grid(3);
    assert!(matches!(
        generator.generate(Some(&grid), &tf, Some(&0.0_f32)),
        Err(SamplingError::InvalidParameter("pixel length"))
    ));
    assert!(matches!(
        generate(Some(&grid), 1., &tf, 0, None),
        Err(SamplingError::InvalidParameter("repetition level"))
    ));
}

#[test]
fn empty_mesh_gives_empty_buffer() {
    let volume: Volume = UnstructuredVolume::new(
        CellType::Tetrahedra,
        vec![],
        vec![],
        ScalarArray::F32(vec![]),
    )
    .into();
    let buffer = run(&volume, GeneratorConfig::default(), &TransferFunction::default());
    assert!(buffer.is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn uniform_particles_have_valid_barycentric_coordinates(
        value in -10.0f32..10.0,
        seed in any::<u64>(),
    ) {
        let volume = single_tetrahedron([value; 4]);
        let tf = TransferFunction::new(OpacityMap::constant(256, 0.2), ColorMap::default());
        let config = GeneratorConfig::default().with_seed(seed);
        let buffer = ParticleGenerator::new(config).generate(Some(&volume), &tf, UNIT).unwrap();
        for i in 0..buffer.len() {
            let p = buffer.position(i);
            let lambda = [1. - (p.x + p.y + p.z) / 6., p.x / 6., p.y / 6., p.z / 6.];
            prop_assert!(lambda.iter().all(|&l| l >= -1e-5));
            prop_assert!((lambda.iter().sum::<f32>() - 1.).abs() < 1e-5);
        }
    }
}
