use cell_particles::{
    Camera, ColorMap, GeneratorConfig, OpacityMap, ParticleGenerator, SamplingMethod, ScalarArray,
    StructuredVolume, TransferFunction, Volume,
};

fn main() {
    env_logger::init();
    log::info!("Grid Example");

    // Distance from the center of a 33³ grid, stored as bytes
    let n = 33;
    let center = (n - 1) as f32 / 2.;
    let mut values = Vec::with_capacity(n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let distance = (x as f32 - center)
                    .hypot(y as f32 - center)
                    .hypot(z as f32 - center);
                values.push((255. - 12. * distance).clamp(0., 255.) as u8);
            }
        }
    }
    let volume: Volume = StructuredVolume::new([n, n, n], ScalarArray::U8(values)).into();

    // Transparent shell, opaque core
    let opacities = (0..256)
        .map(|i| if i < 128 { 0. } else { (i - 128) as f32 / 127. * 0.5 })
        .collect();
    let transfer_function = TransferFunction::new(
        OpacityMap::new(opacities).expect("256 entries"),
        ColorMap::rainbow(256),
    );

    for method in [SamplingMethod::Uniform, SamplingMethod::Rejection, SamplingMethod::Metropolis] {
        let generator = ParticleGenerator::new(
            GeneratorConfig::default()
                .with_method(method)
                .with_repetition_level(4),
        );
        let camera = Camera::default().with_window_size(256, 256);
        match generator.generate(Some(&volume), &transfer_function, Some(&camera)) {
            Ok(buffer) => log::info!("{}: {} particles", method.name(), buffer.len()),
            Err(e) => log::error!("{}: {e}", method.name()),
        }
    }
}
