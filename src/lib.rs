pub mod buffer;
pub mod camera;
pub mod cell;
pub mod config;
pub mod density;
pub mod error;
pub mod generator;
pub mod interp;
pub mod layered;
pub mod random;
pub mod sampler;
pub mod strategy;
pub mod transfer;
pub mod types;
pub mod volume;

pub use buffer::ParticleBuffer;
pub use camera::{Camera, PixelLength};
pub use config::{DuplicationPolicy, GeneratorConfig, SamplingMethod};
pub use error::{Result, SamplingError};
pub use generator::{GenerationStage, ParticleGenerator, generate};
pub use transfer::{ColorMap, OpacityMap, ScalarRange, TransferFunction};
pub use volume::{CellType, ScalarArray, StructuredVolume, UnstructuredVolume, Volume};
