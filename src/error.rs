use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, SamplingError>;

/// Errors that abort a whole generation run.
///
/// Every variant is reported before any particle buffer is allocated. Degenerate
/// cells (zero volume, zero density) are not errors; they simply produce no particles.
#[derive(Debug, Display, From)]
pub enum SamplingError {
    /// No volume was supplied.
    #[display("input volume is missing")]
    #[from(ignore)]
    NullVolume,

    /// The volume stores its node values in a type the samplers can't read.
    #[display("unsupported scalar storage type '{_0}'")]
    #[from(ignore)]
    UnsupportedScalarType(&'static str),

    /// Only scalar fields (one value per node) can be sampled.
    #[display("unsupported vector length {_0}, expected a scalar field")]
    #[from(ignore)]
    UnsupportedVectorLength(usize),

    /// The sampling method can't handle the volume's cell type.
    #[display("{method} sampling does not support {cell_type} volumes")]
    #[from(ignore)]
    UnsupportedCellType {
        method: &'static str,
        cell_type: &'static str,
    },

    /// Connection, coordinate and value arrays disagree with each other.
    #[display("invalid connectivity: {_0}")]
    #[from(ignore)]
    InvalidConnectivity(String),

    /// A scalar range with `min > max` or non-finite bounds.
    #[display("invalid scalar range [{min}, {max}]")]
    #[from(ignore)]
    InvalidRange { min: f32, max: f32 },

    /// A lookup table with fewer than two entries.
    #[display("lookup table needs at least 2 entries, got {_0}")]
    #[from(ignore)]
    InvalidTable(usize),

    /// A configuration or camera parameter that is zero, negative or not finite.
    #[display("invalid parameter: {_0}")]
    #[from(ignore)]
    InvalidParameter(&'static str),

    /// The dedicated worker pool requested by the configuration couldn't be built.
    #[display("failed to build worker pool: {_0}")]
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl std::error::Error for SamplingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = SamplingError::UnsupportedCellType {
            method: "layered",
            cell_type: "hexahedra",
        };
        assert_eq!(
            err.to_string(),
            "layered sampling does not support hexahedra volumes"
        );
        assert_eq!(
            SamplingError::InvalidTable(1).to_string(),
            "lookup table needs at least 2 entries, got 1"
        );
    }
}
