use ndarray::ArrayView3;

use crate::{
    cell::{
        CellSupport,
        shape::{ShapeFunctions, random_local_point},
    },
    error::{Result, SamplingError},
    random::RandomSource,
    types::{Point, Value, Vector},
    volume::{CellType, StructuredVolume},
};

/// One voxel of a [`StructuredVolume`], trilinearly interpolated.
///
/// Voxels live in index space: voxel `(x, y, z)` spans `[x, x + 1] × [y, y + 1] × [z, z + 1]`
/// and has volume 1. Corners follow the hexahedron ordering:
///
/// ```text
///     7----6
///    /|   /|      Z  Y
///   4----5 |      | /
///   | 3--|-2      *-- X
///   |/   |/
///   0----1
/// ```
#[derive(Debug, Clone)]
pub struct Voxel<'a> {
    /// Node values, indexed `[z, y, x]`.
    values: ArrayView3<'a, Value>,
    dims: [usize; 3],
    origin: [usize; 3],
    node_values: [Value; 8],
    shape: ShapeFunctions,
}

const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

impl<'a> Voxel<'a> {
    /// `values` are the grid's node values converted to [`Value`]s, x-fastest.
    pub fn new(volume: &StructuredVolume, values: &'a [Value]) -> Result<Self> {
        let [nx, ny, nz] = volume.resolution;
        let values = ArrayView3::from_shape((nz, ny, nx), values)
            .map_err(|e| SamplingError::InvalidConnectivity(e.to_string()))?;
        Ok(Self {
            values,
            dims: volume.voxel_dims(),
            origin: [0; 3],
            node_values: [0.; 8],
            shape: ShapeFunctions::default(),
        })
    }

    /// Grid index of the bound voxel's lowest corner.
    pub fn origin(&self) -> [usize; 3] {
        self.origin
    }
}

impl CellSupport for Voxel<'_> {
    fn number_of_cells(&self) -> usize {
        self.dims.iter().product()
    }

    fn bind(&mut self, index: usize) {
        let [dx, dy, _] = self.dims;
        let (x, y, z) = (index % dx, (index / dx) % dy, index / (dx * dy));
        self.origin = [x, y, z];
        for (i, [cx, cy, cz]) in CORNERS.iter().enumerate() {
            self.node_values[i] = self.values[[z + cz, y + cy, x + cx]];
        }
        self.shape.evaluate(CellType::Hexahedra, &Vector::zeros());
    }

    fn node_values(&self) -> &[Value] {
        &self.node_values
    }

    fn volume(&self) -> Value {
        1.
    }

    fn set_random_point(&mut self, rng: &mut RandomSource) -> Point {
        let local = random_local_point(CellType::Hexahedra, rng);
        self.shape.evaluate(CellType::Hexahedra, &local);
        let [x, y, z] = self.origin.map(|c| c as Value);
        Point::new(x, y, z) + local
    }

    fn scalar(&self) -> Value {
        self.node_values
            .iter()
            .zip(&self.shape.n)
            .map(|(&v, &n)| v * n)
            .sum()
    }

    // index space: the Jacobian is the identity
    fn gradient(&self) -> Vector {
        self.node_values
            .iter()
            .zip(&self.shape.dn)
            .fold(Vector::zeros(), |acc, (&v, dn)| acc + dn * v)
    }
}
