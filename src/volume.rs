use std::borrow::Cow;

use crate::{
    error::{Result, SamplingError},
    interp::min_max,
    transfer::ScalarRange,
    types::{Bounds, Point, Value},
};

/// Node values in their original storage type.
///
/// Everything up to 32 bits plus `f64` is converted to [`Value`] once per
/// generation run; 64-bit integer storage is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarArray {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl ScalarArray {
    pub fn len(&self) -> usize {
        match self {
            Self::I8(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::U64(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::I8(_) => "i8",
            Self::U8(_) => "u8",
            Self::I16(_) => "i16",
            Self::U16(_) => "u16",
            Self::I32(_) => "i32",
            Self::U32(_) => "u32",
            Self::I64(_) => "i64",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
        }
    }

    /// Node values as [`Value`]s; borrows when the storage already is `f32`.
    ///
    /// Returns [`SamplingError::UnsupportedScalarType`] for 64-bit integer storage.
    pub fn to_values(&self) -> Result<Cow<'_, [Value]>> {
        fn convert<T: Copy>(v: &[T], f: impl Fn(T) -> Value) -> Cow<'static, [Value]> {
            Cow::Owned(v.iter().map(|&x| f(x)).collect())
        }
        Ok(match self {
            Self::F32(v) => Cow::Borrowed(v.as_slice()),
            Self::I8(v) => convert(v, Value::from),
            Self::U8(v) => convert(v, Value::from),
            Self::I16(v) => convert(v, Value::from),
            Self::U16(v) => convert(v, Value::from),
            Self::I32(v) => convert(v, |x| x as Value),
            Self::U32(v) => convert(v, |x| x as Value),
            Self::F64(v) => convert(v, |x| x as Value),
            Self::I64(_) | Self::U64(_) => {
                return Err(SamplingError::UnsupportedScalarType(self.type_name()));
            }
        })
    }
}

/// Cell types of an unstructured volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Tetrahedra,
    QuadraticTetrahedra,
    Hexahedra,
    QuadraticHexahedra,
    Pyramid,
    Prism,
}

impl CellType {
    /// Fixed number of nodes per cell.
    pub const fn node_count(self) -> usize {
        match self {
            Self::Tetrahedra => 4,
            Self::QuadraticTetrahedra => 10,
            Self::Hexahedra => 8,
            Self::QuadraticHexahedra => 20,
            Self::Pyramid => 5,
            Self::Prism => 6,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Tetrahedra => "tetrahedra",
            Self::QuadraticTetrahedra => "quadratic tetrahedra",
            Self::Hexahedra => "hexahedra",
            Self::QuadraticHexahedra => "quadratic hexahedra",
            Self::Pyramid => "pyramid",
            Self::Prism => "prism",
        }
    }
}

/// Regular grid of nodes in index space.
///
/// Node `(x, y, z)` sits at object coordinate `(x, y, z)`; values are stored
/// x-fastest, i.e. flat index `x + nx * (y + ny * z)`, matching `[z][y][x]`
/// array order. The grid has `(nx - 1) × (ny - 1) × (nz - 1)` voxels.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredVolume {
    /// Number of nodes along X, Y and Z.
    pub resolution: [usize; 3],
    /// Components per node; only `1` (scalar fields) can be sampled.
    pub veclen: usize,
    pub values: ScalarArray,
}

impl StructuredVolume {
    pub fn new(resolution: [usize; 3], values: ScalarArray) -> Self {
        Self {
            resolution,
            veclen: 1,
            values,
        }
    }

    /// Voxel counts along X, Y and Z.
    pub fn voxel_dims(&self) -> [usize; 3] {
        self.resolution.map(|n| n.saturating_sub(1))
    }

    pub fn number_of_voxels(&self) -> usize {
        self.voxel_dims().iter().product()
    }

    pub fn number_of_nodes(&self) -> usize {
        self.resolution.iter().product()
    }

    fn validate(&self) -> Result<()> {
        if self.resolution.iter().any(|&n| n < 2) {
            return Err(SamplingError::InvalidConnectivity(format!(
                "grid resolution {:?} has an axis with fewer than 2 nodes",
                self.resolution
            )));
        }
        if self.values.len() != self.number_of_nodes() * self.veclen {
            return Err(SamplingError::InvalidConnectivity(format!(
                "{} values for {} grid nodes",
                self.values.len(),
                self.number_of_nodes()
            )));
        }
        Ok(())
    }
}

/// Mesh of cells sharing one [`CellType`].
#[derive(Debug, Clone, PartialEq)]
pub struct UnstructuredVolume {
    pub cell_type: CellType,
    /// Node coordinates, three per node.
    pub coords: Vec<Value>,
    /// Node indices, `cell_type.node_count()` per cell.
    pub connections: Vec<u32>,
    /// Components per node; only `1` (scalar fields) can be sampled.
    pub veclen: usize,
    pub values: ScalarArray,
}

impl UnstructuredVolume {
    pub fn new(
        cell_type: CellType,
        coords: Vec<Value>,
        connections: Vec<u32>,
        values: ScalarArray,
    ) -> Self {
        Self {
            cell_type,
            coords,
            connections,
            veclen: 1,
            values,
        }
    }

    pub fn number_of_nodes(&self) -> usize {
        self.coords.len() / 3
    }

    pub fn number_of_cells(&self) -> usize {
        self.connections.len() / self.cell_type.node_count()
    }

    /// Node indices of cell `index`.
    #[inline]
    pub fn cell_connections(&self, index: usize) -> &[u32] {
        let n = self.cell_type.node_count();
        &self.connections[n * index..n * (index + 1)]
    }

    #[inline]
    pub fn node_coord(&self, node: usize) -> Point {
        Point::new(
            self.coords[3 * node],
            self.coords[3 * node + 1],
            self.coords[3 * node + 2],
        )
    }

    fn validate(&self) -> Result<()> {
        let nnodes = self.number_of_nodes();
        if self.coords.len() % 3 != 0 {
            return Err(SamplingError::InvalidConnectivity(format!(
                "{} coordinate components is not a multiple of 3",
                self.coords.len()
            )));
        }
        if self.connections.len() % self.cell_type.node_count() != 0 {
            return Err(SamplingError::InvalidConnectivity(format!(
                "{} connections is not a multiple of {} nodes per cell",
                self.connections.len(),
                self.cell_type.node_count()
            )));
        }
        if self.values.len() != nnodes * self.veclen {
            return Err(SamplingError::InvalidConnectivity(format!(
                "{} values for {nnodes} nodes",
                self.values.len()
            )));
        }
        if let Some(&bad) = self.connections.iter().find(|&&c| c as usize >= nnodes) {
            return Err(SamplingError::InvalidConnectivity(format!(
                "node index {bad} out of range for {nnodes} nodes"
            )));
        }
        Ok(())
    }
}

/// Input volume handed to the particle generator.
#[derive(Debug, Clone, PartialEq)]
pub enum Volume {
    Structured(StructuredVolume),
    Unstructured(UnstructuredVolume),
}

impl From<StructuredVolume> for Volume {
    fn from(v: StructuredVolume) -> Self {
        Self::Structured(v)
    }
}

impl From<UnstructuredVolume> for Volume {
    fn from(v: UnstructuredVolume) -> Self {
        Self::Unstructured(v)
    }
}

impl Volume {
    /// Voxels of a grid, cells of a mesh.
    pub fn number_of_cells(&self) -> usize {
        match self {
            Self::Structured(v) => v.number_of_voxels(),
            Self::Unstructured(v) => v.number_of_cells(),
        }
    }

    pub fn values(&self) -> &ScalarArray {
        match self {
            Self::Structured(v) => &v.values,
            Self::Unstructured(v) => &v.values,
        }
    }

    fn veclen(&self) -> usize {
        match self {
            Self::Structured(v) => v.veclen,
            Self::Unstructured(v) => v.veclen,
        }
    }

    /// Human readable kind of cell, used in error messages.
    pub fn cell_type_name(&self) -> &'static str {
        match self {
            Self::Structured(_) => "structured grid",
            Self::Unstructured(v) => v.cell_type.name(),
        }
    }

    /// Object-space bounding box.
    pub fn bounds(&self) -> Bounds {
        match self {
            Self::Structured(v) => {
                let [nx, ny, nz] = v.resolution.map(|n| n.saturating_sub(1) as Value);
                Bounds {
                    min: Point::origin(),
                    max: Point::new(nx, ny, nz),
                }
            }
            Self::Unstructured(v) => {
                Bounds::from_points((0..v.number_of_nodes()).map(|i| v.node_coord(i)))
            }
        }
    }

    /// Checks storage type, vector length and array sizes.
    ///
    /// Everything the samplers index into is verified here, so binding a
    /// cell never fails once generation has started.
    pub fn validate(&self) -> Result<()> {
        if self.veclen() != 1 {
            return Err(SamplingError::UnsupportedVectorLength(self.veclen()));
        }
        if matches!(self.values(), ScalarArray::I64(_) | ScalarArray::U64(_)) {
            return Err(SamplingError::UnsupportedScalarType(self.values().type_name()));
        }
        match self {
            Self::Structured(v) => v.validate(),
            Self::Unstructured(v) => v.validate(),
        }
    }

    /// Range used when the transfer function doesn't pin one.
    ///
    /// 8-bit storage spans its full integer range; everything else spans the
    /// volume's own min/max value.
    pub fn default_range(&self, values: &[Value]) -> Result<ScalarRange> {
        match self.values() {
            ScalarArray::I8(_) => ScalarRange::new(-128., 127.),
            ScalarArray::U8(_) => ScalarRange::new(0., 255.),
            _ if values.is_empty() => ScalarRange::new(0., 0.),
            _ => {
                let (lo, hi) = min_max(values);
                ScalarRange::new(lo, hi)
            }
        }
    }
}
