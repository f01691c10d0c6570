//! Bound, read-only views of one cell of a volume.
//!
//! A support is created once per worker and re-bound to successive cell
//! indices; binding copies the cell's node coordinates and values into fixed
//! size arrays, so sampling inside a cell never touches the volume again.

pub mod shape;
pub mod voxel;

pub use voxel::Voxel;

use crate::{
    cell::shape::{MAX_NODES, ShapeFunctions, for_each_quadrature_point, random_local_point},
    random::RandomSource,
    types::{Matrix, Point, Value, Vector},
    volume::{CellType, UnstructuredVolume},
};

/// Vertices, node values and constant gradient of a linear tetrahedron.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tetrahedron {
    pub vertices: [Point; 4],
    pub values: [Value; 4],
    pub gradient: Vector,
}

/// What a sampler needs from one cell of a volume.
pub trait CellSupport {
    /// Number of cells that can be bound.
    fn number_of_cells(&self) -> usize;

    /// Loads cell `index`. The index must be below [`number_of_cells`](CellSupport::number_of_cells).
    fn bind(&mut self, index: usize);

    /// Scalar values at the bound cell's nodes.
    fn node_values(&self) -> &[Value];

    /// Object-space volume of the bound cell.
    fn volume(&self) -> Value;

    /// Scalar used to estimate the cell's particle count.
    ///
    /// The node average; for a trilinear voxel this equals the value at its center.
    fn representative_scalar(&self) -> Value {
        let values = self.node_values();
        values.iter().sum::<Value>() / values.len() as Value
    }

    /// Moves to a uniformly random local point and returns its object position.
    fn set_random_point(&mut self, rng: &mut RandomSource) -> Point;

    /// Interpolated scalar at the current point.
    fn scalar(&self) -> Value;

    /// Scalar gradient in object space at the current point.
    fn gradient(&self) -> Vector;

    /// The bound cell as a linear tetrahedron, if it is one.
    fn linear_tetrahedron(&self) -> Option<Tetrahedron> {
        None
    }
}

/// One cell of an [`UnstructuredVolume`].
#[derive(Debug, Clone)]
pub struct Cell<'a> {
    volume: &'a UnstructuredVolume,
    values: &'a [Value],
    cell_type: CellType,
    nnodes: usize,
    coords: [Point; MAX_NODES],
    node_values: [Value; MAX_NODES],
    shape: ShapeFunctions,
}

impl<'a> Cell<'a> {
    /// `values` are the volume's node values converted to [`Value`]s.
    pub fn new(volume: &'a UnstructuredVolume, values: &'a [Value]) -> Self {
        Self {
            volume,
            values,
            cell_type: volume.cell_type,
            nnodes: volume.cell_type.node_count(),
            coords: [Point::origin(); MAX_NODES],
            node_values: [0.; MAX_NODES],
            shape: ShapeFunctions::default(),
        }
    }

    /// Node coordinates of the bound cell.
    pub fn coords(&self) -> &[Point] {
        &self.coords[..self.nnodes]
    }

    /// Moves the current point to `local` reference coordinates.
    pub fn set_local_point(&mut self, local: &Vector) {
        self.shape.evaluate(self.cell_type, local);
    }

    /// Object position of the current point.
    pub fn global_point(&self) -> Point {
        let sum = self
            .coords()
            .iter()
            .zip(&self.shape.n)
            .fold(Vector::zeros(), |acc, (p, &n)| acc + p.coords * n);
        Point::from(sum)
    }

    /// Derivative of the object position with respect to the local
    /// coordinates at the current point; column `k` is `∂x / ∂local_k`.
    pub fn jacobian(&self) -> Matrix {
        self.jacobian_of(&self.shape)
    }

    fn jacobian_of(&self, shape: &ShapeFunctions) -> Matrix {
        self.coords()
            .iter()
            .zip(&shape.dn)
            .fold(Matrix::zeros(), |acc, (p, dn)| acc + p.coords * dn.transpose())
    }

    fn local_gradient(&self) -> Vector {
        self.node_values[..self.nnodes]
            .iter()
            .zip(&self.shape.dn)
            .fold(Vector::zeros(), |acc, (&v, dn)| acc + dn * v)
    }
}

impl CellSupport for Cell<'_> {
    fn number_of_cells(&self) -> usize {
        self.volume.number_of_cells()
    }

    fn bind(&mut self, index: usize) {
        let connections = self.volume.cell_connections(index);
        for (i, &node) in connections.iter().enumerate() {
            self.coords[i] = self.volume.node_coord(node as usize);
            self.node_values[i] = self.values[node as usize];
        }
        self.set_local_point(&Vector::zeros());
    }

    fn node_values(&self) -> &[Value] {
        &self.node_values[..self.nnodes]
    }

    /// Exact for linear tetrahedra, Gauss quadrature of `|det J|` otherwise.
    fn volume(&self) -> Value {
        if self.cell_type == CellType::Tetrahedra {
            let [v0, v1, v2, v3] = [0, 1, 2, 3].map(|i| self.coords[i]);
            return (v1 - v0).dot(&(v2 - v0).cross(&(v3 - v0))).abs() / 6.;
        }
        let mut shape = ShapeFunctions::default();
        let mut volume = 0.;
        for_each_quadrature_point(self.cell_type, |local, weight| {
            shape.evaluate(self.cell_type, &local);
            volume += weight * self.jacobian_of(&shape).determinant().abs();
        });
        volume
    }

    fn set_random_point(&mut self, rng: &mut RandomSource) -> Point {
        let local = random_local_point(self.cell_type, rng);
        self.set_local_point(&local);
        self.global_point()
    }

    fn scalar(&self) -> Value {
        self.node_values()
            .iter()
            .zip(&self.shape.n)
            .map(|(&v, &n)| v * n)
            .sum()
    }

    /// `J⁻ᵀ` times the local gradient; zero where the Jacobian is singular.
    fn gradient(&self) -> Vector {
        match self.jacobian().transpose().try_inverse() {
            Some(inverse) => inverse * self.local_gradient(),
            None => Vector::zeros(),
        }
    }

    fn linear_tetrahedron(&self) -> Option<Tetrahedron> {
        if self.cell_type != CellType::Tetrahedra {
            return None;
        }
        Some(Tetrahedron {
            vertices: [0, 1, 2, 3].map(|i| self.coords[i]),
            values: [0, 1, 2, 3].map(|i| self.node_values[i]),
            gradient: self.gradient(),
        })
    }
}
