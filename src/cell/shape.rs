//! Interpolation functions, their local derivatives, reference-domain random
//! sampling and volume quadrature for every [`CellType`].
//!
//! Local coordinates and node orderings:
//!
//! ```text
//! Tetrahedra            (x, y, z), x + y + z <= 1     node 0 at the local origin,
//!                                                     nodes 1, 2, 3 along x, y, z
//! QuadraticTetrahedra   as Tetrahedra, then edge midpoints
//!                       4:(0,1) 5:(1,2) 6:(2,0) 7:(0,3) 8:(1,3) 9:(2,3)
//! Hexahedra             (x, y, z) in [0, 1]³          0..3 bottom face (z = 0),
//!                                                     4..7 top face, counter-clockwise
//! QuadraticHexahedra    as Hexahedra, then edge midpoints
//!                       8..11 bottom edges, 12..15 top edges, 16..19 vertical edges
//! Pyramid               (ξ, η, r), ξ, η in [-1, 1],   0..3 base, 4 apex;
//!                       r in [0, 1]                   the base shrinks by (1 - r)
//! Prism                 (x, y, z), x + y <= 1,        0..2 bottom triangle,
//!                       z in [0, 1]                   3..5 top triangle
//! ```

use crate::{
    random::RandomSource,
    types::{Value, Vector},
    volume::CellType,
};

/// Largest node count of any supported cell.
pub const MAX_NODES: usize = 20;

/// Interpolation weights and their derivatives with respect to the local coordinates.
#[derive(Debug, Clone, Copy)]
pub struct ShapeFunctions {
    pub n: [Value; MAX_NODES],
    pub dn: [Vector; MAX_NODES],
}

impl Default for ShapeFunctions {
    fn default() -> Self {
        Self {
            n: [0.; MAX_NODES],
            dn: [Vector::zeros(); MAX_NODES],
        }
    }
}

// Unit cube corners, bottom face then top face.
const HEX_CORNERS: [[Value; 3]; 8] = [
    [0., 0., 0.],
    [1., 0., 0.],
    [1., 1., 0.],
    [0., 1., 0.],
    [0., 0., 1.],
    [1., 0., 1.],
    [1., 1., 1.],
    [0., 1., 1.],
];

// Serendipity hexahedron nodes in [-1, 1]³.
const HEX20_NODES: [[Value; 3]; 20] = [
    [-1., -1., -1.],
    [1., -1., -1.],
    [1., 1., -1.],
    [-1., 1., -1.],
    [-1., -1., 1.],
    [1., -1., 1.],
    [1., 1., 1.],
    [-1., 1., 1.],
    [0., -1., -1.],
    [1., 0., -1.],
    [0., 1., -1.],
    [-1., 0., -1.],
    [0., -1., 1.],
    [1., 0., 1.],
    [0., 1., 1.],
    [-1., 0., 1.],
    [-1., -1., 0.],
    [1., -1., 0.],
    [1., 1., 0.],
    [-1., 1., 0.],
];

const TET10_EDGES: [[usize; 2]; 6] = [[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]];

const PYRAMID_BASE: [[Value; 2]; 4] = [[-1., -1.], [1., -1.], [1., 1.], [-1., 1.]];

// Barycentric coordinates of a tetrahedron and their (constant) local derivatives.
const TET_DLAMBDA: [[Value; 3]; 4] = [[-1., -1., -1.], [1., 0., 0.], [0., 1., 0.], [0., 0., 1.]];

// 3-point Gauss-Legendre rule on [0, 1].
const GAUSS3: [(Value, Value); 3] = [
    (0.112_701_67, 5. / 18.),
    (0.5, 8. / 18.),
    (0.887_298_33, 5. / 18.),
];

impl ShapeFunctions {
    /// Evaluates the weights and derivatives of `cell_type` at `local`.
    pub fn evaluate(&mut self, cell_type: CellType, local: &Vector) {
        let (x, y, z) = (local.x, local.y, local.z);
        match cell_type {
            CellType::Tetrahedra => {
                let lambda = [1. - x - y - z, x, y, z];
                for i in 0..4 {
                    self.n[i] = lambda[i];
                    self.dn[i] = Vector::from(TET_DLAMBDA[i]);
                }
            }
            CellType::QuadraticTetrahedra => {
                let lambda = [1. - x - y - z, x, y, z];
                for i in 0..4 {
                    let d = Vector::from(TET_DLAMBDA[i]);
                    self.n[i] = lambda[i] * (2. * lambda[i] - 1.);
                    self.dn[i] = d * (4. * lambda[i] - 1.);
                }
                for (k, &[i, j]) in TET10_EDGES.iter().enumerate() {
                    let (di, dj) = (Vector::from(TET_DLAMBDA[i]), Vector::from(TET_DLAMBDA[j]));
                    self.n[4 + k] = 4. * lambda[i] * lambda[j];
                    self.dn[4 + k] = (di * lambda[j] + dj * lambda[i]) * 4.;
                }
            }
            CellType::Hexahedra => {
                for (i, c) in HEX_CORNERS.iter().enumerate() {
                    let f = |t: Value, ci: Value| if ci > 0. { t } else { 1. - t };
                    let d = |ci: Value| if ci > 0. { 1. } else { -1. };
                    let (fx, fy, fz) = (f(x, c[0]), f(y, c[1]), f(z, c[2]));
                    self.n[i] = fx * fy * fz;
                    self.dn[i] = Vector::new(d(c[0]) * fy * fz, fx * d(c[1]) * fz, fx * fy * d(c[2]));
                }
            }
            CellType::QuadraticHexahedra => {
                // serendipity functions in ξ = 2x - 1; d/dx = 2 d/dξ
                let (u, v, w) = (2. * x - 1., 2. * y - 1., 2. * z - 1.);
                for (i, c) in HEX20_NODES.iter().enumerate() {
                    let (a, b, e) = (1. + u * c[0], 1. + v * c[1], 1. + w * c[2]);
                    if i < 8 {
                        let s = u * c[0] + v * c[1] + w * c[2] - 2.;
                        self.n[i] = 0.125 * a * b * e * s;
                        self.dn[i] = Vector::new(
                            c[0] * b * e * (s + a),
                            c[1] * a * e * (s + b),
                            c[2] * a * b * (s + e),
                        ) * 0.25;
                    } else if c[0] == 0. {
                        self.n[i] = 0.25 * (1. - u * u) * b * e;
                        self.dn[i] =
                            Vector::new(-2. * u * b * e, (1. - u * u) * c[1] * e, (1. - u * u) * b * c[2])
                                * 0.5;
                    } else if c[1] == 0. {
                        self.n[i] = 0.25 * a * (1. - v * v) * e;
                        self.dn[i] =
                            Vector::new(c[0] * (1. - v * v) * e, -2. * v * a * e, a * (1. - v * v) * c[2])
                                * 0.5;
                    } else {
                        self.n[i] = 0.25 * a * b * (1. - w * w);
                        self.dn[i] =
                            Vector::new(c[0] * b * (1. - w * w), a * c[1] * (1. - w * w), -2. * w * a * b)
                                * 0.5;
                    }
                }
            }
            CellType::Pyramid => {
                for (i, c) in PYRAMID_BASE.iter().enumerate() {
                    let (a, b) = (1. + x * c[0], 1. + y * c[1]);
                    self.n[i] = 0.25 * a * b * (1. - z);
                    self.dn[i] = Vector::new(
                        0.25 * c[0] * b * (1. - z),
                        0.25 * a * c[1] * (1. - z),
                        -0.25 * a * b,
                    );
                }
                self.n[4] = z;
                self.dn[4] = Vector::new(0., 0., 1.);
            }
            CellType::Prism => {
                let lambda = [1. - x - y, x, y];
                let dlambda = [[-1., -1.], [1., 0.], [0., 1.]];
                for i in 0..3 {
                    let [dx, dy] = dlambda[i];
                    self.n[i] = lambda[i] * (1. - z);
                    self.dn[i] = Vector::new(dx * (1. - z), dy * (1. - z), -lambda[i]);
                    self.n[i + 3] = lambda[i] * z;
                    self.dn[i + 3] = Vector::new(dx * z, dy * z, lambda[i]);
                }
            }
        }
    }
}

/// Folds a point of the unit cube into the reference tetrahedron.
///
/// The fold is measure preserving, so a uniform cube sample stays uniform.
fn fold_into_tetrahedron(mut s: Value, mut t: Value, mut u: Value) -> Vector {
    if s + t > 1. {
        s = 1. - s;
        t = 1. - t;
    }
    if t + u > 1. {
        let tmp = u;
        u = 1. - s - t;
        t = 1. - tmp;
    } else if s + t + u > 1. {
        let tmp = u;
        u = s + t + u - 1.;
        s = 1. - t - tmp;
    }
    Vector::new(s, t, u)
}

/// Draws a local point uniformly distributed in the cell's reference domain.
///
/// For the pyramid the height coordinate is drawn with density `3 (1 - r)²`
/// so the point is uniform in the (collapsed) physical shape.
pub fn random_local_point(cell_type: CellType, rng: &mut RandomSource) -> Vector {
    let (s, t, u) = (rng.next(), rng.next(), rng.next());
    match cell_type {
        CellType::Tetrahedra | CellType::QuadraticTetrahedra => fold_into_tetrahedron(s, t, u),
        CellType::Hexahedra | CellType::QuadraticHexahedra => Vector::new(s, t, u),
        CellType::Pyramid => Vector::new(2. * s - 1., 2. * t - 1., 1. - (1. - u).cbrt()),
        CellType::Prism => {
            if s + t > 1. {
                Vector::new(1. - s, 1. - t, u)
            } else {
                Vector::new(s, t, u)
            }
        }
    }
}

/// Calls `f(local, weight)` for every point of a quadrature rule over the
/// reference domain of `cell_type`. Weights sum to the reference volume.
pub fn for_each_quadrature_point(cell_type: CellType, mut f: impl FnMut(Vector, Value)) {
    match cell_type {
        CellType::Tetrahedra | CellType::QuadraticTetrahedra => {
            const A: Value = 0.585_410_2;
            const B: Value = 0.138_196_6;
            for p in [[B, B, B], [A, B, B], [B, A, B], [B, B, A]] {
                f(Vector::from(p), 1. / 24.);
            }
        }
        CellType::Hexahedra | CellType::QuadraticHexahedra => {
            for (x, wx) in GAUSS3 {
                for (y, wy) in GAUSS3 {
                    for (z, wz) in GAUSS3 {
                        f(Vector::new(x, y, z), wx * wy * wz);
                    }
                }
            }
        }
        CellType::Pyramid => {
            for (x, wx) in GAUSS3 {
                for (y, wy) in GAUSS3 {
                    for (z, wz) in GAUSS3 {
                        f(Vector::new(2. * x - 1., 2. * y - 1., z), 4. * wx * wy * wz);
                    }
                }
            }
        }
        CellType::Prism => {
            const TRI: [[Value; 2]; 3] = [[1. / 6., 1. / 6.], [2. / 3., 1. / 6.], [1. / 6., 2. / 3.]];
            for [x, y] in TRI {
                for (z, wz) in GAUSS3 {
                    f(Vector::new(x, y, z), wz / 6.);
                }
            }
        }
    }
}
