use crate::{
    cell::Tetrahedron,
    interp::{min_max, nonzero_or_one},
    transfer::ScalarRange,
    types::{Matrix, Point, Value, Vector},
};

/// Affine map from a tetrahedron's object space into particle pool space.
///
/// The rotation `L` turns the cell's gradient onto `+z`; the scale and
/// offset `A` then fit the rotated cell into the unit square in `x` and `y`
/// and make `z` equal the normalized scalar:
///
/// ```text
/// L = [t1; t2; g]         g  = normalized gradient
///                         t1 = normalize(g × u), u the axis with the smallest |g_k|
///                         t2 = normalize(g × t1)
/// A(p) = diag(a) p + b    a  = (1 / Δx, 1 / Δy, Δs / Δz)
///                         b  = (-a1 x_min, -a2 y_min, -a3 z_min + s_min)
/// ```
///
/// where `Δ` are the rotated cell's extents and `s` the node scalars
/// normalized to the transfer function range.
#[derive(Debug, Clone, PartialEq)]
pub struct LayeredTransform {
    rotation: Matrix,
    scale: Vector,
    offset: Vector,
    direction: Vector,
    band: (Value, Value),
    origin: Point,
    barycentric: Matrix,
}

impl LayeredTransform {
    /// Returns `None` for a zero gradient, a zero scalar spread after
    /// normalization, or a flat transformed cell.
    pub fn new(tet: &Tetrahedron, range: &ScalarRange) -> Option<Self> {
        let norm = tet.gradient.norm();
        if !norm.is_finite() || norm <= 0. {
            return None;
        }
        let g = tet.gradient / norm;
        let u = Vector::ith(g.iamin(), 1.);
        let t1 = g.cross(&u).normalize();
        let t2 = g.cross(&t1).normalize();
        let rotation = Matrix::from_rows(&[t1.transpose(), t2.transpose(), g.transpose()]);

        let rotated = tet.vertices.map(|v| rotation * v.coords);
        let lo = rotated.iter().fold(Vector::repeat(Value::INFINITY), |a, r| a.inf(r));
        let hi = rotated.iter().fold(Vector::repeat(Value::NEG_INFINITY), |a, r| a.sup(r));
        let extent = hi - lo;
        let (s_min, s_max) = min_max(&tet.values.map(|v| range.normalize(v)));

        let scale = Vector::new(
            1. / nonzero_or_one(extent.x),
            1. / nonzero_or_one(extent.y),
            (s_max - s_min) / nonzero_or_one(extent.z),
        );
        if scale.z <= 0. {
            return None;
        }
        let offset = Vector::new(
            -scale.x * lo.x,
            -scale.y * lo.y,
            -scale.z * lo.z + s_min,
        );

        let [g0, g1, g2, g3] = rotated.map(|r| Point::from(scale.component_mul(&r) + offset));
        let barycentric = Matrix::from_columns(&[g1 - g0, g3 - g0, g2 - g0]).try_inverse()?;

        Some(Self {
            rotation,
            scale,
            offset,
            direction: g,
            band: (s_min, s_max),
            origin: g0,
            barycentric,
        })
    }

    /// Object space to pool space.
    pub fn forward(&self, p: &Point) -> Point {
        Point::from(self.scale.component_mul(&(self.rotation * p.coords)) + self.offset)
    }

    /// Pool space back to object space: `Lᵀ A⁻¹`.
    pub fn inverse(&self, q: &Point) -> Point {
        Point::from(self.rotation.transpose() * (q.coords - self.offset).component_div(&self.scale))
    }

    /// True when pool point `q` lies inside the transformed tetrahedron.
    pub fn contains(&self, q: &Point) -> bool {
        let lambda = self.barycentric * (q - self.origin);
        lambda.iter().all(|&l| l >= 0.) && lambda.sum() <= 1.
    }

    /// Normalized scalar interval covered by the cell.
    pub fn band(&self) -> (Value, Value) {
        self.band
    }

    /// Unit gradient direction.
    pub fn direction(&self) -> Vector {
        self.direction
    }
}
