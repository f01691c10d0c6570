use nalgebra::{Matrix3, Point3, Vector3};

/// Scalar field value at a point in space.
pub type Value = f32;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// A 3x3 matrix with [`Value`] components.
pub type Matrix = Matrix3<Value>;

/// One rendering particle.
///
/// `normal` is the negated field gradient at `position`; it is not normalized
/// except for particles produced by layered sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Point,
    pub normal: Vector,
    pub scalar: Value,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Point::origin(),
            normal: Vector::zeros(),
            scalar: 0.,
        }
    }
}

/// Axis-aligned bounding box of a volume in object coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Returns the smallest box containing every point in `points`.
    ///
    /// An empty iterator yields a degenerate box at the origin.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self {
                min: Point::origin(),
                max: Point::origin(),
            };
        };
        iter.fold(
            Self {
                min: first,
                max: first,
            },
            |b, p| Self {
                min: b.min.inf(&p),
                max: b.max.sup(&p),
            },
        )
    }

    /// Largest edge length of the box.
    pub fn max_extent(&self) -> Value {
        (self.max - self.min).max()
    }
}
