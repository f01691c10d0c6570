use crate::{
    interp::nonzero_or_one,
    types::{Bounds, Value},
};

/// Largest extent an object is normalized to before it is viewed.
pub const NORMALIZED_EXTENT: Value = 6.;

/// Object-space length covered by one pixel.
pub trait PixelLength {
    fn pixel_length(&self, bounds: &Bounds) -> Value;
}

/// A fixed length, independent of the object.
impl PixelLength for Value {
    fn pixel_length(&self, _bounds: &Bounds) -> Value {
        *self
    }
}

/// Perspective camera looking at an object scaled to [`NORMALIZED_EXTENT`].
///
/// ```text
///            window_height pixels
///        ┌──────────────┐
///         ╲            ╱
///          ╲   fov    ╱    pixel = 2 · distance · tan(fov / 2) / window_height
///           ╲        ╱     in normalized units, times max_extent / 6 in object units
///            ╲      ╱
///             camera
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees. Default: `45`.
    pub field_of_view: Value,
    /// Default: `512`.
    pub window_width: u32,
    /// Default: `512`.
    pub window_height: u32,
    /// Distance from the eye to the object center, normalized units. Default: `12`.
    pub distance: Value,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            field_of_view: 45.,
            window_width: 512,
            window_height: 512,
            distance: 12.,
        }
    }
}

impl Camera {
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    pub fn with_field_of_view(mut self, degrees: Value) -> Self {
        self.field_of_view = degrees;
        self
    }

    pub fn with_distance(mut self, distance: Value) -> Self {
        self.distance = distance;
        self
    }
}

impl PixelLength for Camera {
    fn pixel_length(&self, bounds: &Bounds) -> Value {
        let half_fov = 0.5 * self.field_of_view.to_radians();
        let normalized = 2. * self.distance * half_fov.tan() / self.window_height.max(1) as Value;
        normalized * nonzero_or_one(bounds.max_extent()) / NORMALIZED_EXTENT
    }
}
