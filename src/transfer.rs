use crate::{
    error::{Result, SamplingError},
    interp::{lerp, remap},
    types::Value,
};

/// Default number of entries in opacity and color tables.
pub const DEFAULT_RESOLUTION: usize = 256;

/// Closed scalar interval `[min, max]` with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarRange {
    min: Value,
    max: Value,
}

impl ScalarRange {
    /// Returns [`SamplingError::InvalidRange`] if `min > max` or either bound isn't finite.
    pub fn new(min: Value, max: Value) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(SamplingError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Value {
        self.min
    }

    pub fn max(&self) -> Value {
        self.max
    }

    pub fn width(&self) -> Value {
        self.max - self.min
    }

    /// Maps `scalar` to `[0, 1]`, clamping values outside the range.
    pub fn normalize(&self, scalar: Value) -> Value {
        remap(scalar.clamp(self.min, self.max), [self.min, self.max], [0., 1.])
    }

    /// Inverse of [`normalize`](ScalarRange::normalize).
    pub fn denormalize(&self, t: Value) -> Value {
        lerp(self.min, self.max, t)
    }

    /// Continuous table coordinate of `scalar` in `[0, resolution - 1]`.
    pub(crate) fn table_position(&self, scalar: Value, resolution: usize) -> Value {
        self.normalize(scalar) * (resolution - 1) as Value
    }
}

/// Scalar to opacity lookup table. Entries are opacities in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct OpacityMap {
    table: Vec<Value>,
}

impl Default for OpacityMap {
    fn default() -> Self {
        Self::linear(DEFAULT_RESOLUTION)
    }
}

impl OpacityMap {
    /// Wraps `table`; entries are clamped to `[0, 1]`.
    ///
    /// Returns [`SamplingError::InvalidTable`] for fewer than two entries.
    pub fn new(table: Vec<Value>) -> Result<Self> {
        if table.len() < 2 {
            return Err(SamplingError::InvalidTable(table.len()));
        }
        let table = table.into_iter().map(|o| o.clamp(0., 1.)).collect();
        Ok(Self { table })
    }

    /// Opacity rising linearly from 0 to 1 across the table.
    pub fn linear(resolution: usize) -> Self {
        let resolution = resolution.max(2);
        let scale = 1. / (resolution - 1) as Value;
        Self {
            table: (0..resolution).map(|i| i as Value * scale).collect(),
        }
    }

    /// The same opacity in every slot.
    pub fn constant(resolution: usize, opacity: Value) -> Self {
        Self {
            table: vec![opacity.clamp(0., 1.); resolution.max(2)],
        }
    }

    pub fn resolution(&self) -> usize {
        self.table.len()
    }

    pub fn table(&self) -> &[Value] {
        &self.table
    }
}

impl std::ops::Index<usize> for OpacityMap {
    type Output = Value;

    fn index(&self, i: usize) -> &Value {
        &self.table[i]
    }
}

/// Scalar to RGB lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    table: Vec<[u8; 3]>,
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::rainbow(DEFAULT_RESOLUTION)
    }
}

impl ColorMap {
    /// Returns [`SamplingError::InvalidTable`] for fewer than two entries.
    pub fn new(table: Vec<[u8; 3]>) -> Result<Self> {
        if table.len() < 2 {
            return Err(SamplingError::InvalidTable(table.len()));
        }
        Ok(Self { table })
    }

    /// Black to white ramp.
    pub fn grayscale(resolution: usize) -> Self {
        let resolution = resolution.max(2);
        let table = (0..resolution)
            .map(|i| {
                let v = (255. * i as Value / (resolution - 1) as Value).round() as u8;
                [v, v, v]
            })
            .collect();
        Self { table }
    }

    /// Blue to red hue ramp (hue 240° down to 0° at full saturation and value).
    pub fn rainbow(resolution: usize) -> Self {
        let resolution = resolution.max(2);
        let table = (0..resolution)
            .map(|i| {
                let t = i as Value / (resolution - 1) as Value;
                hue_to_rgb(240. * (1. - t))
            })
            .collect();
        Self { table }
    }

    pub fn resolution(&self) -> usize {
        self.table.len()
    }

    pub fn table(&self) -> &[[u8; 3]] {
        &self.table
    }

    /// Color of `scalar` over `range`, linearly interpolated between table entries.
    pub fn at(&self, scalar: Value, range: &ScalarRange) -> [u8; 3] {
        let v = range.table_position(scalar, self.table.len());
        let i0 = v as usize;
        let i1 = (i0 + 1).min(self.table.len() - 1);
        let t = v - i0 as Value;
        let (c0, c1) = (self.table[i0], self.table[i1]);
        std::array::from_fn(|k| lerp(c0[k] as Value, c1[k] as Value, t).round() as u8)
    }
}

fn hue_to_rgb(hue: Value) -> [u8; 3] {
    let h = hue / 60.;
    let x = 1. - (h % 2. - 1.).abs();
    let (r, g, b) = match h as u32 {
        0 => (1., x, 0.),
        1 => (x, 1., 0.),
        2 => (0., 1., x),
        3 => (0., x, 1.),
        4 => (x, 0., 1.),
        _ => (1., 0., x),
    };
    [r, g, b].map(|c: Value| (c * 255.).round() as u8)
}

/// Opacity and color tables plus the scalar range they span.
///
/// When `range` is `None` the generator derives one from the volume (see
/// [`Volume::default_range`](crate::volume::Volume::default_range)).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferFunction {
    pub opacity_map: OpacityMap,
    pub color_map: ColorMap,
    pub range: Option<ScalarRange>,
}

impl TransferFunction {
    pub fn new(opacity_map: OpacityMap, color_map: ColorMap) -> Self {
        Self {
            opacity_map,
            color_map,
            range: None,
        }
    }

    /// Pins the scalar range instead of deriving it from the volume.
    pub fn with_range(mut self, range: ScalarRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Table resolution used for density lookups and the "tiny range" threshold.
    pub fn resolution(&self) -> usize {
        self.opacity_map.resolution()
    }
}
