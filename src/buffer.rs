use rayon::prelude::*;

use crate::{
    transfer::{ColorMap, ScalarRange},
    types::{Particle, Point, Value, Vector},
};

/// Generated particles, ready for a point renderer.
///
/// Attributes are stored flat, three components per particle:
///
/// ```text
/// coords  = [x0, y0, z0, x1, y1, z1, ...]   f32
/// normals = [nx0, ny0, nz0, ...]            f32, negated field gradient
/// colors  = [r0, g0, b0, ...]               u8, from the color map
/// ```
///
/// During generation the buffer is split into one contiguous segment per
/// repetition, each filled by its own worker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleBuffer {
    coords: Vec<Value>,
    normals: Vec<Value>,
    colors: Vec<u8>,
    repetitions: usize,
}

impl ParticleBuffer {
    /// Allocates room for `per_repetition × repetitions` particles, all zeroed.
    pub fn zeroed(per_repetition: usize, repetitions: usize) -> Self {
        let len = 3 * per_repetition * repetitions;
        Self {
            coords: vec![0.; len],
            normals: vec![0.; len],
            colors: vec![0; len],
            repetitions,
        }
    }

    pub fn len(&self) -> usize {
        self.coords.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Number of repetitions the buffer was filled with.
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    pub fn coords(&self) -> &[Value] {
        &self.coords
    }

    pub fn normals(&self) -> &[Value] {
        &self.normals
    }

    pub fn colors(&self) -> &[u8] {
        &self.colors
    }

    pub fn position(&self, index: usize) -> Point {
        Point::from_slice(&self.coords[3 * index..3 * index + 3])
    }

    pub fn normal(&self, index: usize) -> Vector {
        Vector::from_column_slice(&self.normals[3 * index..3 * index + 3])
    }

    pub fn color(&self, index: usize) -> [u8; 3] {
        [
            self.colors[3 * index],
            self.colors[3 * index + 1],
            self.colors[3 * index + 2],
        ]
    }

    /// Moves the three attribute arrays out: `(coords, normals, colors)`.
    pub fn into_parts(self) -> (Vec<Value>, Vec<Value>, Vec<u8>) {
        (self.coords, self.normals, self.colors)
    }

    /// Disjoint per-repetition segments `(coords, normals, colors)`, in order.
    ///
    /// The buffer must not be empty.
    pub(crate) fn segments_mut(
        &mut self,
    ) -> impl IndexedParallelIterator<Item = ((&mut [Value], &mut [Value]), &mut [u8])> {
        let segment = self.coords.len() / self.repetitions.max(1);
        self.coords
            .par_chunks_mut(segment)
            .zip(self.normals.par_chunks_mut(segment))
            .zip(self.colors.par_chunks_mut(segment))
    }

    /// Packs the first `written[r]` particles of every repetition segment
    /// together and truncates the buffer to their sum.
    pub(crate) fn compact(&mut self, written: &[usize]) {
        let capacity = self.len() / self.repetitions.max(1);
        let mut offset = 0;
        for (rep, &n) in written.iter().enumerate() {
            let n = n.min(capacity);
            let src = 3 * rep * capacity..3 * (rep * capacity + n);
            self.coords.copy_within(src.clone(), 3 * offset);
            self.normals.copy_within(src.clone(), 3 * offset);
            self.colors.copy_within(src, 3 * offset);
            offset += n;
        }
        self.coords.truncate(3 * offset);
        self.normals.truncate(3 * offset);
        self.colors.truncate(3 * offset);
    }
}

/// Write cursor over one repetition segment of a [`ParticleBuffer`].
///
/// Particles land at strictly increasing indices; the color is looked up
/// from the particle's scalar when it is pushed.
pub struct ParticleWriter<'b> {
    coords: &'b mut [Value],
    normals: &'b mut [Value],
    colors: &'b mut [u8],
    color_map: &'b ColorMap,
    range: &'b ScalarRange,
    cursor: usize,
}

impl<'b> ParticleWriter<'b> {
    pub fn new(
        coords: &'b mut [Value],
        normals: &'b mut [Value],
        colors: &'b mut [u8],
        color_map: &'b ColorMap,
        range: &'b ScalarRange,
    ) -> Self {
        Self {
            coords,
            normals,
            colors,
            color_map,
            range,
            cursor: 0,
        }
    }

    /// Particles the segment can hold.
    pub fn capacity(&self) -> usize {
        self.coords.len() / 3
    }

    /// Particles written so far.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Appends `particle`. The segment must not be full.
    pub fn push(&mut self, particle: &Particle) {
        debug_assert!(self.cursor < self.capacity(), "particle segment overflow");
        let i = 3 * self.cursor;
        self.coords[i..i + 3].copy_from_slice(particle.position.coords.as_slice());
        self.normals[i..i + 3].copy_from_slice(particle.normal.as_slice());
        self.colors[i..i + 3].copy_from_slice(&self.color_map.at(particle.scalar, self.range));
        self.cursor += 1;
    }
}
