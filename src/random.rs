use crate::types::Value;

/// Fast uniform random numbers in `[0, 1)`.
///
/// Marsaglia's xorshift128 with four 32-bit words of state (period `2^128 - 1`).
/// Instances are cheap to create and must not be shared between workers: each
/// rayon task owns its own stream, derived with [`RandomSource::from_stream`].
#[derive(Debug, Clone)]
pub struct RandomSource {
    x: u32,
    y: u32,
    z: u32,
    w: u32,
}

impl Default for RandomSource {
    fn default() -> Self {
        Self {
            x: 123_456_789,
            y: 362_436_069,
            z: 521_288_629,
            w: 88_675_123,
        }
    }
}

impl RandomSource {
    /// Creates a generator whose state is expanded from `seed`.
    pub fn new(seed: u64) -> Self {
        Self::from_stream(seed, 0)
    }

    /// Creates the generator for independent stream `stream` of `seed`.
    ///
    /// The four state words are drawn from a splitmix64 sequence keyed on both
    /// values, so neighbouring streams are decorrelated. A state word is never
    /// all-zero.
    pub fn from_stream(seed: u64, stream: u64) -> Self {
        let mut s = seed ^ stream.wrapping_mul(0xD1B5_4A32_D192_ED03);
        let mut word = || {
            let v = splitmix64(&mut s) as u32;
            if v == 0 { 0x9E37_79B9 } else { v }
        };
        Self {
            x: word(),
            y: word(),
            z: word(),
            w: word(),
        }
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let t = self.x ^ (self.x << 11);
        self.x = self.y;
        self.y = self.z;
        self.z = self.w;
        self.w = (self.w ^ (self.w >> 19)) ^ (t ^ (t >> 8));
        self.w
    }

    /// Returns the next number in `[0, 1)`.
    #[inline]
    pub fn next(&mut self) -> Value {
        // 24 bits keep the f32 result strictly below 1.0
        (self.next_u32() >> 8) as Value * (1.0 / 16_777_216.0)
    }

    /// Returns a uniform index in `0..len`. `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        ((self.next() * len as Value) as usize).min(len - 1)
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
