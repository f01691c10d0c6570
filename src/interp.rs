use crate::types::Value;

// linearly map a number from one range to another; a collapsed input range maps to range_out[0]
pub fn remap(s: Value, range_in: [Value; 2], range_out: [Value; 2]) -> Value {
    let span = range_in[1] - range_in[0];
    if span == 0. {
        return range_out[0];
    }
    range_out[0] + (s - range_in[0]) * (range_out[1] - range_out[0]) / span
}

// Linear interpolation
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

// Denominator guard for homogeneous / affine math: zero becomes 1.0
pub fn nonzero_or_one(d: Value) -> Value {
    if d == 0. { 1. } else { d }
}

// Min and max of a non-empty slice
pub fn min_max(values: &[Value]) -> (Value, Value) {
    values
        .iter()
        .fold((Value::INFINITY, Value::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
