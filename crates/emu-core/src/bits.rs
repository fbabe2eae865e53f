//! Power-of-two and saturating helpers.

/// True when exactly one bit of `value` is set.
#[must_use]
pub const fn has_single_bit(value: usize) -> bool {
    value != 0 && value & (value - 1) == 0
}

/// Largest power of two not greater than `value` (0 for 0).
#[must_use]
pub const fn bit_floor(value: usize) -> usize {
    if value == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - value.leading_zeros())
    }
}

/// Smallest power of two not less than `value` (1 for 0 and 1).
#[must_use]
pub const fn bit_ceil(value: usize) -> usize {
    if value <= 1 {
        1
    } else {
        1 << (usize::BITS - (value - 1).leading_zeros())
    }
}

/// Power of two closest to `value`. Ties round down.
#[must_use]
pub const fn closest_power_of_two(value: usize) -> usize {
    let lower = bit_floor(value);
    let upper = bit_ceil(value);
    if lower == 0 {
        upper
    } else if value - lower <= upper - value {
        lower
    } else {
        upper
    }
}

/// Signed addition clamped to the `i32` range.
#[must_use]
pub const fn saturating_add_i32(a: i32, b: i32) -> i32 {
    a.saturating_add(b)
}
