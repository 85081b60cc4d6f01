//! Bit-level helpers for the radix-2 transform.
//!
//! Bit reversal composes 4-bit nibble reversals from a static lookup table
//! instead of looping over individual bits.

/// Reversed value of every 4-bit nibble, indexed by the nibble itself.
static NIBBLE_REVERSAL: [u8; 16] = [
    0x0, 0x8, 0x4, 0xc, 0x2, 0xa, 0x6, 0xe, 0x1, 0x9, 0x5, 0xd, 0x3, 0xb, 0x7, 0xf,
];

/// Returns true when exactly one bit of `n` is set.
#[inline]
pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

#[inline]
fn reverse_nibble(value: u32, shift: u32) -> u32 {
    NIBBLE_REVERSAL[((value >> shift) & 0xf) as usize] as u32
}

/// Reverses the bit order of a 16-bit value.
#[inline]
pub fn bit_reverse16(v: u16) -> u16 {
    let v = v as u32;
    (reverse_nibble(v, 0) << 12
        | reverse_nibble(v, 4) << 8
        | reverse_nibble(v, 8) << 4
        | reverse_nibble(v, 12)) as u16
}

/// Reverses the bit order of a 32-bit value.
#[inline]
pub fn bit_reverse32(v: u32) -> u32 {
    reverse_nibble(v, 0) << 28
        | reverse_nibble(v, 4) << 24
        | reverse_nibble(v, 8) << 20
        | reverse_nibble(v, 12) << 16
        | reverse_nibble(v, 16) << 12
        | reverse_nibble(v, 20) << 8
        | reverse_nibble(v, 24) << 4
        | reverse_nibble(v, 28)
}

/// Reorders `data` into bit-reversed index order for a transform of
/// `2^num_stages` points.
///
/// `data.len()` must equal `2^num_stages` and `num_stages` must be at most 32.
pub fn bit_reverse_permute<T>(data: &mut [T], num_stages: u32) {
    if num_stages == 0 {
        return;
    }
    let shift = 32 - num_stages;
    for i in 0..data.len() {
        let j = (bit_reverse32(i as u32) >> shift) as usize;
        if j > i {
            data.swap(i, j);
        }
    }
}
