//! Fixed integer mixing for coordinate-derived seeds.
//!
//! Outputs are fixed: saved chunks must keep matching regenerated ones on
//! every toolchain.

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// One splitmix64 step: a bijective avalanche of `z`.
pub const fn splitmix64(z: u64) -> u64 {
    let mut z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Folds `values` into `seed`, one splitmix64 step per value.
pub fn mix_values(seed: u64, values: &[i64]) -> u64 {
    values.iter().fold(splitmix64(seed), |acc, &v| splitmix64(acc ^ v as u64))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
