//! Process-wide read-only lookup tables.

use std::sync::LazyLock;

/// Size of the shared sine table. Power of two so phase-to-index conversion
/// can mask instead of branching.
pub const LUT_SINE_SIZE: usize = 4096;

pub const LUT_SINE_MASK: usize = LUT_SINE_SIZE - 1;

/// One cycle of a sine, sampled at `LUT_SINE_SIZE` points.
pub static LUT_SINE: LazyLock<[f32; LUT_SINE_SIZE]> = LazyLock::new(|| {
    let mut table = [0.0f32; LUT_SINE_SIZE];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = (std::f32::consts::TAU * i as f32 / LUT_SINE_SIZE as f32).sin();
    }
    table
});
