//! Sample-rate signal kernels for modular synthesis.
//!
//! Each module under [`dsp`] is an independently usable per-sample kernel:
//! it holds its own state, resolves every control input per sample between a
//! connected stream and a held scalar, and fills one output block per call.
//! There is no host layer here — wire the kernels to whatever block-based
//! audio callback you have.
//!
//! ```
//! use modkit_dsp::dsp::oscillators::{Cycle2d, Cycle2dInputs};
//!
//! let mut osc = Cycle2d::new(48_000.0);
//! osc.set_frequency(220.0);
//! let mut block = [0.0f32; 256];
//! osc.process(&Cycle2dInputs::default(), &mut block);
//! ```
//!
//! Conventions shared by every kernel:
//!
//! - `new(sample_rate, ..)` allocates everything the instance will ever
//!   need; the audio path never allocates.
//! - `set_sample_rate` re-derives smoothing factors, filter coefficients and
//!   other rate-dependent constants before the next block.
//! - Out-of-range control values are clamped, never rejected; every call
//!   produces finite output.
//! - Structural loads (`load_table`, ...) return a [`types::LoadError`] and
//!   leave state untouched on failure; diagnostics go through the `log`
//!   facade.

pub mod dsp;
pub mod types;

pub use types::{Input, LoadError, Param};
