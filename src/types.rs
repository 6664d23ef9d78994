//! Cross-cutting types shared by every kernel: per-block input resolution,
//! parameter cells, click-free smoothing, and the small numeric safeguards
//! (denormal flushing, DC blocking) the audio path relies on.

use std::ops::Deref;

use thiserror::Error;

/// Magnitudes below this are flushed to exactly zero before they can reach
/// a feedback path and trigger slow-path float handling.
pub const DENORMAL_THRESHOLD: f32 = 1e-15;

#[inline]
pub fn flush_denormal(value: f32) -> f32 {
    if value.abs() < DENORMAL_THRESHOLD {
        0.0
    } else {
        value
    }
}

/// One control or audio input for the duration of a block.
///
/// Whether an input carries a stream is decided once per processing session,
/// not per sample; an unconnected input falls back to the module's held
/// scalar for that parameter.
#[derive(Clone, Copy, Default)]
pub enum Input<'a> {
    Stream(&'a [f32]),
    #[default]
    Unconnected,
}

impl<'a> Input<'a> {
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, Input::Stream(_))
    }

    /// Sample at `frame`, or `None` when unconnected (or the stream is
    /// shorter than the block — treated as unconnected rather than panicking).
    #[inline]
    pub fn get(&self, frame: usize) -> Option<f32> {
        match self {
            Input::Stream(samples) => samples.get(frame).copied(),
            Input::Unconnected => None,
        }
    }
}

/// A held scalar with its documented range.
///
/// Discrete "set parameter" messages land here; `resolve` performs the
/// per-sample choice between the stream and the held value. Out-of-range
/// values are clamped, never rejected — every sample must produce output.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    value: f32,
    lo: f32,
    hi: f32,
}

impl Param {
    pub fn new(value: f32, lo: f32, hi: f32) -> Self {
        Self {
            value: value.clamp(lo, hi),
            lo,
            hi,
        }
    }

    #[inline]
    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(self.lo, self.hi);
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value
    }

    /// Per-sample value: the clamped stream sample when connected, the held
    /// scalar otherwise.
    #[inline]
    pub fn resolve(&self, input: Input, frame: usize) -> f32 {
        match input.get(frame) {
            Some(v) => v.clamp(self.lo, self.hi),
            None => self.value,
        }
    }
}

/// One-pole parameter smoother (`current += factor * (target - current)`).
///
/// Held scalars get the full ~10 ms factor; stream inputs only need a light
/// touch (a tenth of the factor) to round off extreme jumps.
#[derive(Debug, Clone, Copy)]
pub struct Smoothed {
    value: f32,
    factor: f32,
}

impl Smoothed {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            // ~10ms at 44.1kHz; set_rate() re-derives on session start
            factor: 0.001,
        }
    }

    /// Re-derive the smoothing coefficient for a target time constant.
    pub fn set_rate(&mut self, time_seconds: f32, sample_rate: f32) {
        self.factor = 1.0 - (-1.0 / (time_seconds * sample_rate)).exp();
    }

    #[inline]
    pub fn next(&mut self, target: f32, from_stream: bool) -> f32 {
        let factor = if from_stream {
            self.factor * 0.1
        } else {
            self.factor
        };
        self.value += factor * (target - self.value);
        self.value
    }

    /// Jump straight to a value without smoothing toward it.
    pub fn snap(&mut self, value: f32) {
        self.value = value;
    }
}

impl Deref for Smoothed {
    type Target = f32;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

/// DC-blocking high-pass: `H(z) = (1 - z^-1) / (1 - 0.995 z^-1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DcBlocker {
    x1: f32,
    y1: f32,
}

impl DcBlocker {
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x1 + 0.995 * self.y1;
        self.x1 = input;
        self.y1 = output;
        output
    }

    /// Filter memory is cleared whenever DC blocking is toggled on a module.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

/// Rising-edge trigger detector: fires on a crossing from <= 0 to > 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct RisingEdge {
    prev: f32,
}

impl RisingEdge {
    /// Returns the trigger amplitude when an edge fired this sample.
    #[inline]
    pub fn detect(&mut self, input: f32) -> Option<f32> {
        let fired = input > 0.0 && self.prev <= 0.0;
        self.prev = input;
        if fired {
            Some(input)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.prev = 0.0;
    }
}

/// Structural load failures. The audio path never sees these — a failed load
/// leaves existing state untouched and processing continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("source buffer is empty")]
    EmptyBuffer,
    #[error("all {0} custom table slots are in use")]
    SlotsFull(usize),
}
