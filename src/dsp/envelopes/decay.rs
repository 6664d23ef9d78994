//! Bang-triggered exponential decay envelope.
//!
//! The envelope state decays by `exp(-1/(time * sr))` each sample; a signed
//! curve value reshapes the normalized progress through a power law before
//! scaling back to the peak level.

use crate::types::{flush_denormal, Input, Param, DENORMAL_THRESHOLD};

const MIN_DECAY_TIME: f32 = 0.001;
const MAX_DECAY_TIME: f32 = 60.0;
const ATTACK_SAMPLES: u32 = 44; // ~1ms at 44.1kHz

/// Curve applied when the curve input carries no stream.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveResponse {
    Exponential,
    #[default]
    Linear,
    Logarithmic,
}

impl CurveResponse {
    fn curve_value(self) -> f32 {
        match self {
            CurveResponse::Exponential => -1.5,
            CurveResponse::Linear => 0.0,
            CurveResponse::Logarithmic => 1.5,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetriggerMode {
    /// Continue from the current level when the envelope is still running.
    FromCurrent,
    /// Restart from the peak unconditionally.
    #[default]
    FromPeak,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeMode {
    #[default]
    Decay,
    /// Prepend a short linear attack ramp to each trigger.
    AttackDecay,
}

#[derive(Default)]
pub struct DecayInputs<'a> {
    pub time: Input<'a>,
    pub curve: Input<'a>,
}

pub struct Decay {
    sr: f64,

    time: Param,
    curve: Param,
    peak: Param,

    envelope: f64,
    active: bool,

    mode: EnvelopeMode,
    curve_response: CurveResponse,
    retrigger: RetriggerMode,

    click_protection: u32,
    smooth_remaining: u32,
    smooth_start: f32,

    // attack progress is per-instance and restarts on every trigger
    attack_elapsed: u32,
}

impl Decay {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sr: sample_rate as f64,
            time: Param::new(1.0, MIN_DECAY_TIME, MAX_DECAY_TIME),
            curve: Param::new(0.0, -3.0, 3.0),
            peak: Param::new(1.0, 0.0, 1.0),
            envelope: 0.0,
            active: false,
            mode: EnvelopeMode::default(),
            curve_response: CurveResponse::default(),
            retrigger: RetriggerMode::default(),
            click_protection: 0,
            smooth_remaining: 0,
            smooth_start: 0.0,
            attack_elapsed: ATTACK_SAMPLES,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sr = sample_rate as f64;
    }

    pub fn set_time(&mut self, seconds: f32) {
        self.time.set(seconds);
    }

    pub fn set_peak(&mut self, peak: f32) {
        self.peak.set(peak);
    }

    pub fn set_mode(&mut self, mode: EnvelopeMode) {
        self.mode = mode;
    }

    pub fn set_curve_response(&mut self, response: CurveResponse) {
        self.curve_response = response;
    }

    pub fn set_retrigger_mode(&mut self, mode: RetriggerMode) {
        self.retrigger = mode;
    }

    /// Length of the linear crossfade masking retrigger jumps, in samples.
    pub fn set_click_protection(&mut self, samples: u32) {
        self.click_protection = samples.min(100);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start (or restart) the decay.
    pub fn trigger(&mut self) {
        self.smooth_start = self.envelope as f32;

        if self.retrigger == RetriggerMode::FromPeak || !self.active {
            self.envelope = self.peak.get() as f64;
        }

        if self.click_protection > 0
            && (self.envelope as f32 - self.smooth_start).abs() > 1e-3
        {
            self.smooth_remaining = self.click_protection;
        } else {
            self.smooth_remaining = 0;
        }

        self.active = true;
        self.attack_elapsed = 0;
        log::debug!(
            "decay: triggered (peak {:.3}, time {:.3}s)",
            self.peak.get(),
            self.time.get()
        );
    }

    pub fn process(&mut self, inputs: &DecayInputs, out: &mut [f32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            let decay_time = self.time.resolve(inputs.time, i) as f64;
            let curve = match inputs.curve.get(i) {
                Some(v) => v.clamp(-3.0, 3.0),
                None => self.curve_response.curve_value(),
            };

            let mut output = 0.0f32;

            if self.active {
                let coeff = if decay_time <= 0.0 {
                    0.0
                } else {
                    (-1.0 / (decay_time * self.sr)).exp()
                };
                self.envelope *= coeff;

                let peak = self.peak.get() as f64;
                let progress = if peak > 0.0 { self.envelope / peak } else { 0.0 };
                let body = (apply_curve(progress, curve as f64) * peak) as f32;

                output = body;
                if self.mode == EnvelopeMode::AttackDecay {
                    if self.attack_elapsed < ATTACK_SAMPLES {
                        output *= self.attack_elapsed as f32 / ATTACK_SAMPLES as f32;
                        self.attack_elapsed += 1;
                    }
                }

                if self.envelope < DENORMAL_THRESHOLD as f64
                    || (body as f64) < DENORMAL_THRESHOLD as f64
                {
                    self.envelope = 0.0;
                    self.active = false;
                    output = 0.0;
                }
            }

            if self.smooth_remaining > 0 {
                let progress = (self.click_protection - self.smooth_remaining) as f32
                    / self.click_protection as f32;
                output = self.smooth_start + (output - self.smooth_start) * progress;
                self.smooth_remaining -= 1;
            }

            *slot = flush_denormal(output);
        }
    }
}

/// Power-law reshaping of the normalized decay progress. Negative curves are
/// exponential (fast start), positive logarithmic (slow start).
fn apply_curve(progress: f64, curve: f64) -> f64 {
    if curve == 0.0 || progress <= 0.0 {
        return progress;
    }
    if curve < 0.0 {
        progress.powf(1.0 + curve.abs())
    } else {
        progress.powf(1.0 / (1.0 + curve))
    }
}
