//! Amplitude-dependent saturating VCA.
//!
//! The defining behavior: saturation drive is inversely related to the VCA
//! amplitude, so quiet passages pick up harmonic color while loud ones stay
//! clean. Drive compensation keeps the gain structure roughly constant
//! across the whole amplitude range.

use crate::types::{flush_denormal, Input, Param};

const MAX_SATURATION_DRIVE: f32 = 8.0;
const MIN_SATURATION_DRIVE: f32 = 0.1;

/// How the drive tracks the (inverted) amplitude.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaturationMode {
    #[default]
    Linear,
    Squared,
    /// Negative input excursions get 30% less drive.
    Asymmetric,
}

/// CV-to-amplitude response.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseCurve {
    #[default]
    Linear,
    /// level^4
    Exponential,
    /// level^0.25
    Logarithmic,
}

#[derive(Default)]
pub struct ModVcaInputs<'a> {
    pub audio: Input<'a>,
    pub level: Input<'a>,
}

pub struct ModVca {
    level: Param,

    saturation_mode: SaturationMode,
    response: ResponseCurve,
    character: f32,
    warmth: f32,

    envelope_follower: f32,
}

impl ModVca {
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            level: Param::new(0.0, 0.0, 1.0),
            saturation_mode: SaturationMode::default(),
            response: ResponseCurve::default(),
            character: 1.0,
            warmth: 0.0,
            envelope_follower: 0.0,
        }
    }

    pub fn set_level(&mut self, level: f32) {
        self.level.set(level);
    }

    pub fn set_saturation_mode(&mut self, mode: SaturationMode) {
        self.saturation_mode = mode;
    }

    pub fn set_response(&mut self, response: ResponseCurve) {
        self.response = response;
    }

    /// Saturation intensity scaling, 0..2.
    pub fn set_character(&mut self, amount: f32) {
        self.character = amount.clamp(0.0, 2.0);
    }

    /// Blend in an extra tanh harmonic layer, 0..1.
    pub fn set_warmth(&mut self, amount: f32) {
        self.warmth = amount.clamp(0.0, 1.0);
    }

    /// Smoothed magnitude of the recent output.
    pub fn envelope(&self) -> f32 {
        self.envelope_follower
    }

    pub fn process(&mut self, inputs: &ModVcaInputs, out: &mut [f32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            let audio = inputs.audio.get(i).unwrap_or(0.0);
            let level = self.level.resolve(inputs.level, i);
            *slot = flush_denormal(self.tick(audio, level));
        }
    }

    fn tick(&mut self, input: f32, level: f32) -> f32 {
        let amplitude = match self.response {
            ResponseCurve::Linear => level,
            ResponseCurve::Exponential => level * level * level * level,
            ResponseCurve::Logarithmic => {
                if level > 0.0 {
                    level.sqrt().sqrt()
                } else {
                    0.0
                }
            }
        };

        let vca_output = input * amplitude;
        let mut output = self.saturate(vca_output, amplitude);

        if self.warmth > 0.0 {
            let warmth = self.warmth * 0.15 * (output * 1.5).tanh();
            output = (1.0 - self.warmth) * output + self.warmth * (output + warmth);
        }

        let envelope_coeff = 0.99;
        self.envelope_follower =
            self.envelope_follower * envelope_coeff + output.abs() * (1.0 - envelope_coeff);

        output
    }

    fn saturate(&self, input: f32, amplitude: f32) -> f32 {
        if amplitude <= 0.0 {
            return 0.0;
        }

        let max_drive = MAX_SATURATION_DRIVE * self.character;
        let inv_amp = 1.0 - amplitude;
        let drive = match self.saturation_mode {
            SaturationMode::Linear => max_drive * inv_amp + MIN_SATURATION_DRIVE,
            SaturationMode::Squared => max_drive * inv_amp * inv_amp + MIN_SATURATION_DRIVE,
            SaturationMode::Asymmetric => {
                if input > 0.0 {
                    max_drive * inv_amp + MIN_SATURATION_DRIVE
                } else {
                    max_drive * inv_amp * 0.7 + MIN_SATURATION_DRIVE
                }
            }
        };

        (input * drive).tanh() / drive
    }
}
