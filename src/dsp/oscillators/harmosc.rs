//! Additive harmonic oscillator.
//!
//! One master phase drives up to 64 sine partials through precomputed
//! per-harmonic ratios. A bipolar falloff control tilts the amplitude
//! distribution between "fundamental only" and "top harmonic only", and a
//! detune control spreads the partials by up to +/-50 cents each.

use crate::dsp::consts::{LUT_SINE, LUT_SINE_MASK, LUT_SINE_SIZE};
use crate::dsp::utils::XorShift32;
use crate::types::{Input, Param};

pub const MAX_HARMONICS: usize = 64;

const DETUNE_SEED: u32 = 0x9e37_79b9;

/// Which partials are allowed to sound. The fundamental is always kept.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HarmonicMode {
    #[default]
    All,
    Odd,
    Even,
}

#[derive(Default)]
pub struct HarmOscInputs<'a> {
    pub freq: Input<'a>,
    pub falloff: Input<'a>,
}

pub struct HarmOsc {
    phase: f64,
    sr_inv: f64,

    freq: Param,
    falloff: Param,
    detune: f32,
    mode: HarmonicMode,
    custom_amps: bool,

    num_harmonics: usize,
    amplitudes: Vec<f32>,
    enabled: Vec<bool>,
    detune_offsets: Vec<f32>,
    /// Per-harmonic frequency ratio relative to the fundamental, detune
    /// already applied.
    ratios: Vec<f64>,

    last_falloff: f32,
    rng: XorShift32,
}

impl HarmOsc {
    /// `harmonics` is clamped to 1..=64 and fixed for the instance lifetime.
    pub fn new(sample_rate: f32, harmonics: usize) -> Self {
        let num_harmonics = harmonics.clamp(1, MAX_HARMONICS);
        let mut osc = Self {
            phase: 0.0,
            sr_inv: 1.0 / sample_rate as f64,
            freq: Param::new(440.0, 0.1, 20_000.0),
            falloff: Param::new(0.0, -1.0, 1.0),
            detune: 0.0,
            mode: HarmonicMode::All,
            custom_amps: false,
            num_harmonics,
            amplitudes: vec![0.0; num_harmonics],
            enabled: vec![true; num_harmonics],
            detune_offsets: vec![0.0; num_harmonics],
            ratios: vec![1.0; num_harmonics],
            last_falloff: 0.0,
            rng: XorShift32::new(DETUNE_SEED),
        };
        osc.generate_detune_offsets();
        osc.update_ratios();
        osc.calculate_amplitudes();
        osc
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sr_inv = 1.0 / sample_rate as f64;
    }

    pub fn num_harmonics(&self) -> usize {
        self.num_harmonics
    }

    pub fn set_frequency(&mut self, hz: f32) {
        self.freq.set(hz);
    }

    /// Setting falloff by message returns amplitude control to the automatic
    /// law, discarding any custom amplitude vector.
    pub fn set_falloff(&mut self, falloff: f32) {
        self.falloff.set(falloff);
        self.custom_amps = false;
        self.last_falloff = self.falloff.get();
        self.calculate_amplitudes();
    }

    pub fn set_detune(&mut self, amount: f32) {
        self.detune = amount.clamp(0.0, 1.0);
        self.update_ratios();
    }

    pub fn set_mode(&mut self, mode: HarmonicMode) {
        self.mode = mode;
        for (i, enabled) in self.enabled.iter_mut().enumerate() {
            // harmonic numbers are 1-indexed; the fundamental always sounds
            let number = i + 1;
            *enabled = match mode {
                HarmonicMode::All => true,
                HarmonicMode::Odd => i == 0 || number % 2 == 1,
                HarmonicMode::Even => i == 0 || number % 2 == 0,
            };
        }
        self.calculate_amplitudes();
    }

    /// Replace the automatic falloff law with explicit per-harmonic levels.
    /// Missing entries are zeroed; the vector is normalized to unit sum.
    pub fn set_amplitudes(&mut self, amps: &[f32]) {
        if amps.is_empty() {
            log::warn!("harmosc: ignoring empty amplitude vector");
            return;
        }
        self.custom_amps = true;
        let count = amps.len().min(self.num_harmonics);
        for i in 0..self.num_harmonics {
            let amp = if i < count { amps[i].clamp(0.0, 1.0) } else { 0.0 };
            self.amplitudes[i] = amp;
            self.enabled[i] = amp > 0.0;
        }
        self.normalize_amplitudes();
    }

    /// Redraw the random detune offsets from a new seed.
    pub fn reseed(&mut self, seed: u32) {
        self.rng = XorShift32::new(seed);
        self.generate_detune_offsets();
        self.update_ratios();
    }

    /// Phase reset (bang).
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f32 {
        self.phase as f32
    }

    pub fn process(&mut self, inputs: &HarmOscInputs, out: &mut [f32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            let freq = self.freq.resolve(inputs.freq, i);
            let falloff = self.falloff.resolve(inputs.falloff, i);

            // audio-rate falloff moves re-derive the amplitude set, but only
            // when the value actually changed
            if falloff != self.last_falloff {
                self.last_falloff = falloff;
                if !self.custom_amps {
                    self.falloff.set(falloff);
                    self.calculate_amplitudes();
                }
            }

            let mut sample = 0.0f32;
            for h in 0..self.num_harmonics {
                let amp = self.amplitudes[h];
                if amp > 0.0 {
                    let harmonic_phase = self.phase * self.ratios[h];
                    let harmonic_phase = harmonic_phase - harmonic_phase.floor();
                    let index = (harmonic_phase * LUT_SINE_SIZE as f64) as usize & LUT_SINE_MASK;
                    sample += LUT_SINE[index] * amp;
                }
            }
            *slot = sample;

            self.phase += freq as f64 * self.sr_inv;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
    }

    fn generate_detune_offsets(&mut self) {
        for (i, offset) in self.detune_offsets.iter_mut().enumerate() {
            *offset = if i == 0 {
                // the fundamental stays put
                0.0
            } else {
                self.rng.next_unit() * 100.0 - 50.0
            };
        }
    }

    fn update_ratios(&mut self) {
        for (i, ratio) in self.ratios.iter_mut().enumerate() {
            let harmonic_number = (i + 1) as f64;
            *ratio = if self.detune > 0.0 {
                let cents = (self.detune_offsets[i] * self.detune) as f64;
                harmonic_number * (cents / 1200.0).exp2()
            } else {
                harmonic_number
            };
        }
    }

    fn calculate_amplitudes(&mut self) {
        if self.custom_amps {
            for i in 0..self.num_harmonics {
                if !self.enabled[i] {
                    self.amplitudes[i] = 0.0;
                }
            }
            self.normalize_amplitudes();
            return;
        }

        let falloff = self.falloff.get();
        let top = self.num_harmonics as f32;
        for i in 0..self.num_harmonics {
            let number = (i + 1) as f32;
            let amp = if falloff == -1.0 {
                if i == 0 { 1.0 } else { 0.0 }
            } else if falloff == 1.0 {
                if i == self.num_harmonics - 1 { 1.0 } else { 0.0 }
            } else if falloff == 0.0 {
                1.0
            } else if falloff < 0.0 {
                // decay away from the fundamental
                number.powf(-(-falloff) * 3.0)
            } else {
                // decay away from the top harmonic
                let reversed = top - number + 1.0;
                reversed.powf(-falloff * 3.0)
            };
            self.amplitudes[i] = if self.enabled[i] { amp } else { 0.0 };
        }
        self.normalize_amplitudes();
    }

    fn normalize_amplitudes(&mut self) {
        let total: f32 = self.amplitudes.iter().sum();
        if total > 0.0 {
            for amp in &mut self.amplitudes {
                *amp /= total;
            }
        }
    }
}
