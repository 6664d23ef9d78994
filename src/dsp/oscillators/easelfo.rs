//! LFO shaped by animation easing curves.
//!
//! The phase ramp is pushed through one of twelve easing functions before
//! being mapped to a bipolar output, giving modulation contours that are
//! more deliberate than the usual sine/triangle set.

use crate::dsp::utils::wrap;
use crate::types::{Input, Param};

/// Selectable easing curve. Dispatch is a closed match over pure functions
/// from the `simple_easing` crate.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EasingCurve {
    #[default]
    Linear,
    SineIn,
    SineOut,
    SineInOut,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    ExpoIn,
    ExpoOut,
}

impl EasingCurve {
    pub const COUNT: usize = 12;

    /// Selector values arriving on the curve input are truncated to an index.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => EasingCurve::Linear,
            1 => EasingCurve::SineIn,
            2 => EasingCurve::SineOut,
            3 => EasingCurve::SineInOut,
            4 => EasingCurve::QuadIn,
            5 => EasingCurve::QuadOut,
            6 => EasingCurve::QuadInOut,
            7 => EasingCurve::CubicIn,
            8 => EasingCurve::CubicOut,
            9 => EasingCurve::CubicInOut,
            10 => EasingCurve::ExpoIn,
            _ => EasingCurve::ExpoOut,
        }
    }

    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        match self {
            EasingCurve::Linear => simple_easing::linear(t),
            EasingCurve::SineIn => simple_easing::sine_in(t),
            EasingCurve::SineOut => simple_easing::sine_out(t),
            EasingCurve::SineInOut => simple_easing::sine_in_out(t),
            EasingCurve::QuadIn => simple_easing::quad_in(t),
            EasingCurve::QuadOut => simple_easing::quad_out(t),
            EasingCurve::QuadInOut => simple_easing::quad_in_out(t),
            EasingCurve::CubicIn => simple_easing::cubic_in(t),
            EasingCurve::CubicOut => simple_easing::cubic_out(t),
            EasingCurve::CubicInOut => simple_easing::cubic_in_out(t),
            EasingCurve::ExpoIn => simple_easing::expo_in(t),
            EasingCurve::ExpoOut => simple_easing::expo_out(t),
        }
    }
}

/// Phase transform applied before easing.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoMode {
    #[default]
    Normal,
    /// Fold the ramp into a triangle; frequency is halved so one full
    /// up-down sweep keeps the nominal cycle time.
    Mirror,
    /// Run the ramp backward.
    Reverse,
}

#[derive(Default)]
pub struct EaseLfoInputs<'a> {
    pub freq: Input<'a>,
    pub curve: Input<'a>,
    pub phase_offset: Input<'a>,
}

pub struct EaseLfo {
    phase: f64,
    sr_inv: f64,

    freq: Param,
    phase_offset: Param,
    curve: EasingCurve,
    mode: LfoMode,
    phase_lock: bool,
    smoothing: f32,

    prev_freq: f32,
    prev_curve: f32,
}

impl EaseLfo {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            sr_inv: 1.0 / sample_rate as f64,
            freq: Param::new(1.0, 0.0, 20_000.0),
            phase_offset: Param::new(0.0, 0.0, 1.0),
            curve: EasingCurve::default(),
            mode: LfoMode::default(),
            phase_lock: false,
            smoothing: 0.0,
            prev_freq: 1.0,
            prev_curve: 0.0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sr_inv = 1.0 / sample_rate as f64;
    }

    pub fn set_frequency(&mut self, hz: f32) {
        self.freq.set(hz);
    }

    pub fn set_curve(&mut self, curve: EasingCurve) {
        self.curve = curve;
    }

    pub fn set_mode(&mut self, mode: LfoMode) {
        self.mode = mode;
    }

    /// Offsets outside [0, 1) wrap rather than clamp, so sweeping the offset
    /// keeps rotating the cycle instead of pinning at the edges.
    pub fn set_phase_offset(&mut self, offset: f32) {
        self.phase_offset.set(wrap(0.0..1.0, offset));
    }

    /// Quantize the output phase to 16 discrete steps.
    pub fn set_phase_lock(&mut self, enabled: bool) {
        self.phase_lock = enabled;
    }

    pub fn set_smoothing(&mut self, amount: f32) {
        self.smoothing = amount.clamp(0.0, 1.0);
    }

    /// Phase reset (bang).
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f32 {
        self.phase as f32
    }

    pub fn process(&mut self, inputs: &EaseLfoInputs, out: &mut [f32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            let mut freq = self.freq.resolve(inputs.freq, i);
            let mut curve_val = match inputs.curve.get(i) {
                Some(v) => v.clamp(0.0, 11.0),
                None => self.curve as usize as f32,
            };

            if self.smoothing > 0.0 {
                let factor = self.smoothing * 0.01;
                freq = self.prev_freq + factor * (freq - self.prev_freq);
                curve_val = self.prev_curve + factor * (curve_val - self.prev_curve);
                self.prev_freq = freq;
                self.prev_curve = curve_val;
            }

            let curve = EasingCurve::from_index(curve_val.clamp(0.0, 11.0) as usize);
            let phase_offset = self.phase_offset.resolve(inputs.phase_offset, i);

            if self.mode == LfoMode::Mirror {
                freq *= 0.5;
            }

            self.phase += freq as f64 * self.sr_inv;
            while self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            while self.phase < 0.0 {
                self.phase += 1.0;
            }

            let mut final_phase = self.phase as f32 + phase_offset;
            while final_phase >= 1.0 {
                final_phase -= 1.0;
            }
            while final_phase < 0.0 {
                final_phase += 1.0;
            }

            final_phase = match self.mode {
                LfoMode::Normal => final_phase,
                LfoMode::Mirror => {
                    if final_phase <= 0.5 {
                        final_phase * 2.0
                    } else {
                        (1.0 - final_phase) * 2.0
                    }
                }
                LfoMode::Reverse => 1.0 - final_phase,
            };

            if self.phase_lock {
                final_phase = (final_phase * 16.0).floor() / 16.0;
            }

            *slot = curve.apply(final_phase) * 2.0 - 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 1000.0;

    #[test]
    fn easing_curves_hit_their_endpoints() {
        for index in 0..EasingCurve::COUNT {
            let curve = EasingCurve::from_index(index);
            assert!(curve.apply(0.0).abs() < 1e-6, "{curve:?} at 0");
            assert!((curve.apply(1.0) - 1.0).abs() < 1e-6, "{curve:?} at 1");
        }
    }

    #[test]
    fn output_is_bipolar() {
        let mut lfo = EaseLfo::new(SR);
        lfo.set_frequency(7.0);
        lfo.set_curve(EasingCurve::CubicInOut);
        let mut out = [0.0f32; 2048];
        lfo.process(&EaseLfoInputs::default(), &mut out);
        let min = out.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = out.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!(min >= -1.0 && min < -0.95);
        assert!(max <= 1.0 && max > 0.95);
    }

    #[test]
    fn linear_mode_tracks_phase() {
        let mut lfo = EaseLfo::new(SR);
        lfo.set_frequency(1.0);
        let mut out = [0.0f32; 500];
        lfo.process(&EaseLfoInputs::default(), &mut out);
        // at 1 Hz / 1 kHz, sample 499 sits at phase 0.5 -> output 0.0
        assert!(out[499].abs() < 0.01);
    }

    #[test]
    fn mirror_mode_folds_into_triangle() {
        let mut lfo = EaseLfo::new(SR);
        lfo.set_frequency(1.0);
        lfo.set_mode(LfoMode::Mirror);
        let mut out = [0.0f32; 2000];
        lfo.process(&EaseLfoInputs::default(), &mut out);
        // frequency halves, so the peak lands mid-buffer; both ends sit low
        let peak = out.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!(peak > 0.95);
        assert!(out[0] < -0.95);
        assert!(out[1999] < -0.9);
    }

    #[test]
    fn reverse_mode_starts_high() {
        let mut lfo = EaseLfo::new(SR);
        lfo.set_frequency(1.0);
        lfo.set_mode(LfoMode::Reverse);
        let mut out = [0.0f32; 8];
        lfo.process(&EaseLfoInputs::default(), &mut out);
        assert!(out[0] > 0.95);
    }

    #[test]
    fn phase_lock_quantizes_to_sixteen_levels() {
        let mut lfo = EaseLfo::new(SR);
        lfo.set_frequency(1.0);
        lfo.set_phase_lock(true);
        let mut out = [0.0f32; 1000];
        lfo.process(&EaseLfoInputs::default(), &mut out);
        let mut levels: Vec<i32> = out.iter().map(|v| (v * 8000.0).round() as i32).collect();
        levels.sort_unstable();
        levels.dedup();
        assert!(levels.len() <= 16, "expected <= 16 levels, got {}", levels.len());
    }

    #[test]
    fn curve_stream_overrides_attribute() {
        let mut lfo = EaseLfo::new(SR);
        lfo.set_frequency(1.0);
        lfo.set_curve(EasingCurve::ExpoIn);
        // stream selects linear (0); halfway through the cycle output is 0
        let curve_stream = vec![0.0f32; 500];
        let inputs = EaseLfoInputs {
            curve: Input::Stream(&curve_stream),
            ..Default::default()
        };
        let mut out = [0.0f32; 500];
        lfo.process(&inputs, &mut out);
        assert!(out[499].abs() < 0.01);
    }

    #[test]
    fn bang_resets_phase() {
        let mut lfo = EaseLfo::new(SR);
        lfo.set_frequency(10.0);
        let mut out = [0.0f32; 64];
        lfo.process(&EaseLfoInputs::default(), &mut out);
        assert!(lfo.phase() > 0.0);
        lfo.reset_phase();
        assert_eq!(lfo.phase(), 0.0);
    }
}
