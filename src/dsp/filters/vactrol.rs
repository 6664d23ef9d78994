//! Vactrol low-pass gate (VTL5C3-style).
//!
//! A simulated photoresistance decays from bright (low resistance) back to
//! dark after each trigger, and a CV input can hold the vactrol open
//! directly; the brighter of the two sources wins. Resistance maps to filter
//! cutoff through the RC relation, and also scales the output level the way
//! the physical part does, before an asymmetric tube-style saturation stage.

use crate::dsp::utils::map_range;
use crate::types::{Input, Param};

const MIN_RESISTANCE: f32 = 100.0; // ohms, fully bright
const MAX_RESISTANCE: f32 = 1_000_000.0; // ohms, dark
const CAPACITANCE: f32 = 47e-9;

/// Shape of the post-trigger resistance recovery.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseCurve {
    #[default]
    Exponential,
    Linear,
    Logarithmic,
}

/// Filter slope: one pole, or two cascaded for a steeper gate.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Poles {
    #[default]
    OnePole,
    TwoPole,
}

#[derive(Default)]
pub struct VactrolInputs<'a> {
    pub audio: Input<'a>,
    pub cv: Input<'a>,
}

pub struct Vactrol {
    sample_rate: f32,
    inv_sample_rate: f32,

    decay_time: Param,
    drive: Param,
    character: Param,

    poles: Poles,
    response: ResponseCurve,
    calibration: f32,
    temperature_drift: bool,

    triggered: bool,
    trigger_time: f32,
    resistance: f32,
    drift_phase: f32,

    filter_state: [f32; 2],
}

impl Vactrol {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            inv_sample_rate: 1.0 / sample_rate,
            decay_time: Param::new(0.15, 0.05, 0.5),
            drive: Param::new(0.7, 0.0, 1.0),
            character: Param::new(0.7, 0.01, 1.0),
            poles: Poles::default(),
            response: ResponseCurve::default(),
            calibration: 1.0,
            temperature_drift: false,
            triggered: false,
            trigger_time: 0.0,
            resistance: MAX_RESISTANCE,
            drift_phase: 0.0,
            filter_state: [0.0; 2],
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.inv_sample_rate = 1.0 / sample_rate;
    }

    pub fn set_decay(&mut self, seconds: f32) {
        self.decay_time.set(seconds);
    }

    pub fn set_poles(&mut self, poles: Poles) {
        self.poles = poles;
    }

    pub fn set_response(&mut self, response: ResponseCurve) {
        self.response = response;
    }

    /// Resistance scaling, 0.1..2.0.
    pub fn set_calibration(&mut self, calibration: f32) {
        self.calibration = calibration.clamp(0.1, 2.0);
    }

    pub fn set_temperature_drift(&mut self, enabled: bool) {
        self.temperature_drift = enabled;
    }

    pub fn set_drive(&mut self, drive: f32) {
        self.drive.set(drive);
    }

    /// Asymmetry of the tube stage; lower values soften negative peaks more.
    pub fn set_character(&mut self, character: f32) {
        self.character.set(character);
    }

    /// Ping the gate: resistance snaps bright and decays back to dark.
    /// Filter memory is cleared for a clean retrigger.
    pub fn trigger(&mut self) {
        self.triggered = true;
        self.trigger_time = 0.0;
        self.filter_state = [0.0; 2];
        log::debug!("vactrol: triggered, decay {:.3}s", self.decay_time.get());
    }

    pub fn resistance(&self) -> f32 {
        self.resistance
    }

    pub fn process(&mut self, inputs: &VactrolInputs, out: &mut [f32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            let audio = inputs.audio.get(i).unwrap_or(0.0);

            let envelope_resistance = if self.triggered {
                self.trigger_time += self.inv_sample_rate;
                self.envelope_resistance(self.trigger_time)
            } else {
                MAX_RESISTANCE
            };

            let cv_resistance = match inputs.cv.get(i) {
                Some(cv) => {
                    let cv = cv.clamp(0.0, 1.0);
                    MAX_RESISTANCE - cv * (MAX_RESISTANCE - MIN_RESISTANCE)
                }
                None => MAX_RESISTANCE,
            };

            // the brighter (lower-resistance) source controls the gate
            self.resistance = envelope_resistance.min(cv_resistance);

            let mut calibrated = self.resistance * self.calibration;
            if self.temperature_drift {
                self.drift_phase += 0.0001;
                calibrated *= 1.0 + 0.02 * self.drift_phase.sin();
            }

            let cutoff = resistance_to_cutoff(calibrated);
            let effective_cutoff = match self.poles {
                Poles::OnePole => cutoff,
                Poles::TwoPole => (cutoff * 0.8).clamp(20.0, 20_000.0),
            };

            let mut filtered = one_pole(
                audio,
                effective_cutoff,
                &mut self.filter_state[0],
                self.sample_rate,
            );
            if self.poles == Poles::TwoPole {
                filtered = one_pole(
                    filtered,
                    effective_cutoff,
                    &mut self.filter_state[1],
                    self.sample_rate,
                );
            }

            // the physical device attenuates as it darkens
            let amplitude = map_range(self.resistance, MIN_RESISTANCE, MAX_RESISTANCE, 1.0, 0.0);
            filtered *= amplitude.clamp(0.0, 1.0);

            *slot = tube_saturation(filtered, self.drive.get(), self.character.get());
        }
    }

    fn envelope_resistance(&self, elapsed: f32) -> f32 {
        let tau = self.decay_time.get();
        let decay_factor = match self.response {
            ResponseCurve::Exponential => (-elapsed / tau).exp(),
            ResponseCurve::Linear => (1.0 - elapsed / tau).max(0.0),
            ResponseCurve::Logarithmic => {
                let t = elapsed / tau;
                if t >= 1.0 {
                    0.0
                } else {
                    1.0 - (1.0 + t * 9.0).log10()
                }
            }
        };
        MAX_RESISTANCE - (MAX_RESISTANCE - MIN_RESISTANCE) * decay_factor
    }
}

/// fc = 1 / (2 pi R C), clamped to the audio band.
fn resistance_to_cutoff(resistance: f32) -> f32 {
    let cutoff = 1.0 / (std::f32::consts::TAU * resistance * CAPACITANCE);
    cutoff.clamp(20.0, 20_000.0)
}

fn one_pole(input: f32, cutoff: f32, state: &mut f32, sample_rate: f32) -> f32 {
    let alpha = 1.0 - (-std::f32::consts::TAU * cutoff / sample_rate).exp();
    let alpha = alpha.clamp(0.0, 1.0);
    *state += alpha * (input - *state);
    *state
}

/// Asymmetric tanh saturation: the character control scales the drive seen by
/// negative excursions only.
fn tube_saturation(input: f32, drive: f32, character: f32) -> f32 {
    if drive <= 0.0 {
        return input;
    }
    let scaled_drive = 1.0 + drive * 9.0;
    let output = if input >= 0.0 {
        (input * scaled_drive).tanh() / scaled_drive
    } else {
        let negative_drive = scaled_drive * character;
        (input * negative_drive).tanh() / negative_drive
    };
    output * (1.0 - drive * 0.3)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44_100.0;

    #[test]
    fn resistance_maps_to_audio_band_cutoffs() {
        // bright: 100 ohm, 47nF -> ~33.9 kHz, clamped to 20 kHz
        assert_eq!(resistance_to_cutoff(MIN_RESISTANCE), 20_000.0);
        // dark: 1 Mohm -> ~3.4 Hz, clamped to 20 Hz
        assert_eq!(resistance_to_cutoff(MAX_RESISTANCE), 20.0);
        // mid: 10 kohm -> ~339 Hz
        let mid = resistance_to_cutoff(10_000.0);
        assert!((mid - 338.6).abs() < 2.0);
    }

    #[test]
    fn untriggered_gate_is_dark_and_closed() {
        let mut vactrol = Vactrol::new(SR);
        let audio = vec![0.5f32; 512];
        let inputs = VactrolInputs {
            audio: Input::Stream(&audio),
            ..Default::default()
        };
        let mut out = [0.0f32; 512];
        vactrol.process(&inputs, &mut out);
        // amplitude term is zero when fully dark
        for &s in &out {
            assert!(s.abs() < 1e-4);
        }
    }

    #[test]
    fn trigger_opens_then_decays_dark() {
        let mut vactrol = Vactrol::new(SR);
        vactrol.set_decay(0.05);
        vactrol.trigger();
        let audio = vec![0.5f32; 512];
        let inputs = VactrolInputs {
            audio: Input::Stream(&audio),
            ..Default::default()
        };
        let mut out = [0.0f32; 512];
        vactrol.process(&inputs, &mut out);
        let early_peak = out.iter().fold(0.0f32, |a, &v| a.max(v.abs()));
        assert!(early_peak > 0.1, "gate should open after trigger");

        // run well past the decay time; the gate closes again
        for _ in 0..40 {
            vactrol.process(&inputs, &mut out);
        }
        let late_peak = out.iter().fold(0.0f32, |a, &v| a.max(v.abs()));
        assert!(late_peak < early_peak * 0.1, "gate should close: {late_peak}");
    }

    #[test]
    fn cv_holds_the_gate_open() {
        let mut vactrol = Vactrol::new(SR);
        let audio = vec![0.4f32; 512];
        let cv = vec![1.0f32; 512];
        let inputs = VactrolInputs {
            audio: Input::Stream(&audio),
            cv: Input::Stream(&cv),
        };
        let mut out = [0.0f32; 512];
        for _ in 0..20 {
            vactrol.process(&inputs, &mut out);
        }
        assert!(vactrol.resistance() == MIN_RESISTANCE);
        let peak = out.iter().fold(0.0f32, |a, &v| a.max(v.abs()));
        assert!(peak > 0.1, "CV at 1.0 should keep the gate open");
    }

    #[test]
    fn brighter_source_wins() {
        let mut vactrol = Vactrol::new(SR);
        vactrol.set_decay(0.5);
        vactrol.trigger();
        let audio = vec![0.0f32; 64];
        let cv = vec![0.2f32; 64];
        let inputs = VactrolInputs {
            audio: Input::Stream(&audio),
            cv: Input::Stream(&cv),
        };
        let mut out = [0.0f32; 64];
        vactrol.process(&inputs, &mut out);
        // right after a trigger the envelope is brighter than a 0.2 CV
        let cv_resistance = MAX_RESISTANCE - 0.2 * (MAX_RESISTANCE - MIN_RESISTANCE);
        assert!(vactrol.resistance() < cv_resistance);
    }

    #[test]
    fn response_curves_order_at_midpoint() {
        let mut vactrol = Vactrol::new(SR);
        vactrol.set_decay(0.1);
        let half = 0.05;
        vactrol.set_response(ResponseCurve::Exponential);
        let exp_r = vactrol.envelope_resistance(half);
        vactrol.set_response(ResponseCurve::Linear);
        let lin_r = vactrol.envelope_resistance(half);
        vactrol.set_response(ResponseCurve::Logarithmic);
        let log_r = vactrol.envelope_resistance(half);
        // halfway through: the exponential curve still holds the most
        // brightness, the logarithmic one has darkened furthest
        assert!(exp_r < lin_r);
        assert!(log_r > lin_r);
    }

    #[test]
    fn tube_saturation_is_asymmetric() {
        let positive = tube_saturation(0.8, 0.7, 0.3);
        let negative = tube_saturation(-0.8, 0.7, 0.3);
        assert!(
            (positive.abs() - negative.abs()).abs() > 1e-3,
            "character < 1 must treat polarities differently"
        );
        // zero drive is a clean pass-through
        assert_eq!(tube_saturation(0.5, 0.0, 0.5), 0.5);
    }

    #[test]
    fn two_pole_mode_filters_harder() {
        let make_output = |poles: Poles| {
            let mut vactrol = Vactrol::new(SR);
            vactrol.set_poles(poles);
            vactrol.set_drive(0.0);
            vactrol.set_decay(0.5);
            vactrol.trigger();
            // high-frequency content through a freshly opened gate
            let audio: Vec<f32> = (0..2048)
                .map(|i| (std::f32::consts::TAU * 9000.0 * i as f32 / SR).sin())
                .collect();
            let inputs = VactrolInputs {
                audio: Input::Stream(&audio),
                ..Default::default()
            };
            let mut out = vec![0.0f32; 2048];
            vactrol.process(&inputs, &mut out);
            (out[1024..].iter().map(|v| v * v).sum::<f32>() / 1024.0).sqrt()
        };
        let one = make_output(Poles::OnePole);
        let two = make_output(Poles::TwoPole);
        assert!(two < one, "two poles should attenuate more: {two} vs {one}");
    }
}
