//! SSM2044-style 4-pole low-pass filter.
//!
//! Zero-delay-feedback topology: the integrator gain is pre-warped through a
//! tangent mapping each sample, and resonance feeds the saturated output of
//! the fourth stage back into the input. Self-oscillation falls out of the
//! feedback path at high resonance rather than being synthesized.

use crate::types::{flush_denormal, Input, Param};

const RESONANCE_SCALE: f32 = 4.0;
const INPUT_DRIVE: f32 = 1.5;
const FEEDBACK_DRIVE: f32 = 2.0;

/// Saturation voicing for the input stage.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Character {
    Clean,
    #[default]
    Vintage,
    Aggressive,
}

impl Character {
    fn drive_scale(self) -> f32 {
        match self {
            Character::Clean => 0.5,
            Character::Vintage => 1.0,
            Character::Aggressive => 2.0,
        }
    }
}

#[derive(Default)]
pub struct Ssm2044Inputs<'a> {
    pub audio: Input<'a>,
    pub cutoff: Input<'a>,
    pub resonance: Input<'a>,
    pub gain: Input<'a>,
}

pub struct Ssm2044 {
    sr: f32,
    sr_inv: f32,

    cutoff: Param,
    resonance: Param,
    gain: Param,

    character: Character,
    self_oscillation: bool,
    warmth: f32,
    resonance_compensation: bool,

    state: [f32; 4],
    feedback: f32,
}

impl Ssm2044 {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sr: sample_rate,
            sr_inv: 1.0 / sample_rate,
            cutoff: Param::new(1000.0, 20.0, 20_000.0),
            resonance: Param::new(0.5, 0.0, 4.0),
            gain: Param::new(1.0, 0.0, 4.0),
            character: Character::default(),
            self_oscillation: true,
            warmth: 0.5,
            resonance_compensation: true,
            state: [0.0; 4],
            feedback: 0.0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sr = sample_rate;
        self.sr_inv = 1.0 / sample_rate;
    }

    pub fn set_cutoff(&mut self, hz: f32) {
        self.cutoff.set(hz);
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance.set(resonance);
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain.set(gain);
    }

    pub fn set_character(&mut self, character: Character) {
        self.character = character;
    }

    /// Disabling self-oscillation backs the feedback gain off by 20%.
    pub fn set_self_oscillation(&mut self, enabled: bool) {
        self.self_oscillation = enabled;
    }

    /// Scales the feedback saturation drive (0..1).
    pub fn set_warmth(&mut self, warmth: f32) {
        self.warmth = warmth.clamp(0.0, 1.0);
    }

    /// Offsets the level increase that resonance otherwise causes.
    pub fn set_resonance_compensation(&mut self, enabled: bool) {
        self.resonance_compensation = enabled;
    }

    /// Clear all filter memory.
    pub fn reset(&mut self) {
        self.state = [0.0; 4];
        self.feedback = 0.0;
    }

    pub fn process(&mut self, inputs: &Ssm2044Inputs, out: &mut [f32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            let audio = inputs.audio.get(i).unwrap_or(0.0);
            let cutoff = self.cutoff.resolve(inputs.cutoff, i);
            let resonance = self.resonance.resolve(inputs.resonance, i);
            let gain = self.gain.resolve(inputs.gain, i);

            *slot = flush_denormal(self.tick(audio, cutoff, resonance, gain));
        }
    }

    fn tick(&mut self, input: f32, cutoff: f32, resonance: f32, gain: f32) -> f32 {
        let (g, k) = self.coefficients(cutoff, resonance);

        let drive = INPUT_DRIVE * self.character.drive_scale();
        let saturated_input = soft_saturate(input * gain, drive);

        let feedback_drive = FEEDBACK_DRIVE * self.warmth;
        let saturated_feedback = soft_saturate(self.feedback, feedback_drive);

        let k = if self.self_oscillation { k } else { k * 0.8 };
        let fb_input = saturated_input + k * saturated_feedback;

        let stage1 = self.state[0] + g * (fb_input - self.state[0]);
        let stage2 = self.state[1] + g * (stage1 - self.state[1]);
        let stage3 = self.state[2] + g * (stage2 - self.state[2]);
        let stage4 = self.state[3] + g * (stage3 - self.state[3]);

        self.state[0] = flush_denormal(stage1);
        self.state[1] = flush_denormal(stage2);
        self.state[2] = flush_denormal(stage3);
        self.state[3] = flush_denormal(stage4);
        self.feedback = stage4;

        stage4
    }

    fn coefficients(&self, cutoff: f32, resonance: f32) -> (f32, f32) {
        let cutoff = cutoff.clamp(20.0, self.sr * 0.45);
        let omega = std::f32::consts::TAU * cutoff;
        let warped = (omega * self.sr_inv * 0.5).tan();
        // g must stay below 1.0 for the integrator cascade to be stable
        let g = (warped / (1.0 + warped)).clamp(0.0, 0.99);

        let mut k = resonance * RESONANCE_SCALE;
        if self.resonance_compensation {
            k *= 1.0 / (1.0 + resonance * 0.3);
        }
        (g, k)
    }
}

/// tanh saturation with drive compensation so gain structure stays level.
fn soft_saturate(input: f32, drive: f32) -> f32 {
    if drive <= 0.0 {
        return input;
    }
    (input * drive).tanh() / drive
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44_100.0;

    fn drive_blocks(filter: &mut Ssm2044, input_value: f32, blocks: usize) -> f32 {
        let input = vec![input_value; 512];
        let mut out = [0.0f32; 512];
        let mut last_peak = 0.0f32;
        for _ in 0..blocks {
            let inputs = Ssm2044Inputs {
                audio: Input::Stream(&input),
                ..Default::default()
            };
            filter.process(&inputs, &mut out);
            last_peak = out.iter().fold(0.0f32, |acc, &v| acc.max(v.abs()));
        }
        last_peak
    }

    #[test]
    fn integrator_gain_stays_below_one() {
        let filter = Ssm2044::new(SR);
        for cutoff in [20.0, 1000.0, 20_000.0, 44_100.0] {
            let (g, _) = filter.coefficients(cutoff, 0.0);
            assert!(g < 1.0, "cutoff {cutoff}: g = {g}");
            assert!(g >= 0.0);
        }
    }

    #[test]
    fn passes_dc_at_unity_when_open() {
        let mut filter = Ssm2044::new(SR);
        filter.set_cutoff(20_000.0);
        filter.set_resonance(0.0);
        let peak = drive_blocks(&mut filter, 0.5, 40);
        // tanh input stage compresses slightly below the raw level
        assert!(peak > 0.4 && peak <= 0.55, "settled DC peak {peak}");
    }

    #[test]
    fn attenuates_above_cutoff() {
        let mut filter = Ssm2044::new(SR);
        filter.set_cutoff(100.0);
        filter.set_resonance(0.0);
        // 5 kHz sine through a 100 Hz 4-pole low-pass
        let mut input = vec![0.0f32; 4096];
        for (i, v) in input.iter_mut().enumerate() {
            *v = (std::f32::consts::TAU * 5000.0 * i as f32 / SR).sin() * 0.5;
        }
        let inputs = Ssm2044Inputs {
            audio: Input::Stream(&input),
            ..Default::default()
        };
        let mut out = vec![0.0f32; 4096];
        filter.process(&inputs, &mut out);
        let out_rms =
            (out[2048..].iter().map(|v| v * v).sum::<f32>() / 2048.0).sqrt();
        let in_rms = 0.5 / 2.0f32.sqrt();
        assert!(
            out_rms < in_rms * 0.05,
            "5kHz should be >26dB down: {out_rms} vs {in_rms}"
        );
    }

    #[test]
    fn bounded_for_bounded_input_at_high_resonance() {
        let mut filter = Ssm2044::new(SR);
        filter.set_cutoff(2000.0);
        filter.set_resonance(4.0);
        let mut peak = 0.0f32;
        let mut input = vec![0.0f32; 512];
        let mut out = [0.0f32; 512];
        for block in 0..200 {
            for (i, v) in input.iter_mut().enumerate() {
                let n = (block * 512 + i) as f32;
                *v = (std::f32::consts::TAU * 220.0 * n / SR).sin();
            }
            let inputs = Ssm2044Inputs {
                audio: Input::Stream(&input),
                ..Default::default()
            };
            filter.process(&inputs, &mut out);
            peak = out.iter().fold(peak, |acc, &v| acc.max(v.abs()));
            assert!(peak.is_finite());
        }
        assert!(peak < 10.0, "runaway resonance: {peak}");
    }

    #[test]
    fn stays_silent_on_silence_at_moderate_resonance() {
        let mut filter = Ssm2044::new(SR);
        filter.set_cutoff(1000.0);
        filter.set_resonance(2.0);
        let peak = drive_blocks(&mut filter, 0.0, 100);
        assert_eq!(peak, 0.0);
    }

    #[test]
    fn self_oscillation_sustains_after_excitation() {
        let mut filter = Ssm2044::new(SR);
        filter.set_cutoff(1000.0);
        filter.set_resonance(4.0);
        filter.set_resonance_compensation(false);
        // kick the filter with one block of impulse
        let mut kick = vec![0.0f32; 512];
        kick[0] = 1.0;
        let inputs = Ssm2044Inputs {
            audio: Input::Stream(&kick),
            ..Default::default()
        };
        let mut out = [0.0f32; 512];
        filter.process(&inputs, &mut out);
        // then let it ring on silence
        let ring = drive_blocks(&mut filter, 0.0, 100);
        assert!(ring > 0.01, "expected sustained oscillation, got {ring}");
        assert!(ring < 10.0);
    }

    #[test]
    fn reset_clears_all_memory() {
        let mut filter = Ssm2044::new(SR);
        drive_blocks(&mut filter, 0.8, 4);
        filter.reset();
        assert_eq!(filter.state, [0.0; 4]);
        assert_eq!(filter.feedback, 0.0);
        let peak = drive_blocks(&mut filter, 0.0, 2);
        assert_eq!(peak, 0.0);
    }

    #[test]
    fn character_scales_input_drive() {
        assert!(Character::Clean.drive_scale() < Character::Vintage.drive_scale());
        assert!(Character::Vintage.drive_scale() < Character::Aggressive.drive_scale());
    }
}
