//! Wave-folding sine oscillator with phase warping.
//!
//! A clean sine is warped in phase (horizontal distortion) before passing
//! through one of three folding nonlinearities. An anti-aliasing guard backs
//! the fold amount off as the fundamental approaches Nyquist.

use crate::types::{DcBlocker, Input, Param, Smoothed, DENORMAL_THRESHOLD};

const MIN_FREQUENCY: f32 = 0.001;
const MAX_FREQUENCY: f32 = 20_000.0;

/// Folding nonlinearity.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoldAlgorithm {
    /// Iterative reflection at a shrinking threshold.
    #[default]
    Reflect,
    /// tanh soft saturation, drive scaled by fold amount.
    Tanh,
    /// Light reflection followed by soft saturation, blended by fold amount.
    Hybrid,
}

/// Phase-warp curve steepness.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarpMode {
    #[default]
    Symmetric,
    Asymmetric,
}

#[derive(Default)]
pub struct CycleFoldInputs<'a> {
    pub freq: Input<'a>,
    pub fold: Input<'a>,
    pub warp: Input<'a>,
}

pub struct CycleFold {
    phase: f64,
    sr: f32,
    sr_inv: f64,

    freq: Param,
    fold: Param,
    warp: Param,

    fold_smooth: Smoothed,
    warp_smooth: Smoothed,

    algorithm: FoldAlgorithm,
    warp_mode: WarpMode,
    antialiasing: bool,
    dc_blocking: bool,
    dc: DcBlocker,
}

impl CycleFold {
    pub fn new(sample_rate: f32) -> Self {
        let mut osc = Self {
            phase: 0.0,
            sr: sample_rate,
            sr_inv: 1.0 / sample_rate as f64,
            freq: Param::new(440.0, MIN_FREQUENCY, MAX_FREQUENCY),
            fold: Param::new(0.0, 0.0, 1.0),
            warp: Param::new(0.0, -1.0, 1.0),
            fold_smooth: Smoothed::new(0.0),
            warp_smooth: Smoothed::new(0.0),
            algorithm: FoldAlgorithm::default(),
            warp_mode: WarpMode::default(),
            antialiasing: true,
            dc_blocking: true,
            dc: DcBlocker::default(),
        };
        osc.set_sample_rate(sample_rate);
        osc
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sr = sample_rate;
        self.sr_inv = 1.0 / sample_rate as f64;
        self.fold_smooth.set_rate(0.01, sample_rate);
        self.warp_smooth.set_rate(0.01, sample_rate);
    }

    pub fn set_frequency(&mut self, hz: f32) {
        self.freq.set(hz);
    }

    pub fn set_fold(&mut self, amount: f32) {
        self.fold.set(amount);
    }

    pub fn set_warp(&mut self, amount: f32) {
        self.warp.set(amount);
    }

    pub fn set_algorithm(&mut self, algorithm: FoldAlgorithm) {
        self.algorithm = algorithm;
    }

    pub fn set_warp_mode(&mut self, mode: WarpMode) {
        self.warp_mode = mode;
    }

    pub fn set_antialiasing(&mut self, enabled: bool) {
        self.antialiasing = enabled;
    }

    /// Toggling DC blocking clears the filter memory.
    pub fn set_dc_blocking(&mut self, enabled: bool) {
        self.dc_blocking = enabled;
        self.dc.reset();
    }

    /// Phase reset (bang).
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f32 {
        self.phase as f32
    }

    pub fn process(&mut self, inputs: &CycleFoldInputs, out: &mut [f32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            let freq = self.freq.resolve(inputs.freq, i);
            let fold_target = self.fold.resolve(inputs.fold, i);
            let warp_target = self.warp.resolve(inputs.warp, i);

            let fold = self
                .fold_smooth
                .next(fold_target, inputs.fold.is_connected());
            let warp = self
                .warp_smooth
                .next(warp_target, inputs.warp.is_connected());

            let warped = warp_phase(self.phase as f32, warp, self.warp_mode);
            let sine = (warped * std::f32::consts::TAU).sin();
            let folded = self.fold_wave(sine, fold, freq);

            *slot = if self.dc_blocking {
                self.dc.process(folded)
            } else {
                folded
            };

            self.phase += freq as f64 * self.sr_inv;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            if self.phase < 0.0 {
                self.phase += 1.0;
            }
            if self.phase.abs() < DENORMAL_THRESHOLD as f64 {
                self.phase = 0.0;
            }
        }
    }

    fn fold_wave(&self, input: f32, fold_amount: f32, frequency: f32) -> f32 {
        let mut amount = fold_amount.max(0.0);

        // Folding adds harmonics roughly in proportion to the fold amount;
        // cap it so the top harmonics stay under Nyquist.
        if self.antialiasing && frequency > 20.0 {
            let nyquist = self.sr * 0.5;
            let max_harmonics = nyquist / frequency;
            amount = amount.min((max_harmonics / 10.0).min(1.0));
        }

        match self.algorithm {
            FoldAlgorithm::Reflect => {
                let threshold = (1.0 - amount * 0.99).max(0.01);
                let mut output = input;
                while output > threshold || output < -threshold {
                    if output > threshold {
                        output = 2.0 * threshold - output;
                    } else {
                        output = -2.0 * threshold - output;
                    }
                }
                output
            }
            FoldAlgorithm::Tanh => {
                if amount <= 0.0 {
                    return input;
                }
                let drive = 1.0 + amount * 8.0;
                (input * drive).tanh() / drive.tanh()
            }
            FoldAlgorithm::Hybrid => {
                let threshold = 1.0 - amount * 0.5;
                let mut reflected = input;
                if reflected > threshold {
                    reflected = threshold + (reflected - threshold) * 0.5;
                } else if reflected < -threshold {
                    reflected = -threshold + (reflected + threshold) * 0.5;
                }
                let drive = 1.0 + amount * 4.0;
                let soft = (reflected * drive).tanh() / drive.tanh();
                reflected * (1.0 - amount * 0.5) + soft * (amount * 0.5)
            }
        }
    }
}

/// Power-law phase remapping. Positive warp squeezes the waveform rightward,
/// negative leftward; asymmetric mode uses a steeper exponent range.
fn warp_phase(phase: f32, warp_amount: f32, mode: WarpMode) -> f32 {
    if warp_amount.abs() < 1e-4 {
        return phase;
    }
    match mode {
        WarpMode::Symmetric => {
            let curve = 1.0 + warp_amount.abs() * 3.0;
            if warp_amount > 0.0 {
                phase.powf(1.0 / curve)
            } else {
                1.0 - (1.0 - phase).powf(1.0 / curve)
            }
        }
        WarpMode::Asymmetric => {
            let curve = 1.0 + warp_amount.abs() * 5.0;
            if warp_amount > 0.0 {
                phase.powf(curve)
            } else {
                1.0 - (1.0 - phase).powf(curve)
            }
        }
    }
}
