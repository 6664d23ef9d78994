//! Function-generator envelope modeled on an analog slew integrator.
//!
//! A rising edge on the trigger input starts the integrator rising from its
//! current value; at the top it unconditionally falls, and at the bottom it
//! either idles or loops. Rise and fall rates are shaped by a single
//! linearity control spanning exponential to logarithmic response.

use crate::types::{Input, Param, RisingEdge};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Stage {
    #[default]
    Idle,
    Rising,
    Falling,
}

#[derive(Default)]
pub struct SlewEnvInputs<'a> {
    pub trigger: Input<'a>,
    pub loop_mode: Input<'a>,
    pub rise: Input<'a>,
    pub fall: Input<'a>,
    pub linearity: Input<'a>,
}

pub struct SlewEnv {
    sample_rate: f32,

    rise: Param,
    fall: Param,
    linearity: Param,

    stage: Stage,
    value: f32,
    amplitude: f32,
    loop_enabled: bool,
    edge: RisingEdge,
}

impl SlewEnv {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            rise: Param::new(0.1, 0.001, 1.0),
            fall: Param::new(0.1, 0.001, 1.0),
            linearity: Param::new(0.0, -1.0, 1.0),
            stage: Stage::Idle,
            value: 0.0,
            amplitude: 1.0,
            loop_enabled: false,
            edge: RisingEdge::default(),
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Normalized rise time; 0.1 maps to one second.
    pub fn set_rise(&mut self, time: f32) {
        self.rise.set(time);
    }

    pub fn set_fall(&mut self, time: f32) {
        self.fall.set(time);
    }

    /// -1 = exponential, 0 = linear, 1 = logarithmic.
    pub fn set_linearity(&mut self, linearity: f32) {
        self.linearity.set(linearity);
    }

    /// Enabling looping from the off state auto-triggers at full amplitude.
    pub fn set_looping(&mut self, enabled: bool) {
        let was_enabled = self.loop_enabled;
        self.loop_enabled = enabled;
        if enabled && !was_enabled {
            self.trigger(1.0);
        }
    }

    /// Start rising from the current integrator value; the trigger amplitude
    /// scales the output until the next trigger.
    pub fn trigger(&mut self, amplitude: f32) {
        self.stage = Stage::Rising;
        self.amplitude = amplitude.clamp(0.0, 10.0);
        log::debug!("slewenv: triggered at amplitude {:.3}", self.amplitude);
    }

    pub fn is_idle(&self) -> bool {
        self.stage == Stage::Idle
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn process(&mut self, inputs: &SlewEnvInputs, out: &mut [f32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            if let Some(amplitude) = self.edge.detect(inputs.trigger.get(i).unwrap_or(0.0)) {
                self.trigger(amplitude);
            }

            if let Some(loop_value) = inputs.loop_mode.get(i) {
                self.loop_enabled = loop_value != 0.0;
            }

            let rise = self.rise.resolve(inputs.rise, i);
            let fall = self.fall.resolve(inputs.fall, i);
            let linearity = self.linearity.resolve(inputs.linearity, i);

            self.step(rise, fall, linearity);
            *slot = self.value * self.amplitude;
        }
    }

    fn step(&mut self, rise: f32, fall: f32, linearity: f32) {
        if self.stage == Stage::Idle {
            return;
        }

        // normalized times map to seconds: 0.1 -> 1s, 1.0 -> 10s
        let rise_seconds = (rise * 10.0).max(0.01);
        let fall_seconds = (fall * 10.0).max(0.01);
        let rise_rate = 1.0 / (rise_seconds * self.sample_rate);
        let fall_rate = 1.0 / (fall_seconds * self.sample_rate);

        match self.stage {
            Stage::Rising => {
                let mut increment = rise_rate;
                if linearity < -0.001 {
                    let progress = self.value;
                    let shaping = (-(-linearity) * 5.0 * progress).exp();
                    increment *= shaping * (1.0 + -linearity * 3.0);
                } else if linearity > 0.001 {
                    let progress = self.value;
                    increment *= (0.1 + progress * 0.9) * (1.0 + linearity * 2.0);
                }

                self.value += increment;
                if self.value >= 1.0 {
                    self.value = 1.0;
                    // reaching the top always tips over into the fall
                    self.stage = Stage::Falling;
                }
            }
            Stage::Falling => {
                let mut decrement = fall_rate;
                if linearity < -0.001 {
                    let progress = 1.0 - self.value;
                    let shaping = (-(-linearity) * 5.0 * progress).exp();
                    decrement *= shaping * (1.0 + -linearity * 3.0);
                } else if linearity > 0.001 {
                    let progress = self.value;
                    decrement *= (0.1 + (1.0 - progress) * 0.9) * (1.0 + linearity * 2.0);
                }

                self.value -= decrement;
                if self.value <= 0.0 {
                    self.value = 0.0;
                    self.stage = if self.loop_enabled {
                        Stage::Rising
                    } else {
                        Stage::Idle
                    };
                }
            }
            Stage::Idle => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 1000.0;

    fn run(env: &mut SlewEnv, samples: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; samples];
        env.process(&SlewEnvInputs::default(), &mut out);
        out
    }

    #[test]
    fn idle_until_triggered() {
        let mut env = SlewEnv::new(SR);
        let out = run(&mut env, 128);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(env.is_idle());
    }

    #[test]
    fn linear_rise_takes_the_configured_time() {
        let mut env = SlewEnv::new(SR);
        env.set_rise(0.1); // one second
        env.set_fall(0.1);
        env.trigger(1.0);
        let out = run(&mut env, 1000);
        // after one second of rising the integrator sits at the top
        assert!((out[999] - 1.0).abs() < 2e-3, "top at {}", out[999]);
    }

    #[test]
    fn reaching_the_top_flips_to_falling() {
        let mut env = SlewEnv::new(SR);
        env.set_rise(0.001); // 10ms floor
        env.set_fall(0.1);
        env.trigger(1.0);
        let out = run(&mut env, 200);
        let peak = out.iter().cloned().fold(0.0f32, f32::max);
        assert!((peak - 1.0).abs() < 1e-3);
        // past the peak the output is already descending
        assert!(out[199] < peak);
    }

    #[test]
    fn one_shot_returns_to_idle() {
        let mut env = SlewEnv::new(SR);
        env.set_rise(0.001);
        env.set_fall(0.001);
        env.trigger(1.0);
        run(&mut env, 100);
        assert!(env.is_idle());
        assert_eq!(env.value(), 0.0);
    }

    #[test]
    fn loop_mode_cycles_forever() {
        let mut env = SlewEnv::new(SR);
        env.set_rise(0.001);
        env.set_fall(0.001);
        env.set_looping(true); // also auto-triggers
        let out = run(&mut env, 1000);
        assert!(!env.is_idle());
        // several complete cycles: output must touch both rails repeatedly
        let peaks = out.windows(3).filter(|w| w[1] >= w[0] && w[1] >= w[2] && w[1] > 0.9).count();
        assert!(peaks >= 3, "expected repeated cycles, saw {peaks} peaks");
    }

    #[test]
    fn trigger_amplitude_scales_output() {
        let mut env = SlewEnv::new(SR);
        env.set_rise(0.001);
        env.trigger(0.5);
        let out = run(&mut env, 50);
        let peak = out.iter().cloned().fold(0.0f32, f32::max);
        assert!((peak - 0.5).abs() < 0.01);
    }

    #[test]
    fn stream_edge_starts_the_rise() {
        let mut env = SlewEnv::new(SR);
        env.set_rise(0.01);
        let mut trigger = vec![0.0f32; 64];
        trigger[10] = 1.0;
        let inputs = SlewEnvInputs {
            trigger: Input::Stream(&trigger),
            ..Default::default()
        };
        let mut out = [0.0f32; 64];
        env.process(&inputs, &mut out);
        assert_eq!(out[9], 0.0);
        assert!(out[20] > 0.0);
        // the held high value must not retrigger; a second edge later should
        let mut trigger2 = vec![0.0f32; 64];
        trigger2[0] = 0.0;
        trigger2[5] = 2.0;
        let inputs2 = SlewEnvInputs {
            trigger: Input::Stream(&trigger2),
            ..Default::default()
        };
        env.process(&inputs2, &mut out);
        assert!(!env.is_idle() || env.value() == 0.0);
    }

    #[test]
    fn exponential_shaping_rises_faster_at_the_start() {
        let mut linear = SlewEnv::new(SR);
        linear.set_rise(0.1);
        linear.trigger(1.0);
        let lin = run(&mut linear, 100);

        let mut expo = SlewEnv::new(SR);
        expo.set_rise(0.1);
        expo.set_linearity(-1.0);
        expo.trigger(1.0);
        let exp_out = run(&mut expo, 100);

        assert!(exp_out[99] > lin[99], "exponential should lead early");

        let mut loga = SlewEnv::new(SR);
        loga.set_rise(0.1);
        loga.set_linearity(1.0);
        loga.trigger(1.0);
        let log_out = run(&mut loga, 100);
        assert!(log_out[99] < lin[99], "logarithmic should lag early");
    }
}
