//! Multi-type noise source with continuous morphing.
//!
//! Twenty-two statistically distinct noise types live behind one continuous
//! selector. Every generator runs every sample so their internal states stay
//! synchronized; the two types adjacent to the selector are combined by an
//! equal-power crossfade.

mod generators;
mod procedural;

use generators::{
    BitcrushNoise, BrownNoise, CrackleNoise, Differentiator, DitherNoise, DustNoise,
    FlickerNoise, GaussianNoise, PinkNoise, QuantizationNoise, ShapedNoise, ShotNoise,
    TelegraphNoise, VelvetNoise,
};
use procedural::{PerlinNoise, SimplexNoise, ValueNoise, WorleyNoise};

use crate::dsp::utils::{smoothstep, XorShift32};
use crate::types::{flush_denormal, Input, Param, Smoothed};

/// Catalog order is the selector order; the continuous type input morphs
/// between adjacent entries.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseKind {
    #[default]
    White,
    Pink,
    Brown,
    Blue,
    Violet,
    Grey,
    Velvet,
    Perlin,
    Simplex,
    Worley,
    Value,
    Fractal,
    Dither,
    Gaussian,
    Filtered,
    Crackle,
    Dust,
    Telegraph,
    Shot,
    Flicker,
    Quantization,
    Bitcrushed,
}

impl NoiseKind {
    pub const COUNT: usize = 22;
}

impl From<NoiseKind> for f32 {
    fn from(kind: NoiseKind) -> Self {
        kind as usize as f32
    }
}

#[derive(Default)]
pub struct NoisesInputs<'a> {
    pub noise_type: Input<'a>,
    pub amplitude: Input<'a>,
}

pub struct Noises {
    sr: f32,

    noise_type: Param,
    amplitude: Param,
    type_smooth: Smoothed,
    amplitude_smooth: Smoothed,

    morphing: bool,
    dc_blocking: bool,

    seed: u32,
    rng: XorShift32,

    pink: PinkNoise,
    brown: BrownNoise,
    diff: Differentiator,
    grey: ShapedNoise,
    velvet: VelvetNoise,
    perlin: PerlinNoise,
    simplex: SimplexNoise,
    worley: WorleyNoise,
    value: ValueNoise,
    dither: DitherNoise,
    gaussian: GaussianNoise,
    filtered: ShapedNoise,
    crackle: CrackleNoise,
    dust: DustNoise,
    telegraph: TelegraphNoise,
    shot: ShotNoise,
    flicker: FlickerNoise,
    quantization: QuantizationNoise,
    bitcrush: BitcrushNoise,
}

impl Noises {
    pub fn new(sample_rate: f32, seed: u32) -> Self {
        let mut rng = XorShift32::new(seed);
        let mut noises = Self {
            sr: sample_rate,
            noise_type: Param::new(0.0, 0.0, (NoiseKind::COUNT - 1) as f32),
            amplitude: Param::new(0.5, 0.0, 1.0),
            type_smooth: Smoothed::new(0.0),
            amplitude_smooth: Smoothed::new(0.5),
            morphing: true,
            dc_blocking: true,
            seed,
            pink: PinkNoise::default(),
            brown: BrownNoise::default(),
            diff: Differentiator::default(),
            grey: ShapedNoise::grey(sample_rate),
            velvet: VelvetNoise::new(sample_rate),
            perlin: PerlinNoise::new(sample_rate, &mut rng),
            simplex: SimplexNoise::new(sample_rate, &mut rng),
            worley: WorleyNoise::new(sample_rate),
            value: ValueNoise::new(sample_rate, &mut rng),
            dither: DitherNoise::default(),
            gaussian: GaussianNoise::default(),
            filtered: ShapedNoise::bandpass(sample_rate),
            crackle: CrackleNoise::new(sample_rate),
            dust: DustNoise,
            telegraph: TelegraphNoise::new(sample_rate, &mut rng),
            shot: ShotNoise::new(sample_rate),
            flicker: FlickerNoise::new(sample_rate, &mut rng),
            quantization: QuantizationNoise::default(),
            bitcrush: BitcrushNoise::default(),
            rng,
        };
        noises.type_smooth.set_rate(0.01, sample_rate);
        noises.amplitude_smooth.set_rate(0.01, sample_rate);
        noises
    }

    /// Re-derives every sample-rate-dependent constant and reinitializes the
    /// generators (their probability and filter constants depend on it).
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sr = sample_rate;
        self.type_smooth.set_rate(0.01, sample_rate);
        self.amplitude_smooth.set_rate(0.01, sample_rate);
        self.reseed(self.seed);
    }

    /// Restart the random stream and every derived generator from `seed`.
    pub fn reseed(&mut self, seed: u32) {
        self.seed = seed;
        let mut rng = XorShift32::new(seed);
        self.pink.reset();
        self.brown.reset();
        self.diff.reset();
        self.grey = ShapedNoise::grey(self.sr);
        self.velvet = VelvetNoise::new(self.sr);
        self.perlin = PerlinNoise::new(self.sr, &mut rng);
        self.simplex = SimplexNoise::new(self.sr, &mut rng);
        self.worley = WorleyNoise::new(self.sr);
        self.value = ValueNoise::new(self.sr, &mut rng);
        self.dither = DitherNoise::default();
        self.gaussian.reset();
        self.filtered = ShapedNoise::bandpass(self.sr);
        self.crackle = CrackleNoise::new(self.sr);
        self.telegraph = TelegraphNoise::new(self.sr, &mut rng);
        self.shot = ShotNoise::new(self.sr);
        self.flicker = FlickerNoise::new(self.sr, &mut rng);
        self.quantization = QuantizationNoise::default();
        self.bitcrush.reset();
        self.rng = rng;
    }

    pub fn set_type(&mut self, selector: f32) {
        self.noise_type.set(selector);
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude.set(amplitude);
    }

    /// Morphing off snaps the selector to the nearest integer type.
    pub fn set_morphing(&mut self, enabled: bool) {
        self.morphing = enabled;
    }

    /// Toggling DC blocking clears the brown-noise blocker memory.
    pub fn set_dc_blocking(&mut self, enabled: bool) {
        self.dc_blocking = enabled;
        self.brown.reset();
    }

    pub fn process(&mut self, inputs: &NoisesInputs, out: &mut [f32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            let type_target = self.noise_type.resolve(inputs.noise_type, i);
            let amp_target = self.amplitude.resolve(inputs.amplitude, i);

            let type_param = self
                .type_smooth
                .next(type_target, inputs.noise_type.is_connected());
            let amplitude = self
                .amplitude_smooth
                .next(amp_target, inputs.amplitude.is_connected());

            let noise = self.morph(type_param);
            *slot = flush_denormal(noise * amplitude);
        }
    }

    /// Generate every type, then combine the two adjacent to the selector.
    fn morph(&mut self, type_param: f32) -> f32 {
        let bank = self.bank();

        let last = NoiseKind::COUNT - 1;
        if type_param <= 0.0 {
            return bank[0] * 0.4;
        }
        if type_param >= last as f32 {
            return bank[last] * 0.4;
        }

        if !self.morphing {
            let nearest = (type_param + 0.5) as usize;
            return bank[nearest.min(last)] * 0.4;
        }

        let type_int = type_param as usize;
        let type_frac = type_param - type_int as f32;
        if type_frac < 1e-4 {
            return bank[type_int] * 0.4;
        }

        let position = smoothstep(type_frac);
        let mix_a = (position * std::f32::consts::FRAC_PI_2).cos();
        let mix_b = (position * std::f32::consts::FRAC_PI_2).sin();
        (bank[type_int] * mix_a + bank[type_int + 1] * mix_b) * 0.4
    }

    fn bank(&mut self) -> [f32; NoiseKind::COUNT] {
        let rng = &mut self.rng;
        let mut bank = [0.0f32; NoiseKind::COUNT];
        bank[NoiseKind::White as usize] = rng.next_bipolar();
        bank[NoiseKind::Pink as usize] = self.pink.process(rng);
        bank[NoiseKind::Brown as usize] = self.brown.process(rng, self.dc_blocking);
        bank[NoiseKind::Blue as usize] = self.diff.blue(rng);
        bank[NoiseKind::Violet as usize] = self.diff.violet(rng);
        bank[NoiseKind::Grey as usize] = self.grey.process(rng);
        bank[NoiseKind::Velvet as usize] = self.velvet.process(rng);
        bank[NoiseKind::Perlin as usize] = self.perlin.process();
        bank[NoiseKind::Simplex as usize] = self.simplex.process();
        bank[NoiseKind::Worley as usize] = self.worley.process();
        bank[NoiseKind::Value as usize] = self.value.process();
        bank[NoiseKind::Fractal as usize] = self.value.process_fractal();
        bank[NoiseKind::Dither as usize] = self.dither.process(rng);
        bank[NoiseKind::Gaussian as usize] = self.gaussian.process(rng);
        bank[NoiseKind::Filtered as usize] = self.filtered.process(rng);
        bank[NoiseKind::Crackle as usize] = self.crackle.process(rng);
        bank[NoiseKind::Dust as usize] = self.dust.process(rng);
        bank[NoiseKind::Telegraph as usize] = self.telegraph.process(rng);
        bank[NoiseKind::Shot as usize] = self.shot.process(rng);
        bank[NoiseKind::Flicker as usize] = self.flicker.process(rng);
        bank[NoiseKind::Quantization as usize] = self.quantization.process(rng);
        bank[NoiseKind::Bitcrushed as usize] = self.bitcrush.process(rng);
        bank
    }
}
