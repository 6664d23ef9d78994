//! Benchmarks for the per-sample kernels.
//!
//! Run with: cargo bench
//!
//! Reference deadline at 48kHz: a 512-sample block must render in well under
//! 10.67ms for every kernel in a patch.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use modkit_dsp::dsp::envelopes::{Decay, DecayInputs};
use modkit_dsp::dsp::filters::{Ssm2044, Ssm2044Inputs};
use modkit_dsp::dsp::noise::{Noises, NoisesInputs};
use modkit_dsp::dsp::oscillators::{Cycle2d, Cycle2dInputs, HarmOsc, HarmOscInputs};
use modkit_dsp::Input;

const SR: f32 = 48_000.0;
const BLOCK: usize = 512;

fn bench_cycle2d(c: &mut Criterion) {
    let mut osc = Cycle2d::new(SR);
    osc.set_frequency(220.0);
    let mut out = [0.0f32; BLOCK];
    c.bench_function("cycle2d/block512", |b| {
        b.iter(|| {
            osc.process(&Cycle2dInputs::default(), black_box(&mut out));
        })
    });
}

fn bench_harmosc(c: &mut Criterion) {
    let mut osc = HarmOsc::new(SR, 64);
    osc.set_frequency(110.0);
    osc.set_falloff(-0.3);
    let mut out = [0.0f32; BLOCK];
    c.bench_function("harmosc/64-partials/block512", |b| {
        b.iter(|| {
            osc.process(&HarmOscInputs::default(), black_box(&mut out));
        })
    });
}

fn bench_noises_morphing(c: &mut Criterion) {
    let mut noises = Noises::new(SR, 1);
    noises.set_type(7.5);
    let mut out = [0.0f32; BLOCK];
    c.bench_function("noises/morphing/block512", |b| {
        b.iter(|| {
            noises.process(&NoisesInputs::default(), black_box(&mut out));
        })
    });
}

fn bench_ssm2044(c: &mut Criterion) {
    let mut filter = Ssm2044::new(SR);
    filter.set_cutoff(1200.0);
    filter.set_resonance(3.0);
    let audio: Vec<f32> = (0..BLOCK)
        .map(|i| (std::f32::consts::TAU * 110.0 * i as f32 / SR).sin())
        .collect();
    let mut out = [0.0f32; BLOCK];
    c.bench_function("ssm2044/block512", |b| {
        b.iter(|| {
            let inputs = Ssm2044Inputs {
                audio: Input::Stream(&audio),
                ..Default::default()
            };
            filter.process(&inputs, black_box(&mut out));
        })
    });
}

fn bench_decay(c: &mut Criterion) {
    let mut env = Decay::new(SR);
    env.set_time(0.5);
    let mut out = [0.0f32; BLOCK];
    c.bench_function("decay/block512", |b| {
        b.iter(|| {
            env.trigger();
            env.process(&DecayInputs::default(), black_box(&mut out));
        })
    });
}

criterion_group!(
    benches,
    bench_cycle2d,
    bench_harmosc,
    bench_noises_morphing,
    bench_ssm2044,
    bench_decay,
);
criterion_main!(benches);
