//! 2-D morphing wavetable oscillator.
//!
//! Four corner waveforms sit at the corners of a unit square; the (x, y)
//! position inputs morph between them by bilinear interpolation. User-loaded
//! tables can be dropped anywhere in the square and join the blend by
//! inverse-distance weighting.

use arrayvec::ArrayVec;

use crate::dsp::utils::interpolate;
use crate::types::{Input, LoadError, Param};

/// Samples per wavetable at the default table size.
pub const WAVETABLE_SIZE: usize = 4096;

/// Upper bound on user-loaded tables. Further loads are rejected with a
/// diagnostic; the audio path is unaffected.
pub const MAX_CUSTOM_TABLES: usize = 16;

const CORNER_SINE: usize = 0; // (0,0)
const CORNER_TRIANGLE: usize = 1; // (0,1)
const CORNER_SAW: usize = 2; // (1,0)
const CORNER_SQUARE: usize = 3; // (1,1)

/// How the (x, y) position selects between tables.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Bilinear,
    NearestNeighbor,
    /// Accepted for forward compatibility; currently resolves to bilinear.
    Cubic,
}

/// Which waveform set occupies the four corners.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CornerMode {
    /// sine / triangle / saw / square
    #[default]
    Standard,
    /// sine harmonics 1..4
    Harmonics,
}

/// Corner table length, selectable per instance.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableSize {
    Size1024,
    Size2048,
    #[default]
    Size4096,
    Size8192,
}

impl TableSize {
    fn samples(self) -> usize {
        match self {
            TableSize::Size1024 => 1024,
            TableSize::Size2048 => 2048,
            TableSize::Size4096 => 4096,
            TableSize::Size8192 => 8192,
        }
    }
}

struct CustomTable {
    samples: Vec<f32>,
    x: f32,
    y: f32,
}

/// Per-block input streams. Unconnected inputs fall back to the held scalars.
#[derive(Default)]
pub struct Cycle2dInputs<'a> {
    pub freq: Input<'a>,
    pub x: Input<'a>,
    pub y: Input<'a>,
    pub phase_offset: Input<'a>,
}

pub struct Cycle2d {
    phase: f64,
    sr_inv: f64,

    freq: Param,
    x: Param,
    y: Param,
    phase_offset: Param,

    interpolation: Interpolation,
    corner_mode: CornerMode,
    table_size: TableSize,

    corner_tables: [Vec<f32>; 4],
    custom_tables: ArrayVec<CustomTable, MAX_CUSTOM_TABLES>,
}

impl Cycle2d {
    pub fn new(sample_rate: f32) -> Self {
        let mut osc = Self {
            phase: 0.0,
            sr_inv: 1.0 / sample_rate as f64,
            freq: Param::new(440.0, 0.0, 20_000.0),
            x: Param::new(0.5, 0.0, 1.0),
            y: Param::new(0.5, 0.0, 1.0),
            phase_offset: Param::new(0.0, 0.0, 1.0),
            interpolation: Interpolation::default(),
            corner_mode: CornerMode::default(),
            table_size: TableSize::default(),
            corner_tables: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
            custom_tables: ArrayVec::new(),
        };
        osc.rebuild_corner_tables();
        osc
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sr_inv = 1.0 / sample_rate as f64;
    }

    pub fn set_frequency(&mut self, hz: f32) {
        self.freq.set(hz);
    }

    pub fn set_x(&mut self, x: f32) {
        self.x.set(x);
    }

    pub fn set_y(&mut self, y: f32) {
        self.y.set(y);
    }

    pub fn set_phase_offset(&mut self, offset: f32) {
        self.phase_offset.set(offset);
    }

    pub fn set_interpolation(&mut self, mode: Interpolation) {
        self.interpolation = mode;
    }

    /// Changing the corner set regenerates all four tables synchronously.
    pub fn set_corner_mode(&mut self, mode: CornerMode) {
        if self.corner_mode != mode {
            self.corner_mode = mode;
            self.rebuild_corner_tables();
        }
    }

    pub fn set_table_size(&mut self, size: TableSize) {
        if self.table_size != size {
            self.table_size = size;
            self.rebuild_corner_tables();
        }
    }

    /// Phase reset (bang).
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f32 {
        self.phase as f32
    }

    pub fn custom_table_count(&self) -> usize {
        self.custom_tables.len()
    }

    /// Copy a window of caller-supplied sample data into a custom table slot
    /// bound to `(x, y)`. Short sources are read cyclically starting at
    /// `offset`. On failure existing state is left unchanged.
    pub fn load_table(
        &mut self,
        source: &[f32],
        x: f32,
        y: f32,
        offset: usize,
    ) -> Result<(), LoadError> {
        if source.is_empty() {
            log::warn!("cycle2d: refusing to load empty table");
            return Err(LoadError::EmptyBuffer);
        }
        if self.custom_tables.is_full() {
            log::warn!("cycle2d: all {MAX_CUSTOM_TABLES} custom table slots in use");
            return Err(LoadError::SlotsFull(MAX_CUSTOM_TABLES));
        }

        let mut samples = Vec::with_capacity(WAVETABLE_SIZE);
        for i in 0..WAVETABLE_SIZE {
            samples.push(source[(offset + i) % source.len()]);
        }
        self.custom_tables.push(CustomTable {
            samples,
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        });
        log::debug!(
            "cycle2d: loaded table at ({x:.3}, {y:.3}), {} slots used",
            self.custom_tables.len()
        );
        Ok(())
    }

    pub fn process(&mut self, inputs: &Cycle2dInputs, out: &mut [f32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            let freq = self.freq.resolve(inputs.freq, i);
            let x = self.x.resolve(inputs.x, i);
            let y = self.y.resolve(inputs.y, i);
            let phase_offset = self.phase_offset.resolve(inputs.phase_offset, i);

            self.phase += freq as f64 * self.sr_inv;
            while self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            while self.phase < 0.0 {
                self.phase += 1.0;
            }

            let mut read_phase = self.phase + phase_offset as f64;
            while read_phase >= 1.0 {
                read_phase -= 1.0;
            }
            while read_phase < 0.0 {
                read_phase += 1.0;
            }

            let read_phase = read_phase as f32;
            *slot = match self.interpolation {
                Interpolation::NearestNeighbor => self.nearest_neighbor(x, y, read_phase),
                Interpolation::Bilinear | Interpolation::Cubic => {
                    self.bilinear(x, y, read_phase)
                }
            };
        }
    }

    fn rebuild_corner_tables(&mut self) {
        let size = self.table_size.samples();
        for table in &mut self.corner_tables {
            table.clear();
            table.resize(size, 0.0);
        }
        match self.corner_mode {
            CornerMode::Standard => {
                generate_sine(&mut self.corner_tables[CORNER_SINE]);
                generate_triangle(&mut self.corner_tables[CORNER_TRIANGLE]);
                generate_saw(&mut self.corner_tables[CORNER_SAW]);
                generate_square(&mut self.corner_tables[CORNER_SQUARE]);
            }
            CornerMode::Harmonics => {
                generate_sine_harmonic(&mut self.corner_tables[CORNER_SINE], 1);
                generate_sine_harmonic(&mut self.corner_tables[CORNER_TRIANGLE], 2);
                generate_sine_harmonic(&mut self.corner_tables[CORNER_SAW], 3);
                generate_sine_harmonic(&mut self.corner_tables[CORNER_SQUARE], 4);
            }
        }
    }

    fn bilinear(&self, x: f32, y: f32, phase: f32) -> f32 {
        let sample_00 = interpolate(&self.corner_tables[CORNER_SINE], phase);
        let sample_01 = interpolate(&self.corner_tables[CORNER_TRIANGLE], phase);
        let sample_10 = interpolate(&self.corner_tables[CORNER_SAW], phase);
        let sample_11 = interpolate(&self.corner_tables[CORNER_SQUARE], phase);

        let lerp_x0 = sample_00 * (1.0 - x) + sample_10 * x;
        let lerp_x1 = sample_01 * (1.0 - x) + sample_11 * x;
        let corner_result = lerp_x0 * (1.0 - y) + lerp_x1 * y;

        // Custom tables join by inverse-distance weighting; with none loaded
        // the blend factor is zero and the corner result passes through
        // untouched.
        let mut total_weight = 0.0f32;
        let mut weighted_sum = 0.0f32;
        for table in &self.custom_tables {
            let dx = x - table.x;
            let dy = y - table.y;
            let distance = (dx * dx + dy * dy).sqrt();
            let weight = 1.0 / (1.0 + distance * 2.0);
            weighted_sum += interpolate(&table.samples, phase) * weight;
            total_weight += weight;
        }

        if total_weight > 0.0 {
            let custom_result = weighted_sum / total_weight;
            let blend = total_weight / (total_weight + 1.0);
            corner_result * (1.0 - blend) + custom_result * blend
        } else {
            corner_result
        }
    }

    fn nearest_neighbor(&self, x: f32, y: f32, phase: f32) -> f32 {
        let corner = if x < 0.5 && y < 0.5 {
            CORNER_SINE
        } else if x < 0.5 {
            CORNER_TRIANGLE
        } else if y < 0.5 {
            CORNER_SAW
        } else {
            CORNER_SQUARE
        };
        interpolate(&self.corner_tables[corner], phase)
    }
}

fn generate_sine(table: &mut [f32]) {
    let size = table.len() as f64;
    for (i, slot) in table.iter_mut().enumerate() {
        let phase = i as f64 / size;
        *slot = (std::f64::consts::TAU * phase).sin() as f32;
    }
}

fn generate_triangle(table: &mut [f32]) {
    let size = table.len() as f64;
    for (i, slot) in table.iter_mut().enumerate() {
        let phase = i as f64 / size;
        *slot = if phase < 0.25 {
            4.0 * phase
        } else if phase < 0.75 {
            2.0 - 4.0 * phase
        } else {
            4.0 * phase - 4.0
        } as f32;
    }
}

fn generate_saw(table: &mut [f32]) {
    let size = table.len() as f64;
    for (i, slot) in table.iter_mut().enumerate() {
        let phase = i as f64 / size;
        *slot = (2.0 * phase - 1.0) as f32;
    }
}

fn generate_square(table: &mut [f32]) {
    let size = table.len() as f64;
    for (i, slot) in table.iter_mut().enumerate() {
        let phase = i as f64 / size;
        *slot = if phase < 0.5 { 1.0 } else { -1.0 };
    }
}

fn generate_sine_harmonic(table: &mut [f32], harmonic: u32) {
    let size = table.len() as f64;
    for (i, slot) in table.iter_mut().enumerate() {
        let phase = i as f64 / size;
        *slot = (std::f64::consts::TAU * phase * harmonic as f64).sin() as f32;
    }
}
