//! Procedural (graphics-style) noise sources driven by a slow internal time
//! base: classic gradient noise, 2-D simplex, cellular distance fields, and
//! interpolated value noise with a fractal octave stack.

use crate::dsp::utils::{smoothstep, XorShift32};

const PERM_SIZE: usize = 256;

fn shuffled_permutation(rng: &mut XorShift32) -> [usize; PERM_SIZE * 2] {
    let mut perm = [0usize; PERM_SIZE * 2];
    for (i, slot) in perm.iter_mut().take(PERM_SIZE).enumerate() {
        *slot = i;
    }
    for i in 0..PERM_SIZE {
        let j = rng.next_u32() as usize % PERM_SIZE;
        perm.swap(i, j);
    }
    for i in 0..PERM_SIZE {
        perm[PERM_SIZE + i] = perm[i];
    }
    perm
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Classic 3-D gradient noise sampled along a slowly advancing line.
pub struct PerlinNoise {
    time: f64,
    sr_inv: f64,
    perm: [usize; PERM_SIZE * 2],
}

impl PerlinNoise {
    pub fn new(sample_rate: f32, rng: &mut XorShift32) -> Self {
        Self {
            time: 0.0,
            sr_inv: 1.0 / sample_rate as f64,
            perm: shuffled_permutation(rng),
        }
    }

    pub fn process(&mut self) -> f32 {
        self.time += 0.01 * self.sr_inv;

        let mut x = self.time * 50.0;
        let y = 0.0f64;
        let z = 0.0f64;

        let xi = (x.floor() as i64 & 255) as usize;
        let yi = (y.floor() as i64 & 255) as usize;
        let zi = (z.floor() as i64 & 255) as usize;
        x -= x.floor();

        let u = fade(x);
        let v = fade(y);
        let w = fade(z);

        let p = &self.perm;
        let a = p[xi] + yi;
        let aa = p[a] + zi;
        let ab = p[a + 1] + zi;
        let b = p[xi + 1] + yi;
        let ba = p[b] + zi;
        let bb = p[b + 1] + zi;

        let result = lerp(
            w,
            lerp(
                v,
                lerp(u, grad(p[aa], x, y, z), grad(p[ba], x - 1.0, y, z)),
                lerp(u, grad(p[ab], x, y - 1.0, z), grad(p[bb], x - 1.0, y - 1.0, z)),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad(p[aa + 1], x, y, z - 1.0),
                    grad(p[ba + 1], x - 1.0, y, z - 1.0),
                ),
                lerp(
                    u,
                    grad(p[ab + 1], x, y - 1.0, z - 1.0),
                    grad(p[bb + 1], x - 1.0, y - 1.0, z - 1.0),
                ),
            ),
        );

        (result * 3.0) as f32
    }
}

const GRAD3: [[f64; 2]; 12] = [
    [1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [-1.0, -1.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [0.0, 1.0],
    [0.0, -1.0],
];

/// 2-D simplex noise wandering along a sinusoidal path.
pub struct SimplexNoise {
    time: f64,
    sr_inv: f64,
    perm: [usize; PERM_SIZE * 2],
}

impl SimplexNoise {
    pub fn new(sample_rate: f32, rng: &mut XorShift32) -> Self {
        Self {
            time: 0.0,
            sr_inv: 1.0 / sample_rate as f64,
            perm: shuffled_permutation(rng),
        }
    }

    pub fn process(&mut self) -> f32 {
        self.time += 0.005 * self.sr_inv;

        let x = self.time * 30.0;
        let y = (self.time * 15.0).sin() * 10.0;

        let f2 = 0.5 * (3.0f64.sqrt() - 1.0);
        let g2 = (3.0 - 3.0f64.sqrt()) / 6.0;

        let s = (x + y) * f2;
        let i = (x + s).floor() as i64;
        let j = (y + s).floor() as i64;

        let t = (i + j) as f64 * g2;
        let x0 = x - (i as f64 - t);
        let y0 = y - (j as f64 - t);

        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + g2;
        let y1 = y0 - j1 as f64 + g2;
        let x2 = x0 - 1.0 + 2.0 * g2;
        let y2 = y0 - 1.0 + 2.0 * g2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let p = &self.perm;
        let gi0 = p[ii + p[jj]] % 12;
        let gi1 = p[ii + i1 + p[jj + j1]] % 12;
        let gi2 = p[ii + 1 + p[jj + 1]] % 12;

        let mut n = 0.0f64;
        for (gi, px, py) in [(gi0, x0, y0), (gi1, x1, y1), (gi2, x2, y2)] {
            let t = 0.5 - px * px - py * py;
            if t >= 0.0 {
                let t = t * t;
                n += t * t * (GRAD3[gi][0] * px + GRAD3[gi][1] * py);
            }
        }

        (n * 70.0 * 2.5) as f32
    }
}

/// Cellular distance-field noise: nearest feature point over a 3x3 cell
/// neighborhood, points hashed from cell coordinates.
pub struct WorleyNoise {
    time: f64,
    sr_inv: f64,
}

impl WorleyNoise {
    const CELL_SIZE: f64 = 64.0;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            time: 0.0,
            sr_inv: 1.0 / sample_rate as f64,
        }
    }

    pub fn process(&mut self) -> f32 {
        self.time += 0.02 * self.sr_inv;

        let x = self.time * 20.0;
        let y = (self.time * 8.0).sin() * 5.0;

        let cell_x = (x / Self::CELL_SIZE).floor() as i64;
        let cell_y = (y / Self::CELL_SIZE).floor() as i64;

        let mut min_dist = f64::MAX;
        for di in -1..=1 {
            for dj in -1..=1 {
                let cx = cell_x + di;
                let cy = cell_y + dj;
                let seed = (cx.wrapping_mul(73_856_093) ^ cy.wrapping_mul(19_349_663)) as u32;
                let mut cell_rng = XorShift32::new(seed);
                let px = cx as f64 * Self::CELL_SIZE + cell_rng.next_unit() as f64 * Self::CELL_SIZE;
                let py = cy as f64 * Self::CELL_SIZE + cell_rng.next_unit() as f64 * Self::CELL_SIZE;
                let dist = ((x - px).powi(2) + (y - py).powi(2)).sqrt();
                min_dist = min_dist.min(dist);
            }
        }

        (((1.0 - min_dist / Self::CELL_SIZE) * 2.0 - 1.0) * 1.5) as f32
    }
}

const VALUE_TABLE_SIZE: usize = 256;

/// Interpolated random-table noise, plus a 4-octave fractal sum over the
/// same table.
pub struct ValueNoise {
    time: f64,
    fractal_time: f64,
    sr_inv: f64,
    table: [f32; VALUE_TABLE_SIZE],
}

impl ValueNoise {
    const FRACTAL_OCTAVES: usize = 4;
    const LACUNARITY: f64 = 2.0;
    const PERSISTENCE: f32 = 0.5;

    pub fn new(sample_rate: f32, rng: &mut XorShift32) -> Self {
        let mut table = [0.0f32; VALUE_TABLE_SIZE];
        for slot in &mut table {
            *slot = rng.next_bipolar();
        }
        Self {
            time: 0.0,
            fractal_time: 0.0,
            sr_inv: 1.0 / sample_rate as f64,
            table,
        }
    }

    fn sample(&self, coord: f64) -> f32 {
        let i = coord.floor() as i64;
        let frac = (coord - coord.floor()) as f32;
        let a = self.table[(i & (VALUE_TABLE_SIZE as i64 - 1)) as usize];
        let b = self.table[((i + 1) & (VALUE_TABLE_SIZE as i64 - 1)) as usize];
        a + smoothstep(frac) * (b - a)
    }

    pub fn process(&mut self) -> f32 {
        self.time += 0.008 * self.sr_inv;
        self.sample(self.time * 100.0) * 1.8
    }

    pub fn process_fractal(&mut self) -> f32 {
        self.fractal_time += 0.003 * self.sr_inv;

        let mut result = 0.0f32;
        let mut amplitude = 1.0f32;
        let mut frequency = 1.0f64;
        for octave in 0..Self::FRACTAL_OCTAVES {
            let coord = self.fractal_time * frequency * 50.0 + octave as f64 * 100.0;
            result += self.sample(coord) * amplitude;
            amplitude *= Self::PERSISTENCE;
            frequency *= Self::LACUNARITY;
        }
        result * 1.2
    }
}
