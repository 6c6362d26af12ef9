//! CPU mirror of the compute kernel.
//!
//! Runs the same arithmetic as `kernel.wgsl` on plain slices,
//! including the integer hash behind respawn draws, so a GPU frame and
//! a CPU frame started from the same arena land on the same state.
//! Useful for debugging the kernel and for machines without a GPU; at
//! real arena sizes it is orders of magnitude slower than a dispatch.

use glam::{Vec2, Vec4};

use crate::kernel::MIN_WELL_DISTANCE;
use crate::particle::{Particle, ParticleColor};
use crate::wells::DEFAULT_WELLS;

/// Plain RGBA8 canvas with the same clipping as the storage texture.
pub struct CpuCanvas {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl CpuCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; (width * height) as usize],
        }
    }

    /// Zeroes every pixel.
    pub fn clear(&mut self) {
        self.pixels.fill([0; 4]);
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Number of pixels any lane has touched since the last clear.
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| **p != [0; 4]).count()
    }

    /// Overwrite splat; writes outside the canvas are dropped.
    fn write(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.pixels[(y as u32 * self.width + x as u32) as usize] = color;
    }
}

/// The integration kernel, step for step, on the CPU.
pub struct CpuKernel {
    /// Wells as `(x_px, y_px, mass, spin)` lanes.
    pub wells: [Vec4; 4],
    /// Base lane color.
    pub color: ParticleColor,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Per-step velocity multiplier.
    pub drag_factor: f32,
    /// Whether out-of-bounds lanes are relocated.
    pub respawn_out_of_bounds: bool,
    frame: u32,
}

impl CpuKernel {
    /// A kernel with the standard starting state: the four quarter
    /// wells in pixel space, drag `0.97`, respawn on.
    pub fn new(width: u32, height: u32) -> Self {
        let wells = DEFAULT_WELLS.map(|(x, y, mass, spin)| {
            Vec4::new(x * width as f32, y * height as f32, mass, spin)
        });
        Self {
            wells,
            color: ParticleColor::default(),
            width,
            height,
            drag_factor: 0.97,
            respawn_out_of_bounds: true,
            frame: 0,
        }
    }

    /// Frames stepped so far.
    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Advances every record one step and splats its lanes.
    pub fn step(&mut self, particles: &mut [Particle], canvas: &mut CpuCanvas) {
        self.frame = self.frame.wrapping_add(1);
        let base = [self.color.r, self.color.g, self.color.b, self.color.a];
        let rot_b = [base[2], base[0], base[1], base[3]];
        let rot_c = [base[1], base[2], base[0], base[3]];

        for (index, record) in particles.iter_mut().enumerate() {
            let seed =
                (index as u32).wrapping_mul(4) ^ self.frame.wrapping_mul(0x9e37_79b9);
            record.a = self.step_lane(record.a, base, seed, canvas);
            record.b = self.step_lane(record.b, rot_b, seed.wrapping_add(1), canvas);
            record.c = self.step_lane(record.c, rot_c, seed.wrapping_add(2), canvas);
            record.d = self.step_lane(record.d, base, seed.wrapping_add(3), canvas);
        }
    }

    fn step_lane(
        &self,
        lane: Vec4,
        color: [f32; 4],
        seed: u32,
        canvas: &mut CpuCanvas,
    ) -> Vec4 {
        let mut pos = Vec2::new(lane.x, lane.y);
        let mut vel = Vec2::new(lane.z, lane.w);
        let dims = Vec2::new(self.width as f32, self.height as f32);

        vel = vel * self.drag_factor + self.force_at(pos);
        pos += vel;

        let out_of_bounds =
            pos.x < 0.0 || pos.x > dims.x || pos.y < 0.0 || pos.y > dims.y;
        if self.respawn_out_of_bounds && out_of_bounds {
            pos = Vec2::new(
                rand_range(seed, 0.0, dims.x),
                rand_range(seed.wrapping_add(1), 0.0, dims.y),
            );
            vel = Vec2::new(
                rand_range(seed.wrapping_add(2), -0.0025, 0.0025),
                rand_range(seed.wrapping_add(3), -0.0025, 0.0025),
            );
        }

        canvas.write(pos.x as i32, pos.y as i32, quantize(color));
        Vec4::new(pos.x, pos.y, vel.x, vel.y)
    }

    /// Radial pull plus tangential swirl of all four wells at `pos`.
    pub fn force_at(&self, pos: Vec2) -> Vec2 {
        let mut force = Vec2::ZERO;
        for well in self.wells {
            let delta = Vec2::new(well.x, well.y) - pos;
            let dist = delta.length().max(MIN_WELL_DISTANCE);
            let dir = delta / dist;
            let inv_d2 = 1.0 / (dist * dist);
            force += dir * (well.z * inv_d2);
            force += Vec2::new(-dir.y, dir.x) * (well.w * inv_d2);
        }
        force
    }
}

// Same hash as the WGSL side, wrapping ops for parity.
fn hash(n: u32) -> u32 {
    let mut x = n;
    x ^= x >> 17;
    x = x.wrapping_mul(0xed5a_d4bb);
    x ^= x >> 11;
    x = x.wrapping_mul(0xac4c_1b51);
    x ^= x >> 15;
    x = x.wrapping_mul(0x3184_8bab);
    x ^= x >> 14;
    x
}

fn rand(seed: u32) -> f32 {
    hash(seed) as f32 / 4_294_967_295.0
}

fn rand_range(seed: u32, min_val: f32, max_val: f32) -> f32 {
    min_val + rand(seed) * (max_val - min_val)
}

fn quantize(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}
