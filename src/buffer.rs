//! CPU-side particle arena and seeding.
//!
//! The arena is a single zero-initialized allocation of packed
//! [`Particle`] records with a stable base address, aligned to 16 KiB.
//! The engine uploads its bytes to the GPU storage buffer once at
//! construction and again after each reseed; between reseeds the GPU
//! copy is authoritative.

use std::alloc::{self, Layout};
use std::f32::consts::TAU;
use std::ptr::NonNull;
use std::slice;

use glam::Vec4;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::particle::{Particle, ParticleCount};

/// Arena base alignment in bytes.
pub const ARENA_ALIGN: usize = 0x4000;

/// Scale applied to the uniform `(-0.5, 0.5)` draw for seeded lane
/// velocities.
const SEED_VELOCITY_SCALE: f32 = 0.005;

/// Position distribution for [`ParticleBuffer::seed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Distribution {
    /// Uniform over the full image.
    Uniform,
    /// Clustered toward the image center.
    Gaussian,
}

/// Zero-initialized, 16 KiB-aligned arena of particle records.
pub struct ParticleBuffer {
    ptr: NonNull<Particle>,
    records: usize,
}

// The raw pointer is owned and only dereferenced through &self / &mut self.
unsafe impl Send for ParticleBuffer {}
unsafe impl Sync for ParticleBuffer {}

impl ParticleBuffer {
    /// Allocates a zeroed arena for `count.records()` records.
    pub fn new(count: ParticleCount) -> Self {
        let records = count.records() as usize;
        let layout = Self::layout(records);
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw.cast::<Particle>()) else {
            alloc::handle_alloc_error(layout);
        };
        Self { ptr, records }
    }

    fn layout(records: usize) -> Layout {
        Layout::from_size_align(records * std::mem::size_of::<Particle>(), ARENA_ALIGN)
            .expect("arena size overflows the address space")
    }

    /// Number of records in the arena.
    #[inline]
    pub fn records(&self) -> usize {
        self.records
    }

    /// Arena size in bytes; always `records * 64`.
    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.records * std::mem::size_of::<Particle>()
    }

    pub fn as_slice(&self) -> &[Particle] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.records) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.records) }
    }

    /// Raw bytes for GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// Fills every record with a fresh draw.
    ///
    /// Per lane: a position from `distribution` and a small random
    /// velocity, `uniform(-0.5, 0.5) * 0.005` per axis. With
    /// `edges_only`, one axis of the whole record is pinned to an
    /// image border instead, the same border for all four lanes, so
    /// seeded particles start along the frame.
    pub fn seed(
        &mut self,
        distribution: Distribution,
        edges_only: bool,
        width: u32,
        height: u32,
        rng: &mut SmallRng,
    ) {
        let w = width as f32;
        let h = height as f32;

        for record in self.as_mut_slice() {
            let mut xs = [0.0f32; 4];
            let mut ys = [0.0f32; 4];
            for i in 0..4 {
                let (x, y) = match distribution {
                    Distribution::Uniform => (rng.gen_range(0.0..w), rng.gen_range(0.0..h)),
                    Distribution::Gaussian => gaussian_position(rng, w, h),
                };
                xs[i] = x;
                ys[i] = y;
            }

            if edges_only {
                match rng.gen_range(0u32..4) {
                    0 => xs = [0.0; 4],
                    1 => xs = [w; 4],
                    2 => ys = [0.0; 4],
                    _ => ys = [h; 4],
                }
            }

            *record = Particle {
                a: Vec4::new(xs[0], ys[0], jitter(rng), jitter(rng)),
                b: Vec4::new(xs[1], ys[1], jitter(rng), jitter(rng)),
                c: Vec4::new(xs[2], ys[2], jitter(rng), jitter(rng)),
                d: Vec4::new(xs[3], ys[3], jitter(rng), jitter(rng)),
            };
        }
    }
}

impl Drop for ParticleBuffer {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr().cast(), Self::layout(self.records)) }
    }
}

#[inline]
fn jitter(rng: &mut SmallRng) -> f32 {
    (rng.gen::<f32>() - 0.5) * SEED_VELOCITY_SCALE
}

/// Box-Muller draw around the image center, clamped in-bounds.
fn gaussian_position(rng: &mut SmallRng, w: f32, h: f32) -> (f32, f32) {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen();
    let r = (-2.0 * u1.ln()).sqrt();
    let (sin, cos) = (TAU * u2).sin_cos();
    // a sixth of each dimension as sigma keeps nearly every draw inside
    let x = w * 0.5 + r * cos * (w / 6.0);
    let y = h * 0.5 + r * sin * (h / 6.0);
    (x.clamp(0.0, w), y.clamp(0.0, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const W: u32 = 640;
    const H: u32 = 480;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(0x5eed)
    }

    fn lanes(p: &Particle) -> [Vec4; 4] {
        [p.a, p.b, p.c, p.d]
    }

    #[test]
    fn test_arena_size_matches_record_count() {
        for count in ParticleCount::ALL {
            let expected = count.records() as usize * 4 * 4 * 4;
            assert_eq!(
                count.records() as usize * std::mem::size_of::<Particle>(),
                expected
            );
        }
        // allocate the two smallest and verify the real byte length
        for count in [ParticleCount::HalfMillion, ParticleCount::OneMillion] {
            let buffer = ParticleBuffer::new(count);
            assert_eq!(buffer.len_bytes(), count.records() as usize * 64);
            assert_eq!(buffer.as_bytes().len(), buffer.len_bytes());
            assert_eq!(buffer.records(), count.records() as usize);
        }
    }

    #[test]
    fn test_arena_is_aligned_and_zeroed() {
        let buffer = ParticleBuffer::new(ParticleCount::HalfMillion);
        assert_eq!(buffer.as_slice().as_ptr() as usize % ARENA_ALIGN, 0);
        assert!(buffer.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_uniform_seed_stays_in_bounds() {
        let mut buffer = ParticleBuffer::new(ParticleCount::HalfMillion);
        buffer.seed(Distribution::Uniform, false, W, H, &mut rng());
        for record in buffer.as_slice() {
            for lane in lanes(record) {
                assert!(lane.x >= 0.0 && lane.x <= W as f32);
                assert!(lane.y >= 0.0 && lane.y <= H as f32);
            }
        }
    }

    #[test]
    fn test_gaussian_seed_stays_in_bounds_and_clusters() {
        let mut buffer = ParticleBuffer::new(ParticleCount::HalfMillion);
        buffer.seed(Distribution::Gaussian, false, W, H, &mut rng());
        let mut central = 0usize;
        let mut total = 0usize;
        for record in buffer.as_slice() {
            for lane in lanes(record) {
                assert!(lane.x >= 0.0 && lane.x <= W as f32);
                assert!(lane.y >= 0.0 && lane.y <= H as f32);
                let dx = (lane.x - W as f32 / 2.0).abs() / (W as f32 / 2.0);
                let dy = (lane.y - H as f32 / 2.0).abs() / (H as f32 / 2.0);
                if dx < 0.5 && dy < 0.5 {
                    central += 1;
                }
                total += 1;
            }
        }
        // the central quarter of the image holds well over half the draws
        assert!(central * 2 > total, "{central} of {total} central");
    }

    #[test]
    fn test_edges_only_pins_one_axis_per_record() {
        let mut buffer = ParticleBuffer::new(ParticleCount::HalfMillion);
        buffer.seed(Distribution::Uniform, true, W, H, &mut rng());
        let mut rule_seen = [false; 4];
        for record in buffer.as_slice() {
            let ls = lanes(record);
            let rule = if ls.iter().all(|l| l.x == 0.0) {
                0
            } else if ls.iter().all(|l| l.x == W as f32) {
                1
            } else if ls.iter().all(|l| l.y == 0.0) {
                2
            } else if ls.iter().all(|l| l.y == H as f32) {
                3
            } else {
                panic!("record not pinned to any border: {record:?}");
            };
            rule_seen[rule] = true;
        }
        assert_eq!(rule_seen, [true; 4]);
    }

    #[test]
    fn test_seed_velocities_are_near_zero() {
        let mut buffer = ParticleBuffer::new(ParticleCount::HalfMillion);
        buffer.seed(Distribution::Uniform, false, W, H, &mut rng());
        let limit = SEED_VELOCITY_SCALE * 0.5;
        for record in buffer.as_slice() {
            for lane in lanes(record) {
                assert!(lane.z.abs() <= limit && lane.w.abs() <= limit);
            }
        }
    }

    #[test]
    fn test_reseed_overwrites_previous_state() {
        let mut buffer = ParticleBuffer::new(ParticleCount::HalfMillion);
        let mut r = rng();
        buffer.seed(Distribution::Uniform, false, W, H, &mut r);
        let first = buffer.as_slice()[0];
        buffer.seed(Distribution::Uniform, false, W, H, &mut r);
        assert_ne!(buffer.as_slice()[0], first);
    }
}
