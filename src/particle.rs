//! Packed particle records and the fixed count ladder.
//!
//! A [`Particle`] is one 64-byte record holding four independent point
//! particles, named lanes A through D. Packing four points per record
//! quarters the dispatch width; the kernel updates all four lanes of a
//! record in one invocation and renders lanes B and C with rotated
//! colors so the sub-particles stay visually distinct.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

/// One packed record of four independent point particles.
///
/// Each lane is a [`Vec4`] carrying `(x, y)` position in pixels and
/// `(z, w)` velocity in pixels per step. The layout is shared verbatim
/// with the WGSL kernel; `size_of::<Particle>()` is exactly 64 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub a: Vec4,
    pub b: Vec4,
    pub c: Vec4,
    pub d: Vec4,
}

/// Base RGBA color for rendered lanes, each channel in `0.0..=1.0`.
///
/// Lane class A (and D) draws with this color as-is; classes B and C
/// use its two cyclic channel rotations. Alpha is shared by all lanes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ParticleColor {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for ParticleColor {
    /// The warm orange the simulator has always started with.
    fn default() -> Self {
        Self::new(1.0, 0.5, 0.2, 1.0)
    }
}

/// Available particle-record counts.
///
/// Variant names describe the effective number of rendered points;
/// each record packs four lanes, so [`records`](Self::records) is a
/// quarter of what the name says.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleCount {
    HalfMillion,
    OneMillion,
    TwoMillion,
    FourMillion,
    EightMillion,
    SixteenMillion,
}

impl ParticleCount {
    /// Every variant, smallest first.
    pub const ALL: [ParticleCount; 6] = [
        ParticleCount::HalfMillion,
        ParticleCount::OneMillion,
        ParticleCount::TwoMillion,
        ParticleCount::FourMillion,
        ParticleCount::EightMillion,
        ParticleCount::SixteenMillion,
    ];

    /// Number of packed records.
    pub const fn records(self) -> u32 {
        match self {
            ParticleCount::HalfMillion => 131_072,
            ParticleCount::OneMillion => 262_144,
            ParticleCount::TwoMillion => 524_288,
            ParticleCount::FourMillion => 1_048_576,
            ParticleCount::EightMillion => 2_097_152,
            ParticleCount::SixteenMillion => 4_194_304,
        }
    }

    /// Effective number of rendered points, four lanes per record.
    pub const fn effective(self) -> u32 {
        self.records() * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_layout_is_four_vec4_lanes() {
        // 4 lanes x 4 floats x 4 bytes, no hidden padding
        assert_eq!(std::mem::size_of::<Particle>(), 4 * 4 * 4);
        assert_eq!(std::mem::size_of::<ParticleColor>(), 16);
    }

    #[test]
    fn test_particle_bytes_round_trip() {
        let particle = Particle {
            a: Vec4::new(1.0, 2.0, 3.0, 4.0),
            b: Vec4::new(5.0, 6.0, 7.0, 8.0),
            c: Vec4::new(9.0, 10.0, 11.0, 12.0),
            d: Vec4::new(13.0, 14.0, 15.0, 16.0),
        };
        let bytes = bytemuck::bytes_of(&particle);
        assert_eq!(bytes.len(), 64);
        assert_eq!(*bytemuck::from_bytes::<Particle>(bytes), particle);
    }

    #[test]
    fn test_counts_are_powers_of_two_and_effective_is_quadruple() {
        for count in ParticleCount::ALL {
            assert!(count.records().is_power_of_two());
            assert_eq!(count.effective(), count.records() * 4);
        }
        assert_eq!(ParticleCount::HalfMillion.records(), 131_072);
        assert_eq!(ParticleCount::HalfMillion.effective(), 524_288);
        assert_eq!(ParticleCount::SixteenMillion.effective(), 16_777_216);
    }

    #[test]
    fn test_default_color() {
        let color = ParticleColor::default();
        assert_eq!(color, ParticleColor::new(1.0, 0.5, 0.2, 1.0));
    }
}
