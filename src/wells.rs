//! The four-well gravity state vector.
//!
//! Hosts address wells in normalized `[0, 1]` coordinates; the model
//! stores pixel-space `(x, y, mass, spin)` lanes ready for the kernel
//! uniform. Conversion happens at the setter/getter boundary, using
//! the image dimensions the model was built with.

use glam::Vec4;

/// Identifies one of the four gravity wells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GravityWell {
    One,
    Two,
    Three,
    Four,
}

impl GravityWell {
    /// Maps an integer index to a well.
    ///
    /// The mapping is deliberately non-linear and kept exactly as the
    /// simulator has always behaved: 1, 2 and 3 address wells Two,
    /// Three and Four; every other value, including 0, addresses One.
    pub fn from_index(index: usize) -> Self {
        match index {
            1 => GravityWell::Two,
            2 => GravityWell::Three,
            3 => GravityWell::Four,
            _ => GravityWell::One,
        }
    }

    #[inline]
    pub(crate) fn lane(self) -> usize {
        match self {
            GravityWell::One => 0,
            GravityWell::Two => 1,
            GravityWell::Three => 2,
            GravityWell::Four => 3,
        }
    }
}

/// Default layout: one well per image quadrant, equal mass, spins
/// alternating in sign. Tuples are `(norm_x, norm_y, mass, spin)` in
/// well order One..Four.
pub(crate) const DEFAULT_WELLS: [(f32, f32, f32, f32); 4] = [
    (0.25, 0.75, 10.0, 0.2),
    (0.25, 0.25, 10.0, -0.2),
    (0.75, 0.25, 10.0, 0.2),
    (0.75, 0.75, 10.0, -0.2),
];

/// Pixel-space state for the four wells.
#[derive(Clone, Debug)]
pub struct GravityWellModel {
    wells: [Vec4; 4],
    width: f32,
    height: f32,
}

impl GravityWellModel {
    /// A model for the given image size, in the default layout.
    pub fn new(width: u32, height: u32) -> Self {
        let mut model = Self {
            wells: [Vec4::ZERO; 4],
            width: width as f32,
            height: height as f32,
        };
        model.reset();
        model
    }

    /// Restores the default symmetric layout.
    pub fn reset(&mut self) {
        for (well, (x, y, mass, spin)) in [
            GravityWell::One,
            GravityWell::Two,
            GravityWell::Three,
            GravityWell::Four,
        ]
        .into_iter()
        .zip(DEFAULT_WELLS)
        {
            self.set(well, x, y, mass, spin);
        }
    }

    /// Stores `(x_px, y_px, mass, spin)` for the well, converting the
    /// normalized position to pixel space.
    pub fn set(&mut self, well: GravityWell, norm_x: f32, norm_y: f32, mass: f32, spin: f32) {
        self.wells[well.lane()] = Vec4::new(norm_x * self.width, norm_y * self.height, mass, spin);
    }

    /// Index-addressed variant of [`set`](Self::set), using the
    /// [`GravityWell::from_index`] mapping.
    pub fn set_at(&mut self, index: usize, norm_x: f32, norm_y: f32, mass: f32, spin: f32) {
        self.set(GravityWell::from_index(index), norm_x, norm_y, mass, spin);
    }

    /// Stored position back in normalized coordinates.
    ///
    /// Mass and spin are intentionally not exposed here; the model is
    /// write-mostly and the position is all the host reads back.
    pub fn normalised_position(&self, well: GravityWell) -> (f32, f32) {
        let lane = self.wells[well.lane()];
        (lane.x / self.width, lane.y / self.height)
    }

    /// Raw pixel-space lanes in kernel order One..Four.
    pub(crate) fn lanes(&self) -> [Vec4; 4] {
        self.wells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_set_then_get_round_trips() {
        let mut model = GravityWellModel::new(640, 480);
        for (i, well) in [
            GravityWell::One,
            GravityWell::Two,
            GravityWell::Three,
            GravityWell::Four,
        ]
        .into_iter()
        .enumerate()
        {
            let nx = 0.1 + i as f32 * 0.2;
            let ny = 0.9 - i as f32 * 0.2;
            model.set(well, nx, ny, 5.0, -1.0);
            let (gx, gy) = model.normalised_position(well);
            assert!((gx - nx).abs() < EPS, "{well:?} x: {gx} vs {nx}");
            assert!((gy - ny).abs() < EPS, "{well:?} y: {gy} vs {ny}");
        }
    }

    #[test]
    fn test_setting_one_well_leaves_the_others_alone() {
        let mut model = GravityWellModel::new(100, 100);
        let before: Vec<_> = [GravityWell::Two, GravityWell::Three, GravityWell::Four]
            .into_iter()
            .map(|w| model.normalised_position(w))
            .collect();
        model.set(GravityWell::One, 0.5, 0.5, 99.0, 3.0);
        let after: Vec<_> = [GravityWell::Two, GravityWell::Three, GravityWell::Four]
            .into_iter()
            .map(|w| model.normalised_position(w))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_index_mapping_is_shifted_by_one() {
        assert_eq!(GravityWell::from_index(1), GravityWell::Two);
        assert_eq!(GravityWell::from_index(2), GravityWell::Three);
        assert_eq!(GravityWell::from_index(3), GravityWell::Four);
        // 0 and every out-of-range value fall back to well One
        assert_eq!(GravityWell::from_index(0), GravityWell::One);
        assert_eq!(GravityWell::from_index(4), GravityWell::One);
        assert_eq!(GravityWell::from_index(usize::MAX), GravityWell::One);
    }

    #[test]
    fn test_set_at_uses_the_index_mapping() {
        let mut model = GravityWellModel::new(100, 100);
        model.set_at(1, 0.9, 0.9, 1.0, 0.0);
        let (x, y) = model.normalised_position(GravityWell::Two);
        assert!((x - 0.9).abs() < EPS && (y - 0.9).abs() < EPS);

        model.set_at(7, 0.1, 0.2, 1.0, 0.0);
        let (x, y) = model.normalised_position(GravityWell::One);
        assert!((x - 0.1).abs() < EPS && (y - 0.2).abs() < EPS);
    }

    #[test]
    fn test_reset_restores_quadrant_layout() {
        let mut model = GravityWellModel::new(200, 100);
        model.set(GravityWell::Three, 0.0, 0.0, 0.0, 0.0);
        model.reset();

        let expected = [(0.25, 0.75), (0.25, 0.25), (0.75, 0.25), (0.75, 0.75)];
        for (well, (nx, ny)) in [
            GravityWell::One,
            GravityWell::Two,
            GravityWell::Three,
            GravityWell::Four,
        ]
        .into_iter()
        .zip(expected)
        {
            let (gx, gy) = model.normalised_position(well);
            assert!((gx - nx).abs() < EPS && (gy - ny).abs() < EPS, "{well:?}");
        }

        // lanes carry pixel coordinates plus mass and spin
        let lanes = model.lanes();
        assert_eq!(lanes[0], Vec4::new(50.0, 75.0, 10.0, 0.2));
        assert_eq!(lanes[1], Vec4::new(50.0, 25.0, 10.0, -0.2));
        assert_eq!(lanes[2], Vec4::new(150.0, 25.0, 10.0, 0.2));
        assert_eq!(lanes[3], Vec4::new(150.0, 75.0, 10.0, -0.2));
    }
}
