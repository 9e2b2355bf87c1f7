//! Read-only sampled elevation grid and the flat-footprint predicate.

use glam::Vec3;
use rampart_core::level::TerrainDefinition;

/// Maximum height deviation, in world units, tolerated inside a footprint.
const FLATNESS_TOLERANCE: f32 = 5.0;
/// World heights below this value are reserved for the road network.
const ROAD_ELEVATION: f32 = 5.0;

/// Read-only sampled height grid covering the playable terrain.
///
/// Heights are stored normalized into `0..=1` and scaled by the vertical
/// extent of [`ElevationField::size`] when compared against world values.
/// The grid resolution is independent of the world extent, so a circle in
/// world units maps onto an ellipse in sample coordinates.
#[derive(Clone, Debug)]
pub struct ElevationField {
    resolution: u32,
    size: Vec3,
    heights: Vec<f32>,
}

impl ElevationField {
    /// Builds a field from a validated terrain definition.
    ///
    /// An empty height list denotes uniform terrain at the base height.
    #[must_use]
    pub fn from_definition(definition: &TerrainDefinition) -> Self {
        let sample_count = definition.resolution as usize * definition.resolution as usize;
        let heights = if definition.heights.is_empty() {
            vec![definition.base_height.clamp(0.0, 1.0); sample_count]
        } else {
            definition.heights.clone()
        };
        Self {
            resolution: definition.resolution,
            size: Vec3::from_array(definition.world_size),
            heights,
        }
    }

    /// World-space extent of the terrain.
    #[must_use]
    pub const fn size(&self) -> Vec3 {
        self.size
    }

    /// World height of the sample nearest to the provided ground point.
    #[must_use]
    pub fn height_at_world(&self, x: f32, z: f32) -> Option<f32> {
        let column = (x * self.resolution as f32 / self.size.x).round() as i32;
        let row = (z * self.resolution as f32 / self.size.z).round() as i32;
        self.sample(column, row).map(|height| height * self.size.y)
    }

    /// Reports whether the circular footprint around `center` is flat.
    ///
    /// The circle is converted into elliptical radii in sample coordinates
    /// and its interior is scanned by walking the ellipse boundary with the
    /// incremental midpoint algorithm, testing every interior column of each
    /// boundary row in all four quadrant reflections. The first sample that
    /// deviates from the center height by more than the tolerance decides
    /// the answer.
    #[must_use]
    pub fn is_flat_circle(&self, center: Vec3, radius: i32) -> bool {
        if radius <= 0 {
            return true;
        }
        if center.y < ROAD_ELEVATION {
            return false;
        }

        let cx = center.x.round() as i32;
        let cz = center.z.round() as i32;
        if cx - radius < 0
            || ((cx + radius) as f32) >= self.size.x
            || cz - radius < 0
            || ((cz + radius) as f32) >= self.size.z
        {
            return false;
        }

        let width_scale = self.resolution as f32 / self.size.x;
        let length_scale = self.resolution as f32 / self.size.z;
        let rx = (radius as f32 * width_scale).round() as i32;
        let ry = (radius as f32 * length_scale).round() as i32;

        let center_height = center.y / self.size.y;
        let center_column = ((cx - radius) as f32 * width_scale).round() as i32 + rx;
        let center_row = ((cz - radius) as f32 * length_scale).round() as i32 + ry;

        let sample_is_level = |dc: i32, dr: i32| -> bool {
            match self.sample(center_column + dc, center_row + dr) {
                Some(height) => (height - center_height).abs() * self.size.y <= FLATNESS_TOLERANCE,
                None => false,
            }
        };
        let row_is_level = |boundary_x: i32, offset_y: i32| -> bool {
            for column in 0..boundary_x {
                if !sample_is_level(column, offset_y)
                    || !sample_is_level(-column, offset_y)
                    || !sample_is_level(column, -offset_y)
                    || !sample_is_level(-column, -offset_y)
                {
                    return false;
                }
            }
            true
        };

        let rx2 = f64::from(rx) * f64::from(rx);
        let ry2 = f64::from(ry) * f64::from(ry);
        let mut x = 0_i32;
        let mut y = ry;
        let mut dx = 0.0_f64;
        let mut dy = 2.0 * rx2 * f64::from(y);
        let mut d1 = ry2 - rx2 * f64::from(ry) + 0.25 * rx2;

        // Region 1: tangent slope magnitude below one.
        while dx < dy {
            if d1 < 0.0 {
                x += 1;
                dx += 2.0 * ry2;
                d1 += dx + ry2;
            } else {
                if !row_is_level(x, y) {
                    return false;
                }
                x += 1;
                y -= 1;
                dx += 2.0 * ry2;
                dy -= 2.0 * rx2;
                d1 += dx - dy + ry2;
            }
        }

        // Region 2: remaining rows down to the horizontal axis.
        let mut d2 =
            ry2 * (f64::from(x) + 0.5).powi(2) + rx2 * (f64::from(y) - 1.0).powi(2) - rx2 * ry2;
        while y >= 0 {
            if !row_is_level(x, y) {
                return false;
            }
            if d2 > 0.0 {
                y -= 1;
                dy -= 2.0 * rx2;
                d2 += rx2 - dy;
            } else {
                y -= 1;
                x += 1;
                dx += 2.0 * ry2;
                dy -= 2.0 * rx2;
                d2 += dx - dy + rx2;
            }
        }

        true
    }

    fn sample(&self, column: i32, row: i32) -> Option<f32> {
        if column < 0 || row < 0 {
            return None;
        }
        let resolution = self.resolution as i32;
        if column >= resolution || row >= resolution {
            return None;
        }
        let index = row as usize * self.resolution as usize + column as usize;
        self.heights.get(index).copied()
    }
}
