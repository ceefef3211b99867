use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Shape of the rolling hills and the shoulders beside the road.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct HeightFieldParams {
    pub hill_spacing: f32,
    pub hill_offset: f32,
    pub hill_up_length: f32,
    pub hill_down_length: f32,
    pub peak_height: f32,
    pub lateral_amplitude: f32,
    pub lateral_frequency: f32,
    pub road_half_width: f32,
    pub flat_start_z: f32,
    pub flat_start_damping: f32,
}

impl Default for HeightFieldParams {
    fn default() -> Self {
        HeightFieldParams {
            hill_spacing: 30.0,
            hill_offset: 60.0,
            hill_up_length: 10.0,
            hill_down_length: 10.0,
            peak_height: 4.0,
            lateral_amplitude: 1.0,
            lateral_frequency: 0.3,
            road_half_width: 5.0,
            flat_start_z: -35.0,
            // 0.04 * (peak + lateral) stays within 5% of the peak
            flat_start_damping: 0.04,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeightField {
    pub params: HeightFieldParams,
}

impl HeightField {
    pub fn new(params: HeightFieldParams) -> Self {
        HeightField { params }
    }

    /// Elevation at any horizontal position, grid-aligned or not.
    pub fn height(&self, x: f32, z: f32) -> f32 {
        let p = &self.params;
        let hill_position = (z + p.hill_offset).rem_euclid(p.hill_spacing);

        let mut y = if hill_position < p.hill_up_length {
            let progress = hill_position / p.hill_up_length;
            (progress * FRAC_PI_2).sin() * p.peak_height
        } else if hill_position < p.hill_up_length + p.hill_down_length {
            let progress = (hill_position - p.hill_up_length) / p.hill_down_length;
            (progress * FRAC_PI_2).cos() * p.peak_height
        } else {
            0.0
        };

        // Road stays flat across, only the shoulders undulate
        if x.abs() > p.road_half_width {
            y += (x * p.lateral_frequency).sin() * p.lateral_amplitude;
        }

        if z < p.flat_start_z {
            y *= p.flat_start_damping;
        }

        y
    }
}

/// Height under the default hill layout. Used every frame to seat the jeep
/// and the camera.
pub fn height_at(x: f32, z: f32) -> f32 {
    HeightField::default().height(x, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_is_deterministic() {
        let field = HeightField::default();
        for &(x, z) in &[(0.0, 0.0), (12.3, -45.6), (-59.9, 59.9), (5.01, 17.5)] {
            assert_eq!(field.height(x, z).to_bits(), field.height(x, z).to_bits());
            assert_eq!(height_at(x, z).to_bits(), field.height(x, z).to_bits());
        }
    }

    #[test]
    fn spawn_point_is_nearly_flat() {
        let peak = HeightFieldParams::default().peak_height;
        assert!(height_at(0.0, -56.0).abs() <= 0.05 * peak);
    }

    #[test]
    fn flat_start_zone_is_bounded_everywhere() {
        let field = HeightField::default();
        let bound = 0.05 * field.params.peak_height + 1e-6;
        let mut x = -80.0;
        while x <= 80.0 {
            let mut z = -120.0;
            while z < field.params.flat_start_z {
                let h = field.height(x, z);
                assert!(h.abs() <= bound, "height {} at ({}, {})", h, x, z);
                z += 0.7;
            }
            x += 0.9;
        }
    }

    #[test]
    fn hill_cycle_ramps_up_then_down() {
        let field = HeightField::default();
        // z = -30 is the start of the first undamped cycle
        assert!(field.height(0.0, -30.0).abs() < 1e-6);
        assert!((field.height(0.0, -20.0) - 4.0).abs() < 1e-5);
        assert!(field.height(0.0, -25.0) > 0.0 && field.height(0.0, -25.0) < 4.0);
        assert!(field.height(0.0, -10.0).abs() < 1e-5);
        assert_eq!(field.height(0.0, -5.0), 0.0);
    }

    #[test]
    fn hills_repeat_with_spacing() {
        let field = HeightField::default();
        for &z in &[-28.0, -21.5, -13.0, -4.0] {
            let a = field.height(0.0, z);
            let b = field.height(0.0, z + 30.0);
            assert!((a - b).abs() < 1e-4, "{} vs {}", a, b);
        }
    }

    #[test]
    fn road_is_flat_across_and_shoulders_undulate() {
        let field = HeightField::default();
        let centre = field.height(0.0, 3.0);
        assert_eq!(field.height(4.9, 3.0), centre);
        assert_eq!(field.height(-5.0, 3.0), centre);

        let shoulder = field.height(8.0, 3.0);
        let expected = centre + (8.0f32 * 0.3).sin();
        assert!((shoulder - expected).abs() < 1e-5);
    }

    #[test]
    fn negative_hill_phase_wraps_forward() {
        let field = HeightField::new(HeightFieldParams {
            flat_start_z: f32::NEG_INFINITY,
            ..HeightFieldParams::default()
        });
        // z + offset = -25, which wraps to phase 5 on the up ramp
        let h = field.height(0.0, -85.0);
        assert!(h > 0.0);
        assert!((h - field.height(0.0, -55.0)).abs() < 1e-5);
    }
}
