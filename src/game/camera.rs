use nalgebra::{Matrix4, Perspective3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use crate::game::vehicle::Vehicle;
use crate::terrain::{HeightField, GROUND_OFFSET};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f32,
    pub height: f32,
    pub look_height: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            distance: 15.0,
            height: 5.0,
            look_height: 1.0,
            fov_degrees: 45.0,
            near: 0.1,
            far: 200.0,
        }
    }
}

/// Follows the jeep from behind and above.
pub struct ChaseCamera {
    pub config: CameraConfig,
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
}

impl ChaseCamera {
    pub fn new(config: CameraConfig) -> Self {
        ChaseCamera {
            config,
            eye: Point3::new(0.0, 0.0, -1.0),
            target: Point3::origin(),
        }
    }

    pub fn follow(&mut self, vehicle: &Vehicle, field: &HeightField) {
        let up = Vector3::y();
        let position = vehicle.position();

        let mut eye = position - vehicle.forward() * self.config.distance + up * self.config.height;
        // Never sink into a hill behind the jeep
        let ground = field.height(eye.x, eye.z) - GROUND_OFFSET;
        eye.y = eye.y.max(ground + 1.0);

        self.eye = Point3::from(eye);
        self.target = Point3::from(position + up * self.config.look_height);
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.eye, &self.target, &Vector3::y())
    }

    pub fn projection(&self, aspect: f32) -> Matrix4<f32> {
        Perspective3::new(
            aspect,
            self.config.fov_degrees.to_radians(),
            self.config.near,
            self.config.far,
        )
        .to_homogeneous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::vehicle::VehicleConfig;

    #[test]
    fn sits_behind_and_above_the_jeep() {
        let field = HeightField::default();
        let jeep = Vehicle::new(VehicleConfig::default(), &field);
        let mut camera = ChaseCamera::new(CameraConfig::default());
        camera.follow(&jeep, &field);

        assert!((camera.eye.z - (jeep.z - 15.0)).abs() < 1e-4);
        assert!((camera.eye.y - (jeep.y + 5.0)).abs() < 1e-4);
        assert!((camera.target.y - (jeep.y + 1.0)).abs() < 1e-4);
    }

    #[test]
    fn target_projects_to_screen_centre() {
        let field = HeightField::default();
        let jeep = Vehicle::new(VehicleConfig::default(), &field);
        let mut camera = ChaseCamera::new(CameraConfig::default());
        camera.follow(&jeep, &field);

        let clip = camera.projection(16.0 / 9.0) * camera.view() * camera.target.to_homogeneous();
        assert!((clip.x / clip.w).abs() < 1e-4);
        assert!((clip.y / clip.w).abs() < 1e-4);
        assert!(clip.w > 0.0);
    }

    #[test]
    fn lifts_over_terrain_behind() {
        let field = HeightField::default();
        let mut jeep = Vehicle::new(VehicleConfig::default(), &field);
        let camera_config = CameraConfig { height: -10.0, ..CameraConfig::default() };
        jeep.z = 0.0;
        let mut camera = ChaseCamera::new(camera_config);
        camera.follow(&jeep, &field);

        let ground = field.height(camera.eye.x, camera.eye.z) - GROUND_OFFSET;
        assert!(camera.eye.y >= ground + 1.0 - 1e-5);
    }
}
