use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use crate::game::input::InputState;
use crate::terrain::{HeightField, GROUND_OFFSET};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct VehicleConfig {
    pub spawn_x: f32,
    pub spawn_z: f32,
    pub forward_speed: f32,
    pub reverse_speed: f32,
    pub turn_rate: f32,
    pub steer_angle: f32,
    pub ride_height: f32,
    pub wheelbase: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        VehicleConfig {
            spawn_x: 0.0,
            spawn_z: -50.0,
            forward_speed: 0.2,
            reverse_speed: 0.1,
            turn_rate: 0.05,
            steer_angle: 0.5,
            ride_height: 1.3,
            wheelbase: 3.0,
        }
    }
}

/// Where a wheel sits on the body and whether it steers.
pub struct Wheel {
    pub offset: [f32; 3],
    pub steers: bool,
}

pub const WHEELS: [Wheel; 4] = [
    Wheel { offset: [-1.5, -0.5, 1.5], steers: true },
    Wheel { offset: [1.5, -0.5, 1.5], steers: true },
    Wheel { offset: [-1.5, -0.5, -1.5], steers: false },
    Wheel { offset: [1.5, -0.5, -1.5], steers: false },
];

pub struct Vehicle {
    pub config: VehicleConfig,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Radians about +y; zero faces +z.
    pub heading: f32,
    pub pitch: f32,
    pub speed: f32,
    pub front_wheel_angle: f32,
    pub wheel_rotation: f32,
}

impl Vehicle {
    pub fn new(config: VehicleConfig, field: &HeightField) -> Self {
        let mut vehicle = Vehicle {
            x: config.spawn_x,
            y: 0.0,
            z: config.spawn_z,
            heading: 0.0,
            pitch: 0.0,
            speed: 0.0,
            front_wheel_angle: 0.0,
            wheel_rotation: 0.0,
            config,
        };
        vehicle.settle(field);
        vehicle
    }

    /// Advances one frame. `extent` is the half size of the ground the jeep may roam.
    pub fn update(&mut self, input: &InputState, field: &HeightField, extent: f32) {
        self.speed = if input.forward {
            self.config.forward_speed
        } else if input.reverse {
            -self.config.reverse_speed
        } else {
            0.0
        };

        let turn = if input.left {
            self.front_wheel_angle = self.config.steer_angle;
            self.config.turn_rate
        } else if input.right {
            self.front_wheel_angle = -self.config.steer_angle;
            -self.config.turn_rate
        } else {
            self.front_wheel_angle = 0.0;
            0.0
        };

        self.heading += turn;
        self.x = (self.x + self.heading.sin() * self.speed).clamp(-extent, extent);
        self.z = (self.z + self.heading.cos() * self.speed).clamp(-extent, extent);

        if self.speed != 0.0 {
            self.wheel_rotation += self.speed * 10.0;
        }

        self.settle(field);
    }

    pub fn reset(&mut self, field: &HeightField) {
        self.x = self.config.spawn_x;
        self.z = self.config.spawn_z;
        self.heading = 0.0;
        self.speed = 0.0;
        self.front_wheel_angle = 0.0;
        self.wheel_rotation = 0.0;
        self.settle(field);
    }

    pub fn forward(&self) -> Vector3<f32> {
        Vector3::new(self.heading.sin(), 0.0, self.heading.cos())
    }

    pub fn position(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Body transform: heading about y, then nose up or down along the slope.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.position())
            * Matrix4::from_axis_angle(&Vector3::y_axis(), self.heading)
            * Matrix4::from_axis_angle(&Vector3::x_axis(), -self.pitch)
    }

    fn settle(&mut self, field: &HeightField) {
        let ground = field.height(self.x, self.z);
        self.y = ground - GROUND_OFFSET + self.config.ride_height;

        let half = self.forward() * (self.config.wheelbase / 2.0);
        let front = field.height(self.x + half.x, self.z + half.z);
        let back = field.height(self.x - half.x, self.z - half.z);
        self.pitch = (front - back).atan2(self.config.wheelbase);
    }
}
