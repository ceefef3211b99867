pub mod camera;
pub mod input;
pub mod vehicle;

use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use web_sys::WebGlTexture;
use wasm_bindgen::JsValue;
use crate::engine::mesh::Mesh;
use crate::engine::renderer::{GpuMesh, Lighting, Material, Renderer};
use crate::engine::texture::{self, Pattern};
use crate::terrain::{self, HeightField, HeightFieldParams, RoadConfig, TerrainConfig};
use self::camera::{CameraConfig, ChaseCamera};
use self::input::InputState;
use self::vehicle::{Vehicle, VehicleConfig, WHEELS};

/// Everything tunable from `/assets/config.json`. Missing sections keep their defaults.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub terrain: TerrainConfig,
    pub road: RoadConfig,
    pub height: HeightFieldParams,
    pub vehicle: VehicleConfig,
    pub camera: CameraConfig,
}

/// Upper bound on samples per generated grid, keeps a typo'd step from exhausting memory.
pub const MAX_GRID_VERTICES: usize = 1 << 22;

impl AppConfig {
    /// Rejects values the generators cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        positive("terrain.size", self.terrain.size)?;
        positive("terrain.step", self.terrain.step)?;
        positive("terrain.tile_size", self.terrain.tile_size)?;
        positive("road.width", self.road.width)?;
        positive("road.size", self.road.size)?;
        positive("road.step", self.road.step)?;
        positive("road.tile_size", self.road.tile_size)?;
        positive("height.hill_spacing", self.height.hill_spacing)?;

        let h = &self.height;
        for (name, value) in [
            ("height.hill_offset", h.hill_offset),
            ("height.hill_up_length", h.hill_up_length),
            ("height.hill_down_length", h.hill_down_length),
            ("height.peak_height", h.peak_height),
            ("height.lateral_amplitude", h.lateral_amplitude),
            ("height.lateral_frequency", h.lateral_frequency),
            ("height.road_half_width", h.road_half_width),
            ("height.flat_start_z", h.flat_start_z),
            ("height.flat_start_damping", h.flat_start_damping),
        ] {
            if !value.is_finite() {
                return Err(format!("{} must be finite, got {}", name, value));
            }
        }
        if h.hill_up_length < 0.0 || h.hill_down_length < 0.0 {
            return Err("hill ramp lengths must not be negative".to_string());
        }

        for (name, domain) in [("terrain", self.terrain.domain()), ("road", self.road.domain())] {
            let vertices = domain.rows().saturating_mul(domain.columns());
            if vertices > MAX_GRID_VERTICES {
                return Err(format!("{} grid of {} vertices exceeds {}", name, vertices, MAX_GRID_VERTICES));
            }
        }
        Ok(())
    }
}

fn positive(name: &str, value: f32) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{} must be positive and finite, got {}", name, value))
    }
}

const SKY_COLOR: (f32, f32, f32) = (0.5, 0.7, 1.0);
const BODY_COLOR: (f32, f32, f32) = (0.1, 0.45, 0.1);
const WHEEL_COLOR: (f32, f32, f32) = (0.1, 0.1, 0.1);
const BODY_SCALE: [f32; 3] = [1.5, 0.8, 2.5];
const WHEEL_SCALE: f32 = 0.4;
const PATTERN_SIZE: u32 = 64;

pub struct Game {
    pub renderer: Renderer,
    pub config: AppConfig,
    pub field: HeightField,
    pub vehicle: Vehicle,
    pub camera: ChaseCamera,
    terrain_mesh: GpuMesh,
    road_mesh: GpuMesh,
    cube_mesh: GpuMesh,
    grass_texture: Option<WebGlTexture>,
    road_texture: Option<WebGlTexture>,
}

impl Game {
    pub fn new(renderer: Renderer, config: AppConfig) -> Result<Self, JsValue> {
        let field = HeightField::new(config.height.clone());

        // CPU meshes drop at the end of this scope, the GPU keeps its copies
        let terrain_mesh = renderer.upload_mesh(&terrain::generate_terrain_mesh(&config.terrain, &field))?;
        let road_mesh = renderer.upload_mesh(&terrain::generate_road_mesh(&config.road, &field))?;
        let cube_mesh = renderer.upload_mesh(&Mesh::cube(2.0))?;

        let grass_texture = load_texture(&renderer, "assets/textures/grass.png", &texture::grass(PATTERN_SIZE));
        let road_texture = load_texture(&renderer, "assets/textures/road.png", &texture::asphalt(PATTERN_SIZE));

        let vehicle = Vehicle::new(config.vehicle.clone(), &field);
        let mut camera = ChaseCamera::new(config.camera.clone());
        camera.follow(&vehicle, &field);

        Ok(Game {
            renderer,
            config,
            field,
            vehicle,
            camera,
            terrain_mesh,
            road_mesh,
            cube_mesh,
            grass_texture,
            road_texture,
        })
    }

    pub fn update(&mut self, input: &InputState) {
        self.vehicle.update(input, &self.field, self.config.terrain.size);
        self.camera.follow(&self.vehicle, &self.field);
    }

    pub fn restart(&mut self) {
        log::info!("restarting drive");
        self.vehicle.reset(&self.field);
        self.camera.follow(&self.vehicle, &self.field);
    }

    pub fn render(&self) {
        let (r, g, b) = SKY_COLOR;
        self.renderer.clear(r, g, b);
        self.renderer.enable_depth_test();

        let (width, height) = match self.renderer.canvas() {
            Some(canvas) => (canvas.width(), canvas.height()),
            None => return,
        };
        self.renderer.resize(width as i32, height as i32);

        let aspect = width as f32 / height.max(1) as f32;
        let projection = self.camera.projection(aspect);
        let view = self.camera.view();

        self.renderer.set_lighting(&self.lighting());

        let identity = Matrix4::identity();
        self.renderer.draw_indexed(
            &self.terrain_mesh, &identity, &view, &projection,
            &Material { color: None, texture: self.grass_texture.as_ref() },
        );
        self.renderer.draw_indexed(
            &self.road_mesh, &identity, &view, &projection,
            &Material { color: None, texture: self.road_texture.as_ref() },
        );

        self.draw_jeep(&view, &projection);
    }

    fn lighting(&self) -> Lighting {
        let forward = self.vehicle.forward();
        Lighting {
            ambient: (0.35, 0.35, 0.4),
            sun_direction: Vector3::new(-0.4, -1.0, 0.3),
            sun_color: (0.7, 0.7, 0.65),
            headlight_position: self.vehicle.position() + forward * 2.6 + Vector3::y() * 0.3,
            headlight_direction: forward - Vector3::y() * 0.2,
        }
    }

    fn draw_jeep(&self, view: &Matrix4<f32>, projection: &Matrix4<f32>) {
        let body = self.vehicle.model_matrix();

        let body_model = body * Matrix4::new_nonuniform_scaling(&Vector3::from(BODY_SCALE));
        self.renderer.draw_indexed(
            &self.cube_mesh, &body_model, view, projection,
            &Material { color: Some(BODY_COLOR), texture: None },
        );

        for wheel in WHEELS.iter() {
            let steer = if wheel.steers { self.vehicle.front_wheel_angle } else { 0.0 };
            let model = body
                * Matrix4::new_translation(&Vector3::from(wheel.offset))
                * Matrix4::from_axis_angle(&Vector3::y_axis(), steer)
                * Matrix4::from_axis_angle(&Vector3::x_axis(), self.vehicle.wheel_rotation)
                * Matrix4::new_scaling(WHEEL_SCALE);
            self.renderer.draw_indexed(
                &self.cube_mesh, &model, view, projection,
                &Material { color: Some(WHEEL_COLOR), texture: None },
            );
        }
    }
}

fn load_texture(renderer: &Renderer, url: &str, fallback: &Pattern) -> Option<WebGlTexture> {
    match renderer.create_texture(url, fallback) {
        Ok(texture) => Some(texture),
        Err(e) => {
            log::warn!("texture {} unavailable: {:?}", url, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.terrain.size, 60.0);
        assert_eq!(config.road.step, 0.5);
        assert_eq!(config.height.hill_spacing, 30.0);
    }

    #[test]
    fn partial_sections_keep_other_fields() {
        let json = r#"{
            "terrain": { "step": 2.0 },
            "height": { "peak_height": 6.5 },
            "vehicle": { "forward_speed": 0.3 }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.terrain.step, 2.0);
        assert_eq!(config.terrain.size, 60.0);
        assert_eq!(config.height.peak_height, 6.5);
        assert_eq!(config.height.hill_offset, 60.0);
        assert_eq!(config.vehicle.forward_speed, 0.3);
        assert_eq!(config.vehicle.spawn_z, -50.0);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn malformed_config_is_rejected() {
        assert!(serde_json::from_str::<AppConfig>(r#"{ "terrain": { "size": "big" } }"#).is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(AppConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_or_negative_steps_are_rejected() {
        for json in [
            r#"{ "terrain": { "step": 0.0 } }"#,
            r#"{ "terrain": { "step": -1.0 } }"#,
            r#"{ "road": { "step": 0.0 } }"#,
            r#"{ "road": { "width": -10.0 } }"#,
            r#"{ "terrain": { "tile_size": 0.0 } }"#,
        ] {
            let config: AppConfig = serde_json::from_str(json).unwrap();
            assert!(config.validate().is_err(), "accepted {}", json);
        }
    }

    #[test]
    fn zero_hill_spacing_is_rejected() {
        let config: AppConfig = serde_json::from_str(r#"{ "height": { "hill_spacing": 0.0 } }"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("hill_spacing"));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut config = AppConfig::default();
        config.terrain.step = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.height.peak_height = f32::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn tiny_step_is_rejected_before_generation() {
        let config: AppConfig = serde_json::from_str(r#"{ "terrain": { "step": 0.001 } }"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("terrain grid"));
    }
}
