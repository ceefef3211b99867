pub mod grid;
pub mod height;

use serde::{Deserialize, Serialize};
use crate::engine::mesh::Mesh;
use self::grid::{GridDomain, SurfaceStyle};

pub use self::height::{height_at, HeightField, HeightFieldParams};

/// Drops the whole ground below the camera's reference plane.
pub const GROUND_OFFSET: f32 = 2.5;

/// Lift of the road above the terrain beneath it, against z-fighting.
pub const ROAD_BIAS: f32 = 0.05;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Half extent of the square terrain.
    pub size: f32,
    pub step: f32,
    pub tile_size: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig { size: 60.0, step: 1.0, tile_size: 10.0 }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RoadConfig {
    /// Full width across x.
    pub width: f32,
    /// Half length along z, matched to the terrain size.
    pub size: f32,
    pub step: f32,
    pub tile_size: f32,
}

impl Default for RoadConfig {
    fn default() -> Self {
        RoadConfig { width: 10.0, size: 60.0, step: 0.5, tile_size: 5.0 }
    }
}

impl RoadConfig {
    pub fn domain(&self) -> GridDomain {
        GridDomain::new(self.width / 2.0, self.size, self.step, self.step)
    }
}

impl TerrainConfig {
    pub fn domain(&self) -> GridDomain {
        GridDomain::new(self.size, self.size, self.step, self.step)
    }
}

pub fn generate_terrain_mesh(config: &TerrainConfig, field: &HeightField) -> Mesh {
    let style = SurfaceStyle { vertical_offset: GROUND_OFFSET, tile_size: config.tile_size };
    let mesh = grid::sample(&config.domain(), &style, field);
    log::info!(
        "terrain mesh: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    mesh
}

/// Narrow strip over the same height field, sitting [`ROAD_BIAS`] above the terrain.
pub fn generate_road_mesh(config: &RoadConfig, field: &HeightField) -> Mesh {
    let style = SurfaceStyle {
        vertical_offset: GROUND_OFFSET - ROAD_BIAS,
        tile_size: config.tile_size,
    };
    let mesh = grid::sample(&config.domain(), &style, field);
    log::info!(
        "road mesh: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    mesh
}
