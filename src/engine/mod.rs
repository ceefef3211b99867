pub mod mesh;
pub mod renderer;
pub mod texture;
