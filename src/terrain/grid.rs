use nalgebra::Vector3;
use crate::engine::mesh::Mesh;
use crate::terrain::height::HeightField;

/// Offset used for the central differences behind every normal.
pub const NORMAL_EPSILON: f32 = 0.1;

/// Vertical component of the unnormalised normal. Larger than 1 on purpose:
/// it flattens the shading of slopes.
pub const NORMAL_UP_BIAS: f32 = 2.0;

/// Rectangular lattice centred on the origin.
///
/// Rows advance along +x and columns along -z, so the quads emitted by
/// [`triangulate`] wind counter-clockwise when seen from above.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridDomain {
    pub half_x: f32,
    pub half_z: f32,
    pub step_x: f32,
    pub step_z: f32,
}

impl GridDomain {
    pub fn new(half_x: f32, half_z: f32, step_x: f32, step_z: f32) -> Self {
        debug_assert!(step_x > 0.0 && step_x.is_finite(), "step_x must be positive");
        debug_assert!(step_z > 0.0 && step_z.is_finite(), "step_z must be positive");
        GridDomain { half_x, half_z, step_x, step_z }
    }

    pub fn rows(&self) -> usize {
        samples_along(self.half_x, self.step_x)
    }

    pub fn columns(&self) -> usize {
        samples_along(self.half_z, self.step_z)
    }

    pub fn x_at(&self, row: usize) -> f32 {
        -self.half_x + row as f32 * self.step_x
    }

    pub fn z_at(&self, column: usize) -> f32 {
        self.half_z - column as f32 * self.step_z
    }
}

// Small slack so 2 * 60 / 0.1 style ratios don't lose their last sample to rounding
fn samples_along(half: f32, step: f32) -> usize {
    ((2.0 * half / step) + 1e-4).floor() as usize + 1
}

/// How a sampled surface sits in the world and how its texture tiles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceStyle {
    pub vertical_offset: f32,
    pub tile_size: f32,
}

/// Samples `field` over `domain` and triangulates the lattice.
pub fn sample(domain: &GridDomain, style: &SurfaceStyle, field: &HeightField) -> Mesh {
    let rows = domain.rows();
    let cols = domain.columns();
    let mut mesh = Mesh::with_capacity(rows * cols, 6 * rows.saturating_sub(1) * cols.saturating_sub(1));

    for i in 0..rows {
        let x = domain.x_at(i);
        for j in 0..cols {
            let z = domain.z_at(j);
            let y = field.height(x, z);

            let position = [x, y - style.vertical_offset, z];
            let normal = estimate_normal(field, x, z);
            let tex_coord = [
                (x + domain.half_x) / style.tile_size,
                (z + domain.half_z) / style.tile_size,
            ];
            mesh.push_vertex(position, normal, tex_coord);
        }
    }

    mesh.indices = triangulate(rows, cols);
    mesh
}

/// Central-difference normal with the up component pinned to [`NORMAL_UP_BIAS`].
pub fn estimate_normal(field: &HeightField, x: f32, z: f32) -> [f32; 3] {
    let e = NORMAL_EPSILON;
    let nx = field.height(x - e, z) - field.height(x + e, z);
    let nz = field.height(x, z - e) - field.height(x, z + e);
    let n = Vector3::new(nx, NORMAL_UP_BIAS, nz).normalize();
    [n.x, n.y, n.z]
}

/// Two triangles per lattice quad, `6 * (rows - 1) * (cols - 1)` indices.
pub fn triangulate(rows: usize, cols: usize) -> Vec<u32> {
    if rows < 2 || cols < 2 {
        return Vec::new();
    }

    let mut indices = Vec::with_capacity(6 * (rows - 1) * (cols - 1));
    for i in 0..rows - 1 {
        for j in 0..cols - 1 {
            let top_left = (i * cols + j) as u32;
            let top_right = top_left + 1;
            let bottom_left = ((i + 1) * cols + j) as u32;
            let bottom_right = bottom_left + 1;

            indices.extend_from_slice(&[
                top_left, bottom_left, top_right,
                top_right, bottom_left, bottom_right,
            ]);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangulate_counts_and_bounds() {
        for &(rows, cols) in &[(2, 2), (3, 7), (21, 241), (121, 121), (5, 1), (1, 9)] {
            let indices = triangulate(rows, cols);
            assert_eq!(
                indices.len(),
                6 * rows.saturating_sub(1) * cols.saturating_sub(1)
            );
            assert!(indices.iter().all(|&i| (i as usize) < rows * cols));
        }
    }

    #[test]
    fn triangulate_single_quad() {
        assert_eq!(triangulate(2, 2), vec![0, 2, 1, 1, 2, 3]);
    }

    #[test]
    fn sample_counts_include_both_edges() {
        let domain = GridDomain::new(60.0, 60.0, 1.0, 1.0);
        assert_eq!(domain.rows(), 121);
        assert_eq!(domain.columns(), 121);
        assert_eq!(domain.x_at(0), -60.0);
        assert_eq!(domain.x_at(120), 60.0);
        assert_eq!(domain.z_at(0), 60.0);
        assert_eq!(domain.z_at(120), -60.0);

        let fine = GridDomain::new(60.0, 60.0, 0.1, 0.1);
        assert_eq!(fine.rows(), 1201);
    }

    #[test]
    fn normals_are_unit_length() {
        let field = HeightField::default();
        let domain = GridDomain::new(12.0, 40.0, 0.75, 0.5);
        let style = SurfaceStyle { vertical_offset: 2.5, tile_size: 10.0 };
        let mesh = sample(&domain, &style, &field);
        for i in 0..mesh.vertex_count() {
            let [x, y, z] = mesh.normal(i);
            let len = (x * x + y * y + z * z).sqrt();
            assert!((len - 1.0).abs() <= 1e-5, "normal {} has length {}", i, len);
        }
    }

    #[test]
    fn flat_ground_normal_points_straight_up() {
        let field = HeightField::default();
        // Flat run between hills, on the road
        assert_eq!(estimate_normal(&field, 0.0, -5.0), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn sampled_positions_follow_the_field() {
        let field = HeightField::default();
        let domain = GridDomain::new(10.0, 10.0, 2.0, 2.0);
        let style = SurfaceStyle { vertical_offset: 2.5, tile_size: 5.0 };
        let mesh = sample(&domain, &style, &field);

        let cols = domain.columns();
        let index = 3 * cols + 4;
        let [x, y, z] = mesh.position(index);
        assert_eq!(x, domain.x_at(3));
        assert_eq!(z, domain.z_at(4));
        assert_eq!(y, field.height(x, z) - 2.5);

        let [u, v] = mesh.tex_coord(index);
        assert!((u - (x + 10.0) / 5.0).abs() < 1e-6);
        assert!((v - (z + 10.0) / 5.0).abs() < 1e-6);
    }

    #[test]
    fn faces_wind_upward() {
        let field = HeightField::default();
        let domain = GridDomain::new(20.0, 30.0, 1.0, 1.5);
        let style = SurfaceStyle { vertical_offset: 0.0, tile_size: 10.0 };
        let mesh = sample(&domain, &style, &field);

        for tri in mesh.indices.chunks(3) {
            let a = Vector3::from(mesh.position(tri[0] as usize));
            let b = Vector3::from(mesh.position(tri[1] as usize));
            let c = Vector3::from(mesh.position(tri[2] as usize));
            let face = (b - a).cross(&(c - a));
            assert!(face.y > 0.0, "triangle {:?} faces down", tri);
        }
    }
}
