/// Floats per vertex: position (3), normal (3), texture coordinate (2).
pub const VERTEX_STRIDE: usize = 8;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Mesh {
            vertices: Vec::with_capacity(vertex_count * VERTEX_STRIDE),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Appends a vertex and returns its index.
    pub fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&position);
        self.vertices.extend_from_slice(&normal);
        self.vertices.extend_from_slice(&tex_coord);
        index
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, index: usize) -> [f32; 3] {
        let v = &self.vertices[index * VERTEX_STRIDE..];
        [v[0], v[1], v[2]]
    }

    pub fn normal(&self, index: usize) -> [f32; 3] {
        let v = &self.vertices[index * VERTEX_STRIDE + 3..];
        [v[0], v[1], v[2]]
    }

    pub fn tex_coord(&self, index: usize) -> [f32; 2] {
        let v = &self.vertices[index * VERTEX_STRIDE + 6..];
        [v[0], v[1]]
    }

    /// Axis-aligned cube centred on the origin with flat per-face normals.
    pub fn cube(size: f32) -> Self {
        let s = size / 2.0;
        let mut mesh = Mesh::with_capacity(24, 36);

        let mut add_face = |corners: [[f32; 3]; 4], normal: [f32; 3]| {
            let base = mesh.push_vertex(corners[0], normal, [0.0, 0.0]);
            mesh.push_vertex(corners[1], normal, [1.0, 0.0]);
            mesh.push_vertex(corners[2], normal, [1.0, 1.0]);
            mesh.push_vertex(corners[3], normal, [0.0, 1.0]);

            mesh.indices.extend_from_slice(&[
                base, base + 1, base + 2,
                base, base + 2, base + 3,
            ]);
        };

        add_face([[-s, -s, s], [s, -s, s], [s, s, s], [-s, s, s]], [0.0, 0.0, 1.0]);
        add_face([[s, -s, -s], [-s, -s, -s], [-s, s, -s], [s, s, -s]], [0.0, 0.0, -1.0]);
        add_face([[-s, s, s], [s, s, s], [s, s, -s], [-s, s, -s]], [0.0, 1.0, 0.0]);
        add_face([[-s, -s, -s], [s, -s, -s], [s, -s, s], [-s, -s, s]], [0.0, -1.0, 0.0]);
        add_face([[s, -s, s], [s, -s, -s], [s, s, -s], [s, s, s]], [1.0, 0.0, 0.0]);
        add_face([[-s, -s, -s], [-s, -s, s], [-s, s, s], [-s, s, -s]], [-1.0, 0.0, 0.0]);

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn push_vertex_interleaves_attributes() {
        let mut mesh = Mesh::default();
        assert_eq!(mesh.push_vertex([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.25]), 0);
        assert_eq!(mesh.push_vertex([4.0, 5.0, 6.0], [1.0, 0.0, 0.0], [0.75, 1.0]), 1);

        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.vertices.len(), 2 * VERTEX_STRIDE);
        assert_eq!(mesh.position(1), [4.0, 5.0, 6.0]);
        assert_eq!(mesh.normal(0), [0.0, 1.0, 0.0]);
        assert_eq!(mesh.tex_coord(1), [0.75, 1.0]);
    }

    #[test]
    fn cube_faces_point_outward() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);

        for tri in cube.indices.chunks(3) {
            let a = Vector3::from(cube.position(tri[0] as usize));
            let b = Vector3::from(cube.position(tri[1] as usize));
            let c = Vector3::from(cube.position(tri[2] as usize));
            let n = Vector3::from(cube.normal(tri[0] as usize));

            let face = (b - a).cross(&(c - a));
            assert!(face.dot(&n) > 0.0, "winding disagrees with normal on {:?}", tri);
            assert!(a.dot(&n) > 0.0, "normal {:?} points inward", n);
        }
    }
}
