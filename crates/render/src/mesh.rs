use crate::backend::BufferId;
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// CPU-side indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Uploaded mesh: what a drawable needs to issue an indexed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuMesh {
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
    pub index_count: u32,
}

impl MeshData {
    /// Axis-aligned cube centered on the origin, 24 vertices with face normals.
    pub fn cube(size: f32) -> Self {
        let p = size * 0.5;
        // (normal, tangent u, tangent v) for each face
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        let mut mesh = Self::default();
        for (n, u, v) in faces {
            let base = mesh.vertices.len() as u32;
            for (cu, cv) in corners {
                let position = [
                    (n[0] + u[0] * cu + v[0] * cv) * p,
                    (n[1] + u[1] * cu + v[1] * cv) * p,
                    (n[2] + u[2] * cu + v[2] * cv) * p,
                ];
                mesh.vertices.push(Vertex {
                    position,
                    normal: n,
                    uv: [(cu + 1.0) * 0.5, 1.0 - (cv + 1.0) * 0.5],
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        mesh
    }

    /// Horizontal square in the XZ plane facing +Y.
    pub fn plane(size: f32, uv_repeat: f32) -> Self {
        let h = size * 0.5;
        #[rustfmt::skip]
        let vertices = vec![
            Vertex { position: [-h, 0.0,  h], normal: [0.0, 1.0, 0.0], uv: [0.0, uv_repeat] },
            Vertex { position: [ h, 0.0,  h], normal: [0.0, 1.0, 0.0], uv: [uv_repeat, uv_repeat] },
            Vertex { position: [ h, 0.0, -h], normal: [0.0, 1.0, 0.0], uv: [uv_repeat, 0.0] },
            Vertex { position: [-h, 0.0, -h], normal: [0.0, 1.0, 0.0], uv: [0.0, 0.0] },
        ];
        Self {
            vertices,
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn cube_has_six_quads() {
        let cube = MeshData::cube(1.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert!(cube.indices.iter().all(|i| (*i as usize) < cube.vertices.len()));
    }

    #[test]
    fn cube_faces_wind_counter_clockwise() {
        let cube = MeshData::cube(2.0);
        for tri in cube.indices.chunks(3) {
            let a = Vec3::from(cube.vertices[tri[0] as usize].position);
            let b = Vec3::from(cube.vertices[tri[1] as usize].position);
            let c = Vec3::from(cube.vertices[tri[2] as usize].position);
            let n = Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn cube_vertices_lie_on_surface() {
        let cube = MeshData::cube(2.0);
        for v in &cube.vertices {
            let max = v.position.iter().fold(0.0_f32, |m, c| m.max(c.abs()));
            assert!((max - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn plane_faces_up() {
        let plane = MeshData::plane(10.0, 4.0);
        let v = &plane.vertices;
        let a = Vec3::from(v[0].position);
        let b = Vec3::from(v[1].position);
        let c = Vec3::from(v[2].position);
        assert!((b - a).cross(c - a).y > 0.0);
    }
}
