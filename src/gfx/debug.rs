//! Debug line overlay: queued world-space line segments drawn over the
//! final image with the current view-projection, then cleared.

use glam::Vec3;

use crate::gfx::types::LineVertex;
use crate::physics::Obb;

#[derive(Default)]
pub struct DebugLines {
    vertices: Vec<LineVertex>,
}

impl DebugLines {
    pub fn add_line(&mut self, a: Vec3, b: Vec3, color: [f32; 3]) {
        self.vertices.push(LineVertex {
            pos: a.to_array(),
            color,
        });
        self.vertices.push(LineVertex {
            pos: b.to_array(),
            color,
        });
    }

    /// RGB coordinate axes of length `len` at `origin`.
    pub fn add_axes(&mut self, origin: Vec3, len: f32) {
        self.add_line(origin, origin + Vec3::X * len, [1.0, 0.2, 0.2]);
        self.add_line(origin, origin + Vec3::Y * len, [0.2, 1.0, 0.2]);
        self.add_line(origin, origin + Vec3::Z * len, [0.2, 0.4, 1.0]);
    }

    /// Wireframe of an oriented bounding box (12 edges).
    pub fn add_obb(&mut self, obb: &Obb, color: [f32; 3]) {
        let c = obb.corners();
        // corners() orders by (dx, dy, dz) in {-1,1}³, dz fastest.
        const EDGES: [(usize, usize); 12] = [
            (0, 1),
            (2, 3),
            (4, 5),
            (6, 7),
            (0, 2),
            (1, 3),
            (4, 6),
            (5, 7),
            (0, 4),
            (1, 5),
            (2, 6),
            (3, 7),
        ];
        for (a, b) in EDGES {
            self.add_line(c[a], c[b], color);
        }
    }

    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Aabb;
    use glam::Mat4;

    #[test]
    fn obb_wireframe_has_twelve_edges() {
        let mut dbg = DebugLines::default();
        let obb = Obb::from_transform(&Mat4::IDENTITY, &Aabb::UNIT, 1.0);
        dbg.add_obb(&obb, [1.0, 1.0, 0.0]);
        assert_eq!(dbg.vertices().len(), 24);
        dbg.clear();
        assert!(dbg.is_empty());
    }
}
