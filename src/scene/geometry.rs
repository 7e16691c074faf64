use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Vertex layout shared by every effect geometry
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct EffectVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl EffectVertex {
    fn new(position: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            uv,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topology {
    Lines,
    Triangles,
}

/// Local-space shape of an effect object
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Connected points, drawn as line segments
    Polyline(Vec<Vec3>),
    /// Centered rectangle in the XY plane
    Quad { width: f32, height: f32 },
    /// Filled circle in the XY plane
    Disc { radius: f32, segments: u32 },
}

impl Geometry {
    /// Straight vertical streak hanging down from the origin
    pub fn streak(length: f32) -> Self {
        Geometry::Polyline(vec![Vec3::ZERO, Vec3::new(0.0, -length, 0.0)])
    }

    /// Horizontal streak starting at the origin
    pub fn horizontal_streak(length: f32) -> Self {
        Geometry::Polyline(vec![Vec3::ZERO, Vec3::new(length, 0.0, 0.0)])
    }

    /// Square sprite used for point-like particles
    pub fn point(size: f32) -> Self {
        Geometry::Quad {
            width: size,
            height: size,
        }
    }

    pub fn topology(&self) -> Topology {
        match self {
            Geometry::Polyline(_) => Topology::Lines,
            Geometry::Quad { .. } | Geometry::Disc { .. } => Topology::Triangles,
        }
    }

    /// Expand into a non-indexed vertex list matching `topology()`
    pub fn vertices(&self) -> Vec<EffectVertex> {
        match self {
            Geometry::Polyline(points) => points
                .windows(2)
                .flat_map(|pair| {
                    [
                        EffectVertex::new(pair[0], [0.5, 0.5]),
                        EffectVertex::new(pair[1], [0.5, 0.5]),
                    ]
                })
                .collect(),
            Geometry::Quad { width, height } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                let bl = EffectVertex::new(Vec3::new(-hw, -hh, 0.0), [0.0, 1.0]);
                let br = EffectVertex::new(Vec3::new(hw, -hh, 0.0), [1.0, 1.0]);
                let tr = EffectVertex::new(Vec3::new(hw, hh, 0.0), [1.0, 0.0]);
                let tl = EffectVertex::new(Vec3::new(-hw, hh, 0.0), [0.0, 0.0]);
                vec![bl, br, tr, bl, tr, tl]
            }
            Geometry::Disc { radius, segments } => {
                let segments = (*segments).max(3);
                let center = EffectVertex::new(Vec3::ZERO, [0.5, 0.5]);
                let rim = |i: u32| {
                    let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
                    let (sin, cos) = angle.sin_cos();
                    EffectVertex::new(
                        Vec3::new(cos * radius, sin * radius, 0.0),
                        [0.5 + 0.5 * cos, 0.5 - 0.5 * sin],
                    )
                };
                (0..segments)
                    .flat_map(|i| [center, rim(i), rim(i + 1)])
                    .collect()
            }
        }
    }

    pub fn vertex_count(&self) -> u32 {
        match self {
            Geometry::Polyline(points) => (points.len().saturating_sub(1) * 2) as u32,
            Geometry::Quad { .. } => 6,
            Geometry::Disc { segments, .. } => (*segments).max(3) * 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_counts_match_expansion() {
        let shapes = [
            Geometry::streak(1.0),
            Geometry::Polyline(vec![Vec3::ZERO, Vec3::Y, Vec3::X, Vec3::Z]),
            Geometry::point(0.1),
            Geometry::Disc { radius: 1.5, segments: 32 },
            Geometry::Disc { radius: 1.0, segments: 1 },
        ];
        for shape in shapes {
            assert_eq!(shape.vertices().len() as u32, shape.vertex_count(), "{:?}", shape);
        }
    }

    #[test]
    fn test_polyline_becomes_segments() {
        let bolt = Geometry::Polyline(vec![Vec3::ZERO, Vec3::NEG_Y, Vec3::new(1.0, -2.0, 0.0)]);
        let vertices = bolt.vertices();
        assert_eq!(bolt.topology(), Topology::Lines);
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[1].position, vertices[2].position);
    }

    #[test]
    fn test_single_point_polyline_is_empty() {
        assert_eq!(Geometry::Polyline(vec![Vec3::ZERO]).vertex_count(), 0);
    }
}
