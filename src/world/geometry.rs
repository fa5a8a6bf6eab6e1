use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Level extent. The origin is the lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Bounds { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a point so a box of `half_extents` around it stays inside.
    pub fn clamp(&self, point: Vec2, half_extents: Vec2) -> Vec2 {
        let min = half_extents.min(self.center());
        let max = (Vec2::new(self.width, self.height) - half_extents).max(self.center());
        point.clamp(min, max)
    }
}

/// Axis-aligned rectangle described by its center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Footprint {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Footprint {
            center,
            half_extents: size / 2.0,
        }
    }

    pub fn square(center: Vec2, side: f32) -> Self {
        Footprint::new(center, Vec2::splat(side))
    }

    pub fn width(&self) -> f32 {
        self.half_extents.x * 2.0
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Corners in counter-clockwise order starting at the lower left.
    pub fn corners(&self) -> [Vec2; 4] {
        let (min, max) = (self.min(), self.max());
        [
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ]
    }

    pub fn overlaps(&self, other: &Footprint) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        d.x < reach.x && d.y < reach.y
    }
}

/// Convex polygon with counter-clockwise vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
}

const EDGE_EPSILON: f32 = 1e-3;

impl Polygon {
    pub fn from_footprint(footprint: &Footprint) -> Self {
        Polygon {
            vertices: footprint.corners().to_vec(),
        }
    }

    fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// True when `point` is inside or on the boundary (within a small tolerance).
    pub fn contains(&self, point: Vec2) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        self.edges().all(|(a, b)| {
            let edge = b - a;
            let len = edge.length().max(f32::EPSILON);
            edge.perp_dot(point - a) / len >= -EDGE_EPSILON
        })
    }

    /// Nearest point of the polygon (interior included) to `point`.
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        if self.contains(point) {
            return point;
        }
        let mut best = point;
        let mut best_dist = f32::MAX;
        for (a, b) in self.edges() {
            let edge = b - a;
            let len_sq = edge.length_squared();
            let t = if len_sq > 0.0 {
                ((point - a).dot(edge) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let candidate = a + edge * t;
            let dist = candidate.distance_squared(point);
            if dist < best_dist {
                best_dist = dist;
                best = candidate;
            }
        }
        best
    }

    pub fn centroid(&self) -> Vec2 {
        if self.vertices.is_empty() {
            return Vec2::ZERO;
        }
        self.vertices.iter().copied().sum::<Vec2>() / self.vertices.len() as f32
    }
}

/// Static level geometry that blocks movement and repels steering agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub footprint: Footprint,
    pub polygon: Polygon,
}

impl Obstacle {
    pub fn new(footprint: Footprint) -> Self {
        Obstacle {
            polygon: Polygon::from_footprint(&footprint),
            footprint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacle_polygon_encloses_footprint_corners() {
        let obstacle = Obstacle::new(Footprint::new(Vec2::new(300.0, 410.5), Vec2::new(96.0, 48.0)));
        for corner in obstacle.footprint.corners() {
            assert!(
                obstacle.polygon.contains(corner),
                "Corner {:?} should lie on the polygon",
                corner
            );
        }
        assert!(obstacle.polygon.contains(obstacle.footprint.center));
        assert!(!obstacle.polygon.contains(Vec2::new(300.0, 500.0)));
    }

    #[test]
    fn closest_point_projects_onto_edge() {
        let polygon = Polygon::from_footprint(&Footprint::square(Vec2::ZERO, 2.0));
        let p = polygon.closest_point(Vec2::new(5.0, 0.5));
        assert!((p - Vec2::new(1.0, 0.5)).length() < 1e-5, "got {:?}", p);

        let inside = Vec2::new(0.2, -0.3);
        assert_eq!(polygon.closest_point(inside), inside);
    }

    #[test]
    fn footprint_overlap_is_strict() {
        let a = Footprint::square(Vec2::ZERO, 2.0);
        let touching = Footprint::square(Vec2::new(2.0, 0.0), 2.0);
        let overlapping = Footprint::square(Vec2::new(1.5, 1.5), 2.0);
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&overlapping));
    }

    #[test]
    fn bounds_clamp_keeps_box_inside() {
        let bounds = Bounds::new(100.0, 50.0);
        let clamped = bounds.clamp(Vec2::new(-10.0, 80.0), Vec2::splat(5.0));
        assert_eq!(clamped, Vec2::new(5.0, 45.0));
    }
}
