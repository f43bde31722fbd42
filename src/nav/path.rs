//! Navigation path output

use glam::Vec3;

/// One path vertex. `layer` sizes debug drawing: 0 inside a rasterized leaf,
/// otherwise one more than the octree layer of the voxel it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathPoint {
    pub location: Vec3,
    pub layer: i32,
}

impl PathPoint {
    pub fn new(location: Vec3, layer: i32) -> Self {
        Self { location, layer }
    }
}

/// Ordered path from start to goal
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavPath {
    points: Vec<PathPoint>,
    ready: bool,
}

impl NavPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<PathPoint>) -> Self {
        Self { points, ready: true }
    }

    pub fn add_point(&mut self, point: PathPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [PathPoint] {
        &mut self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True once the search that owns this path finished writing it
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Drop all points before a new search writes into this path
    pub fn reset_for_repath(&mut self) {
        self.points.clear();
        self.ready = false;
    }

    /// Plain polyline for movement components
    pub fn locations(&self) -> Vec<Vec3> {
        self.points.iter().map(|p| p.location).collect()
    }

    /// Sum of segment lengths
    pub fn length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|w| w[0].location.distance(w[1].location))
            .sum()
    }

    /// Chaikin corner cutting. Endpoints stay fixed, every interior corner is
    /// replaced by two points at 1/4 and 3/4 of its adjacent segments.
    pub fn smooth(&mut self, iterations: u32) {
        for _ in 0..iterations {
            if self.points.len() < 3 {
                return;
            }
            let last = self.points.len() - 1;
            let mut smoothed = Vec::with_capacity(self.points.len() * 2);
            smoothed.push(self.points[0]);
            for (i, w) in self.points.windows(2).enumerate() {
                let (a, b) = (w[0], w[1]);
                let layer = a.layer.min(b.layer);
                if i > 0 {
                    smoothed.push(PathPoint::new(a.location.lerp(b.location, 0.25), layer));
                }
                if i + 1 < last {
                    smoothed.push(PathPoint::new(a.location.lerp(b.location, 0.75), layer));
                }
            }
            smoothed.push(self.points[last]);
            self.points = smoothed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner() -> NavPath {
        NavPath::from_points(vec![
            PathPoint::new(Vec3::ZERO, 0),
            PathPoint::new(Vec3::new(4.0, 0.0, 0.0), 1),
            PathPoint::new(Vec3::new(4.0, 4.0, 0.0), 2),
        ])
    }

    #[test]
    fn test_length_and_locations() {
        let path = corner();
        assert_eq!(path.length(), 8.0);
        assert_eq!(path.locations()[1], Vec3::new(4.0, 0.0, 0.0));
        assert!(path.is_ready());
    }

    #[test]
    fn test_reset_for_repath() {
        let mut path = corner();
        path.reset_for_repath();
        assert!(path.is_empty());
        assert!(!path.is_ready());
    }

    #[test]
    fn test_smoothing_cuts_corner() {
        let mut path = corner();
        path.smooth(1);
        let locations = path.locations();
        assert_eq!(
            locations,
            vec![
                Vec3::ZERO,
                Vec3::new(3.0, 0.0, 0.0),
                Vec3::new(4.0, 1.0, 0.0),
                Vec3::new(4.0, 4.0, 0.0),
            ]
        );
        assert!(path.length() < 8.0);

        path.smooth(2);
        assert_eq!(path.points().first().unwrap().location, Vec3::ZERO);
        assert_eq!(path.points().last().unwrap().location, Vec3::new(4.0, 4.0, 0.0));
    }

    #[test]
    fn test_smoothing_keeps_straight_segments() {
        let mut path = NavPath::from_points(vec![
            PathPoint::new(Vec3::ZERO, 1),
            PathPoint::new(Vec3::ONE, 1),
        ]);
        path.smooth(3);
        assert_eq!(path.len(), 2);
    }
}
