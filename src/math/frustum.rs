//! Clip volume for visibility and collision relevance culling

use crate::core::types::{Mat4, Vec2, Vec3, Vec4};
use super::aabb::Aabb;

/// A plane defined by normal and distance from origin.
///
/// Stores a precomputed corner selector: for each axis, whether the AABB
/// corner farthest along the plane normal is the max (`true`) or min corner.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
    positive_corner: [bool; 3],
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self {
            normal,
            distance,
            positive_corner: [normal.x >= 0.0, normal.y >= 0.0, normal.z >= 0.0],
        }
    }

    /// Signed distance from point to plane (positive = in front)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    /// The AABB corner farthest along the plane normal (p-vertex)
    pub fn positive_vertex(&self, aabb: &Aabb) -> Vec3 {
        Vec3::new(
            if self.positive_corner[0] { aabb.max.x } else { aabb.min.x },
            if self.positive_corner[1] { aabb.max.y } else { aabb.min.y },
            if self.positive_corner[2] { aabb.max.z } else { aabb.min.z },
        )
    }
}

/// Convex clip volume with 6 planes (Near, Far, Left, Right, Top, Bottom)
///
/// Extracted from a view-projection matrix; used both for render visibility
/// and for collision relevance tests.
#[derive(Clone, Copy, Debug)]
pub struct ClipVolume {
    pub planes: [Plane; 6],
}

impl ClipVolume {
    /// Extract clip planes from a view-projection matrix
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        // Left: row3 + row0
        let left = Self::normalize_plane(Vec4::new(
            m[0][3] + m[0][0],
            m[1][3] + m[1][0],
            m[2][3] + m[2][0],
            m[3][3] + m[3][0],
        ));

        // Right: row3 - row0
        let right = Self::normalize_plane(Vec4::new(
            m[0][3] - m[0][0],
            m[1][3] - m[1][0],
            m[2][3] - m[2][0],
            m[3][3] - m[3][0],
        ));

        // Bottom: row3 + row1
        let bottom = Self::normalize_plane(Vec4::new(
            m[0][3] + m[0][1],
            m[1][3] + m[1][1],
            m[2][3] + m[2][1],
            m[3][3] + m[3][1],
        ));

        // Top: row3 - row1
        let top = Self::normalize_plane(Vec4::new(
            m[0][3] - m[0][1],
            m[1][3] - m[1][1],
            m[2][3] - m[2][1],
            m[3][3] - m[3][1],
        ));

        // Near: row3 + row2
        let near = Self::normalize_plane(Vec4::new(
            m[0][3] + m[0][2],
            m[1][3] + m[1][2],
            m[2][3] + m[2][2],
            m[3][3] + m[3][2],
        ));

        // Far: row3 - row2
        let far = Self::normalize_plane(Vec4::new(
            m[0][3] - m[0][2],
            m[1][3] - m[1][2],
            m[2][3] - m[2][2],
            m[3][3] - m[3][2],
        ));

        Self {
            planes: [near, far, left, right, top, bottom],
        }
    }

    fn normalize_plane(plane: Vec4) -> Plane {
        let normal = Vec3::new(plane.x, plane.y, plane.z);
        let len = normal.length();
        Plane::new(normal / len, plane.w / len)
    }

    /// Check if point is inside the volume
    pub fn contains_point(&self, point: Vec3) -> bool {
        for plane in &self.planes {
            if plane.distance_to_point(point) < 0.0 {
                return false;
            }
        }
        true
    }

    /// Check if AABB overlaps the volume (conservative positive-vertex test).
    ///
    /// Never rejects a box that does overlap; may accept boxes that do not.
    pub fn overlaps(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            // If the p-vertex is outside, the whole AABB is outside
            if plane.distance_to_point(plane.positive_vertex(aabb)) < 0.0 {
                return false;
            }
        }
        true
    }
}

/// World-space XZ rectangle spanned by the view frustum.
///
/// Computed from the far-plane corners (inverse view-projection of the NDC
/// far face, valid for both 0..1 and -1..1 depth conventions) together with
/// the camera position. Conservative: the true frustum footprint is contained
/// within the returned rectangle.
pub fn frustum_world_rect(vp: &Mat4, camera_pos: Vec3) -> Option<(Vec2, Vec2)> {
    let inv = vp.inverse();
    if !inv.is_finite() {
        return None;
    }

    let mut min = Vec2::new(camera_pos.x, camera_pos.z);
    let mut max = min;
    for ndc_x in [-1.0f32, 1.0] {
        for ndc_y in [-1.0f32, 1.0] {
            let corner = inv.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
            if !corner.is_finite() {
                return None;
            }
            min = min.min(Vec2::new(corner.x, corner.z));
            max = max.max(Vec2::new(corner.x, corner.z));
        }
    }
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_volume() -> ClipVolume {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, 1.0, 0.1, 500.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 10.0, -100.0), Vec3::Y);
        ClipVolume::from_view_projection(&(proj * view))
    }

    #[test]
    fn test_plane_distance() {
        let plane = Plane::new(Vec3::Y, 0.0); // XZ plane
        assert_eq!(plane.distance_to_point(Vec3::new(0.0, 5.0, 0.0)), 5.0);
        assert_eq!(plane.distance_to_point(Vec3::new(0.0, -3.0, 0.0)), -3.0);
    }

    #[test]
    fn test_positive_vertex_selection() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let up = Plane::new(Vec3::Y, 0.0);
        assert_eq!(up.positive_vertex(&aabb).y, 1.0);
        let down = Plane::new(-Vec3::Y, 0.0);
        assert_eq!(down.positive_vertex(&aabb).y, 0.0);
    }

    #[test]
    fn test_contains_point() {
        let volume = test_volume();
        assert!(volume.contains_point(Vec3::new(0.0, 10.0, -50.0)));
        assert!(!volume.contains_point(Vec3::new(0.0, 10.0, 50.0)));
    }

    #[test]
    fn test_overlaps_contained_box() {
        let volume = test_volume();
        let inside = Aabb::from_center_half_extent(Vec3::new(0.0, 10.0, -50.0), Vec3::splat(2.0));
        assert!(volume.overlaps(&inside));
    }

    #[test]
    fn test_overlaps_rejects_behind_camera() {
        let volume = test_volume();
        // Fully behind the near plane: every corner shares the same outside half-space
        let behind = Aabb::from_center_half_extent(Vec3::new(0.0, 10.0, 100.0), Vec3::splat(2.0));
        assert!(!volume.overlaps(&behind));
    }

    #[test]
    fn test_overlaps_straddling_box() {
        let volume = test_volume();
        // Huge box enclosing the whole frustum must never be rejected
        let huge = Aabb::from_center_half_extent(Vec3::new(0.0, 0.0, -100.0), Vec3::splat(1000.0));
        assert!(volume.overlaps(&huge));
    }

    #[test]
    fn test_world_rect_covers_footprint() {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, 1.0, 0.1, 500.0);
        let cam = Vec3::new(3.0, 10.0, 7.0);
        let view = Mat4::look_at_rh(cam, cam + Vec3::new(0.0, -0.2, -1.0), Vec3::Y);
        let (min, max) = frustum_world_rect(&(proj * view), cam).unwrap();

        // Camera position always inside the rect
        assert!(min.x <= cam.x && cam.x <= max.x);
        assert!(min.y <= cam.z && cam.z <= max.y);
        // Looking down -Z, the rect must extend well in front of the camera
        assert!(min.y < cam.z - 100.0);
    }
}
