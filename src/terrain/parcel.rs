//! Parcel coordinates and parcel-space rectangles

use serde::{Deserialize, Serialize};

use crate::core::types::{IVec2, Vec2, Vec3};
use crate::math::Aabb;

/// Integer coordinate of one square terrain cell.
///
/// Stateless identity: used as the key for RNG seeding, occupancy lookup and
/// scatter determinism.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parcel {
    pub x: i32,
    pub y: i32,
}

impl Parcel {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Parcel containing the given world XZ position
    pub fn from_world(x: f32, z: f32, parcel_size: f32) -> Self {
        Self {
            x: (x / parcel_size).floor() as i32,
            y: (z / parcel_size).floor() as i32,
        }
    }

    /// World-space XZ corner with the smallest coordinates
    pub fn world_min(&self, parcel_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * parcel_size, self.y as f32 * parcel_size)
    }

    /// World-space bounds spanning heights `[0, max_height]`
    pub fn world_aabb(&self, parcel_size: f32, max_height: f32) -> Aabb {
        let min = self.world_min(parcel_size);
        Aabb::new(
            Vec3::new(min.x, 0.0, min.y),
            Vec3::new(min.x + parcel_size, max_height, min.y + parcel_size),
        )
    }
}

/// Rectangular extent in parcel space: `min` inclusive, `max` exclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl ParcelRect {
    pub fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    /// Rect of `2 * radius + 1` parcels on a side centered on `center`
    pub fn centered(center: Parcel, radius: i32) -> Self {
        Self {
            min: IVec2::new(center.x - radius, center.y - radius),
            max: IVec2::new(center.x + radius + 1, center.y + radius + 1),
        }
    }

    pub fn width(&self) -> i32 {
        (self.max.x - self.min.x).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.max.y - self.min.y).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn contains(&self, p: Parcel) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Intersection of two rects (possibly empty)
    pub fn intersect(&self, other: &ParcelRect) -> ParcelRect {
        ParcelRect {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// Row-major iteration over contained parcels
    pub fn iter(&self) -> impl Iterator<Item = Parcel> + '_ {
        let rect = *self;
        (rect.min.y..rect.max.y)
            .flat_map(move |y| (rect.min.x..rect.max.x).map(move |x| Parcel::new(x, y)))
    }
}
