//! Ground sensing.
//!
//! Ground contact is determined by casting rays from the body origin. Two
//! sensor shapes are supported:
//! - [`GroundSensor::Sphere`]: a Fibonacci-sphere distribution of rays in every
//!   direction, used by the ball so that it also "grounds" against walls and slopes
//! - [`GroundSensor::Down`]: a single short ray pointing straight down, used by
//!   the pogo stick
//!
//! The sampling itself is backend agnostic: the caller supplies the actual
//! raycast as a closure and receives a [`GroundContacts`] set.

use std::f32::consts::PI;

use bevy::prelude::*;

use crate::collision::CollisionData;

/// Direction `index` of a Fibonacci sphere distribution with `count` points.
///
/// The result is a unit vector and depends only on `(index, count)`.
pub fn fibonacci_direction(index: u32, count: u32) -> Vec3 {
    let count = count.max(1) as f32;
    let i = index as f32;

    let inclination = (1.0 - 2.0 * (i + 0.5) / count).clamp(-1.0, 1.0).acos();
    let azimuth = PI * (1.0 + 5.0_f32.sqrt()) * i;

    Vec3::new(
        inclination.sin() * azimuth.cos(),
        inclination.cos(),
        inclination.sin() * azimuth.sin(),
    )
}

/// All `count` directions of a Fibonacci sphere distribution, in index order.
pub fn fibonacci_directions(count: u32) -> impl Iterator<Item = Vec3> {
    (0..count).map(move |i| fibonacci_direction(i, count))
}

/// Ground sensor configuration.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub enum GroundSensor {
    /// Cast `ray_count` rays of length `radius` in a sphere around the origin.
    Sphere {
        /// Number of rays in the distribution.
        ray_count: u32,
        /// Length of every ray.
        radius: f32,
    },
    /// Cast one ray straight down, starting `offset` above the origin.
    Down {
        /// Height above the body origin where the ray starts.
        offset: f32,
        /// Length of the ray.
        length: f32,
    },
}

impl Default for GroundSensor {
    fn default() -> Self {
        Self::ball()
    }
}

impl GroundSensor {
    /// Sphere sensor tuned for the ball: 50 rays, 3 units long.
    pub fn ball() -> Self {
        Self::Sphere {
            ray_count: 50,
            radius: 3.0,
        }
    }

    /// Down probe tuned for the pogo stick: starts 0.1 above the origin, 1 unit long.
    pub fn pogo() -> Self {
        Self::Down {
            offset: 0.1,
            length: 1.0,
        }
    }

    /// Sample the ground around `origin`.
    ///
    /// `cast` performs a single raycast `(origin, direction, max_distance)` and
    /// returns the first hit, if any.
    pub fn sample<F>(&self, origin: Vec3, cast: F) -> GroundContacts
    where
        F: FnMut(Vec3, Vec3, f32) -> Option<CollisionData>,
    {
        match *self {
            Self::Sphere { ray_count, radius } => sample_sphere(origin, radius, ray_count, cast),
            Self::Down { offset, length } => probe_down(origin, offset, length, cast),
        }
    }
}

/// Cast `ray_count` rays in a Fibonacci sphere around `origin` and collect the
/// distinct colliders that were hit.
pub fn sample_sphere<F>(origin: Vec3, max_distance: f32, ray_count: u32, mut cast: F) -> GroundContacts
where
    F: FnMut(Vec3, Vec3, f32) -> Option<CollisionData>,
{
    let mut contacts = GroundContacts::default();
    for direction in fibonacci_directions(ray_count) {
        if let Some(hit) = cast(origin, direction, max_distance) {
            contacts.insert(hit);
        }
    }
    contacts
}

/// Cast a single ray downward from `offset` above `origin`.
pub fn probe_down<F>(origin: Vec3, offset: f32, length: f32, mut cast: F) -> GroundContacts
where
    F: FnMut(Vec3, Vec3, f32) -> Option<CollisionData>,
{
    let mut contacts = GroundContacts::default();
    if let Some(hit) = cast(origin + Vec3::Y * offset, Vec3::NEG_Y, length) {
        contacts.insert(hit);
    }
    contacts
}

/// Result of the last ground query, one entry per collider.
///
/// Recomputed every fixed tick by the backend's sensor system.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct GroundContacts {
    #[reflect(ignore)]
    contacts: Vec<CollisionData>,
}

impl GroundContacts {
    /// Add a hit unless its collider is already present.
    ///
    /// Returns `true` if the hit was added.
    pub fn insert(&mut self, hit: CollisionData) -> bool {
        if self.contacts.iter().any(|c| c.entity == hit.entity) {
            return false;
        }
        self.contacts.push(hit);
        true
    }

    /// Whether any collider was hit.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        !self.contacts.is_empty()
    }

    /// Number of distinct colliders hit.
    #[inline]
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Iterate over the contacts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CollisionData> {
        self.contacts.iter()
    }

    /// Whether `entity` is among the contacts.
    pub fn contains(&self, entity: Entity) -> bool {
        self.contacts.iter().any(|c| c.entity == Some(entity))
    }

    /// Normalized sum of all contact normals.
    ///
    /// Zero when there are no contacts or the normals cancel out.
    pub fn combined_normal(&self) -> Vec3 {
        self.contacts
            .iter()
            .map(|c| c.normal)
            .sum::<Vec3>()
            .normalize_or_zero()
    }

    /// Replace the contents with a new sample.
    pub fn replace(&mut self, other: GroundContacts) {
        self.contacts = other.contacts;
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
    }
}
