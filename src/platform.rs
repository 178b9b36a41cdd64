//! Moving platforms and platform riding.
//!
//! A [`MovingPlatform`] moves its own `Transform` every fixed tick (circle or
//! waypoint route) and records the resulting per-tick displacement and
//! velocity in [`PlatformKinematics`]. Controllers standing on it carry a
//! [`PlatformRider`] that the backend points at the platform while the rider is
//! inside the platform's trigger volume. The displacement is then added to the
//! rider's position, and the ball adds the platform velocity to its jumps.

use std::f32::consts::TAU;

use bevy::prelude::*;

/// Distance under which a waypoint counts as reached.
pub const ARRIVAL_EPSILON: f32 = 0.1;

/// Move `current` toward `target` by at most `max_distance`, never overshooting.
#[inline]
pub fn move_towards_point(current: Vec3, target: Vec3, max_distance: f32) -> Vec3 {
    let offset = target - current;
    let distance = offset.length();
    if distance <= max_distance.max(0.0) || distance <= f32::EPSILON {
        target
    } else {
        current + offset / distance * max_distance.max(0.0)
    }
}

/// What a route does when it reaches its last waypoint.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    /// Continue from the first waypoint.
    Loop,
    /// Walk the list backwards, then forwards again.
    PingPong,
    /// Stop at the last waypoint.
    #[default]
    Clamp,
}

/// Ordered waypoints traversed at constant speed.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct WaypointRoute {
    pub waypoints: Vec<Vec3>,
    /// Units per second.
    pub speed: f32,
    pub traversal: Traversal,
    index: usize,
    reversing: bool,
}

impl WaypointRoute {
    pub fn new(waypoints: Vec<Vec3>, speed: f32, traversal: Traversal) -> Self {
        Self {
            waypoints,
            speed,
            traversal,
            index: 0,
            reversing: false,
        }
    }

    /// Index of the waypoint currently being approached.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Whether a ping-pong route is on its way back.
    #[inline]
    pub fn is_reversing(&self) -> bool {
        self.reversing
    }

    /// Whether the route has enough waypoints to move.
    #[inline]
    pub fn is_movable(&self) -> bool {
        self.waypoints.len() >= 2
    }

    pub fn target(&self) -> Option<Vec3> {
        self.waypoints.get(self.index).copied()
    }

    /// Index of the waypoint closest to `position`.
    pub fn nearest_index(&self, position: Vec3) -> Option<usize> {
        self.waypoints
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.distance_squared(position).total_cmp(&b.distance_squared(position)))
            .map(|(i, _)| i)
    }

    /// Snap to the nearest waypoint and make it the current one.
    ///
    /// Returns the snapped position, or `position` if there are no waypoints.
    pub fn snap(&mut self, position: Vec3) -> Vec3 {
        let Some(nearest) = self.nearest_index(position) else {
            return position;
        };
        self.index = nearest;
        self.reversing = false;
        self.waypoints[nearest]
    }

    /// Move from `position` toward the current waypoint for `dt` seconds.
    ///
    /// Advances to the next waypoint on arrival. Routes with fewer than two
    /// waypoints never move.
    pub fn step(&mut self, position: Vec3, dt: f32) -> Vec3 {
        if !self.is_movable() {
            return position;
        }
        let Some(target) = self.target() else {
            return position;
        };

        let next = move_towards_point(position, target, self.speed * dt.max(0.0));
        if next.distance(target) < ARRIVAL_EPSILON {
            self.advance();
        }
        next
    }

    fn advance(&mut self) {
        let last = self.waypoints.len().saturating_sub(1);
        match self.traversal {
            Traversal::Loop => {
                self.index = if self.index >= last { 0 } else { self.index + 1 };
            }
            Traversal::PingPong => {
                if self.reversing {
                    if self.index == 0 {
                        self.reversing = false;
                        self.index = 1.min(last);
                    } else {
                        self.index -= 1;
                    }
                } else if self.index >= last {
                    self.reversing = true;
                    self.index = last.saturating_sub(1);
                } else {
                    self.index += 1;
                }
            }
            Traversal::Clamp => {
                self.index = (self.index + 1).min(last);
            }
        }
    }
}

/// How a platform moves.
#[derive(Reflect, Debug, Clone, PartialEq, Default)]
pub enum PlatformMotion {
    #[default]
    None,
    /// Circle in the XZ plane around the spawn position.
    Circular {
        radius: f32,
        /// Radians per second.
        speed: f32,
        /// Current phase in `[0, 2π)`.
        angle: f32,
    },
    PointToPoint(WaypointRoute),
}

/// Per-tick displacement and velocity of a platform.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlatformKinematics {
    pub previous: Vec3,
    pub current: Vec3,
    pub displacement: Vec3,
    pub velocity: Vec3,
}

impl PlatformKinematics {
    /// Start tracking from `position` with no motion.
    pub fn reset(&mut self, position: Vec3) {
        *self = Self {
            previous: position,
            current: position,
            ..default()
        };
    }

    /// Record a new position. Velocity is zero when `dt` is not positive.
    pub fn update(&mut self, current: Vec3, dt: f32) {
        self.current = current;
        self.displacement = current - self.previous;
        self.velocity = if dt > 0.0 {
            self.displacement / dt
        } else {
            Vec3::ZERO
        };
        self.previous = current;
    }
}

/// A platform that moves itself every fixed tick.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct MovingPlatform {
    pub motion: PlatformMotion,
    /// Spawn position; center of circular motion.
    start: Vec3,
    kinematics: PlatformKinematics,
}

impl MovingPlatform {
    /// Circle of `radius` around the spawn position at `speed` radians per second.
    pub fn circular(radius: f32, speed: f32) -> Self {
        Self {
            motion: PlatformMotion::Circular {
                radius,
                speed,
                angle: 0.0,
            },
            ..default()
        }
    }

    pub fn point_to_point(waypoints: Vec<Vec3>, speed: f32, traversal: Traversal) -> Self {
        Self {
            motion: PlatformMotion::PointToPoint(WaypointRoute::new(waypoints, speed, traversal)),
            ..default()
        }
    }

    /// A platform that reports kinematics but never moves.
    pub fn stationary() -> Self {
        Self::default()
    }

    #[inline]
    pub fn start(&self) -> Vec3 {
        self.start
    }

    #[inline]
    pub fn kinematics(&self) -> &PlatformKinematics {
        &self.kinematics
    }

    /// Velocity over the last tick.
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.kinematics.velocity
    }

    /// Displacement over the last tick.
    #[inline]
    pub fn displacement(&self) -> Vec3 {
        self.kinematics.displacement
    }

    /// Initialize from the spawn `position`. Returns the position to place the
    /// platform at.
    pub fn spawn_at(&mut self, position: Vec3) -> Vec3 {
        self.start = position;
        let placed = match &mut self.motion {
            PlatformMotion::None => position,
            PlatformMotion::Circular { radius, angle, .. } => {
                position + circle_offset(*radius, *angle)
            }
            PlatformMotion::PointToPoint(route) => route.snap(position),
        };
        self.kinematics.reset(placed);
        placed
    }

    /// Advance the motion by `dt` from `position`. Returns the new position.
    pub fn tick(&mut self, position: Vec3, dt: f32) -> Vec3 {
        let start = self.start;
        let next = match &mut self.motion {
            PlatformMotion::None => position,
            PlatformMotion::Circular {
                radius,
                speed,
                angle,
            } => {
                *angle = (*angle + *speed * dt).rem_euclid(TAU);
                start + circle_offset(*radius, *angle)
            }
            PlatformMotion::PointToPoint(route) => route.step(position, dt),
        };
        self.kinematics.update(next, dt);
        next
    }
}

#[inline]
fn circle_offset(radius: f32, angle: f32) -> Vec3 {
    Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
}

/// The platform a controller is currently riding.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct PlatformRider {
    platform: Option<Entity>,
}

impl PlatformRider {
    #[inline]
    pub fn platform(&self) -> Option<Entity> {
        self.platform
    }

    #[inline]
    pub fn is_riding(&self) -> bool {
        self.platform.is_some()
    }

    /// Start riding `platform`.
    pub fn enter(&mut self, platform: Entity) {
        self.platform = Some(platform);
    }

    /// Stop riding `platform`. Ignored if the rider has since moved to another one.
    ///
    /// Returns `true` if the reference was cleared.
    pub fn exit(&mut self, platform: Entity) -> bool {
        if self.platform == Some(platform) {
            self.platform = None;
            true
        } else {
            false
        }
    }
}

/// Marks a trigger volume that belongs to a moving platform.
///
/// Riders entering this collider start riding the referenced platform. A
/// `MovingPlatform` with a sensor collider of its own does not need one.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct PlatformTrigger(pub Entity);
