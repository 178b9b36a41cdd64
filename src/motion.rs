//! Motion integration math.
//!
//! Pure functions used by the controller systems each fixed tick:
//! - camera-relative movement force and extra fall gravity for the ball
//! - tilt and centering targets for the pogo stick
//! - conversion of a target rotation into an angular velocity, so rotation is
//!   driven through the physics engine instead of written to the transform
//!
//! Angles exchanged with configuration and UI are in degrees. Body Euler angles
//! use yaw about Y, then pitch about X, then roll about Z.

use bevy::prelude::*;

use crate::config::{BallConfig, PogoConfig};

/// Movement input shorter than this (after normalization) is ignored.
pub const MIN_INPUT_MAGNITUDE: f32 = 0.1;

/// Orientation of the view camera, reduced to what the controllers need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    /// Camera forward direction.
    pub forward: Vec3,
    /// Camera right direction.
    pub right: Vec3,
    /// Camera yaw in degrees.
    pub yaw: f32,
}

impl Default for CameraBasis {
    fn default() -> Self {
        Self::from_rotation(Quat::IDENTITY)
    }
}

impl CameraBasis {
    pub fn from_rotation(rotation: Quat) -> Self {
        let (yaw, _, _) = rotation.to_euler(EulerRot::YXZ);
        Self {
            forward: rotation * Vec3::NEG_Z,
            right: rotation * Vec3::X,
            yaw: yaw.to_degrees(),
        }
    }

    pub fn from_global_transform(transform: &GlobalTransform) -> Self {
        let (_, rotation, _) = transform.to_scale_rotation_translation();
        Self::from_rotation(rotation)
    }

    /// Forward projected onto the ground plane.
    pub fn flat_forward(&self) -> Vec3 {
        flatten(self.forward)
    }

    /// Right projected onto the ground plane.
    pub fn flat_right(&self) -> Vec3 {
        flatten(self.right)
    }
}

/// Drop the Y component and renormalize. Zero for vertical input.
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z).normalize_or_zero()
}

/// World-space direction for planar `input` as seen from `camera`.
///
/// `None` when the input is too small to count as movement.
pub fn camera_relative_direction(input: Vec2, camera: &CameraBasis) -> Option<Vec3> {
    let direction = Vec3::new(input.x, 0.0, input.y).normalize_or_zero();
    if direction.length() < MIN_INPUT_MAGNITUDE {
        return None;
    }
    Some(direction.z * camera.flat_forward() + direction.x * camera.flat_right())
}

/// Movement force for the ball this tick.
pub fn movement_force(input: Vec2, camera: &CameraBasis, grounded: bool, config: &BallConfig) -> Vec3 {
    let Some(direction) = camera_relative_direction(input, camera) else {
        return Vec3::ZERO;
    };
    let control = if grounded {
        1.0
    } else {
        config.air_control_factor
    };
    direction * config.move_force * control
}

/// Extra velocity added while airborne so the ball falls faster than it rises.
#[inline]
pub fn fall_velocity_delta(gravity: Vec3, fall_multiplier: f32, dt: f32) -> Vec3 {
    Vec3::Y * gravity.y * (fall_multiplier - 1.0) * dt
}

/// Wrap an angle in degrees into `(-180, 180]`.
pub fn signed_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Shortest signed difference from `current` to `target`, in degrees.
#[inline]
pub fn delta_angle(current: f32, target: f32) -> f32 {
    signed_degrees(target - current)
}

/// Move an angle toward `target` along the shortest path by at most `max_delta`.
pub fn move_towards_angle(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = delta_angle(current, target);
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

/// Body Euler angles in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyAngles {
    /// Rotation about X, in `(-180, 180]`.
    pub pitch: f32,
    /// Rotation about Y, in `(-180, 180]`.
    pub yaw: f32,
    /// Rotation about Z, in `(-180, 180]`.
    pub roll: f32,
}

impl BodyAngles {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
        Self {
            pitch: signed_degrees(pitch.to_degrees()),
            yaw: signed_degrees(yaw.to_degrees()),
            roll: signed_degrees(roll.to_degrees()),
        }
    }

    pub fn to_rotation(self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            self.roll.to_radians(),
        )
    }
}

/// Target rotation while centering: pitch and roll step toward level, yaw
/// follows the camera.
pub fn centering_target(rotation: Quat, camera_yaw: f32, step: f32) -> Quat {
    let angles = BodyAngles::from_rotation(rotation);
    BodyAngles::new(
        move_towards_angle(angles.pitch, 0.0, step),
        camera_yaw,
        move_towards_angle(angles.roll, 0.0, step),
    )
    .to_rotation()
}

/// Target rotation for a tilt input: pitch from `tilt.y`, roll from `-tilt.x`,
/// both clamped to `config.max_tilt_angle`, yaw following the camera.
pub fn tilt_target(rotation: Quat, tilt: Vec2, camera_yaw: f32, config: &PogoConfig, dt: f32) -> Quat {
    let angles = BodyAngles::from_rotation(rotation);
    let delta_pitch = tilt.y * config.angle_speed * dt;
    let delta_roll = -tilt.x * config.angle_speed * dt;
    let limit = config.max_tilt_angle.abs();

    BodyAngles::new(
        (angles.pitch + delta_pitch).clamp(-limit, limit),
        camera_yaw,
        (angles.roll + delta_roll).clamp(-limit, limit),
    )
    .to_rotation()
}

/// Pogo rotation for this tick: the centering or tilt target blended from the
/// current rotation at `angle_speed`.
pub fn pogo_rotation(
    rotation: Quat,
    tilt: Vec2,
    centering: bool,
    camera_yaw: f32,
    config: &PogoConfig,
    dt: f32,
) -> Quat {
    let target = if centering {
        centering_target(rotation, camera_yaw, config.angle_speed_centering * dt)
    } else {
        tilt_target(rotation, tilt, camera_yaw, config, dt)
    };
    blend_rotation(rotation, target, dt * config.angle_speed)
}

/// Spherical blend from `current` toward `target`, `t` clamped to `[0, 1]`.
#[inline]
pub fn blend_rotation(current: Quat, target: Quat, t: f32) -> Quat {
    current.slerp(target, t.clamp(0.0, 1.0)).normalize()
}

/// Angular velocity that rotates `current` onto `target` in `dt` seconds.
///
/// Zero when `dt` is not positive.
pub fn angular_velocity_to(current: Quat, target: Quat, dt: f32) -> Vec3 {
    if dt <= 0.0 {
        return Vec3::ZERO;
    }
    let mut delta = (target * current.inverse()).normalize();
    if delta.w < 0.0 {
        delta = -delta;
    }
    delta.to_scaled_axis() / dt
}
