//! Controller components and configuration.
//!
//! Each controller has two components:
//! - a **hub** ([`BallController`], [`PogoController`]) holding runtime state and
//!   the references to its collaborators (the view camera)
//! - a **config** ([`BallConfig`], [`PogoConfig`]) holding the tuning values
//!
//! Defaults reproduce the tuning of the shipped game.

use bevy::prelude::*;

use crate::backend::AccumulatedForce;
use crate::charge::{PogoCharge, SquishCharge};
use crate::detection::{GroundContacts, GroundSensor};
use crate::intent::ControlInput;
use crate::platform::PlatformRider;

/// Linear and angular drag coefficients applied to a rigid body.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct DragProfile {
    pub linear: f32,
    pub angular: f32,
}

impl DragProfile {
    pub const fn new(linear: f32, angular: f32) -> Self {
        Self { linear, angular }
    }
}

// ============================================================================
// Ball
// ============================================================================

/// Runtime state of a ball controller.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct BallController {
    /// Camera whose orientation defines "forward" for movement input.
    pub view_camera: Option<Entity>,
    /// Scale the ball returns to after squishing.
    ///
    /// Captured from the `Transform` when the controller is added.
    pub rest_scale: Vec3,
    /// Jump charge and squish animation state.
    pub squish: SquishCharge,
}

impl Default for BallController {
    fn default() -> Self {
        Self {
            view_camera: None,
            rest_scale: Vec3::ONE,
            squish: SquishCharge::default(),
        }
    }
}

impl BallController {
    /// Create a controller that moves relative to `camera`.
    pub fn new(camera: Entity) -> Self {
        Self {
            view_camera: Some(camera),
            ..default()
        }
    }

    /// Builder: set the view camera.
    pub fn with_camera(mut self, camera: Entity) -> Self {
        self.view_camera = Some(camera);
        self
    }
}

/// Tuning values for the ball.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct BallConfig {
    // === Movement ===
    /// Force applied along the camera-relative input direction.
    pub move_force: f32,

    /// Multiplier on `move_force` while airborne (0.0-1.0).
    pub air_control_factor: f32,

    // === Jump ===
    /// Seconds of holding needed for a full charge (and full squish).
    pub max_squish_time: f32,

    /// Impulse at full charge, before clamping.
    pub jump_force: f32,

    /// Lower bound of the jump impulse.
    pub min_jump_force: f32,

    /// Upper bound of the jump impulse.
    pub max_jump_force: f32,

    // === Squish ===
    /// Scale multiplier at full charge (0.0-1.0).
    pub squish_factor: f32,

    /// Rate at which the scale eases back after a release.
    pub scale_recovery_speed: f32,

    // === Gravity & Drag ===
    /// World gravity, used for the extra fall acceleration.
    pub gravity: Vec3,

    /// Gravity multiplier while airborne. 1.0 disables the extra fall gravity.
    pub fall_multiplier: f32,

    /// Drag while grounded.
    pub grounded_drag: DragProfile,

    /// Drag while airborne.
    pub airborne_drag: DragProfile,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            move_force: 10.0,
            air_control_factor: 0.5,

            max_squish_time: 2.0,
            jump_force: 10.0,
            min_jump_force: 30.0,
            max_jump_force: 100.0,

            squish_factor: 0.5,
            scale_recovery_speed: 2.0,

            gravity: Vec3::new(0.0, -9.81, 0.0),
            fall_multiplier: 2.5,
            grounded_drag: DragProfile::new(1.0, 1.0),
            airborne_drag: DragProfile::new(0.0, 0.05),
        }
    }
}

impl BallConfig {
    /// Drag to use for the given ground state.
    #[inline]
    pub fn drag(&self, grounded: bool) -> DragProfile {
        if grounded {
            self.grounded_drag
        } else {
            self.airborne_drag
        }
    }

    /// Builder: set movement force.
    pub fn with_move_force(mut self, force: f32) -> Self {
        self.move_force = force;
        self
    }

    /// Builder: set air control factor.
    pub fn with_air_control(mut self, factor: f32) -> Self {
        self.air_control_factor = factor;
        self
    }

    /// Builder: set the full-charge jump force.
    pub fn with_jump_force(mut self, force: f32) -> Self {
        self.jump_force = force;
        self
    }

    /// Builder: set the jump impulse clamp range.
    pub fn with_jump_force_range(mut self, min: f32, max: f32) -> Self {
        self.min_jump_force = min;
        self.max_jump_force = max;
        self
    }

    /// Builder: set the full-charge hold time.
    pub fn with_max_squish_time(mut self, seconds: f32) -> Self {
        self.max_squish_time = seconds;
        self
    }

    /// Builder: set squish factor and recovery speed.
    pub fn with_squish(mut self, factor: f32, recovery_speed: f32) -> Self {
        self.squish_factor = factor;
        self.scale_recovery_speed = recovery_speed;
        self
    }

    /// Builder: set gravity.
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Builder: set fall multiplier.
    pub fn with_fall_multiplier(mut self, multiplier: f32) -> Self {
        self.fall_multiplier = multiplier;
        self
    }
}

/// Controller components for a ball.
///
/// Add a physics body (e.g. `Rapier3dBodyBundle`) and a collider alongside.
#[derive(Bundle, Default)]
pub struct BallBundle {
    pub controller: BallController,
    pub config: BallConfig,
    pub input: ControlInput,
    pub sensor: GroundSensor,
    pub contacts: GroundContacts,
    pub rider: PlatformRider,
    pub force: AccumulatedForce,
}

impl BallBundle {
    /// Ball that moves relative to `camera`.
    pub fn new(camera: Entity) -> Self {
        Self {
            controller: BallController::new(camera),
            sensor: GroundSensor::ball(),
            ..default()
        }
    }

    /// Builder: set config.
    pub fn with_config(mut self, config: BallConfig) -> Self {
        self.config = config;
        self
    }
}

// ============================================================================
// Pogo
// ============================================================================

/// Runtime state of a pogo stick controller.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct PogoController {
    /// Camera whose yaw the pogo stick follows.
    pub view_camera: Option<Entity>,
    /// Uncompressed scale, captured from the `Transform` when added.
    pub rest_scale: Vec3,
    /// Jump charge, compression and lockout state.
    pub jump: PogoCharge,
}

impl Default for PogoController {
    fn default() -> Self {
        Self {
            view_camera: None,
            rest_scale: Vec3::ONE,
            jump: PogoCharge::default(),
        }
    }
}

impl PogoController {
    /// Create a controller that follows the yaw of `camera`.
    pub fn new(camera: Entity) -> Self {
        Self {
            view_camera: Some(camera),
            ..default()
        }
    }

    /// Builder: set the view camera.
    pub fn with_camera(mut self, camera: Entity) -> Self {
        self.view_camera = Some(camera);
        self
    }

    /// Charge fraction in `[0, 1]` for the power meter.
    #[inline]
    pub fn normalized_charge(&self) -> f32 {
        self.jump.normalized_charge()
    }
}

/// Tuning values for the pogo stick.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct PogoConfig {
    // === Angle Control ===
    /// Tilt speed in degrees per second, also the rotation blend rate.
    pub angle_speed: f32,

    /// Speed (degrees per second) at which centering levels the stick.
    pub angle_speed_centering: f32,

    /// Maximum pitch/roll in degrees.
    pub max_tilt_angle: f32,

    // === Jump ===
    /// Charge at which charging stops.
    pub max_jump_force: f32,

    /// Charge at the start of every press.
    pub min_jump_force: f32,

    /// Seconds to go from min to max charge.
    pub max_charge_timer: f32,

    /// Grounded time under which a jump counts as a repeated jump.
    pub repeated_jump_time_limit: f32,

    /// Seconds after a jump during which further jumps are rejected.
    pub lockout_duration: f32,

    /// Whether the active platform's velocity is added to the jump impulse.
    pub inherit_platform_velocity: bool,

    // === Compression ===
    /// Y scale multiplier at full charge (0.0-1.0).
    pub compression_factor: f32,

    /// How quickly the stick springs back to full length.
    pub decompression_multiplier: f32,
}

impl Default for PogoConfig {
    fn default() -> Self {
        Self {
            angle_speed: 50.0,
            angle_speed_centering: 100.0,
            max_tilt_angle: 80.0,

            max_jump_force: 1000.0,
            min_jump_force: 200.0,
            max_charge_timer: 1.0,
            repeated_jump_time_limit: 0.2,
            lockout_duration: 1.0,
            inherit_platform_velocity: false,

            compression_factor: 0.7,
            decompression_multiplier: 5.0,
        }
    }
}

impl PogoConfig {
    /// Builder: set tilt and centering speeds.
    pub fn with_angle_speeds(mut self, tilt: f32, centering: f32) -> Self {
        self.angle_speed = tilt;
        self.angle_speed_centering = centering;
        self
    }

    /// Builder: set the jump charge range.
    pub fn with_jump_force_range(mut self, min: f32, max: f32) -> Self {
        self.min_jump_force = min;
        self.max_jump_force = max;
        self
    }

    /// Builder: set the time to full charge.
    pub fn with_max_charge_timer(mut self, seconds: f32) -> Self {
        self.max_charge_timer = seconds;
        self
    }

    /// Builder: set lockout duration.
    pub fn with_lockout(mut self, seconds: f32) -> Self {
        self.lockout_duration = seconds;
        self
    }

    /// Builder: add platform velocity to jumps.
    pub fn with_platform_velocity(mut self, inherit: bool) -> Self {
        self.inherit_platform_velocity = inherit;
        self
    }
}

/// Controller components for a pogo stick.
#[derive(Bundle)]
pub struct PogoBundle {
    pub controller: PogoController,
    pub config: PogoConfig,
    pub input: ControlInput,
    pub sensor: GroundSensor,
    pub contacts: GroundContacts,
    pub rider: PlatformRider,
    pub force: AccumulatedForce,
}

impl Default for PogoBundle {
    fn default() -> Self {
        Self {
            controller: PogoController::default(),
            config: PogoConfig::default(),
            input: ControlInput::default(),
            sensor: GroundSensor::pogo(),
            contacts: GroundContacts::default(),
            rider: PlatformRider::default(),
            force: AccumulatedForce::default(),
        }
    }
}

impl PogoBundle {
    /// Pogo stick that follows the yaw of `camera`.
    pub fn new(camera: Entity) -> Self {
        Self {
            controller: PogoController::new(camera),
            ..default()
        }
    }

    /// Builder: set config.
    pub fn with_config(mut self, config: PogoConfig) -> Self {
        self.config = config;
        self
    }
}
