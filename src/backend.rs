//! Physics backend abstraction.
//!
//! The controller systems never talk to a physics engine directly. They go
//! through the static methods of [`PhysicsBackend`], so the engine can be
//! swapped without touching the gameplay code. Ground sensing and platform
//! trigger events are engine specific and are added by the backend's plugin.

use bevy::prelude::*;

use crate::config::DragProfile;
use crate::motion::angular_velocity_to;

/// Fallback timestep when `Time<Fixed>` is missing or reports zero.
pub const DEFAULT_FIXED_TIMESTEP: f32 = 1.0 / 60.0;

/// Fixed timestep from `Time<Fixed>`, falling back to 60 Hz.
pub fn fixed_timestep(world: &World) -> f32 {
    world
        .get_resource::<Time<Fixed>>()
        .map(|t| t.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(DEFAULT_FIXED_TIMESTEP)
}

/// Force requested by the controllers during the current fixed tick.
///
/// Controllers add to `force` through [`PhysicsBackend::apply_force`]. The
/// backend hands the sum to the engine at the end of the tick and takes it
/// back out at the start of the next one, so forces set by other game code on
/// the same body are left alone.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct AccumulatedForce {
    /// Sum of forces added this tick.
    pub force: Vec3,
    /// Force handed to the engine last tick.
    applied: Vec3,
}

impl AccumulatedForce {
    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Force handed to the engine on the previous tick.
    #[inline]
    pub fn applied(&self) -> Vec3 {
        self.applied
    }

    /// Start a new tick. Returns the force to take back out of the engine.
    pub fn prepare_new_frame(&mut self) -> Vec3 {
        self.force = Vec3::ZERO;
        std::mem::take(&mut self.applied)
    }

    /// End the tick. Returns the force to hand to the engine.
    pub fn finalize_frame(&mut self) -> Vec3 {
        self.applied = self.force;
        self.force
    }
}

/// Operations the controllers need from a physics engine.
///
/// All methods are static and operate on a `World`, matching how the
/// controller systems run as exclusive systems. Getters return neutral values
/// (`Vec3::ZERO`, `Quat::IDENTITY`) when the entity lacks the relevant
/// component, and setters are no-ops in that case.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use pogo_ball_controller::prelude::*;
///
/// // Systems are written against the trait, not a concrete engine
/// fn speed<B: PhysicsBackend>(world: &World, entity: Entity) -> f32 {
///     B::get_velocity(world, entity).length()
/// }
/// ```
pub trait PhysicsBackend: 'static + Send + Sync {
    /// Plugin that adds the backend's sensing and force systems.
    fn plugin() -> impl Plugin;

    /// Linear velocity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Replace linear velocity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Angular velocity in radians per second.
    fn get_angular_velocity(world: &World, entity: Entity) -> Vec3;

    /// Replace angular velocity.
    fn set_angular_velocity(world: &mut World, entity: Entity, angular_velocity: Vec3);

    /// Instantaneous change in momentum.
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3);

    /// Continuous force for the current fixed tick.
    ///
    /// The default accumulates into [`AccumulatedForce`]; the backend plugin is
    /// responsible for handing it to the engine.
    fn apply_force(world: &mut World, entity: Entity, force: Vec3) {
        if let Some(mut accumulated) = world.get_mut::<AccumulatedForce>(entity) {
            accumulated.add_force(force);
        }
    }

    /// Set linear and angular drag.
    fn set_damping(world: &mut World, entity: Entity, drag: DragProfile);

    /// World rotation of the body.
    fn get_rotation(world: &World, entity: Entity) -> Quat {
        world
            .get::<Transform>(entity)
            .map(|t| t.rotation)
            .or_else(|| {
                world.get::<GlobalTransform>(entity).map(|t| {
                    let (_, rotation, _) = t.to_scale_rotation_translation();
                    rotation
                })
            })
            .unwrap_or(Quat::IDENTITY)
    }

    /// Drive the body toward `target` over the next `dt` seconds.
    ///
    /// The default sets the angular velocity that reaches `target` in one step,
    /// leaving the actual integration to the engine.
    fn move_rotation(world: &mut World, entity: Entity, target: Quat, dt: f32) {
        let current = Self::get_rotation(world, entity);
        let angular_velocity = angular_velocity_to(current, target, dt);
        Self::set_angular_velocity(world, entity, angular_velocity);
    }

    /// Fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        fixed_timestep(world)
    }
}
