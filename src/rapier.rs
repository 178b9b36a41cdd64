//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature (on by default).

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::{AccumulatedForce, PhysicsBackend};
use crate::collision::CollisionData;
use crate::config::DragProfile;
use crate::detection::{GroundContacts, GroundSensor};
use crate::platform::{MovingPlatform, PlatformRider, PlatformTrigger};
use crate::PogoBallSet;

/// Rapier3D physics backend for the ball and pogo controllers.
///
/// Velocity, impulses and damping go through the usual `bevy_rapier3d`
/// components. Ground sensing and platform trigger handling are done by
/// dedicated systems that read the `RapierContext` and collision events.
pub struct Rapier3dBackend;

impl PhysicsBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn get_angular_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.angvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_angular_velocity(world: &mut World, entity: Entity, angular_velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.angvel = angular_velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.impulse += impulse;
        } else if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(ExternalImpulse {
                impulse,
                torque_impulse: Vec3::ZERO,
            });
        }
    }

    fn set_damping(world: &mut World, entity: Entity, drag: DragProfile) {
        let damping = Damping {
            linear_damping: drag.linear,
            angular_damping: drag.angular,
        };
        if let Some(mut current) = world.get_mut::<Damping>(entity) {
            if current.linear_damping != damping.linear_damping
                || current.angular_damping != damping.angular_damping
            {
                *current = damping;
            }
        } else if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(damping);
        }
    }
}

/// Plugin that sets up Rapier3D-specific systems for the controllers.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        // Preparation: take last tick's controller forces back out
        app.add_systems(
            FixedUpdate,
            clear_accumulated_forces.in_set(PogoBallSet::Preparation),
        );

        // Sensors: ground queries and platform trigger events
        app.add_systems(
            FixedUpdate,
            (rapier_ground_sensing, rapier_platform_triggers).in_set(PogoBallSet::Sensors),
        );

        // Final Application: hand this tick's controller forces to Rapier
        app.add_systems(
            FixedUpdate,
            apply_accumulated_forces.in_set(PogoBallSet::FinalApplication),
        );
    }
}

/// Perform a raycast using RapierContext.
///
/// The casting body and all sensor colliders are ignored.
pub fn rapier_raycast(
    context: &RapierContext,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    exclude_entity: Entity,
) -> Option<CollisionData> {
    let filter = QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .exclude_sensors();

    context
        .cast_ray_and_get_normal(origin, direction, max_distance, true, filter)
        .map(|(hit_entity, hit)| {
            CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
        })
}

/// Rapier-specific ground sensing.
///
/// Replaces every controller's [`GroundContacts`] with a fresh sample of its
/// [`GroundSensor`], cast from the body's global position.
fn rapier_ground_sensing(
    rapier_context: ReadRapierContext,
    mut q_sensors: Query<(Entity, &GlobalTransform, &GroundSensor, &mut GroundContacts)>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, sensor, mut contacts) in &mut q_sensors {
        let origin = transform.translation();
        let sample = sensor.sample(origin, |origin, direction, max_distance| {
            rapier_raycast(&context, origin, direction, max_distance, entity)
        });
        contacts.replace(sample);
    }
}

/// Point riders at the platform whose trigger they entered, and release them
/// when they leave it.
fn rapier_platform_triggers(
    mut collision_events: EventReader<CollisionEvent>,
    mut q_riders: Query<&mut PlatformRider>,
    q_triggers: Query<&PlatformTrigger>,
    q_platforms: Query<(), With<MovingPlatform>>,
) {
    let resolve_platform = |entity: Entity| -> Option<Entity> {
        if let Ok(trigger) = q_triggers.get(entity) {
            Some(trigger.0)
        } else if q_platforms.contains(entity) {
            Some(entity)
        } else {
            None
        }
    };

    for event in collision_events.read() {
        let (a, b, started) = match *event {
            CollisionEvent::Started(a, b, _) => (a, b, true),
            CollisionEvent::Stopped(a, b, _) => (a, b, false),
        };

        for (rider_entity, other) in [(a, b), (b, a)] {
            let Some(platform) = resolve_platform(other) else {
                continue;
            };
            let Ok(mut rider) = q_riders.get_mut(rider_entity) else {
                continue;
            };
            if started {
                rider.enter(platform);
                debug!("{rider_entity} entered platform {platform}");
            } else if rider.exit(platform) {
                debug!("{rider_entity} left platform {platform}");
            }
        }
    }
}

/// Take the controller forces applied last tick back out of `ExternalForce`.
///
/// Runs before any controller system, so forces that other game code put on
/// the same body are preserved.
pub fn clear_accumulated_forces(mut q: Query<(&mut ExternalForce, &mut AccumulatedForce)>) {
    for (mut ext_force, mut accumulated) in &mut q {
        let force_to_subtract = accumulated.prepare_new_frame();
        if force_to_subtract != Vec3::ZERO {
            ext_force.force -= force_to_subtract;
        }
    }
}

/// Hand this tick's accumulated controller forces to `ExternalForce`.
pub fn apply_accumulated_forces(mut q: Query<(&mut ExternalForce, &mut AccumulatedForce)>) {
    for (mut ext_force, mut accumulated) in &mut q {
        let force_to_apply = accumulated.finalize_frame();
        if force_to_apply != Vec3::ZERO {
            ext_force.force += force_to_apply;
        }
    }
}

/// Bundle for a controller body with Rapier3D physics.
///
/// Provides the rigid body and the components the backend reads and writes.
/// Add a collider and `ActiveEvents::COLLISION_EVENTS` (needed for platform
/// riding) alongside.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use pogo_ball_controller::prelude::*;
///
/// fn spawn_ball(mut commands: Commands, camera: Single<Entity, With<Camera3d>>) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 1.0, 0.0),
///         BallBundle::new(*camera),
///         Rapier3dBodyBundle::new(),
///         Collider::ball(0.5),
///         ActiveEvents::COLLISION_EVENTS,
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `damping`: linear 1.0, angular 1.0 (the ball's grounded drag)
/// - `locked_axes`: empty
#[derive(Bundle, Default)]
pub struct Rapier3dBodyBundle {
    pub rigid_body: RigidBody,
    pub velocity: Velocity,
    /// Controller forces are added to this at the end of each fixed tick.
    pub external_force: ExternalForce,
    /// Jump impulses.
    pub external_impulse: ExternalImpulse,
    pub locked_axes: LockedAxes,
    /// Overwritten by the ball every tick from its drag profile.
    pub damping: Damping,
}

impl Rapier3dBodyBundle {
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            external_impulse: ExternalImpulse::default(),
            locked_axes: LockedAxes::empty(),
            damping: Damping {
                linear_damping: 1.0,
                angular_damping: 1.0,
            },
        }
    }

    /// Builder: set the rigid body type.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Builder: set the damping coefficients.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }

    /// Builder: set locked axes.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
