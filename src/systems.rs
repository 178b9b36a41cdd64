//! Core controller systems.
//!
//! The controller systems are exclusive systems generic over the physics
//! backend. Each one snapshots the components it needs, then drives the pure
//! models in [`charge`](crate::charge) and [`motion`](crate::motion) and
//! pushes the result back through the backend.

use bevy::prelude::*;

use crate::backend::PhysicsBackend;
use crate::charge::{JumpTrigger, PogoCharge, SquishCharge, SquishPhase};
use crate::config::{BallConfig, BallController, PogoConfig, PogoController};
use crate::detection::GroundContacts;
use crate::intent::{ControlInput, ForcedJump};
use crate::motion::{fall_velocity_delta, movement_force, pogo_rotation, BodyAngles, CameraBasis};
use crate::platform::{MovingPlatform, PlatformRider};
use crate::readout::{ChargeMeter, TiltLabels, TiltReadout};
use crate::state::{Airborne, Grounded};

// ============================================================================
// Preparation
// ============================================================================

/// Remember the scale controllers return to after squishing or compressing.
pub fn capture_rest_scale(
    mut q_balls: Query<(&Transform, &mut BallController), Added<BallController>>,
    mut q_pogos: Query<(&Transform, &mut PogoController), Added<PogoController>>,
) {
    for (transform, mut controller) in &mut q_balls {
        controller.rest_scale = transform.scale;
    }
    for (transform, mut controller) in &mut q_pogos {
        controller.rest_scale = transform.scale;
    }
}

/// Place newly added platforms at their starting point.
pub fn init_moving_platforms(mut q: Query<(&mut Transform, &mut MovingPlatform), Added<MovingPlatform>>) {
    for (mut transform, mut platform) in &mut q {
        transform.translation = platform.spawn_at(transform.translation);
    }
}

// ============================================================================
// Platforms
// ============================================================================

/// Advance every moving platform by one fixed tick.
pub fn move_platforms(time: Option<Res<Time<Fixed>>>, mut q: Query<(&mut Transform, &mut MovingPlatform)>) {
    let dt = time
        .map(|t| t.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(crate::backend::DEFAULT_FIXED_TIMESTEP);

    for (mut transform, mut platform) in &mut q {
        let next = platform.tick(transform.translation, dt);
        if next != transform.translation {
            transform.translation = next;
        }
    }
}

/// Move riders along with the platform they stand on.
pub fn carry_riders(
    q_platforms: Query<&MovingPlatform>,
    mut q_riders: Query<(Entity, &mut Transform, &PlatformRider), Without<MovingPlatform>>,
) {
    for (entity, mut transform, rider) in &mut q_riders {
        let Some(platform_entity) = rider.platform() else {
            continue;
        };
        let Ok(platform) = q_platforms.get(platform_entity) else {
            warn_once!("rider {entity} references {platform_entity}, which is not a moving platform");
            continue;
        };
        let displacement = platform.displacement();
        if displacement != Vec3::ZERO {
            transform.translation += displacement;
        }
    }
}

/// Velocity of the platform `rider` is standing on, or zero.
fn platform_velocity(world: &World, rider: Option<Entity>) -> Vec3 {
    rider
        .and_then(|platform| world.get::<MovingPlatform>(platform))
        .map(|platform| platform.velocity())
        .unwrap_or(Vec3::ZERO)
}

fn camera_basis(world: &World, camera: Option<Entity>) -> Option<CameraBasis> {
    camera
        .and_then(|camera| world.get::<GlobalTransform>(camera))
        .map(CameraBasis::from_global_transform)
}

fn set_scale(world: &mut World, entity: Entity, scale: Vec3) {
    if let Some(mut transform) = world.get_mut::<Transform>(entity) {
        if transform.scale != scale {
            transform.scale = scale;
        }
    }
}

// ============================================================================
// Controllers
// ============================================================================

struct BallTick {
    entity: Entity,
    camera: Option<Entity>,
    rest_scale: Vec3,
    squish: SquishCharge,
    config: BallConfig,
    input: ControlInput,
    grounded: bool,
    ground_normal: Vec3,
    platform: Option<Entity>,
    scale: Vec3,
}

/// Ball: jump charge and squish, camera-relative movement, fall gravity and drag.
pub fn update_ball_controllers<B: PhysicsBackend>(world: &mut World) {
    let balls: Vec<BallTick> = world
        .query::<(
            Entity,
            &BallController,
            &BallConfig,
            &ControlInput,
            &GroundContacts,
            Option<&PlatformRider>,
            &Transform,
        )>()
        .iter(world)
        .map(|(entity, controller, config, input, contacts, rider, transform)| BallTick {
            entity,
            camera: controller.view_camera,
            rest_scale: controller.rest_scale,
            squish: controller.squish,
            config: *config,
            input: *input,
            grounded: contacts.is_grounded(),
            ground_normal: contacts.combined_normal(),
            platform: rider.and_then(|r| r.platform()),
            scale: transform.scale,
        })
        .collect();

    let dt = B::get_fixed_timestep(world);

    for ball in balls {
        let BallTick {
            entity,
            config,
            input,
            grounded,
            ..
        } = ball;
        let mut squish = ball.squish;

        // Jump
        if input.jump_started_before_release() {
            squish.press();
        }
        squish.tick(dt);
        if input.jump_released() {
            if let Some(magnitude) = squish.release(grounded, &config) {
                let impulse = ball.ground_normal * magnitude + platform_velocity(world, ball.platform);
                B::apply_impulse(world, entity, impulse);
                debug!("ball {entity} jumped with impulse {impulse}");
            }
        }
        if input.jump_restarted_after_release() {
            squish.press();
        }

        // Squish feedback
        let scale = match squish.phase() {
            SquishPhase::Charging => squish.squished_scale(ball.rest_scale, &config),
            SquishPhase::Recovering => {
                squish.recover(ball.scale, ball.rest_scale, dt, config.scale_recovery_speed)
            }
            SquishPhase::Idle => ball.scale,
        };
        set_scale(world, entity, scale);

        // Movement
        if input.is_moving() {
            match camera_basis(world, ball.camera) {
                Some(camera) => {
                    let force = movement_force(input.movement, &camera, grounded, &config);
                    B::apply_force(world, entity, force);
                }
                None => warn_once!("ball {entity} has no view camera; movement input ignored"),
            }
        }

        // Extra fall gravity
        if !grounded {
            let velocity = B::get_velocity(world, entity);
            let delta = fall_velocity_delta(config.gravity, config.fall_multiplier, dt);
            B::set_velocity(world, entity, velocity + delta);
        }

        B::set_damping(world, entity, config.drag(grounded));

        if let Some(mut controller) = world.get_mut::<BallController>(entity) {
            controller.squish = squish;
        }
    }
}

struct PogoTick {
    entity: Entity,
    camera: Option<Entity>,
    rest_scale: Vec3,
    jump: PogoCharge,
    config: PogoConfig,
    input: ControlInput,
    forced: bool,
    grounded: bool,
    platform: Option<Entity>,
    scale: Vec3,
}

/// Pogo stick: lockout, jump charge and compression, tilt and centering.
pub fn update_pogo_controllers<B: PhysicsBackend>(world: &mut World) {
    let pogos: Vec<PogoTick> = world
        .query::<(
            Entity,
            &PogoController,
            &PogoConfig,
            &ControlInput,
            Has<ForcedJump>,
            &GroundContacts,
            Option<&PlatformRider>,
            &Transform,
        )>()
        .iter(world)
        .map(
            |(entity, controller, config, input, forced, contacts, rider, transform)| PogoTick {
                entity,
                camera: controller.view_camera,
                rest_scale: controller.rest_scale,
                jump: controller.jump,
                config: *config,
                input: *input,
                forced,
                grounded: contacts.is_grounded(),
                platform: rider.and_then(|r| r.platform()),
                scale: transform.scale,
            },
        )
        .collect();

    let dt = B::get_fixed_timestep(world);

    for pogo in pogos {
        let PogoTick {
            entity,
            config,
            input,
            grounded,
            ..
        } = pogo;
        let mut jump = pogo.jump;

        if jump.tick_lockout(dt) {
            debug!("pogo {entity} can jump again");
        }

        // Jump
        if input.jump_started_before_release() {
            jump.press(&config);
        }
        let trigger = if pogo.forced {
            world.entity_mut(entity).remove::<ForcedJump>();
            Some(JumpTrigger::Forced)
        } else if input.jump_released() {
            Some(JumpTrigger::Player)
        } else {
            None
        };
        if let Some(trigger) = trigger {
            let up = B::get_rotation(world, entity) * Vec3::Y;
            if let Some(mut impulse) = jump.release(grounded, up, trigger, &config) {
                if config.inherit_platform_velocity {
                    impulse += platform_velocity(world, pogo.platform);
                }
                B::set_velocity(world, entity, Vec3::ZERO);
                B::apply_impulse(world, entity, impulse);
                debug!("pogo {entity} jumped with impulse {impulse}");
            }
        }
        if input.jump_restarted_after_release() {
            jump.press(&config);
        }

        // Tilt and centering
        match camera_basis(world, pogo.camera) {
            Some(camera) => {
                let rotation = B::get_rotation(world, entity);
                let target = pogo_rotation(
                    rotation,
                    input.tilt,
                    input.centering_held,
                    camera.yaw,
                    &config,
                    dt,
                );
                B::move_rotation(world, entity, target, dt);
            }
            None => warn_once!("pogo {entity} has no view camera; tilt input ignored"),
        }

        // Compression feedback
        let scale = jump.tick(dt, pogo.scale, pogo.rest_scale, &config);
        set_scale(world, entity, scale);

        jump.tick_grounded(grounded, dt);

        if let Some(mut controller) = world.get_mut::<PogoController>(entity) {
            controller.jump = jump;
        }
    }
}

/// Sync [`Grounded`]/[`Airborne`] markers with the last ground query.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(Entity, &GroundContacts, Has<Grounded>, Has<Airborne>)>,
) {
    for (entity, contacts, has_grounded, has_airborne) in &q_controllers {
        if contacts.is_grounded() {
            if !has_grounded {
                commands.entity(entity).insert(Grounded);
            }
            if has_airborne {
                commands.entity(entity).remove::<Airborne>();
            }
        } else {
            if !has_airborne {
                commands.entity(entity).insert(Airborne);
            }
            if has_grounded {
                commands.entity(entity).remove::<Grounded>();
            }
        }
    }
}

// ============================================================================
// Final Application
// ============================================================================

/// Latch input snapshots so each press/release is seen by exactly one tick.
pub fn latch_inputs(mut q: Query<&mut ControlInput>) {
    for mut input in &mut q {
        if input.has_pending_jump() {
            input.latch();
        }
    }
}

/// Drop [`ForcedJump`] requests on entities that are not pogo sticks.
pub fn discard_stray_forced_jumps(
    mut commands: Commands,
    q: Query<Entity, (With<ForcedJump>, Without<PogoController>)>,
) {
    for entity in &q {
        warn_once!("{entity} has a ForcedJump but no PogoController; request dropped");
        commands.entity(entity).remove::<ForcedJump>();
    }
}

// ============================================================================
// Readouts
// ============================================================================

/// Copy the jump charge of each meter's source into the meter.
pub fn update_charge_meters(
    mut q_meters: Query<(Entity, &mut ChargeMeter)>,
    q_pogos: Query<&PogoController>,
    q_balls: Query<(&BallController, &BallConfig)>,
) {
    for (entity, mut meter) in &mut q_meters {
        let value = if let Ok(pogo) = q_pogos.get(meter.source) {
            pogo.normalized_charge()
        } else if let Ok((ball, config)) = q_balls.get(meter.source) {
            ball.squish.normalized_charge(config)
        } else {
            warn_once!("charge meter {entity} has no controller source");
            continue;
        };
        if meter.value != value {
            meter.value = value;
        }
    }
}

/// Refresh tilt labels from each readout's source rotation.
pub fn update_tilt_readouts(
    mut q_readouts: Query<(Entity, &mut TiltReadout)>,
    q_sources: Query<&GlobalTransform>,
) {
    for (entity, mut readout) in &mut q_readouts {
        let Ok(source) = q_sources.get(readout.source) else {
            warn_once!("tilt readout {entity} source has no transform");
            continue;
        };
        let (_, rotation, _) = source.to_scale_rotation_translation();
        let angles = BodyAngles::from_rotation(rotation);
        let labels = TiltLabels::from_angles(angles.pitch, angles.roll);
        if readout.labels != labels {
            readout.labels = labels;
        }
    }
}
