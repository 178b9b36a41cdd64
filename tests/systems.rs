//! System tests against a minimal in-memory backend.
//!
//! `PlaneBackend` stores velocity and impulses in a plain component and senses
//! an infinite ground plane at y = 0. Only `FixedUpdate` (and `Update` for the
//! readouts) is run, so every tick uses the 60 Hz fallback timestep and the
//! results are deterministic.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use pogo_ball_controller::collision::CollisionData;
use pogo_ball_controller::prelude::*;

const DT: f32 = 1.0 / 60.0;

// ==================== Test Backend ====================

#[derive(Component, Debug, Default, Clone)]
struct TestBody {
    linvel: Vec3,
    angvel: Vec3,
    impulses: Vec<Vec3>,
    /// Force handed over at the end of the last tick.
    force: Vec3,
    drag: Option<DragProfile>,
}

#[derive(Resource)]
struct Ground(Entity);

struct PlaneBackend;

impl PhysicsBackend for PlaneBackend {
    fn plugin() -> impl Plugin {
        PlaneBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world.get::<TestBody>(entity).map(|b| b.linvel).unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.linvel = velocity;
        }
    }

    fn get_angular_velocity(world: &World, entity: Entity) -> Vec3 {
        world.get::<TestBody>(entity).map(|b| b.angvel).unwrap_or(Vec3::ZERO)
    }

    fn set_angular_velocity(world: &mut World, entity: Entity, angular_velocity: Vec3) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.angvel = angular_velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.impulses.push(impulse);
            body.linvel += impulse;
        }
    }

    fn set_damping(world: &mut World, entity: Entity, drag: DragProfile) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.drag = Some(drag);
        }
    }
}

struct PlaneBackendPlugin;

impl Plugin for PlaneBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, clear_forces.in_set(PogoBallSet::Preparation));
        app.add_systems(FixedUpdate, sense_plane.in_set(PogoBallSet::Sensors));
        app.add_systems(FixedUpdate, apply_forces.in_set(PogoBallSet::FinalApplication));
    }
}

fn clear_forces(mut q: Query<&mut AccumulatedForce>) {
    for mut accumulated in &mut q {
        accumulated.prepare_new_frame();
    }
}

fn apply_forces(mut q: Query<(&mut TestBody, &mut AccumulatedForce)>) {
    for (mut body, mut accumulated) in &mut q {
        body.force = accumulated.finalize_frame();
    }
}

fn sense_plane(ground: Res<Ground>, mut q: Query<(&Transform, &GroundSensor, &mut GroundContacts)>) {
    let ground = ground.0;
    for (transform, sensor, mut contacts) in &mut q {
        let sample = sensor.sample(transform.translation, |origin, direction, max_distance| {
            if direction.y >= 0.0 {
                return None;
            }
            let distance = origin.y / -direction.y;
            (distance >= 0.0 && distance <= max_distance).then(|| {
                CollisionData::new(distance, Vec3::Y, origin + direction * distance, Some(ground))
            })
        });
        contacts.replace(sample);
    }
}

// ==================== Harness ====================

fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(PogoBallPlugin::<PlaneBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));

    let ground = app.world_mut().spawn_empty().id();
    app.insert_resource(Ground(ground));

    app.finish();
    app.cleanup();
    app
}

fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        tick(app);
    }
}

fn spawn_camera(app: &mut App, rotation: Quat) -> Entity {
    app.world_mut()
        .spawn(GlobalTransform::from(Transform::from_rotation(rotation)))
        .id()
}

fn spawn_ball(app: &mut App, camera: Entity, position: Vec3, config: BallConfig) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_translation(position),
            BallBundle::new(camera).with_config(config),
            TestBody::default(),
        ))
        .id()
}

fn spawn_pogo(app: &mut App, camera: Entity, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_translation(position),
            PogoBundle::new(camera),
            TestBody::default(),
        ))
        .id()
}

fn set_jump(app: &mut App, entity: Entity, held: bool) {
    app.world_mut()
        .get_mut::<ControlInput>(entity)
        .unwrap()
        .set_jump_held(held);
}

/// Hold jump for `held_ticks` ticks, then release on the following tick.
fn charge_and_release(app: &mut App, entity: Entity, held_ticks: usize) {
    set_jump(app, entity, true);
    run_ticks(app, held_ticks);
    set_jump(app, entity, false);
    tick(app);
}

fn impulses(app: &App, entity: Entity) -> Vec<Vec3> {
    app.world().get::<TestBody>(entity).unwrap().impulses.clone()
}

// ==================== Ground State Tests ====================

#[test]
fn ball_on_plane_is_grounded() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let ball = spawn_ball(&mut app, camera, Vec3::new(0.0, 1.0, 0.0), BallConfig::default());

    tick(&mut app);

    let contacts = app.world().get::<GroundContacts>(ball).unwrap();
    assert!(contacts.is_grounded());
    assert!((contacts.combined_normal() - Vec3::Y).length() < 1e-5);
    assert!(app.world().get::<Grounded>(ball).is_some());
    assert!(app.world().get::<Airborne>(ball).is_none());
}

#[test]
fn ball_in_air_gets_extra_fall_gravity() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let config = BallConfig::default();
    let ball = spawn_ball(&mut app, camera, Vec3::new(0.0, 10.0, 0.0), config);

    tick(&mut app);

    assert!(app.world().get::<Airborne>(ball).is_some());
    let body = app.world().get::<TestBody>(ball).unwrap();
    let expected = config.gravity.y * (config.fall_multiplier - 1.0) * DT;
    assert!((body.linvel.y - expected).abs() < 1e-5);
    assert_eq!(body.drag, Some(config.airborne_drag));
}

#[test]
fn pogo_probe_only_reaches_just_below() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let near = spawn_pogo(&mut app, camera, Vec3::new(0.0, 0.5, 0.0));
    let far = spawn_pogo(&mut app, camera, Vec3::new(3.0, 1.5, 0.0));

    tick(&mut app);

    assert!(app.world().get::<Grounded>(near).is_some());
    assert!(app.world().get::<Airborne>(far).is_some());
}

// ==================== Ball Tests ====================

#[test]
fn ball_half_charge_jump_end_to_end() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let config = BallConfig::default()
        .with_jump_force(100.0)
        .with_jump_force_range(10.0, 100.0);
    let ball = spawn_ball(&mut app, camera, Vec3::new(0.0, 1.0, 0.0), config);

    // The release tick counts as held time: 59 + 1 ticks = 1 second = half of max
    charge_and_release(&mut app, ball, 59);

    let impulses = impulses(&app, ball);
    assert_eq!(impulses.len(), 1);
    let impulse = impulses[0];
    assert!((impulse.length() - 50.0).abs() < 1e-2, "impulse {impulse}");
    assert!(impulse.normalize().dot(Vec3::Y) > 0.9999);
}

#[test]
fn ball_default_half_charge_is_clamped_to_min() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let config = BallConfig::default();
    let ball = spawn_ball(&mut app, camera, Vec3::new(0.0, 1.0, 0.0), config);

    charge_and_release(&mut app, ball, 59);

    // jump_force * 0.5 = 5 is below the minimum of 30
    let impulses = impulses(&app, ball);
    assert_eq!(impulses.len(), 1);
    assert!((impulses[0] - Vec3::Y * config.min_jump_force).length() < 1e-3);
}

#[test]
fn ball_squishes_while_charging_and_recovers() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let config = BallConfig::default();
    let ball = spawn_ball(&mut app, camera, Vec3::new(0.0, 1.0, 0.0), config);

    set_jump(&mut app, ball, true);
    run_ticks(&mut app, 300);
    let squished = app.world().get::<Transform>(ball).unwrap().scale;
    assert!((squished - Vec3::splat(config.squish_factor)).length() < 1e-5);

    set_jump(&mut app, ball, false);
    run_ticks(&mut app, 600);
    assert_eq!(app.world().get::<Transform>(ball).unwrap().scale, Vec3::ONE);
    assert_eq!(
        app.world().get::<BallController>(ball).unwrap().squish.phase(),
        SquishPhase::Idle
    );
}

#[test]
fn ball_airborne_release_does_not_jump() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let ball = spawn_ball(&mut app, camera, Vec3::new(0.0, 10.0, 0.0), BallConfig::default());

    charge_and_release(&mut app, ball, 30);

    assert!(impulses(&app, ball).is_empty());
}

#[test]
fn ball_moves_relative_to_camera() {
    let mut app = create_test_app();
    // Camera turned to look down -X
    let camera = spawn_camera(&mut app, Quat::from_rotation_y(FRAC_PI_2));
    let config = BallConfig::default();
    let ball = spawn_ball(&mut app, camera, Vec3::new(0.0, 1.0, 0.0), config);

    app.world_mut()
        .get_mut::<ControlInput>(ball)
        .unwrap()
        .set_movement(Vec2::Y);
    tick(&mut app);

    let force = app.world().get::<TestBody>(ball).unwrap().force;
    assert!((force - Vec3::NEG_X * config.move_force).length() < 1e-4, "force {force}");
}

#[test]
fn ball_without_camera_ignores_movement() {
    let mut app = create_test_app();
    let missing = app.world_mut().spawn_empty().id();
    let ball = spawn_ball(&mut app, missing, Vec3::new(0.0, 1.0, 0.0), BallConfig::default());
    app.world_mut().despawn(missing);

    app.world_mut()
        .get_mut::<ControlInput>(ball)
        .unwrap()
        .set_movement(Vec2::Y);
    tick(&mut app);

    assert_eq!(app.world().get::<TestBody>(ball).unwrap().force, Vec3::ZERO);
}

#[test]
fn ball_tap_within_one_tick_jumps_at_min_force() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let ball = spawn_ball(&mut app, camera, Vec3::new(0.0, 1.0, 0.0), BallConfig::default());
    tick(&mut app);

    // Pressed and let go between two fixed ticks
    set_jump(&mut app, ball, true);
    set_jump(&mut app, ball, false);
    run_ticks(&mut app, 2);

    let impulses = impulses(&app, ball);
    assert_eq!(impulses.len(), 1);
    let expected = Vec3::Y * BallConfig::default().min_jump_force;
    assert!((impulses[0] - expected).length() < 1e-4, "impulse {}", impulses[0]);
}

#[test]
fn ball_release_and_press_within_one_tick_jumps_then_charges_again() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let ball = spawn_ball(&mut app, camera, Vec3::new(0.0, 1.0, 0.0), BallConfig::default());

    set_jump(&mut app, ball, true);
    run_ticks(&mut app, 30);

    set_jump(&mut app, ball, false);
    set_jump(&mut app, ball, true);
    tick(&mut app);

    assert_eq!(impulses(&app, ball).len(), 1);
    let controller = app.world().get::<BallController>(ball).unwrap();
    assert!(controller.squish.is_charging());
    assert!(controller.squish.elapsed() < 0.05);
}

#[test]
fn forced_jump_on_a_ball_is_dropped() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let ball = spawn_ball(&mut app, camera, Vec3::new(0.0, 1.0, 0.0), BallConfig::default());

    app.world_mut().entity_mut(ball).insert(ForcedJump);
    tick(&mut app);

    assert!(impulses(&app, ball).is_empty());
    assert!(app.world().get::<ForcedJump>(ball).is_none());
}

// ==================== Pogo Tests ====================

#[test]
fn pogo_jump_then_lockout() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let pogo = spawn_pogo(&mut app, camera, Vec3::new(0.0, 0.5, 0.0));

    // 30 ticks of charging: 200 + 800 * 0.5
    charge_and_release(&mut app, pogo, 30);
    let first = impulses(&app, pogo);
    assert_eq!(first.len(), 1);
    assert!((first[0] - Vec3::Y * 600.0).length() < 1e-2, "impulse {}", first[0]);

    // Second jump inside the lockout is rejected
    charge_and_release(&mut app, pogo, 1);
    assert_eq!(impulses(&app, pogo).len(), 1);

    // After the lockout expires the meter is cleared and jumps work again
    run_ticks(&mut app, 60);
    let controller = app.world().get::<PogoController>(pogo).unwrap();
    assert_eq!(controller.normalized_charge(), 0.0);
    assert!(!controller.jump.lockout().is_active());

    charge_and_release(&mut app, pogo, 1);
    assert_eq!(impulses(&app, pogo).len(), 2);
}

#[test]
fn pogo_compresses_while_charging() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let pogo = spawn_pogo(&mut app, camera, Vec3::new(0.0, 0.5, 0.0));

    set_jump(&mut app, pogo, true);
    run_ticks(&mut app, 120);

    let scale = app.world().get::<Transform>(pogo).unwrap().scale;
    let config = PogoConfig::default();
    assert_eq!(scale.x, 1.0);
    assert!((scale.y - config.compression_factor).abs() < 1e-4);
    let controller = app.world().get::<PogoController>(pogo).unwrap();
    assert_eq!(controller.jump.charge(), config.max_jump_force);
}

#[test]
fn pogo_forced_jump_is_consumed() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let pogo = spawn_pogo(&mut app, camera, Vec3::new(0.0, 0.5, 0.0));

    app.world_mut().entity_mut(pogo).insert(ForcedJump);
    tick(&mut app);

    let impulses = impulses(&app, pogo);
    assert_eq!(impulses.len(), 1);
    assert_eq!(impulses[0], Vec3::Y * PogoConfig::default().min_jump_force);
    assert!(app.world().get::<ForcedJump>(pogo).is_none());
}

#[test]
fn pogo_tap_within_one_tick_jumps_at_min_force() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let pogo = spawn_pogo(&mut app, camera, Vec3::new(0.0, 0.5, 0.0));
    tick(&mut app);

    set_jump(&mut app, pogo, true);
    set_jump(&mut app, pogo, false);
    run_ticks(&mut app, 2);

    let impulses = impulses(&app, pogo);
    assert_eq!(impulses.len(), 1);
    let rotation = app.world().get::<Transform>(pogo).unwrap().rotation;
    let expected = rotation * Vec3::Y * PogoConfig::default().min_jump_force;
    assert!((impulses[0] - expected).length() < 1e-3, "impulse {}", impulses[0]);
    assert!(!app.world().get::<PogoController>(pogo).unwrap().jump.is_charging());
}

#[test]
fn pogo_tilt_drives_angular_velocity() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let pogo = spawn_pogo(&mut app, camera, Vec3::new(0.0, 0.5, 0.0));

    app.world_mut()
        .get_mut::<ControlInput>(pogo)
        .unwrap()
        .set_tilt(Vec2::Y);
    tick(&mut app);

    // Pitch forward means rotation about +X
    let angvel = app.world().get::<TestBody>(pogo).unwrap().angvel;
    assert!(angvel.x > 0.0, "angvel {angvel}");
    assert!(angvel.y.abs() < 1e-4);
}

// ==================== Platform Tests ====================

#[test]
fn circular_platform_position_over_time() {
    let mut app = create_test_app();
    let start = Vec3::new(1.0, 0.0, -2.0);
    let platform = app
        .world_mut()
        .spawn((Transform::from_translation(start), MovingPlatform::circular(5.0, 2.0)))
        .id();

    for n in 1..=90 {
        tick(&mut app);
        let t = n as f32 * DT;
        let expected = start + Vec3::new(5.0 * (2.0 * t).cos(), 0.0, 5.0 * (2.0 * t).sin());
        let position = app.world().get::<Transform>(platform).unwrap().translation;
        assert!((position - expected).length() < 1e-3, "tick {n}: {position} vs {expected}");
    }
}

#[test]
fn rider_is_carried_and_inherits_velocity_on_jump() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let platform = app
        .world_mut()
        .spawn((
            Transform::default(),
            MovingPlatform::point_to_point(
                vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)],
                6.0,
                Traversal::PingPong,
            ),
        ))
        .id();
    let ball = spawn_ball(&mut app, camera, Vec3::new(0.0, 1.0, 0.0), BallConfig::default());
    app.world_mut()
        .get_mut::<PlatformRider>(ball)
        .unwrap()
        .enter(platform);

    run_ticks(&mut app, 10);

    let platform_x = app.world().get::<Transform>(platform).unwrap().translation.x;
    let ball_x = app.world().get::<Transform>(ball).unwrap().translation.x;
    assert!(platform_x > 0.5);
    assert!((ball_x - platform_x).abs() < 1e-4);

    charge_and_release(&mut app, ball, 1);
    let impulses = impulses(&app, ball);
    assert_eq!(impulses.len(), 1);
    // Upward jump plus the platform's 6 units/s along X
    assert!((impulses[0].x - 6.0).abs() < 1e-2, "impulse {}", impulses[0]);
    assert!(impulses[0].y >= BallConfig::default().min_jump_force - 1e-3);
}

#[test]
fn pogo_ignores_platform_velocity_by_default() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let platform = app
        .world_mut()
        .spawn((
            Transform::default(),
            MovingPlatform::point_to_point(
                vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)],
                6.0,
                Traversal::Loop,
            ),
        ))
        .id();
    let pogo = spawn_pogo(&mut app, camera, Vec3::new(0.0, 0.5, 0.0));
    app.world_mut()
        .get_mut::<PlatformRider>(pogo)
        .unwrap()
        .enter(platform);

    run_ticks(&mut app, 5);
    charge_and_release(&mut app, pogo, 1);

    let impulses = impulses(&app, pogo);
    assert_eq!(impulses.len(), 1);
    assert!(impulses[0].x.abs() < 1e-4);
}

// ==================== Readout Tests ====================

#[test]
fn charge_meter_tracks_pogo_charge() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let pogo = spawn_pogo(&mut app, camera, Vec3::new(0.0, 0.5, 0.0));
    let meter = app.world_mut().spawn(ChargeMeter::new(pogo)).id();

    set_jump(&mut app, pogo, true);
    run_ticks(&mut app, 30);
    app.world_mut().run_schedule(Update);

    let expected = app.world().get::<PogoController>(pogo).unwrap().normalized_charge();
    let value = app.world().get::<ChargeMeter>(meter).unwrap().value;
    assert!(expected > 0.0);
    assert_eq!(value, expected);
}

#[test]
fn charge_meter_tracks_ball_charge() {
    let mut app = create_test_app();
    let camera = spawn_camera(&mut app, Quat::IDENTITY);
    let ball = spawn_ball(&mut app, camera, Vec3::new(0.0, 1.0, 0.0), BallConfig::default());
    let meter = app.world_mut().spawn(ChargeMeter::new(ball)).id();

    set_jump(&mut app, ball, true);
    run_ticks(&mut app, 60);
    app.world_mut().run_schedule(Update);

    // One second of a two second charge
    let value = app.world().get::<ChargeMeter>(meter).unwrap().value;
    assert!((value - 0.5).abs() < 1e-3);
}

#[test]
fn tilt_readout_labels_source_rotation() {
    let mut app = create_test_app();
    let rotation = Quat::from_euler(EulerRot::YXZ, 0.0, 20f32.to_radians(), -10f32.to_radians());
    let source = app
        .world_mut()
        .spawn(GlobalTransform::from(Transform::from_rotation(rotation)))
        .id();
    let readout = app.world_mut().spawn(TiltReadout::new(source)).id();

    app.world_mut().run_schedule(Update);

    let labels = &app.world().get::<TiltReadout>(readout).unwrap().labels;
    assert_eq!(labels.north, "20°");
    assert_eq!(labels.south, "-");
    assert_eq!(labels.east, "10°");
    assert_eq!(labels.west, "-");
}
