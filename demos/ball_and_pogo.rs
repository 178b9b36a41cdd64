//! Ball and Pogo Example
//!
//! A small 3D scene with both controllers:
//! - A floor
//! - A platform circling above the floor
//! - A platform ping-ponging between three waypoints
//! - A ball and a pogo stick, with a charge meter and tilt readout
//!
//! ## Controls
//! - **WASD** or **Arrows**: Roll the ball / tilt the pogo stick
//! - **Space** (hold): Charge a jump, release to jump
//! - **C** (hold): Center the pogo stick
//! - **F**: Force a pogo jump

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use pogo_ball_controller::prelude::*;

// ==================== Constants ====================

const FLOOR_HALF_SIZE: f32 = 20.0;
const BALL_RADIUS: f32 = 0.5;
const POGO_HALF_EXTENTS: Vec3 = Vec3::new(0.2, 0.6, 0.2);

/// Marks the entities driven by the keyboard.
#[derive(Component)]
struct Player;

#[derive(Component)]
struct ChargeText;

#[derive(Component)]
struct TiltText;

// ==================== Main ====================

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Ball and Pogo - Controller Example".into(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        // Physics
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        .add_plugins(RapierDebugRenderPlugin::default())
        // Controllers
        .add_plugins(PogoBallPlugin::<Rapier3dBackend>::default())
        // Systems
        .add_systems(Startup, setup)
        .add_systems(Update, (read_keyboard, show_readouts))
        .run();
}

// ==================== Setup ====================

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let camera = commands
        .spawn((
            Camera3d::default(),
            Transform::from_xyz(0.0, 12.0, 18.0).looking_at(Vec3::ZERO, Vec3::Y),
        ))
        .id();

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    spawn_floor(&mut commands, &mut meshes, &mut materials);
    spawn_platforms(&mut commands, &mut meshes, &mut materials);

    let ball = spawn_ball(&mut commands, &mut meshes, &mut materials, camera);
    let pogo = spawn_pogo(&mut commands, &mut meshes, &mut materials, camera);

    // Readouts
    commands.spawn((
        Text::new("Charge"),
        ChargeMeter::new(pogo),
        ChargeText,
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
    ));
    commands.spawn((
        Text::new("Tilt"),
        TiltReadout::new(pogo),
        TiltText,
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(40.0),
            left: Val::Px(10.0),
            ..default()
        },
    ));
    commands.spawn((
        Text::new("WASD: Roll / Tilt | Space: Jump | C: Center | F: Force Jump"),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
    ));

    info!("ball {ball} and pogo {pogo} ready");
}

fn spawn_floor(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Transform::from_xyz(0.0, -0.5, 0.0),
        RigidBody::Fixed,
        Collider::cuboid(FLOOR_HALF_SIZE, 0.5, FLOOR_HALF_SIZE),
        Mesh3d(meshes.add(Cuboid::new(FLOOR_HALF_SIZE * 2.0, 1.0, FLOOR_HALF_SIZE * 2.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.3, 0.3, 0.3))),
    ));
}

fn spawn_platforms(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) {
    let mesh = meshes.add(Cuboid::new(3.0, 0.4, 3.0));
    let material = materials.add(Color::srgb(0.4, 0.5, 0.3));

    let circling = commands
        .spawn((
            Transform::from_xyz(-6.0, 1.5, 0.0),
            MovingPlatform::circular(4.0, 0.5),
            RigidBody::KinematicPositionBased,
            Collider::cuboid(1.5, 0.2, 1.5),
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
        ))
        .id();
    spawn_trigger(commands, circling);

    let waypoints = vec![
        Vec3::new(6.0, 1.0, -6.0),
        Vec3::new(6.0, 3.0, 0.0),
        Vec3::new(6.0, 1.0, 6.0),
    ];
    let shuttle = commands
        .spawn((
            Transform::from_translation(waypoints[0]),
            MovingPlatform::point_to_point(waypoints, 2.0, Traversal::PingPong),
            RigidBody::KinematicPositionBased,
            Collider::cuboid(1.5, 0.2, 1.5),
            Mesh3d(mesh),
            MeshMaterial3d(material),
        ))
        .id();
    spawn_trigger(commands, shuttle);
}

/// Sensor volume on top of a platform. Riders entering it are carried along.
fn spawn_trigger(commands: &mut Commands, platform: Entity) {
    let trigger = commands
        .spawn((
            Transform::from_xyz(0.0, 0.6, 0.0),
            Collider::cuboid(1.5, 0.4, 1.5),
            Sensor,
            ActiveEvents::COLLISION_EVENTS,
            PlatformTrigger(platform),
        ))
        .id();
    commands.entity(platform).add_child(trigger);
}

fn spawn_ball(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    camera: Entity,
) -> Entity {
    commands
        .spawn((
            Player,
            Transform::from_xyz(-2.0, BALL_RADIUS, 4.0),
            Mesh3d(meshes.add(Sphere::new(BALL_RADIUS))),
            MeshMaterial3d(materials.add(Color::srgb(0.2, 0.6, 0.9))),
        ))
        .insert(BallBundle::new(camera).with_config(BallConfig::default().with_move_force(15.0)))
        .insert((
            Rapier3dBodyBundle::new(),
            Collider::ball(BALL_RADIUS),
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

fn spawn_pogo(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    camera: Entity,
) -> Entity {
    commands
        .spawn((
            Player,
            Transform::from_xyz(2.0, POGO_HALF_EXTENTS.y, 4.0),
            Mesh3d(meshes.add(Cuboid::from_size(POGO_HALF_EXTENTS * 2.0))),
            MeshMaterial3d(materials.add(Color::srgb(0.9, 0.5, 0.2))),
        ))
        .insert(PogoBundle::new(camera))
        .insert((
            Rapier3dBodyBundle::new().with_damping(0.1, 2.0),
            Collider::cuboid(POGO_HALF_EXTENTS.x, POGO_HALF_EXTENTS.y, POGO_HALF_EXTENTS.z),
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

// ==================== Input ====================

fn read_keyboard(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    mut q_players: Query<(Entity, &mut ControlInput, Has<PogoController>), With<Player>>,
) {
    let mut axis = Vec2::ZERO;
    if keys.any_pressed([KeyCode::KeyW, KeyCode::ArrowUp]) {
        axis.y += 1.0;
    }
    if keys.any_pressed([KeyCode::KeyS, KeyCode::ArrowDown]) {
        axis.y -= 1.0;
    }
    if keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        axis.x += 1.0;
    }
    if keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        axis.x -= 1.0;
    }

    for (entity, mut input, is_pogo) in &mut q_players {
        if is_pogo {
            input.set_tilt(axis);
            input.set_centering_held(keys.pressed(KeyCode::KeyC));
            if keys.just_pressed(KeyCode::KeyF) {
                commands.entity(entity).insert(ForcedJump);
            }
        } else {
            input.set_movement(axis);
        }
        // Presses shorter than a fixed tick are queued by the input itself
        if keys.just_pressed(KeyCode::Space) {
            input.set_jump_held(true);
        }
        if keys.just_released(KeyCode::Space) {
            input.set_jump_held(false);
        }
    }
}

// ==================== Readouts ====================

fn show_readouts(
    mut q_charge: Query<(&ChargeMeter, &mut Text), (With<ChargeText>, Without<TiltText>)>,
    mut q_tilt: Query<(&TiltReadout, &mut Text), (With<TiltText>, Without<ChargeText>)>,
) {
    for (meter, mut text) in &mut q_charge {
        text.0 = format!("Charge: {:>3.0}%", meter.value * 100.0);
    }
    for (readout, mut text) in &mut q_tilt {
        let labels = &readout.labels;
        text.0 = format!(
            "N {} | S {} | E {} | W {}",
            labels.north, labels.south, labels.east, labels.west
        );
    }
}
