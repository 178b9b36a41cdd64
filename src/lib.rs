//! # `pogo_ball_controller`
//!
//! Physics-driven ball and pogo stick controllers for 3D Bevy games, with
//! moving platforms and a physics backend abstraction.
//!
//! This crate provides:
//! - Ground sensing by raycasts: a Fibonacci sphere of rays for the ball, a
//!   single down probe for the pogo stick
//! - Charge-based jumps: the ball squishes while the jump is held, the pogo
//!   stick compresses and locks out further jumps for a while after each one
//! - Camera-relative rolling for the ball, tilt and centering for the pogo
//! - Moving platforms (circular or waypoint routes) that carry their riders
//! - Charge meter and tilt readouts for the HUD
//!
//! ## Architecture
//!
//! Every fixed tick runs the [`PogoBallSet`] phases in order:
//! 1. **Preparation**: capture rest scales, place new platforms, reset forces
//! 2. **Platforms**: move platforms and carry their riders
//! 3. **Sensors**: sample the ground, process platform trigger events
//! 4. **Controllers**: read input transitions and drive jumps, movement, rotation
//! 5. **FinalApplication**: hand forces to the physics engine, latch input
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use pogo_ball_controller::prelude::*;
//!
//! let camera = Entity::from_raw(0);
//!
//! // Controller components for a ball and a pogo stick
//! let ball = BallBundle::new(camera).with_config(BallConfig::default().with_move_force(15.0));
//! let pogo = PogoBundle::new(camera).with_config(PogoConfig::default().with_lockout(0.5));
//!
//! // A platform circling its spawn point
//! let platform = MovingPlatform::circular(5.0, 2.0);
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod charge;
pub mod collision;
pub mod config;
pub mod detection;
pub mod intent;
pub mod motion;
pub mod platform;
pub mod readout;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{AccumulatedForce, PhysicsBackend};
    pub use crate::charge::{JumpLockout, JumpTrigger, PogoCharge, SquishCharge, SquishPhase};
    pub use crate::collision::CollisionData;
    pub use crate::config::{
        BallBundle, BallConfig, BallController, DragProfile, PogoBundle, PogoConfig,
        PogoController,
    };
    pub use crate::detection::{GroundContacts, GroundSensor};
    pub use crate::intent::{ControlInput, ForcedJump};
    pub use crate::motion::CameraBasis;
    pub use crate::platform::{MovingPlatform, PlatformRider, PlatformTrigger, Traversal};
    pub use crate::readout::{ChargeMeter, TiltLabels, TiltReadout};
    pub use crate::state::{Airborne, Grounded};
    pub use crate::{PogoBallPlugin, PogoBallSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dBodyBundle};
}

/// System sets for the fixed tick, chained in declaration order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PogoBallSet {
    /// Per-tick setup before anything moves.
    Preparation,
    /// Platform motion and rider carrying.
    Platforms,
    /// Ground sensing and trigger events. Provided by the backend.
    Sensors,
    /// Controller updates.
    Controllers,
    /// Hand results to the physics engine and latch input.
    FinalApplication,
}

/// Main plugin for the ball and pogo controllers.
///
/// Generic over a physics backend `B` which provides the actual physics
/// operations.
///
/// # Examples
///
/// With the Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use pogo_ball_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(PogoBallPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct PogoBallPlugin<B: backend::PhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::PhysicsBackend> Default for PogoBallPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::PhysicsBackend> Plugin for PogoBallPlugin<B> {
    fn build(&self, app: &mut App) {
        app.register_type::<config::BallController>();
        app.register_type::<config::BallConfig>();
        app.register_type::<config::PogoController>();
        app.register_type::<config::PogoConfig>();
        app.register_type::<detection::GroundSensor>();
        app.register_type::<detection::GroundContacts>();
        app.register_type::<intent::ControlInput>();
        app.register_type::<intent::ForcedJump>();
        app.register_type::<platform::MovingPlatform>();
        app.register_type::<platform::PlatformRider>();
        app.register_type::<platform::PlatformTrigger>();
        app.register_type::<readout::ChargeMeter>();
        app.register_type::<readout::TiltReadout>();
        app.register_type::<backend::AccumulatedForce>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();

        app.configure_sets(
            FixedUpdate,
            (
                PogoBallSet::Preparation,
                PogoBallSet::Platforms,
                PogoBallSet::Sensors,
                PogoBallSet::Controllers,
                PogoBallSet::FinalApplication,
            )
                .chain(),
        );

        // Sensing and force hand-off
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (systems::capture_rest_scale, systems::init_moving_platforms)
                .in_set(PogoBallSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            (systems::move_platforms, systems::carry_riders)
                .chain()
                .in_set(PogoBallSet::Platforms),
        );
        app.add_systems(
            FixedUpdate,
            (
                systems::update_ball_controllers::<B>,
                systems::update_pogo_controllers::<B>,
                systems::sync_state_markers,
            )
                .chain()
                .in_set(PogoBallSet::Controllers),
        );
        app.add_systems(
            FixedUpdate,
            (systems::latch_inputs, systems::discard_stray_forced_jumps)
                .in_set(PogoBallSet::FinalApplication),
        );

        app.add_systems(
            Update,
            (systems::update_charge_meters, systems::update_tilt_readouts),
        );
    }
}
