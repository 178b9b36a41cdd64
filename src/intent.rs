//! Control input snapshot.
//!
//! The host writes the current state of its input devices into a
//! [`ControlInput`] every frame. Jump presses and releases made through
//! [`ControlInput::set_jump_held`] are queued until the next fixed tick
//! consumes them, so a tap shorter than one tick still reaches the
//! controllers as a press followed by a release.

use bevy::prelude::*;

/// Per-entity input snapshot.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use pogo_ball_controller::prelude::*;
///
/// let mut input = ControlInput::new();
/// input.set_jump_held(true);
/// assert!(input.jump_started());
///
/// // The controller latches the snapshot at the end of each fixed tick
/// input.latch();
/// assert!(!input.jump_started());
///
/// input.set_jump_held(false);
/// assert!(input.jump_released());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct ControlInput {
    /// Planar movement (x = right, y = forward), camera relative. Used by the ball.
    pub movement: Vec2,
    /// Tilt (x = roll, y = pitch), each in `[-1, 1]`. Used by the pogo stick.
    pub tilt: Vec2,
    /// Whether the jump input is held.
    pub jump_held: bool,
    /// Whether the centering input is held. Used by the pogo stick.
    pub centering_held: bool,
    /// `jump_held` as of the last latched tick.
    pub(crate) jump_held_prev: bool,
    /// A press was queued since the last latch.
    pub(crate) jump_pressed: bool,
    /// A release was queued since the last latch.
    pub(crate) jump_let_go: bool,
}

impl ControlInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set planar movement. The length is clamped to 1.
    pub fn set_movement(&mut self, movement: Vec2) {
        self.movement = movement.clamp_length_max(1.0);
    }

    /// Set tilt. Each axis is clamped to `[-1, 1]`.
    pub fn set_tilt(&mut self, tilt: Vec2) {
        self.tilt = tilt.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Set the jump button state, queueing the press or release it implies.
    pub fn set_jump_held(&mut self, held: bool) {
        if held && !self.jump_held {
            self.jump_pressed = true;
        } else if !held && self.jump_held {
            self.jump_let_go = true;
        }
        self.jump_held = held;
    }

    pub fn set_centering_held(&mut self, held: bool) {
        self.centering_held = held;
    }

    /// Clear movement and tilt, leaving button state untouched.
    pub fn clear_axes(&mut self) {
        self.movement = Vec2::ZERO;
        self.tilt = Vec2::ZERO;
    }

    /// Whether there is any planar movement input.
    pub fn is_moving(&self) -> bool {
        self.movement.length_squared() > 1e-6
    }

    /// Jump was pressed since the last latch.
    ///
    /// Also true when `jump_held` was written directly and differs from the
    /// last latched state.
    #[inline]
    pub fn jump_started(&self) -> bool {
        self.jump_pressed || (self.jump_held && !self.jump_held_prev)
    }

    /// Jump was released since the last latch.
    #[inline]
    pub fn jump_released(&self) -> bool {
        self.jump_let_go || (!self.jump_held && self.jump_held_prev)
    }

    /// A press since the last latch that comes before any queued release.
    ///
    /// False when the jump was already held at the last latch: the release
    /// then ends the running charge first.
    #[inline]
    pub fn jump_started_before_release(&self) -> bool {
        self.jump_started() && !self.jump_held_prev
    }

    /// The jump was released and is held again, so a new charge starts after
    /// the release is handled.
    #[inline]
    pub fn jump_restarted_after_release(&self) -> bool {
        self.jump_held && self.jump_released()
    }

    /// Whether any jump transition is waiting for the next tick.
    #[inline]
    pub fn has_pending_jump(&self) -> bool {
        self.jump_started() || self.jump_released()
    }

    /// Remember the current button state and drop queued transitions so each
    /// one is seen once.
    pub fn latch(&mut self) {
        self.jump_held_prev = self.jump_held;
        self.jump_pressed = false;
        self.jump_let_go = false;
    }
}

/// Request a pogo jump on the next fixed tick without going through the jump input.
///
/// Only pogo sticks handle it; on any other entity it is dropped with a
/// warning at the end of the tick. Removed once handled. Ground and lockout checks still apply, but the jump
/// never counts as a repeated jump.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ForcedJump;
