//! Jump charge models.
//!
//! Both controllers charge their jump while the jump input is held and release
//! it as an impulse when the input is let go:
//! - [`SquishCharge`] (ball): hold time is converted into a clamped impulse
//!   magnitude, and the body squishes uniformly while charging
//! - [`PogoCharge`] (pogo stick): the charge value itself grows linearly up to
//!   the maximum jump force, the body compresses along Y, and every jump is
//!   followed by a [`JumpLockout`]
//!
//! These are plain state machines advanced by explicit `tick`/`press`/`release`
//! calls; the controller systems feed them time, ground state and the current
//! scale.

use bevy::prelude::*;

use crate::config::{BallConfig, PogoConfig};

/// Distance below which a recovering scale snaps to its rest value.
pub const SCALE_SNAP_DISTANCE: f32 = 0.01;

/// Clamp `value` into `[min, max]` without panicking on an inverted range.
///
/// The lower bound is checked first, so an inverted range yields `min`.
#[inline]
pub fn clamp_range(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Move `current` toward `target` by at most `max_delta`.
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Ball jump impulse magnitude for a hold fraction in `[0, 1]`.
#[inline]
pub fn ball_jump_magnitude(hold_fraction: f32, config: &BallConfig) -> f32 {
    clamp_range(
        config.jump_force * hold_fraction,
        config.min_jump_force,
        config.max_jump_force,
    )
}

// ============================================================================
// Ball
// ============================================================================

/// Phase of the ball's squish animation.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SquishPhase {
    /// At rest scale, not charging.
    #[default]
    Idle,
    /// Jump held; the body squishes over time.
    Charging,
    /// Jump released; the scale eases back to rest.
    Recovering,
}

/// Squish-while-held jump charge for the ball.
#[derive(Reflect, Debug, Clone, Copy, Default)]
pub struct SquishCharge {
    phase: SquishPhase,
    /// Time the jump has been held, in seconds.
    elapsed: f32,
}

impl SquishCharge {
    #[inline]
    pub fn phase(&self) -> SquishPhase {
        self.phase
    }

    #[inline]
    pub fn is_charging(&self) -> bool {
        self.phase == SquishPhase::Charging
    }

    /// Seconds the jump has been held so far (unclamped).
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Start charging. Interrupts any running scale recovery.
    pub fn press(&mut self) {
        self.phase = SquishPhase::Charging;
        self.elapsed = 0.0;
    }

    /// Accumulate hold time. No-op unless charging.
    pub fn tick(&mut self, dt: f32) {
        if self.is_charging() {
            self.elapsed += dt.max(0.0);
        }
    }

    /// Fraction of the maximum charge time that has been held, in `[0, 1]`.
    pub fn hold_fraction(&self, max_time: f32) -> f32 {
        if max_time <= 0.0 {
            return 1.0;
        }
        (self.elapsed / max_time).clamp(0.0, 1.0)
    }

    /// Charge fraction for display: the hold fraction while charging, 0 otherwise.
    pub fn normalized_charge(&self, config: &BallConfig) -> f32 {
        if self.is_charging() {
            self.hold_fraction(config.max_squish_time)
        } else {
            0.0
        }
    }

    /// Uniform squish factor for the current hold time.
    ///
    /// 1.0 at the start of a charge, `config.squish_factor` at full charge.
    pub fn squish_amount(&self, config: &BallConfig) -> f32 {
        1.0 - self.hold_fraction(config.max_squish_time) * (1.0 - config.squish_factor)
    }

    /// Scale to display while charging.
    pub fn squished_scale(&self, rest_scale: Vec3, config: &BallConfig) -> Vec3 {
        rest_scale * self.squish_amount(config)
    }

    /// Release the jump.
    ///
    /// Returns the impulse magnitude if the ball was charging and is grounded.
    /// Scale recovery starts either way once a charge is released.
    pub fn release(&mut self, grounded: bool, config: &BallConfig) -> Option<f32> {
        if !self.is_charging() {
            return None;
        }

        let fraction = self.hold_fraction(config.max_squish_time);
        self.phase = SquishPhase::Recovering;
        self.elapsed = 0.0;

        grounded.then(|| ball_jump_magnitude(fraction, config))
    }

    /// Ease `current` back toward `rest_scale`.
    ///
    /// Returns the new scale. Snaps to `rest_scale` and goes idle once within
    /// [`SCALE_SNAP_DISTANCE`]. Returns `current` unchanged unless recovering.
    pub fn recover(&mut self, current: Vec3, rest_scale: Vec3, dt: f32, speed: f32) -> Vec3 {
        if self.phase != SquishPhase::Recovering {
            return current;
        }

        let next = current.lerp(rest_scale, (dt * speed).clamp(0.0, 1.0));
        if next.distance(rest_scale) < SCALE_SNAP_DISTANCE {
            self.phase = SquishPhase::Idle;
            rest_scale
        } else {
            next
        }
    }
}

// ============================================================================
// Lockout
// ============================================================================

/// One-shot cooldown that rejects jumps until it expires.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct JumpLockout {
    remaining: Option<f32>,
}

impl JumpLockout {
    /// Start (or restart) the lockout.
    pub fn start(&mut self, duration: f32) {
        self.remaining = Some(duration.max(0.0));
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining.is_some()
    }

    /// Seconds left, if active.
    #[inline]
    pub fn remaining(&self) -> Option<f32> {
        self.remaining
    }

    /// Advance the timer. Returns `true` on the tick the lockout expires.
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(remaining) = self.remaining.as_mut() else {
            return false;
        };

        *remaining -= dt.max(0.0);
        if *remaining <= 0.0 {
            self.remaining = None;
            true
        } else {
            false
        }
    }
}

// ============================================================================
// Pogo
// ============================================================================

/// What caused a pogo jump.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JumpTrigger {
    /// Released jump input.
    #[default]
    Player,
    /// Jump requested by game code regardless of the repeated-jump window.
    Forced,
}

/// Compress-while-held jump charge for the pogo stick.
#[derive(Reflect, Debug, Clone, Copy, Default)]
pub struct PogoCharge {
    charge: f32,
    previous_charge: f32,
    charging: bool,
    normalized_charge: f32,
    grounded_time: f32,
    lockout: JumpLockout,
}

impl PogoCharge {
    /// Current charge (impulse magnitude if released now).
    #[inline]
    pub fn charge(&self) -> f32 {
        self.charge
    }

    /// Charge of the last jump that was actually applied.
    #[inline]
    pub fn previous_charge(&self) -> f32 {
        self.previous_charge
    }

    #[inline]
    pub fn is_charging(&self) -> bool {
        self.charging
    }

    /// Charge as a fraction of the maximum jump force, in `[0, 1]`.
    ///
    /// Holds its last value after a jump and drops to 0 when the lockout expires.
    #[inline]
    pub fn normalized_charge(&self) -> f32 {
        self.normalized_charge
    }

    /// Seconds spent continuously grounded.
    #[inline]
    pub fn grounded_time(&self) -> f32 {
        self.grounded_time
    }

    #[inline]
    pub fn lockout(&self) -> &JumpLockout {
        &self.lockout
    }

    /// Start charging from the minimum jump force.
    pub fn press(&mut self, config: &PogoConfig) {
        self.charging = true;
        self.charge = config.min_jump_force;
    }

    /// Advance charge and compression by `dt`.
    ///
    /// Returns the new scale: compressing along Y while charging, easing back
    /// to `rest_scale` otherwise.
    pub fn tick(&mut self, dt: f32, current_scale: Vec3, rest_scale: Vec3, config: &PogoConfig) -> Vec3 {
        let dt = dt.max(0.0);
        let charge_time = config.max_charge_timer.max(f32::EPSILON);

        if self.charging {
            let target_y = rest_scale.y * config.compression_factor;
            let compression_step = (1.0 - config.compression_factor) / charge_time * dt;
            let y = move_towards(current_scale.y, target_y, compression_step);

            let charge_rate = (config.max_jump_force - config.min_jump_force) / charge_time;
            self.charge = (self.charge + dt * charge_rate).min(config.max_jump_force);
            self.normalized_charge = if config.max_jump_force > 0.0 {
                (self.charge / config.max_jump_force).clamp(0.0, 1.0)
            } else {
                0.0
            };

            Vec3::new(rest_scale.x, y, rest_scale.z)
        } else {
            let decompression_speed = config.decompression_multiplier / charge_time;
            current_scale.lerp(rest_scale, (dt * decompression_speed).clamp(0.0, 1.0))
        }
    }

    /// Track how long the pogo has been grounded.
    pub fn tick_grounded(&mut self, grounded: bool, dt: f32) {
        if grounded {
            self.grounded_time += dt.max(0.0);
        } else {
            self.grounded_time = 0.0;
        }
    }

    /// Advance the lockout. Clears the displayed charge when it expires.
    ///
    /// Returns `true` on the tick the lockout expires.
    pub fn tick_lockout(&mut self, dt: f32) -> bool {
        let expired = self.lockout.tick(dt);
        if expired {
            self.normalized_charge = 0.0;
        }
        expired
    }

    /// Release the jump.
    ///
    /// `up` is the body's local up axis in world space. Returns the impulse to
    /// apply, or `None` if airborne or locked out. The caller is expected to
    /// zero the body's velocity before applying the impulse.
    pub fn release(
        &mut self,
        grounded: bool,
        up: Vec3,
        trigger: JumpTrigger,
        config: &PogoConfig,
    ) -> Option<Vec3> {
        self.charging = false;

        // No stored charge survives an airborne release.
        if !grounded {
            self.charge = config.min_jump_force;
        }

        if self.lockout.is_active() || !grounded {
            return None;
        }

        // A quick re-jump keeps the previous charge around; it has no other effect.
        let repeated = self.grounded_time < config.repeated_jump_time_limit
            && trigger == JumpTrigger::Player;
        if !repeated {
            self.previous_charge = 0.0;
        }

        // A forced jump may arrive without a press; it still jumps at minimum force.
        let magnitude = self.charge.max(config.min_jump_force);
        let impulse = up.normalize_or_zero() * magnitude;

        self.previous_charge = magnitude;
        self.charge = config.min_jump_force;
        self.lockout.start(config.lockout_duration);

        Some(impulse)
    }
}
