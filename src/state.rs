//! State marker components.
//!
//! Mirrors of the last ground query, kept in sync by the plugin so game code
//! can filter on them (`With<Grounded>`) instead of reading [`GroundContacts`].
//!
//! [`GroundContacts`]: crate::detection::GroundContacts

use bevy::prelude::*;

/// Marker: the last ground query hit at least one collider.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use pogo_ball_controller::prelude::*;
///
/// fn count_grounded(q: Query<(), With<Grounded>>) -> usize {
///     q.iter().count()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker: the last ground query hit nothing. Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;
