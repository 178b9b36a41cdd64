//! UI readout components.
//!
//! The crate does not render anything. It keeps these components up to date
//! in `Update` and the host binds them to whatever widgets it uses.

use bevy::prelude::*;

/// Placeholder shown for a direction the body is not tilted toward.
pub const NO_TILT: &str = "-";

/// Jump charge of `source` as a fraction in `[0, 1]`, for a power bar.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct ChargeMeter {
    /// Entity with a `PogoController` or `BallController`.
    pub source: Entity,
    pub value: f32,
}

impl ChargeMeter {
    pub fn new(source: Entity) -> Self {
        Self { source, value: 0.0 }
    }
}

/// Compass-style tilt labels of a single axis pair.
#[derive(Reflect, Debug, Clone, PartialEq, Eq)]
pub struct TiltLabels {
    pub north: String,
    pub south: String,
    pub east: String,
    pub west: String,
}

impl Default for TiltLabels {
    fn default() -> Self {
        Self {
            north: NO_TILT.to_string(),
            south: NO_TILT.to_string(),
            east: NO_TILT.to_string(),
            west: NO_TILT.to_string(),
        }
    }
}

impl TiltLabels {
    /// Labels for a pitch (about X) and roll (about Z) in degrees.
    ///
    /// Angles are rounded to whole degrees. Positive pitch reads north, negative
    /// south. Positive roll reads west, negative east.
    pub fn from_angles(pitch: f32, roll: f32) -> Self {
        let pitch = pitch.round() as i32;
        let roll = roll.round() as i32;

        let mut labels = Self::default();
        if pitch > 0 {
            labels.north = degrees_label(pitch);
        } else if pitch < 0 {
            labels.south = degrees_label(pitch);
        }
        if roll > 0 {
            labels.west = degrees_label(roll);
        } else if roll < 0 {
            labels.east = degrees_label(roll);
        }
        labels
    }

    /// Whether every label shows [`NO_TILT`].
    pub fn is_level(&self) -> bool {
        [&self.north, &self.south, &self.east, &self.west]
            .iter()
            .all(|label| label.as_str() == NO_TILT)
    }
}

fn degrees_label(angle: i32) -> String {
    format!("{}°", angle.abs())
}

/// Tilt of `source` split into four compass labels.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct TiltReadout {
    /// Entity whose rotation is displayed.
    pub source: Entity,
    pub labels: TiltLabels,
}

impl TiltReadout {
    pub fn new(source: Entity) -> Self {
        Self {
            source,
            labels: TiltLabels::default(),
        }
    }
}
