//! Collision resolution: turns post-solve contact reports into destruction,
//! score and turn-end signals

use crate::physics::{ContactEvent, ShapeHandle, Space};
use crate::settings::{ContactThresholds, ScoreValues, Settings};

use super::world::{WorldKind, WorldObject};

/// Effects of one contact event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactOutcome {
    /// `(id, kind)` of every object destroyed by this contact
    pub destroyed: Vec<(u32, WorldKind)>,
    pub points: u64,
    pub pigs_destroyed: u32,
    /// The in-flight bird took part in the contact
    pub ends_turn: bool,
}

impl ContactOutcome {
    pub fn is_empty(&self) -> bool {
        self.destroyed.is_empty() && !self.ends_turn
    }
}

/// Impulse thresholds plus point values
#[derive(Debug, Clone, PartialEq)]
pub struct ContactPolicy {
    pub thresholds: ContactThresholds,
    pub scores: ScoreValues,
}

impl ContactPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            thresholds: settings.contact.clone(),
            scores: settings.scores.clone(),
        }
    }

    /// Apply one contact.
    ///
    /// * below `ignore_below`: nothing happens
    /// * above `destroy_above`: every live destructible participant is removed
    ///   from the space and scored
    /// * at or above `ignore_below` with the in-flight bird as a participant:
    ///   the turn ends, whatever else happened
    pub fn resolve(
        &self,
        event: &ContactEvent,
        world: &mut [WorldObject],
        active_shape: Option<ShapeHandle>,
        space: &mut Space,
    ) -> ContactOutcome {
        let mut outcome = ContactOutcome::default();
        let magnitude = event.impulse_magnitude();
        if magnitude < self.thresholds.ignore_below {
            return outcome;
        }

        if magnitude > self.thresholds.destroy_above {
            for object in world.iter_mut().filter(|o| event.involves(o.shape)) {
                let Some(points) = object.kind.points(&self.scores) else {
                    continue;
                };
                if !object.destroy(space) {
                    continue;
                }
                log::debug!(
                    "{} {} destroyed by impulse {:.0} (+{})",
                    object.kind.as_str(),
                    object.id,
                    magnitude,
                    points
                );
                outcome.points += points;
                if object.kind == WorldKind::Pig {
                    outcome.pigs_destroyed += 1;
                }
                outcome.destroyed.push((object.id, object.kind));
            }
        }

        outcome.ends_turn = active_shape.is_some_and(|shape| event.involves(shape));
        outcome
    }
}
