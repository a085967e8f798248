//! Game tuning and configuration
//!
//! Every gameplay constant lives here so a build can be re-tuned from a JSON
//! file without touching the simulation. Missing fields fall back to the
//! defaults below.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Launchable bird tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BirdParams {
    pub mass: f32,
    pub radius: f32,
    /// Cap on the drag impulse magnitude before the power multiplier
    pub max_impulse: f32,
    pub power_multiplier: f32,
    pub elasticity: f32,
    pub friction: f32,
    pub collision_layer: u32,
    /// Boost impulse = multiplier * mass * scale
    pub boost_multiplier: f32,
    pub boost_scale: f32,
    /// Child spread for the splitting bird (degrees, applied as +/-)
    pub split_spread_deg: f32,
    /// Child offsets for the exploding bird (degrees)
    pub explode_offsets_deg: Vec<f32>,
    pub grow_radius_factor: f32,
    pub grow_mass_factor: f32,
}

impl Default for BirdParams {
    fn default() -> Self {
        Self {
            mass: 5.0,
            radius: 12.0,
            max_impulse: 100.0,
            power_multiplier: 50.0,
            elasticity: 0.8,
            friction: 1.0,
            collision_layer: 0,
            boost_multiplier: 2.0,
            boost_scale: 500.0,
            split_spread_deg: 30.0,
            explode_offsets_deg: vec![-90.0, -60.0, -30.0, 30.0, 60.0, 90.0, 180.0],
            grow_radius_factor: 1.5,
            grow_mass_factor: 2.0,
        }
    }
}

/// Scenery body tuning (pigs, columns, static blocks)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropParams {
    pub mass: f32,
    /// Circle radius (pigs) or unused for boxes
    pub radius: f32,
    /// Box size (columns, statics) or unused for circles
    pub size: Vec2,
    pub elasticity: f32,
    pub friction: f32,
    pub collision_layer: u32,
}

impl PropParams {
    pub fn pig() -> Self {
        Self {
            mass: 2.0,
            radius: 20.0,
            size: Vec2::splat(40.0),
            elasticity: 0.8,
            friction: 0.4,
            collision_layer: 0,
        }
    }

    pub fn column() -> Self {
        Self {
            mass: 2.0,
            radius: 0.0,
            size: Vec2::new(20.0, 70.0),
            elasticity: 0.8,
            friction: 1.0,
            collision_layer: 0,
        }
    }
}

impl Default for PropParams {
    fn default() -> Self {
        Self::column()
    }
}

/// Contact impulse thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactThresholds {
    /// Contacts weaker than this are ignored entirely
    pub ignore_below: f32,
    /// Contacts stronger than this destroy destructible participants
    pub destroy_above: f32,
}

impl Default for ContactThresholds {
    fn default() -> Self {
        Self {
            ignore_below: 100.0,
            destroy_above: 1200.0,
        }
    }
}

/// Points per destroyed object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreValues {
    pub pig: u64,
    pub column: u64,
}

impl Default for ScoreValues {
    fn default() -> Self {
        Self { pig: 100, column: 35 }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Playfield ===
    pub width: f32,
    pub height: f32,
    pub gravity: f32,
    pub floor_height: f32,
    pub floor_friction: f32,

    // === Loop ===
    /// Fixed simulation step (seconds)
    pub sim_dt: f32,
    /// Substep cap per rendered frame
    pub max_substeps: u32,

    // === Rules ===
    /// Birds per level attempt
    pub max_birds: u32,
    /// Below this speed an in-flight bird counts as settled
    pub settle_speed: f32,
    pub drag_reduction: f32,
    /// Advancing after a clear also needs the bird budget used up
    pub require_full_budget_to_advance: bool,
    pub contact: ContactThresholds,
    pub scores: ScoreValues,

    // === Bodies ===
    pub bird: BirdParams,
    pub pig: PropParams,
    pub column: PropParams,
    pub static_block: PropParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 1800.0,
            height: 600.0,
            gravity: -900.0,
            floor_height: 15.0,
            floor_friction: 10.0,

            sim_dt: 1.0 / 60.0,
            max_substeps: 8,

            max_birds: 3,
            settle_speed: 10.0,
            drag_reduction: crate::geometry::DEFAULT_REDUCTION_FACTOR,
            require_full_budget_to_advance: true,
            contact: ContactThresholds::default(),
            scores: ScoreValues::default(),

            bird: BirdParams::default(),
            pig: PropParams::pig(),
            column: PropParams::column(),
            static_block: PropParams {
                size: Vec2::new(200.0, 20.0),
                ..PropParams::column()
            },
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "playfield must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.sim_dt > 0.0) || self.max_substeps == 0 {
            return Err(ConfigError::Invalid("sim_dt and max_substeps must be positive".into()));
        }
        if self.max_birds == 0 {
            return Err(ConfigError::Invalid("max_birds must be at least 1".into()));
        }
        if self.contact.destroy_above < self.contact.ignore_below {
            return Err(ConfigError::Invalid(format!(
                "destroy_above ({}) below ignore_below ({})",
                self.contact.destroy_above, self.contact.ignore_below
            )));
        }
        for (name, mass) in [
            ("bird", self.bird.mass),
            ("pig", self.pig.mass),
            ("column", self.column.mass),
        ] {
            if !(mass > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} mass must be positive")));
            }
        }
        if !(self.bird.radius > 0.0 && self.pig.radius > 0.0) {
            return Err(ConfigError::Invalid("radii must be positive".into()));
        }
        if !(self.bird.max_impulse >= 0.0) {
            return Err(ConfigError::Invalid("bird max_impulse must not be negative".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn gravity_vec(&self) -> Vec2 {
        Vec2::new(0.0, self.gravity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_birds, 3);
        assert_eq!(settings.bird.explode_offsets_deg.len(), 7);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "max_birds": 5, "bird": { "mass": 8.0 } }"#)
            .expect("valid partial config");
        assert_eq!(settings.max_birds, 5);
        assert_eq!(settings.bird.mass, 8.0);
        assert_eq!(settings.bird.radius, 12.0);
        assert_eq!(settings.width, 1800.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let settings = Settings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let err = Settings::from_json(
            r#"{ "contact": { "ignore_below": 500.0, "destroy_above": 100.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            Settings::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
