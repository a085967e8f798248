//! Level layouts and progression

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::EntityIds;
use super::projectile::Projectile;
use super::world::{WorldKind, WorldObject};
use crate::geometry::Point2D;
use crate::physics::{self, Space};
use crate::settings::Settings;

/// Height at which built-in columns are placed
const COLUMN_Y: f32 = 50.0;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level list is empty")]
    Empty,

    #[error("failed to read levels: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse levels: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One hand-authored layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub name: String,
    pub columns: Vec<Point2D>,
    pub pigs: Vec<Point2D>,
    /// Indestructible blocks
    #[serde(default)]
    pub statics: Vec<Point2D>,
}

impl LevelDefinition {
    /// Columns along `xs` at the standard height plus the given pigs
    fn standard(name: &str, xs: impl IntoIterator<Item = f32>, pigs: &[(f32, f32)]) -> Self {
        Self {
            name: name.to_string(),
            columns: xs.into_iter().map(|x| Point2D::new(x, COLUMN_Y)).collect(),
            pigs: pigs.iter().map(|&(x, y)| Point2D::new(x, y)).collect(),
            statics: Vec::new(),
        }
    }
}

/// Ordered levels plus the current cursor
#[derive(Debug, Clone)]
pub struct LevelRegistry {
    levels: Vec<LevelDefinition>,
    current: usize,
}

impl LevelRegistry {
    pub fn new(levels: Vec<LevelDefinition>) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::Empty);
        }
        Ok(Self { levels, current: 0 })
    }

    /// The four shipped layouts
    pub fn builtin() -> Self {
        let spread = || (0..3).map(|i| 500.0 + 300.0 * i as f32);
        Self {
            levels: vec![
                LevelDefinition::standard("Opening Shot", [600.0, 1000.0], &[(900.0, 100.0)]),
                LevelDefinition::standard("Picket Fence", spread(), &[(800.0, 100.0)]),
                LevelDefinition::standard("Second Fence", spread(), &[(800.0, 100.0)]),
                LevelDefinition::standard("Last Stand", spread(), &[(800.0, 100.0)]),
            ],
            current: 0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let registry = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!("Loaded {} levels from {}", registry.len(), path.display());
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &LevelDefinition {
        &self.levels[self.current]
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.levels.len()
    }

    /// Move to the next level. Returns `false` when there is none; the cursor
    /// never wraps.
    pub fn advance(&mut self) -> bool {
        if self.current + 1 < self.levels.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn rewind(&mut self) {
        self.current = 0;
    }

    /// Tear down the live level and build the current one.
    ///
    /// Every world object and bird is removed from the space and the
    /// collections are cleared before the new layout is created. Returns the
    /// number of pigs placed.
    pub fn load_level(
        &self,
        space: &mut Space,
        world: &mut Vec<WorldObject>,
        birds: &mut Vec<Projectile>,
        ids: &mut EntityIds,
        settings: &Settings,
    ) -> physics::Result<usize> {
        for object in world.drain(..) {
            object.remove_from(space);
        }
        for bird in birds.drain(..) {
            bird.remove_from(space);
        }

        let level = self.current();
        for p in &level.columns {
            world.push(WorldObject::column(ids.next_id(), p.to_vec2(), space, &settings.column)?);
        }
        for p in &level.statics {
            world.push(WorldObject::fixed(ids.next_id(), p.to_vec2(), space, &settings.static_block)?);
        }
        for p in &level.pigs {
            world.push(WorldObject::pig(ids.next_id(), p.to_vec2(), space, &settings.pig)?);
        }

        let pigs = world.iter().filter(|o| o.kind == WorldKind::Pig).count();
        log::info!(
            "Level {} '{}' loaded: {} pigs, {} objects",
            self.current + 1,
            level.name,
            pigs,
            world.len()
        );
        Ok(pigs)
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
