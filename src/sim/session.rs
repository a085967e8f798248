//! Game session: input handling, the fixed-step tick and the level state
//! machine
//!
//! One `Session` owns the simulation space and every live entity. The
//! presentation layer feeds it raw input and frame time, then reads a
//! `Frame` back for drawing.
//!
//! Tick order: step space -> resolve contacts -> sync sprites -> watchdog ->
//! win/loss rules.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::contact::ContactPolicy;
use super::entity::EntityIds;
use super::level::LevelRegistry;
use super::projectile::{Ability, BirdKind, Projectile};
use super::view::{Frame, SpriteView};
use super::world::{WorldKind, WorldObject};
use crate::geometry::{ImpulseVector, Point2D, impulse_from_drag};
use crate::physics::{self, Body, Shape, ShapeHandle, Space};
use crate::settings::Settings;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No bird in flight; a drag may be in progress
    Aiming,
    /// The active bird has not resolved yet
    InFlight,
    /// Last level cleared
    GameComplete,
    /// Bird budget spent on the last level with pigs standing
    GameOverFailed,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::GameComplete | GamePhase::GameOverFailed)
    }
}

/// Why a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEnd {
    /// The active bird touched something hard enough
    Contact,
    OutOfBounds,
    Settled,
}

/// Things that happened during input handling or a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelLoaded { level: usize, pigs: usize },
    Launched { bird: BirdKind, impulse: ImpulseVector, bird_count: u32 },
    AbilityTriggered { bird: BirdKind, spawned: usize },
    Destroyed { id: u32, kind: WorldKind, points: u64 },
    TurnEnded(TurnEnd),
    LevelFailed { level: usize, score: u64 },
    LevelCleared { level: usize, score: u64 },
    GameComplete { total_score: u64 },
    GameOver { total_score: u64 },
}

/// Outcome of one level attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelResult {
    pub level: usize,
    pub score: u64,
    pub birds_used: u32,
    pub cleared: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragGesture {
    start: Point2D,
    end: Point2D,
}

/// The whole game
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    policy: ContactPolicy,
    space: Space,
    floor: ShapeHandle,
    levels: LevelRegistry,
    ids: EntityIds,
    world: Vec<WorldObject>,
    birds: Vec<Projectile>,
    phase: GamePhase,
    /// Score of the current level attempt
    score: u64,
    /// Banked score of finished attempts
    total_score: u64,
    bird_count: u32,
    remaining_pigs: usize,
    active: Option<u32>,
    selected: BirdKind,
    drag: Option<DragGesture>,
    message: Option<String>,
    events: Vec<GameEvent>,
    results: Vec<LevelResult>,
    accumulator: f32,
    time_ticks: u64,
}

impl Session {
    /// Build the playfield and load the registry's current level
    pub fn new(settings: Settings, levels: LevelRegistry) -> crate::Result<Self> {
        settings.validate()?;

        let mut space = Space::new(settings.gravity_vec());
        let floor_body = space.add_body(Body::fixed())?;
        let floor = space.add_shape(
            Shape::segment(
                floor_body,
                Vec2::new(0.0, settings.floor_height),
                Vec2::new(settings.width, settings.floor_height),
                0.0,
            )
            .with_friction(settings.floor_friction),
        )?;

        let mut session = Self {
            policy: ContactPolicy::from_settings(&settings),
            settings,
            space,
            floor,
            levels,
            ids: EntityIds::default(),
            world: Vec::new(),
            birds: Vec::new(),
            phase: GamePhase::Aiming,
            score: 0,
            total_score: 0,
            bird_count: 0,
            remaining_pigs: 0,
            active: None,
            selected: BirdKind::default(),
            drag: None,
            message: None,
            events: Vec::new(),
            results: Vec::new(),
            accumulator: 0.0,
            time_ticks: 0,
        };
        session.reload_level()?;
        Ok(session)
    }

    /// Default tuning with the built-in levels
    pub fn with_defaults() -> crate::Result<Self> {
        Self::new(Settings::default(), LevelRegistry::builtin())
    }

    // === Input ===

    /// Mouse/touch down: start a drag while aiming, fire the active bird's
    /// ability while in flight
    pub fn on_press(&mut self, x: f32, y: f32) -> physics::Result<()> {
        match self.phase {
            GamePhase::Aiming => {
                let p = Point2D::new(x, y);
                self.drag = Some(DragGesture { start: p, end: p });
                log::debug!("Drag start at ({x:.0}, {y:.0})");
            }
            GamePhase::InFlight => self.trigger_active_ability()?,
            GamePhase::GameComplete | GamePhase::GameOverFailed => {}
        }
        Ok(())
    }

    pub fn on_drag(&mut self, x: f32, y: f32) {
        if self.phase != GamePhase::Aiming {
            return;
        }
        if let Some(drag) = self.drag.as_mut() {
            drag.end = Point2D::new(x, y);
        }
    }

    /// Mouse/touch up: launch the selected bird from the release point.
    /// Returns the new bird's id when a launch happened.
    pub fn on_release(&mut self, x: f32, y: f32) -> physics::Result<Option<u32>> {
        if self.phase != GamePhase::Aiming {
            log::debug!("Release ignored: a bird is still in flight");
            return Ok(None);
        }
        let Some(drag) = self.drag.take() else {
            return Ok(None);
        };
        let impulse = impulse_from_drag(drag.start, drag.end, self.settings.drag_reduction);
        self.launch(impulse, Vec2::new(x, y)).map(Some)
    }

    /// Key up: choose the variant for the next launch
    pub fn on_key_release(&mut self, key: char) {
        if let Some(kind) = BirdKind::from_key(key) {
            log::debug!("Selected {} bird", kind.as_str());
            self.selected = kind;
        }
    }

    /// Feed wall-clock frame time; runs as many fixed steps as fit, capped
    /// at `max_substeps`. Returns the number of steps taken.
    pub fn advance_frame(&mut self, frame_dt: f32) -> physics::Result<u32> {
        self.accumulator += frame_dt.clamp(0.0, 0.1);

        let mut substeps = 0;
        while self.accumulator >= self.settings.sim_dt && substeps < self.settings.max_substeps {
            self.on_tick(self.settings.sim_dt)?;
            self.accumulator -= self.settings.sim_dt;
            substeps += 1;
        }
        Ok(substeps)
    }

    /// Advance the game by one step of `dt` seconds
    pub fn on_tick(&mut self, dt: f32) -> physics::Result<()> {
        if self.phase.is_terminal() {
            return Ok(());
        }
        self.time_ticks += 1;

        self.space.step(dt);
        self.resolve_contacts();
        self.sync_sprites()?;
        self.cull_escaped_birds();
        self.check_active_bird()?;
        self.apply_rules()
    }

    // === Turn flow ===

    fn launch(&mut self, impulse: ImpulseVector, at: Vec2) -> physics::Result<u32> {
        self.bird_count += 1;
        let id = self.ids.next_id();
        let bird = Projectile::launch(id, self.selected, impulse, at, &mut self.space, &self.settings.bird)?;
        self.birds.push(bird);
        self.active = Some(id);
        self.phase = GamePhase::InFlight;

        log::info!(
            "Launched {} bird #{} (angle {:.2} rad, impulse {:.1})",
            self.selected.as_str(),
            self.bird_count,
            impulse.angle,
            impulse.impulse
        );
        self.events.push(GameEvent::Launched {
            bird: self.selected,
            impulse,
            bird_count: self.bird_count,
        });
        Ok(id)
    }

    fn trigger_active_ability(&mut self) -> physics::Result<()> {
        let Some(idx) = self.active_index() else {
            return Ok(());
        };
        let bird = &mut self.birds[idx];
        let kind = bird.kind;
        let spawned = match bird.trigger_ability(&mut self.space, &mut self.ids, &self.settings.bird)? {
            Ability::None | Ability::AlreadyUsed => return Ok(()),
            Ability::Boosted(_) | Ability::Grew { .. } => 0,
            Ability::Spawned(children) => {
                let n = children.len();
                self.birds.extend(children);
                n
            }
        };

        log::info!("{} bird ability triggered ({} spawned)", kind.as_str(), spawned);
        self.events.push(GameEvent::AbilityTriggered { bird: kind, spawned });
        Ok(())
    }

    fn resolve_contacts(&mut self) {
        let mut active_shape = self.active_bird().map(|b| b.shape);

        for event in self.space.drain_contacts() {
            let outcome = self
                .policy
                .resolve(&event, &mut self.world, active_shape, &mut self.space);

            self.score += outcome.points;
            self.remaining_pigs = self
                .remaining_pigs
                .saturating_sub(outcome.pigs_destroyed as usize);
            for (id, kind) in outcome.destroyed {
                let points = kind.points(&self.policy.scores).unwrap_or(0);
                self.events.push(GameEvent::Destroyed { id, kind, points });
            }
            if outcome.ends_turn {
                self.end_turn(TurnEnd::Contact);
                active_shape = None;
            }
        }

        self.world.retain(|o| !o.destroyed);
    }

    fn sync_sprites(&mut self) -> physics::Result<()> {
        for bird in &mut self.birds {
            bird.update(&self.space)?;
        }
        for object in &mut self.world {
            object.update(&self.space)?;
        }
        Ok(())
    }

    /// Drop birds that fell or flew off the sides of the playfield. The
    /// active bird is left to the watchdog.
    fn cull_escaped_birds(&mut self) {
        let width = self.settings.width;
        let active = self.active;
        let space = &mut self.space;
        self.birds.retain(|bird| {
            let c = bird.sprite.center;
            let escaped = c.x < 0.0 || c.x > width || c.y < 0.0;
            if escaped && Some(bird.id) != active {
                bird.remove_from(space);
                false
            } else {
                true
            }
        });
    }

    /// End the turn if the active bird left the playfield or came to rest
    fn check_active_bird(&mut self) -> physics::Result<()> {
        let Some(bird) = self.active_bird() else {
            return Ok(());
        };
        let (p, speed) = {
            let body = self.space.body(bird.body)?;
            (body.position, body.velocity.length())
        };

        let out_of_bounds =
            p.x < 0.0 || p.x > self.settings.width || p.y < 0.0 || p.y > self.settings.height;
        if out_of_bounds {
            self.end_turn(TurnEnd::OutOfBounds);
        } else if speed < self.settings.settle_speed {
            self.end_turn(TurnEnd::Settled);
        }
        Ok(())
    }

    fn end_turn(&mut self, reason: TurnEnd) {
        if self.active.take().is_none() {
            return;
        }
        if self.phase == GamePhase::InFlight {
            self.phase = GamePhase::Aiming;
        }
        log::debug!("Turn ended: {reason:?}");
        self.events.push(GameEvent::TurnEnded(reason));
    }

    // === Level flow ===

    fn apply_rules(&mut self) -> physics::Result<()> {
        let budget_spent = self.bird_count >= self.settings.max_birds;

        if budget_spent && self.remaining_pigs > 0 && !self.in_flight() {
            return self.fail_level();
        }

        // Observed rule: a clean clear still waits for the whole budget
        // unless configured otherwise.
        let may_advance = budget_spent || !self.settings.require_full_budget_to_advance;
        if self.remaining_pigs == 0 && may_advance {
            return self.clear_level();
        }
        Ok(())
    }

    fn fail_level(&mut self) -> physics::Result<()> {
        let level = self.levels.current_index();
        self.bank_score(false);
        log::info!(
            "Level {} failed, total score {}",
            level + 1,
            self.total_score
        );
        self.events.push(GameEvent::LevelFailed {
            level,
            score: self.results.last().map_or(0, |r| r.score),
        });

        let last = self.levels.is_last();
        self.reload_level()?;
        if last {
            self.phase = GamePhase::GameOverFailed;
            self.message = Some(format!("Game over! Total score: {}", self.total_score));
            log::info!("Game over, total score {}", self.total_score);
            self.events.push(GameEvent::GameOver {
                total_score: self.total_score,
            });
        }
        Ok(())
    }

    fn clear_level(&mut self) -> physics::Result<()> {
        let level = self.levels.current_index();
        self.bank_score(true);
        log::info!("Level {} cleared, total score {}", level + 1, self.total_score);
        self.events.push(GameEvent::LevelCleared {
            level,
            score: self.results.last().map_or(0, |r| r.score),
        });

        if self.levels.advance() {
            self.reload_level()
        } else {
            self.phase = GamePhase::GameComplete;
            self.active = None;
            self.drag = None;
            self.message = Some(format!("Game complete! Total score: {}", self.total_score));
            log::info!("Game complete, total score {}", self.total_score);
            self.events.push(GameEvent::GameComplete {
                total_score: self.total_score,
            });
            Ok(())
        }
    }

    fn bank_score(&mut self, cleared: bool) {
        self.total_score += self.score;
        self.results.push(LevelResult {
            level: self.levels.current_index(),
            score: self.score,
            birds_used: self.bird_count,
            cleared,
        });
    }

    /// Rebuild the current level and reset the per-attempt counters
    fn reload_level(&mut self) -> physics::Result<()> {
        let pigs = self.levels.load_level(
            &mut self.space,
            &mut self.world,
            &mut self.birds,
            &mut self.ids,
            &self.settings,
        )?;
        // Reports from the torn-down level refer to dead shapes
        self.space.drain_contacts();

        self.remaining_pigs = pigs;
        self.score = 0;
        self.bird_count = 0;
        self.active = None;
        self.drag = None;
        self.phase = GamePhase::Aiming;
        self.events.push(GameEvent::LevelLoaded {
            level: self.levels.current_index(),
            pigs,
        });
        Ok(())
    }

    /// Start over from the first level with a clean score
    pub fn restart(&mut self) -> physics::Result<()> {
        log::info!("Restarting session");
        self.levels.rewind();
        self.total_score = 0;
        self.results.clear();
        self.message = None;
        self.accumulator = 0.0;
        self.reload_level()
    }

    // === Queries ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn in_flight(&self) -> bool {
        self.phase == GamePhase::InFlight
    }

    pub fn game_over(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn total_score(&self) -> u64 {
        self.total_score
    }

    pub fn bird_count(&self) -> u32 {
        self.bird_count
    }

    pub fn birds_left(&self) -> u32 {
        self.settings.max_birds.saturating_sub(self.bird_count)
    }

    pub fn remaining_pigs(&self) -> usize {
        self.remaining_pigs
    }

    pub fn level_index(&self) -> usize {
        self.levels.current_index()
    }

    pub fn selected(&self) -> BirdKind {
        self.selected
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn floor(&self) -> ShapeHandle {
        self.floor
    }

    pub fn birds(&self) -> &[Projectile] {
        &self.birds
    }

    pub fn world(&self) -> &[WorldObject] {
        &self.world
    }

    pub fn results(&self) -> &[LevelResult] {
        &self.results
    }

    pub fn active_bird(&self) -> Option<&Projectile> {
        self.active_index().map(|i| &self.birds[i])
    }

    fn active_index(&self) -> Option<usize> {
        let id = self.active?;
        self.birds.iter().position(|b| b.id == id)
    }

    pub fn drag_line(&self) -> Option<(Point2D, Point2D)> {
        self.drag.map(|d| (d.start, d.end))
    }

    /// Take every event since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Snapshot for the renderer
    pub fn frame(&self) -> Frame {
        let sprites = self
            .world
            .iter()
            .map(SpriteView::from)
            .chain(self.birds.iter().map(SpriteView::from))
            .collect();

        Frame {
            level: self.levels.current_index() + 1,
            level_name: self.levels.current().name.clone(),
            phase: self.phase,
            score: self.score,
            total_score: self.total_score,
            birds_left: self.birds_left(),
            selected: self.selected,
            game_over: self.game_over(),
            message: self.message.clone(),
            drag_line: self.drag_line(),
            sprites,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::ContactEvent;
    use crate::sim::level::LevelDefinition;

    const DT: f32 = 1.0 / 60.0;

    fn level(name: &str, columns: &[(f32, f32)], pigs: &[(f32, f32)]) -> LevelDefinition {
        LevelDefinition {
            name: name.into(),
            columns: columns.iter().map(|&(x, y)| Point2D::new(x, y)).collect(),
            pigs: pigs.iter().map(|&(x, y)| Point2D::new(x, y)).collect(),
            statics: Vec::new(),
        }
    }

    fn session_with(levels: Vec<LevelDefinition>, settings: Settings) -> Session {
        Session::new(settings, LevelRegistry::new(levels).unwrap()).unwrap()
    }

    fn two_levels() -> Vec<LevelDefinition> {
        vec![
            level("One", &[(600.0, 50.0)], &[(900.0, 100.0)]),
            level("Two", &[(500.0, 50.0)], &[(800.0, 100.0)]),
        ]
    }

    /// Queue a contact as if the solver had reported it this step
    fn hit(session: &mut Session, a: ShapeHandle, b: ShapeHandle, magnitude: f32) {
        session.space.push_contact(ContactEvent {
            shapes: (a, b),
            total_impulse: Vec2::new(magnitude, 0.0),
        });
    }

    fn shape_of(session: &Session, kind: WorldKind, nth: usize) -> ShapeHandle {
        session
            .world
            .iter()
            .filter(|o| o.kind == kind)
            .nth(nth)
            .map(|o| o.shape)
            .unwrap()
    }

    /// Launch straight off the left edge so the watchdog ends the turn on
    /// the next tick
    fn waste_bird(session: &mut Session) {
        session.on_press(-50.0, 300.0).unwrap();
        session.on_release(-50.0, 300.0).unwrap();
        assert!(session.in_flight());
        session.on_tick(DT).unwrap();
    }

    #[test]
    fn test_new_session_loads_first_level() {
        let mut session = Session::with_defaults().unwrap();
        assert_eq!(session.phase(), GamePhase::Aiming);
        assert_eq!(session.level_index(), 0);
        assert_eq!(session.remaining_pigs(), 1);
        assert_eq!(session.world().len(), 3);
        assert_eq!(session.birds_left(), 3);
        assert_eq!(
            session.drain_events(),
            vec![GameEvent::LevelLoaded { level: 0, pigs: 1 }]
        );
    }

    #[test]
    fn test_drag_release_launches() {
        let mut session = Session::with_defaults().unwrap();
        session.on_press(200.0, 200.0).unwrap();
        session.on_drag(150.0, 180.0);
        assert_eq!(
            session.drag_line(),
            Some((Point2D::new(200.0, 200.0), Point2D::new(150.0, 180.0)))
        );
        let id = session.on_release(150.0, 180.0).unwrap().expect("launched");

        assert_eq!(session.phase(), GamePhase::InFlight);
        assert_eq!(session.bird_count(), 1);
        assert_eq!(session.active_bird().map(|b| b.id), Some(id));
        assert!(session.drag_line().is_none());

        let v = session.active_bird().unwrap().velocity(session.space()).unwrap();
        // Pulled down-left, so it flies up-right
        assert!(v.x > 0.0 && v.y > 0.0);

        // A second release while in flight does nothing
        assert_eq!(session.on_release(150.0, 180.0).unwrap(), None);
        assert_eq!(session.bird_count(), 1);
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut session = Session::with_defaults().unwrap();
        assert_eq!(session.on_release(100.0, 100.0).unwrap(), None);
        assert_eq!(session.bird_count(), 0);
        assert_eq!(session.phase(), GamePhase::Aiming);
    }

    #[test]
    fn test_press_in_flight_splits_once() {
        let mut session = Session::with_defaults().unwrap();
        session.on_key_release('b');
        assert_eq!(session.selected(), BirdKind::Splitting);

        session.on_press(200.0, 200.0).unwrap();
        session.on_drag(120.0, 150.0);
        session.on_release(120.0, 150.0).unwrap();
        session.drain_events();

        session.on_press(300.0, 300.0).unwrap();
        assert_eq!(session.birds().len(), 3);
        assert!(session.active_bird().unwrap().has_split());
        assert_eq!(
            session.drain_events(),
            vec![GameEvent::AbilityTriggered {
                bird: BirdKind::Splitting,
                spawned: 2
            }]
        );

        // Second click: no more children, no drag started
        session.on_press(300.0, 300.0).unwrap();
        assert_eq!(session.birds().len(), 3);
        assert!(session.drag_line().is_none());
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_two_pig_kills_leave_one() {
        let levels = vec![level(
            "Three Pigs",
            &[],
            &[(700.0, 100.0), (800.0, 100.0), (900.0, 100.0)],
        )];
        let mut session = session_with(levels, Settings::default());
        assert_eq!(session.remaining_pigs(), 3);

        let floor = session.floor();
        for nth in 0..2 {
            let pig = shape_of(&session, WorldKind::Pig, nth);
            hit(&mut session, pig, floor, 1500.0);
        }
        session.on_tick(DT).unwrap();

        assert_eq!(session.remaining_pigs(), 1);
        assert_eq!(session.score(), 200);
        assert_eq!(session.world().len(), 1);
    }

    #[test]
    fn test_weak_hits_change_nothing() {
        let mut session = session_with(two_levels(), Settings::default());
        let floor = session.floor();
        let pig = shape_of(&session, WorldKind::Pig, 0);
        hit(&mut session, pig, floor, 99.0);
        hit(&mut session, pig, floor, 1200.0);
        session.on_tick(DT).unwrap();
        assert_eq!(session.remaining_pigs(), 1);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_budget_spent_resets_level() {
        let mut session = session_with(two_levels(), Settings::default());
        let floor = session.floor();
        let column = shape_of(&session, WorldKind::Column, 0);
        hit(&mut session, column, floor, 1500.0);
        session.on_tick(DT).unwrap();
        assert_eq!(session.score(), 35);
        assert_eq!(session.world().len(), 1);
        session.drain_events();

        waste_bird(&mut session);
        waste_bird(&mut session);
        assert_eq!(session.bird_count(), 2);
        waste_bird(&mut session);

        assert_eq!(session.total_score(), 35);
        assert_eq!(session.score(), 0);
        assert_eq!(session.bird_count(), 0);
        assert_eq!(session.level_index(), 0);
        assert_eq!(session.phase(), GamePhase::Aiming);
        assert_eq!(session.world().len(), 2);
        assert!(session.birds().is_empty());
        assert_eq!(
            session.results(),
            &[LevelResult {
                level: 0,
                score: 35,
                birds_used: 3,
                cleared: false
            }]
        );
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::LevelFailed { level: 0, score: 35 }));
        assert!(events.contains(&GameEvent::TurnEnded(TurnEnd::OutOfBounds)));
    }

    #[test]
    fn test_last_bird_in_flight_does_not_fail() {
        let mut session = session_with(two_levels(), Settings::default());
        waste_bird(&mut session);
        waste_bird(&mut session);
        session.drain_events();

        session.on_press(300.0, 300.0).unwrap();
        session.on_drag(250.0, 250.0);
        session.on_release(250.0, 250.0).unwrap();
        session.on_tick(DT).unwrap();

        // Budget is spent and the pig stands, but the last bird still flies
        assert_eq!(session.phase(), GamePhase::InFlight);
        assert_eq!(session.bird_count(), 3);
        assert_eq!(session.level_index(), 0);
        assert_eq!(session.remaining_pigs(), 1);
        assert!(session.results().is_empty());
        assert!(
            !session
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::LevelFailed { .. }))
        );
    }

    #[test]
    fn test_watchdog_vertical_bounds() {
        for y in [650.0, -20.0] {
            let settings = Settings {
                gravity: 0.0,
                ..Settings::default()
            };
            let mut session = session_with(two_levels(), settings);
            session.on_press(300.0, y).unwrap();
            session.on_release(300.0, y).unwrap();
            assert!(session.in_flight());
            session.on_tick(DT).unwrap();

            assert!(!session.in_flight(), "bird at y = {y} kept flying");
            assert!(
                session
                    .drain_events()
                    .contains(&GameEvent::TurnEnded(TurnEnd::OutOfBounds))
            );
        }
    }

    #[test]
    fn test_clear_waits_for_budget_then_advances() {
        let mut session = session_with(two_levels(), Settings::default());
        let floor = session.floor();
        let pig = shape_of(&session, WorldKind::Pig, 0);
        hit(&mut session, pig, floor, 2000.0);
        session.on_tick(DT).unwrap();

        // All pigs down but budget unused: the level stays
        assert_eq!(session.remaining_pigs(), 0);
        assert_eq!(session.level_index(), 0);

        waste_bird(&mut session);
        waste_bird(&mut session);
        assert_eq!(session.level_index(), 0);
        waste_bird(&mut session);

        assert_eq!(session.level_index(), 1);
        assert_eq!(session.total_score(), 100);
        assert_eq!(session.score(), 0);
        assert_eq!(session.remaining_pigs(), 1);
        assert!(session.results()[0].cleared);
    }

    #[test]
    fn test_clear_advances_immediately_when_configured() {
        let settings = Settings {
            require_full_budget_to_advance: false,
            ..Settings::default()
        };
        let mut session = session_with(two_levels(), settings);
        let floor = session.floor();
        let pig = shape_of(&session, WorldKind::Pig, 0);
        hit(&mut session, pig, floor, 2000.0);
        session.on_tick(DT).unwrap();

        assert_eq!(session.level_index(), 1);
        assert_eq!(session.total_score(), 100);
    }

    #[test]
    fn test_clearing_last_level_completes_game() {
        let settings = Settings {
            require_full_budget_to_advance: false,
            ..Settings::default()
        };
        let mut session = session_with(vec![level("Only", &[], &[(900.0, 100.0)])], settings);
        let floor = session.floor();
        let pig = shape_of(&session, WorldKind::Pig, 0);
        hit(&mut session, pig, floor, 2000.0);
        session.on_tick(DT).unwrap();

        assert_eq!(session.phase(), GamePhase::GameComplete);
        assert!(session.game_over());
        assert_eq!(session.message(), Some("Game complete! Total score: 100"));

        // Terminal: no more ticks or launches
        let ticks = session.time_ticks();
        session.on_tick(DT).unwrap();
        assert_eq!(session.time_ticks(), ticks);
        session.on_press(100.0, 100.0).unwrap();
        assert_eq!(session.on_release(100.0, 100.0).unwrap(), None);
    }

    #[test]
    fn test_failing_last_level_ends_game() {
        let mut session = session_with(vec![level("Only", &[], &[(900.0, 100.0)])], Settings::default());
        for _ in 0..3 {
            waste_bird(&mut session);
        }
        assert_eq!(session.phase(), GamePhase::GameOverFailed);
        assert!(session.message().unwrap().starts_with("Game over!"));
        assert!(session.drain_events().contains(&GameEvent::GameOver { total_score: 0 }));
    }

    #[test]
    fn test_settled_bird_ends_turn() {
        let settings = Settings {
            gravity: 0.0,
            ..Settings::default()
        };
        let mut session = session_with(two_levels(), settings);
        session.on_press(300.0, 300.0).unwrap();
        session.on_release(300.0, 300.0).unwrap();
        session.on_tick(DT).unwrap();

        assert_eq!(session.phase(), GamePhase::Aiming);
        assert!(session.active_bird().is_none());
        assert!(session.drain_events().contains(&GameEvent::TurnEnded(TurnEnd::Settled)));
        // The settled bird stays on the field
        assert_eq!(session.birds().len(), 1);
    }

    #[test]
    fn test_active_bird_contact_ends_turn() {
        let mut session = session_with(two_levels(), Settings::default());
        session.on_press(300.0, 300.0).unwrap();
        session.on_drag(250.0, 250.0);
        session.on_release(250.0, 250.0).unwrap();
        let bird_shape = session.active_bird().unwrap().shape;
        let floor = session.floor();
        hit(&mut session, bird_shape, floor, 500.0);
        session.on_tick(DT).unwrap();

        assert!(!session.in_flight());
        assert!(session.drain_events().contains(&GameEvent::TurnEnded(TurnEnd::Contact)));
    }

    #[test]
    fn test_every_turn_ends_eventually() {
        let mut session = Session::with_defaults().unwrap();
        session.on_press(200.0, 150.0).unwrap();
        session.on_drag(120.0, 90.0);
        session.on_release(120.0, 90.0).unwrap();

        let mut ticks = 0;
        while session.in_flight() && ticks < 1200 {
            session.on_tick(DT).unwrap();
            ticks += 1;
        }
        assert!(!session.in_flight());
    }

    #[test]
    fn test_advance_frame_substeps() {
        let settings = Settings {
            max_substeps: 2,
            ..Settings::default()
        };
        let mut session = session_with(two_levels(), settings);
        assert_eq!(session.advance_frame(0.01).unwrap(), 0);
        assert_eq!(session.advance_frame(0.01).unwrap(), 1);
        assert_eq!(session.time_ticks(), 1);
        assert_eq!(session.advance_frame(0.09).unwrap(), 2);
    }

    #[test]
    fn test_frame_snapshot() {
        let mut session = Session::with_defaults().unwrap();
        session.on_key_release('G');
        session.on_press(200.0, 200.0).unwrap();
        session.on_drag(180.0, 190.0);

        let frame = session.frame();
        assert_eq!(frame.level, 1);
        assert_eq!(frame.level_name, "Opening Shot");
        assert_eq!(frame.selected, BirdKind::Growing);
        assert_eq!(frame.sprites.len(), 3);
        assert!(frame.drag_line.is_some());
        assert!(!frame.game_over);

        session.on_release(180.0, 190.0).unwrap();
        let frame = session.frame();
        assert_eq!(frame.sprites.len(), 4);
        assert_eq!(frame.birds_left, 2);
        assert!(serde_json::to_string(&frame).is_ok());
    }

    #[test]
    fn test_restart_resets_progress() {
        let mut session = session_with(two_levels(), Settings::default());
        let column = shape_of(&session, WorldKind::Column, 0);
        let floor = session.floor();
        hit(&mut session, column, floor, 1500.0);
        for _ in 0..3 {
            waste_bird(&mut session);
        }
        assert_eq!(session.total_score(), 35);

        session.restart().unwrap();
        assert_eq!(session.total_score(), 0);
        assert_eq!(session.level_index(), 0);
        assert!(session.results().is_empty());
        assert_eq!(session.phase(), GamePhase::Aiming);
    }
}
