//! Headless demo input driver
//!
//! Feeds a `Session` the press, drag, release and key calls a presentation
//! layer would make, with pull and angle drawn from a seeded RNG. It has no
//! view of the level. Same seed, same input stream.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::projectile::BirdKind;
use super::session::{GamePhase, Session};
use crate::geometry::Point2D;
use crate::physics;

/// Where every drag starts
const SLING: Point2D = Point2D { x: 200.0, y: 250.0 };

/// Seeded source of scripted input for headless runs
#[derive(Debug, Clone)]
pub struct Autoplayer {
    rng: Pcg32,
    /// Ticks left before the in-flight ability fires
    ability_delay: Option<u32>,
    next_kind: usize,
}

impl Autoplayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            ability_delay: None,
            next_kind: 0,
        }
    }

    /// Make this tick's input, if any
    pub fn act(&mut self, session: &mut Session) -> physics::Result<()> {
        match session.phase() {
            GamePhase::Aiming => self.shoot(session),
            GamePhase::InFlight => {
                match self.ability_delay {
                    Some(0) => {
                        session.on_press(SLING.x, SLING.y)?;
                        self.ability_delay = None;
                    }
                    Some(n) => self.ability_delay = Some(n - 1),
                    None => {}
                }
                Ok(())
            }
            GamePhase::GameComplete | GamePhase::GameOverFailed => Ok(()),
        }
    }

    /// Cycle the variant, pull back down-left and let go
    fn shoot(&mut self, session: &mut Session) -> physics::Result<()> {
        let kind = BirdKind::ALL[self.next_kind % BirdKind::ALL.len()];
        self.next_kind += 1;
        session.on_key_release(kind.key());

        let pull = self.rng.random_range(80.0..150.0f32);
        let angle = self.rng.random_range(20.0..60.0f32).to_radians();
        let end = Point2D::new(SLING.x - pull * angle.cos(), SLING.y - pull * angle.sin());

        session.on_press(SLING.x, SLING.y)?;
        session.on_drag(end.x, end.y);
        if session.on_release(end.x, end.y)?.is_some() {
            self.ability_delay = Some(self.rng.random_range(15..45));
            log::debug!("Autoplayer shot {} (pull {:.0}, {:.0} deg)", kind.as_str(), pull, angle.to_degrees());
        }
        Ok(())
    }
}
