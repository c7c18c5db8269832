use serde_derive::Deserialize;
use tracing::info;

use crate::detection::PlayerObservation;
use crate::team::{TeamClassifier, TeamSlot};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FoulConfig {
    /// Minimum number of frames between two reported fouls.
    pub cooldown_frames: u64,
    /// A player counts as grounded when their box top is at or below the other
    /// player's top plus this fraction of the other player's height.
    pub grounded_factor: f32,
}

impl Default for FoulConfig {
    fn default() -> Self {
        Self {
            cooldown_frames: 30,
            grounded_factor: 0.55,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Foul {
    pub frame: u64,
    /// Team blamed: the opposite of the grounded player's team.
    pub team: TeamSlot,
    /// Index of the grounded player in the input slice.
    pub grounded: usize,
    /// Index of the player standing over them.
    pub standing: usize,
}

#[derive(Debug, Clone)]
pub struct FoulDetector {
    config: FoulConfig,
    last_foul_frame: Option<u64>,
}

impl FoulDetector {
    pub fn new(config: FoulConfig) -> Self {
        Self {
            config,
            last_foul_frame: None,
        }
    }

    #[inline]
    pub fn last_foul_frame(&self) -> Option<u64> {
        self.last_foul_frame
    }

    /// Forgets a foul that lies after `frame` (backward seek).
    pub fn rewind(&mut self, frame: u64) {
        if self.last_foul_frame.map_or(false, |last| last > frame) {
            self.last_foul_frame = None;
        }
    }

    fn cooling_down(&self, frame: u64) -> bool {
        match self.last_foul_frame {
            Some(last) => frame.saturating_sub(last) < self.config.cooldown_frames,
            None => false,
        }
    }

    /// Reports at most one foul per frame: the first grounded/standing pair
    /// whose grounded player can be attributed to a team.
    pub fn check(
        &mut self,
        frame: u64,
        players: &[PlayerObservation],
        teams: &TeamClassifier,
    ) -> Option<Foul> {
        if players.len() < 2 || self.cooling_down(frame) {
            return None;
        }

        for (ai, a) in players.iter().enumerate() {
            for (bi, b) in players.iter().enumerate() {
                if ai == bi {
                    continue;
                }

                let threshold = b.bbox.top() + self.config.grounded_factor * b.bbox.height();
                if a.bbox.top() < threshold {
                    continue;
                }

                let da = teams.model(TeamSlot::A).distance(&a.hsv);
                let db = teams.model(TeamSlot::B).distance(&a.hsv);

                let team = match (da, db) {
                    (None, None) => continue,
                    (Some(da), Some(db)) if da < db => TeamSlot::B,
                    (Some(_), None) => TeamSlot::B,
                    _ => TeamSlot::A,
                };

                info!(frame, ?team, grounded = ai, standing = bi, "foul detected");
                self.last_foul_frame = Some(frame);

                return Some(Foul {
                    frame,
                    team,
                    grounded: ai,
                    standing: bi,
                });
            }
        }

        None
    }
}
