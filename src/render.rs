//! Everything an external renderer needs to draw a frame. Nothing here draws.

use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::detection::Detection;
use crate::events::Event;
use crate::shot::Phase;
use crate::team::TeamSlot;
use crate::tracker::TrackedPlayer;

pub const MAKE_COLOR: [u8; 3] = [0, 255, 0];
pub const MISS_COLOR: [u8; 3] = [255, 0, 0];
pub const FOUL_COLOR: [u8; 3] = [255, 0, 0];

#[inline]
pub fn team_color(team: TeamSlot) -> [u8; 3] {
    match team {
        TeamSlot::A => [255, 140, 0],
        TeamSlot::B => [0, 0, 255],
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub shot_fade_frames: u32,
    pub foul_fade_frames: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shot_fade_frames: 20,
            foul_fade_frames: 30,
        }
    }
}

/// Banner that fades out over `total` frames.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Overlay {
    pub text: String,
    pub color: [u8; 3],
    pub remaining: u32,
    pub total: u32,
}

impl Overlay {
    pub fn new(text: impl Into<String>, color: [u8; 3], total: u32) -> Self {
        Self {
            text: text.into(),
            color,
            remaining: total,
            total,
        }
    }

    /// 1.0 on the first frame, falling linearly towards 0.
    #[inline]
    pub fn alpha(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.remaining as f32 / self.total as f32
        }
    }
}

#[derive(Debug, Clone)]
pub struct Overlays {
    config: RenderConfig,
    shot: Option<Overlay>,
    foul: Option<Overlay>,
}

impl Overlays {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            shot: None,
            foul: None,
        }
    }

    pub fn show_shot(&mut self, made: bool, points: u8) {
        self.shot = Some(if made {
            Overlay::new(format!("{} Points", points), MAKE_COLOR, self.config.shot_fade_frames)
        } else {
            Overlay::new("Miss", MISS_COLOR, self.config.shot_fade_frames)
        });
    }

    pub fn show_foul(&mut self, team_name: &str) {
        self.foul = Some(Overlay::new(
            format!("Foul by {}", team_name),
            FOUL_COLOR,
            self.config.foul_fade_frames,
        ));
    }

    #[inline]
    pub fn shot(&self) -> Option<&Overlay> {
        self.shot.as_ref()
    }

    #[inline]
    pub fn foul(&self) -> Option<&Overlay> {
        self.foul.as_ref()
    }

    /// Advances both banners by one frame.
    pub fn tick(&mut self) {
        for slot in [&mut self.shot, &mut self.foul] {
            if let Some(overlay) = slot {
                overlay.remaining = overlay.remaining.saturating_sub(1);
                if overlay.remaining == 0 {
                    *slot = None;
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.shot = None;
        self.foul = None;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Scoreboard {
    pub makes: u32,
    pub attempts: u32,
    pub points: [u32; 2],
}

impl Scoreboard {
    pub fn record(&mut self, made: bool, team: Option<TeamSlot>, points: u8) {
        self.attempts += 1;

        if made {
            self.makes += 1;

            if let Some(team) = team {
                self.points[team.index()] += points as u32;
            }
        }
    }

    #[inline]
    pub fn team_points(&self, team: TeamSlot) -> u32 {
        self.points[team.index()]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlayerBox {
    pub id: u32,
    pub team: TeamSlot,
    pub bbox: BBox<Ltrb>,
    pub center: [f32; 2],
    pub label: String,
    pub color: [u8; 3],
    /// Not matched this frame; the box is where the player was last seen.
    pub stale: bool,
}

impl PlayerBox {
    pub fn from_tracked(player: &TrackedPlayer, team_name: &str) -> Self {
        Self {
            id: player.id,
            team: player.team,
            bbox: player.bbox,
            center: [player.center.x, player.center.y],
            label: format!("{}_P{}", team_name, player.id),
            color: team_color(player.team),
            stale: player.missed > 0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub ball: Option<Detection>,
    pub hoop: Option<Detection>,
    pub players: Vec<PlayerBox>,
    pub phase: Phase,
    /// Point value of the last resolved attempt.
    pub shot_type: Option<u8>,
    pub shot_overlay: Option<Overlay>,
    pub foul_overlay: Option<Overlay>,
    pub scoreboard: Scoreboard,
    /// Events emitted while processing this frame.
    pub events: Vec<Event>,
}

impl FrameReport {
    pub fn shot_type_label(&self) -> Option<&'static str> {
        match self.shot_type? {
            3 => Some("3PT"),
            _ => Some("2PT"),
        }
    }
}
