use std::path::Path;

use serde_derive::Deserialize;

use crate::error::Error;
use crate::filter::FilterConfig;
use crate::foul::FoulConfig;
use crate::frame::GateConfig;
use crate::render::RenderConfig;
use crate::score::ScoreConfig;
use crate::shot::ShotConfig;
use crate::team::{TeamConfig, TeamSlot};
use crate::tracker::TrackerConfig;

/// Session configuration. Every section falls back to its defaults, so a
/// JSON file only needs the keys it overrides.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub match_id: u64,
    /// Display names of team A and team B.
    pub team_names: [String; 2],
    /// Used to turn frame indices into event timestamps.
    pub fps: f32,
    pub gate: GateConfig,
    pub filter: FilterConfig,
    pub team: TeamConfig,
    pub tracker: TrackerConfig,
    pub shot: ShotConfig,
    pub score: ScoreConfig,
    pub foul: FoulConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            match_id: 0,
            team_names: ["Team A".to_string(), "Team B".to_string()],
            fps: 30.0,
            gate: GateConfig::default(),
            filter: FilterConfig::default(),
            team: TeamConfig::default(),
            tracker: TrackerConfig::default(),
            shot: ShotConfig::default(),
            score: ScoreConfig::default(),
            foul: FoulConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Config {
    pub fn from_json_str(src: &str) -> Result<Self, Error> {
        let config: Config = serde_json::from_str(src)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let src = std::fs::read_to_string(path)?;
        Self::from_json_str(&src)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.fps > 0.0) {
            return Err(Error::Config(format!("fps must be positive, got {}", self.fps)));
        }

        if self.team.history == 0 {
            return Err(Error::Config("team color history must hold at least one sample".into()));
        }

        if self.filter.hoop_capacity == 0 {
            return Err(Error::Config("hoop history capacity must be positive".into()));
        }

        Ok(())
    }

    #[inline]
    pub fn team_name(&self, team: TeamSlot) -> &str {
        &self.team_names[team.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json_str(
            r#"{
                "match_id": 42,
                "team_names": ["Bulls", "Celtics"],
                "shot": { "three_point_distance": 120.0 },
                "tracker": { "max_missed_frames": null }
            }"#,
        )
        .unwrap();

        assert_eq!(config.match_id, 42);
        assert_eq!(config.team_name(TeamSlot::B), "Celtics");
        assert_eq!(config.shot.three_point_distance, 120.0);
        assert_eq!(config.shot.up_zone_width, 2.5);
        assert_eq!(config.tracker.max_missed_frames, None);
        assert_eq!(config.tracker.max_distance, 50.0);
        assert_eq!(config.filter, FilterConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_json_str(r#"{ "fps": 0.0 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{ "fps": "fast" }"#),
            Err(Error::Json(_))
        ));
    }
}
