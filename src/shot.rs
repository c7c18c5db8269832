use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use tracing::debug;

use crate::detection::Detection;
use crate::history::{BallHistory, HoopHistory};
use crate::score::{self, ScoreConfig};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ShotConfig {
    /// Half-width of the zone above the hoop, in hoop widths.
    pub up_zone_width: f32,
    /// Height of the zone above the hoop, in hoop heights.
    pub up_zone_height: f32,
    /// The ball is down once below the hoop center by this many hoop heights...
    pub down_factor: f32,
    /// ...plus this many pixels.
    pub down_buffer: f32,
    /// Ball-to-hoop distance (pixels) at which an attempt counts three points.
    /// Depends on the video resolution.
    pub three_point_distance: f32,
}

impl Default for ShotConfig {
    fn default() -> Self {
        Self {
            up_zone_width: 2.5,
            up_zone_height: 2.2,
            down_factor: 0.5,
            down_buffer: 5.0,
            three_point_distance: 35.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Up,
    Down,
}

/// The single attempt a session can have open. The down frame is only ever
/// seen in the [`Resolution`] since going down resolves the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShotAttempt {
    pub phase: Phase,
    pub up_frame: Option<u64>,
    pub start_hoop_center: Option<na::Point2<f32>>,
}

impl ShotAttempt {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.phase != Phase::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub up_frame: u64,
    pub down_frame: u64,
    pub made: bool,
    pub points: u8,
    /// Distance between the final ball center and the hoop center at `up_frame`.
    pub distance: f32,
    pub ball: na::Point2<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotTransition {
    Opened { frame: u64 },
    Resolved(Resolution),
}

pub fn in_up_zone(ball: &Detection, hoop: &Detection, cfg: &ShotConfig) -> bool {
    let x1 = hoop.x - cfg.up_zone_width * hoop.w;
    let x2 = hoop.x + cfg.up_zone_width * hoop.w;
    let y1 = hoop.y - cfg.up_zone_height * hoop.h;
    let y2 = hoop.y;

    x1 < ball.x && ball.x < x2 && y1 < ball.y && ball.y < y2
}

pub fn below_hoop(ball: &Detection, hoop: &Detection, cfg: &ShotConfig) -> bool {
    ball.y > hoop.y + cfg.down_factor * hoop.h + cfg.down_buffer
}

/// Advances the attempt by one frame.
///
/// Resolution happens on the frame the ball goes down, so the returned
/// attempt is never left in `Phase::Down`.
pub fn step(
    attempt: &ShotAttempt,
    ball: &BallHistory,
    hoop: &HoopHistory,
    frame: u64,
    cfg: &ShotConfig,
    score_cfg: &ScoreConfig,
) -> (ShotAttempt, Option<ShotTransition>) {
    let (Some(b), Some(h)) = (ball.latest(), hoop.latest()) else {
        return (*attempt, None);
    };

    match attempt.phase {
        Phase::Idle => {
            if !in_up_zone(b, h, cfg) {
                return (*attempt, None);
            }

            debug!(frame, "ball entered zone above hoop");

            let opened = ShotAttempt {
                phase: Phase::Up,
                up_frame: Some(frame),
                start_hoop_center: Some(h.center()),
            };

            (opened, Some(ShotTransition::Opened { frame }))
        }

        Phase::Up | Phase::Down => {
            if attempt.phase == Phase::Up && !below_hoop(b, h, cfg) {
                return (*attempt, None);
            }

            let start = attempt.start_hoop_center.unwrap_or_else(|| h.center());
            let distance = na::distance(&b.center(), &start);
            let points = if distance >= cfg.three_point_distance { 3 } else { 2 };
            let made = score::is_make(ball, hoop, score_cfg);

            debug!(frame, distance, points, made, "attempt resolved");

            let resolution = Resolution {
                up_frame: attempt.up_frame.unwrap_or(frame),
                down_frame: frame,
                made,
                points,
                distance,
                ball: b.center(),
            };

            (ShotAttempt::default(), Some(ShotTransition::Resolved(resolution)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;

    fn hoop_at(cx: f32, cy: f32) -> HoopHistory {
        let mut h = History::bounded(25);
        h.push(Detection::new(cx, cy, 40.0, 30.0, 0.9, 0));
        h
    }

    fn run(
        path: &[(f32, f32)],
        hoop: &HoopHistory,
    ) -> Vec<(u64, ShotAttempt, Option<ShotTransition>)> {
        let (cfg, score_cfg) = (ShotConfig::default(), ScoreConfig::default());
        let mut ball = History::unbounded();
        let mut attempt = ShotAttempt::default();
        let mut out = Vec::new();

        for (i, &(x, y)) in path.iter().enumerate() {
            let frame = i as u64;
            ball.push(Detection::new(x, y, 20.0, 20.0, 0.9, frame));

            let (next, transition) = step(&attempt, &ball, hoop, frame, &cfg, &score_cfg);
            attempt = next;
            out.push((frame, attempt, transition));
        }

        out
    }

    #[test]
    fn up_then_down_resolves_make() {
        let hoop = hoop_at(320.0, 200.0);
        let steps = run(
            &[
                (300.0, 150.0),
                (304.0, 166.0),
                (308.0, 182.0),
                (312.0, 198.0),
                (316.0, 214.0),
                (320.0, 230.0),
            ],
            &hoop,
        );

        assert_eq!(steps[0].2, Some(ShotTransition::Opened { frame: 0 }));
        assert_eq!(steps[0].1.phase, Phase::Up);
        assert_eq!(steps[0].1.start_hoop_center, Some(na::Point2::new(320.0, 200.0)));

        for s in &steps[1..5] {
            assert_eq!(s.2, None);
            assert_eq!(s.1.phase, Phase::Up);
        }

        match steps[5].2 {
            Some(ShotTransition::Resolved(r)) => {
                assert!(r.made);
                assert_eq!(r.up_frame, 0);
                assert_eq!(r.down_frame, 5);
                assert_eq!(r.distance, 30.0);
                assert_eq!(r.points, 2);
            }
            other => panic!("expected resolution, got {:?}", other),
        }
        assert_eq!(steps[5].1, ShotAttempt::default());
    }

    #[test]
    fn long_distance_counts_three() {
        let hoop = hoop_at(320.0, 200.0);
        let steps = run(&[(250.0, 150.0), (250.0, 170.0), (250.0, 190.0), (250.0, 210.0), (250.0, 230.0)], &hoop);

        match steps[4].2 {
            Some(ShotTransition::Resolved(r)) => {
                assert!(!r.made);
                assert!(r.distance >= 35.0);
                assert_eq!(r.points, 3);
            }
            other => panic!("expected resolution, got {:?}", other),
        }
    }

    #[test]
    fn ball_below_without_up_does_nothing() {
        let hoop = hoop_at(320.0, 200.0);
        let steps = run(&[(320.0, 260.0), (320.0, 280.0), (320.0, 300.0)], &hoop);

        assert!(steps.iter().all(|s| s.2.is_none() && s.1.phase == Phase::Idle));
    }

    #[test]
    fn down_never_precedes_up() {
        let hoop = hoop_at(320.0, 200.0);
        let path: Vec<(f32, f32)> = (0..120)
            .map(|i| {
                let t = i as f32 * 0.2;
                (320.0 + 60.0 * t.sin(), 180.0 + 70.0 * (t * 0.7).cos())
            })
            .collect();

        let mut open = false;
        for (_, attempt, transition) in run(&path, &hoop) {
            match transition {
                Some(ShotTransition::Opened { .. }) => {
                    assert!(!open);
                    open = true;
                }
                Some(ShotTransition::Resolved(r)) => {
                    assert!(open);
                    assert!(r.up_frame < r.down_frame);
                    assert_eq!(attempt.phase, Phase::Idle);
                    open = false;
                }
                None => assert_eq!(attempt.is_open(), open),
            }

            assert_ne!(attempt.phase, Phase::Down);
        }
    }

    #[test]
    fn needs_ball_and_hoop() {
        let empty = History::unbounded();
        let (attempt, t) = step(
            &ShotAttempt::default(),
            &empty,
            &hoop_at(320.0, 200.0),
            0,
            &ShotConfig::default(),
            &ScoreConfig::default(),
        );

        assert_eq!(t, None);
        assert_eq!(attempt, ShotAttempt::default());
    }
}
