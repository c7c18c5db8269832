//! Make/miss decision for a resolved attempt.
//!
//! Two signals are OR-ed: the smoothed ball path crossing the rim circle
//! while still moving down, and a parabola through the recent ball centers
//! passing through the rim opening.

use nalgebra as na;
use serde_derive::Deserialize;
use tracing::debug;

use crate::detection::Detection;
use crate::error::Error;
use crate::history::{BallHistory, HoopHistory};
use crate::math::{fit_parabola, linspace, trailing_mean};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScoreConfig {
    pub crossing_points: usize,
    pub smoothing_window: usize,
    /// Rim circle radius as a fraction of the hoop width.
    pub rim_radius_factor: f32,
    pub fit_points: usize,
    pub fit_samples: usize,
    /// Half-width of the sampled rim span, as a fraction of the hoop width.
    pub rim_span_factor: f32,
    pub coarse_points: usize,
    pub min_trajectory_points: usize,
    pub fit_confidence: f32,
    pub coarse_confidence: f32,
    pub make_threshold: f32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            crossing_points: 15,
            smoothing_window: 3,
            rim_radius_factor: 0.6,
            fit_points: 10,
            fit_samples: 5,
            rim_span_factor: 0.4,
            coarse_points: 5,
            min_trajectory_points: 5,
            fit_confidence: 0.8,
            coarse_confidence: 0.6,
            make_threshold: 0.75,
        }
    }
}

/// Rim geometry taken from the authoritative (newest) hoop detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rim {
    pub center: na::Point2<f32>,
    pub width: f32,
    pub height: f32,
}

impl Rim {
    pub fn from_hoop(hoop: &Detection) -> Self {
        Self {
            center: hoop.center(),
            width: hoop.w,
            height: hoop.h,
        }
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.center.y - self.height / 2.0
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.center.y + self.height / 4.0
    }
}

fn centers(dets: &[Detection]) -> Vec<na::Point2<f32>> {
    dets.iter().map(|d| d.center()).collect()
}

/// Smoothed path enters the rim circle, has points above and below it and
/// keeps moving down (or stalls) at least once.
pub fn rim_crossing(ball: &BallHistory, rim: &Rim, cfg: &ScoreConfig) -> bool {
    let path = trailing_mean(
        &centers(&ball.recent(cfg.crossing_points)),
        cfg.smoothing_window,
    );
    let radius = rim.width * cfg.rim_radius_factor;

    let in_rim = path.iter().any(|p| na::distance(p, &rim.center) < radius);
    let above = path.iter().any(|p| p.y < rim.center.y - radius);
    let below = path.iter().any(|p| p.y > rim.center.y + radius);

    if !(in_rim && above && below) {
        return false;
    }

    path.windows(2).any(|w| w[1].y - w[0].y >= 0.0)
}

fn fitted_confidence(points: &[na::Point2<f32>], rim: &Rim, cfg: &ScoreConfig) -> Result<f32, Error> {
    let parabola = fit_parabola(points)?;

    let half = (rim.width * cfg.rim_span_factor) as f64;
    let cx = rim.center.x as f64;
    let (top, bottom) = (rim.top() as f64, rim.bottom() as f64);

    let hits = linspace(cx - half, cx + half, cfg.fit_samples)
        .map(|x| parabola.eval(x))
        .any(|y| top < y && y < bottom);

    Ok(if hits { cfg.fit_confidence } else { 0.0 })
}

fn coarse_confidence(ball: &BallHistory, rim: &Rim, cfg: &ScoreConfig) -> f32 {
    let recent = ball.recent(cfg.coarse_points);

    let above = recent.iter().any(|d| d.y < rim.top());
    let below = recent.iter().any(|d| d.y > rim.bottom());

    if above && below {
        cfg.coarse_confidence
    } else {
        0.0
    }
}

/// Confidence in [0, 1] that the ball trajectory passes through the rim.
pub fn trajectory_confidence(ball: &BallHistory, rim: &Rim, cfg: &ScoreConfig) -> f32 {
    if ball.len() < cfg.min_trajectory_points {
        return 0.0;
    }

    let points = centers(&ball.recent(cfg.fit_points));

    match fitted_confidence(&points, rim, cfg) {
        Ok(conf) if conf > 0.0 => return conf,
        Ok(_) => {}
        Err(err) => debug!(%err, "falling back to coarse trajectory check"),
    }

    coarse_confidence(ball, rim, cfg)
}

/// Evaluates the attempt against the newest hoop detection.
pub fn classify(ball: &BallHistory, hoop: &HoopHistory, cfg: &ScoreConfig) -> Result<bool, Error> {
    let hoop = hoop
        .latest()
        .ok_or(Error::InsufficientData("no hoop detection"))?;

    if ball.len() < 2 {
        return Err(Error::InsufficientData("fewer than two ball positions"));
    }

    let rim = Rim::from_hoop(hoop);

    Ok(rim_crossing(ball, &rim, cfg) || trajectory_confidence(ball, &rim, cfg) >= cfg.make_threshold)
}

/// `classify`, with missing data counted as a miss.
pub fn is_make(ball: &BallHistory, hoop: &HoopHistory, cfg: &ScoreConfig) -> bool {
    match classify(ball, hoop, cfg) {
        Ok(made) => made,
        Err(err) => {
            debug!(%err, "attempt counted as miss");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;

    fn hoop() -> HoopHistory {
        let mut h = History::bounded(25);
        h.push(Detection::new(320.0, 200.0, 40.0, 30.0, 0.9, 0));
        h
    }

    fn ball_path(points: &[(f32, f32)]) -> BallHistory {
        let mut h = History::unbounded();
        for (i, &(x, y)) in points.iter().enumerate() {
            h.push(Detection::new(x, y, 20.0, 20.0, 0.9, i as u64));
        }
        h
    }

    #[test]
    fn straight_drop_through_rim_is_make() {
        let cfg = ScoreConfig::default();
        let ball = ball_path(&[
            (320.0, 140.0),
            (320.0, 160.0),
            (320.0, 180.0),
            (320.0, 200.0),
            (320.0, 220.0),
            (320.0, 240.0),
            (320.0, 260.0),
        ]);
        let rim = Rim::from_hoop(hoop().latest().unwrap());

        assert!(rim_crossing(&ball, &rim, &cfg));
        assert!(is_make(&ball, &hoop(), &cfg));
    }

    #[test]
    fn diagonal_entry_is_make_by_fit() {
        let cfg = ScoreConfig::default();
        let ball = ball_path(&[
            (300.0, 150.0),
            (304.0, 166.0),
            (308.0, 182.0),
            (312.0, 198.0),
            (316.0, 214.0),
            (320.0, 230.0),
        ]);
        let rim = Rim::from_hoop(hoop().latest().unwrap());

        // smoothed path never gets below y = 224
        assert!(!rim_crossing(&ball, &rim, &cfg));
        assert_eq!(trajectory_confidence(&ball, &rim, &cfg), 0.8);
        assert!(is_make(&ball, &hoop(), &cfg));
    }

    #[test]
    fn vertical_drop_beside_rim_is_miss() {
        let cfg = ScoreConfig::default();
        let ball = ball_path(&[
            (250.0, 150.0),
            (250.0, 170.0),
            (250.0, 190.0),
            (250.0, 210.0),
            (250.0, 230.0),
        ]);
        let rim = Rim::from_hoop(hoop().latest().unwrap());

        assert!(!rim_crossing(&ball, &rim, &cfg));
        // degenerate fit, coarse fallback sees the ball above and below
        assert_eq!(trajectory_confidence(&ball, &rim, &cfg), 0.6);
        assert!(!is_make(&ball, &hoop(), &cfg));
    }

    #[test]
    fn bounce_back_is_not_crossing() {
        let cfg = ScoreConfig::default();
        // rises through the rim from below and keeps rising
        let ball = ball_path(&[(320.0, 250.0), (320.0, 220.0), (320.0, 190.0), (320.0, 160.0), (320.0, 130.0)]);
        let rim = Rim::from_hoop(hoop().latest().unwrap());

        assert!(!rim_crossing(&ball, &rim, &cfg));
    }

    #[test]
    fn too_few_points_for_trajectory() {
        let cfg = ScoreConfig::default();
        let ball = ball_path(&[(300.0, 150.0), (310.0, 190.0), (320.0, 230.0)]);
        let rim = Rim::from_hoop(hoop().latest().unwrap());

        assert_eq!(trajectory_confidence(&ball, &rim, &cfg), 0.0);
    }

    #[test]
    fn missing_data_is_miss() {
        let cfg = ScoreConfig::default();
        let one = ball_path(&[(320.0, 200.0)]);

        assert!(matches!(
            classify(&one, &hoop(), &cfg),
            Err(Error::InsufficientData(_))
        ));
        assert!(!is_make(&one, &hoop(), &cfg));

        let ball = ball_path(&[(320.0, 140.0), (320.0, 240.0)]);
        assert!(!is_make(&ball, &History::unbounded(), &cfg));
    }
}
