//! Motion-continuity cleanup for ball and hoop histories.
//!
//! Both cleaners look only at the two newest entries, so they are meant to
//! run right after every append. Run that way a history never holds a pair
//! of consecutive entries that fails the rule, which makes a second pass a
//! no-op.

use serde_derive::Deserialize;
use tracing::debug;

use crate::detection::Detection;
use crate::history::{BallHistory, HoopHistory, History};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct OutlierRule {
    /// Max plausible displacement, as a multiple of the older box diagonal.
    pub jump_factor: f32,
    /// Jumps are only rejected when the entries are fewer frames apart than this.
    pub max_frame_gap: u64,
    /// Max ratio between the long and the short side of the box.
    pub aspect_limit: f32,
}

impl OutlierRule {
    pub const BALL: OutlierRule = OutlierRule {
        jump_factor: 4.0,
        max_frame_gap: 5,
        aspect_limit: 1.4,
    };

    pub const HOOP: OutlierRule = OutlierRule {
        jump_factor: 0.5,
        max_frame_gap: 5,
        aspect_limit: 1.3,
    };
}

impl Default for OutlierRule {
    fn default() -> Self {
        Self::BALL
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub ball: OutlierRule,
    pub hoop: OutlierRule,
    pub ball_max_age: u64,
    pub hoop_capacity: usize,
    pub hoop_max_age: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            ball: OutlierRule::BALL,
            hoop: OutlierRule::HOOP,
            ball_max_age: 30,
            hoop_capacity: 25,
            hoop_max_age: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    Jump { dist: f32, max_dist: f32 },
    Aspect { w: f32, h: f32 },
}

/// Decides whether `next` may follow `prev` in a history. The first entry
/// of a history is always accepted.
pub fn check(prev: Option<&Detection>, next: &Detection, rule: &OutlierRule) -> Result<(), Rejection> {
    if let Some(prev) = prev {
        let dist = prev.distance(next);
        let max_dist = rule.jump_factor * prev.diagonal();
        let gap = next.frame.saturating_sub(prev.frame);

        if dist > max_dist && gap < rule.max_frame_gap {
            return Err(Rejection::Jump { dist, max_dist });
        }

        if !next.is_squarish(rule.aspect_limit) {
            return Err(Rejection::Aspect { w: next.w, h: next.h });
        }
    }

    Ok(())
}

fn reject_newest(history: &mut History, rule: &OutlierRule) -> usize {
    let verdict = match history.latest() {
        Some(latest) => check(history.previous(), latest, rule),
        None => return 0,
    };

    match verdict {
        Ok(()) => 0,
        Err(reason) => {
            debug!(?reason, "dropping newest detection");
            history.pop_latest();
            1
        }
    }
}

/// Drops entries newer than `frame` (left behind by a backward seek) or more
/// than `max_age` frames older than it.
pub fn age_out(history: &mut History, frame: u64, max_age: u64) -> usize {
    history.retain(|d| d.frame <= frame && frame - d.frame <= max_age)
}

/// Returns the number of removed entries.
pub fn clean_ball(history: &mut BallHistory, frame: u64, cfg: &FilterConfig) -> usize {
    reject_newest(history, &cfg.ball) + age_out(history, frame, cfg.ball_max_age)
}

/// Returns the number of removed entries.
pub fn clean_hoop(history: &mut HoopHistory, frame: u64, cfg: &FilterConfig) -> usize {
    let mut removed = reject_newest(history, &cfg.hoop);

    while history.len() > cfg.hoop_capacity {
        history.pop_oldest();
        removed += 1;
    }

    removed + age_out(history, frame, cfg.hoop_max_age)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(x: f32, y: f32, w: f32, h: f32, frame: u64) -> Detection {
        Detection::new(x, y, w, h, 0.9, frame)
    }

    #[test]
    fn drops_flat_ball_box() {
        let cfg = FilterConfig::default();
        let mut h = BallHistory::unbounded();

        h.push(ball(100.0, 100.0, 20.0, 21.0, 0));
        assert_eq!(clean_ball(&mut h, 0, &cfg), 0);

        h.push(ball(105.0, 102.0, 50.0, 10.0, 1));
        assert_eq!(clean_ball(&mut h, 1, &cfg), 1);
        assert_eq!(h.len(), 1);
        assert_eq!(h.latest().map(|d| d.frame), Some(0));
    }

    #[test]
    fn drops_teleporting_ball() {
        let cfg = FilterConfig::default();
        let mut h = BallHistory::unbounded();

        h.push(ball(100.0, 100.0, 20.0, 20.0, 0));
        // 4 * sqrt(800) ~ 113
        h.push(ball(300.0, 100.0, 20.0, 20.0, 2));
        assert_eq!(clean_ball(&mut h, 2, &cfg), 1);

        h.push(ball(180.0, 100.0, 20.0, 20.0, 3));
        assert_eq!(clean_ball(&mut h, 3, &cfg), 0);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn long_gap_allows_large_jump() {
        let cfg = FilterConfig::default();
        let mut h = BallHistory::unbounded();

        h.push(ball(100.0, 100.0, 20.0, 20.0, 0));
        h.push(ball(400.0, 100.0, 20.0, 20.0, 5));

        assert_eq!(clean_ball(&mut h, 5, &cfg), 0);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn ball_ages_out_after_window() {
        let cfg = FilterConfig::default();
        let mut h = BallHistory::unbounded();

        for frame in 0..100u64 {
            h.push(ball(100.0 + frame as f32, 100.0, 20.0, 20.0, frame));
            clean_ball(&mut h, frame, &cfg);

            assert!(h.iter().all(|d| frame - d.frame <= cfg.ball_max_age));
        }

        assert_eq!(h.len(), 31);
    }

    #[test]
    fn backward_seek_drops_future_entries() {
        let cfg = FilterConfig::default();
        let mut h = BallHistory::unbounded();

        for frame in 0..20u64 {
            h.push(ball(100.0, 100.0, 20.0, 20.0, frame));
        }

        age_out(&mut h, 10, cfg.ball_max_age);
        assert!(h.iter().all(|d| d.frame <= 10));
        assert_eq!(h.len(), 11);
    }

    #[test]
    fn hoop_rules_are_tighter() {
        let cfg = FilterConfig::default();
        let mut h = HoopHistory::unbounded();

        // 40 / 30 exceeds 1.3, but nothing precedes it
        h.push(ball(320.0, 200.0, 40.0, 30.0, 0));
        assert_eq!(clean_hoop(&mut h, 0, &cfg), 0);

        h.push(ball(320.0, 200.0, 40.0, 30.0, 1));
        assert_eq!(clean_hoop(&mut h, 1, &cfg), 1);

        // 0.5 * sqrt(40^2 + 30^2) = 25
        h.push(ball(350.0, 200.0, 36.0, 30.0, 2));
        assert_eq!(clean_hoop(&mut h, 2, &cfg), 1);

        h.push(ball(321.0, 200.0, 36.0, 30.0, 3));
        assert_eq!(clean_hoop(&mut h, 3, &cfg), 0);

        assert_eq!(h.iter().map(|d| d.frame).collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn first_entry_skips_aspect_check() {
        let cfg = FilterConfig::default();
        let mut h = BallHistory::unbounded();

        h.push(ball(100.0, 100.0, 50.0, 10.0, 0));
        assert_eq!(clean_ball(&mut h, 0, &cfg), 0);

        h.push(ball(102.0, 100.0, 50.0, 10.0, 1));
        assert_eq!(clean_ball(&mut h, 1, &cfg), 1);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn hoop_history_is_capped() {
        let cfg = FilterConfig::default();
        let mut h = HoopHistory::unbounded();

        for frame in 0..60u64 {
            h.push(ball(320.0, 200.0, 36.0, 30.0, frame));
            clean_hoop(&mut h, frame, &cfg);
            assert!(h.len() <= cfg.hoop_capacity);
        }

        assert_eq!(h.len(), cfg.hoop_capacity);
    }

    #[test]
    fn cleaning_is_idempotent() {
        let cfg = FilterConfig::default();
        let mut h = BallHistory::unbounded();

        let stream = [
            ball(100.0, 100.0, 20.0, 20.0, 0),
            ball(110.0, 95.0, 20.0, 20.0, 1),
            ball(500.0, 95.0, 20.0, 20.0, 2),
            ball(120.0, 90.0, 60.0, 12.0, 3),
            ball(125.0, 88.0, 21.0, 20.0, 4),
            ball(131.0, 85.0, 20.0, 22.0, 5),
        ];

        for det in stream {
            h.push(det);
            clean_ball(&mut h, det.frame, &cfg);
        }

        let before: Vec<_> = h.iter().copied().collect();
        assert_eq!(clean_ball(&mut h, 5, &cfg), 0);
        assert_eq!(clean_ball(&mut h, 5, &cfg), 0);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), before);
        assert_eq!(before.len(), 4);
    }
}
