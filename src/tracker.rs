use std::collections::{BTreeMap, BTreeSet};

use nalgebra as na;
use serde_derive::Deserialize;
use tracing::debug;

use crate::bbox::{BBox, Ltrb};
use crate::team::TeamSlot;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Detections farther than this from every tracked center start a new id.
    pub max_distance: f32,
    /// Ids unmatched for more consecutive frames than this are expired.
    /// `None` keeps them forever.
    pub max_missed_frames: Option<u32>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_distance: 50.0,
            max_missed_frames: Some(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedPlayer {
    pub id: u32,
    pub team: TeamSlot,
    pub center: na::Point2<f32>,
    pub bbox: BBox<Ltrb>,
    /// Consecutive frames without a matching detection.
    pub missed: u32,
}

/// Greedy nearest-neighbour identity keeping for the players of one team.
#[derive(Debug, Clone)]
pub struct PlayerTracker {
    team: TeamSlot,
    config: TrackerConfig,
    players: BTreeMap<u32, TrackedPlayer>,
    max_id: u32,
}

impl PlayerTracker {
    pub fn new(team: TeamSlot, config: TrackerConfig) -> Self {
        Self {
            team,
            config,
            players: BTreeMap::new(),
            max_id: 0,
        }
    }

    #[inline]
    pub fn team(&self) -> TeamSlot {
        self.team
    }

    /// Highest id handed out so far; ids start at 1.
    #[inline]
    pub fn max_id(&self) -> u32 {
        self.max_id
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&TrackedPlayer> {
        self.players.get(&id)
    }

    /// Live players in ascending id order.
    #[inline]
    pub fn players(&self) -> impl Iterator<Item = &TrackedPlayer> {
        self.players.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn closest(&self, point: &na::Point2<f32>) -> Option<(&TrackedPlayer, f32)> {
        self.players
            .values()
            .map(|p| (p, na::distance(&p.center, point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Associates this frame's detections with tracked ids and returns the id
    /// given to each detection, in input order.
    ///
    /// Detections are matched one at a time to the closest id that existed
    /// before this frame and is not taken yet; equal distances keep the
    /// lower id.
    pub fn update(&mut self, detections: &[BBox<Ltrb>]) -> Vec<u32> {
        let candidates: Vec<u32> = self.players.keys().copied().collect();
        let mut assigned = BTreeSet::new();
        let mut ids = Vec::with_capacity(detections.len());

        for bbox in detections {
            let center = bbox.center();
            let mut best: Option<(u32, f32)> = None;

            for id in candidates.iter().copied() {
                if assigned.contains(&id) {
                    continue;
                }

                let dist = match self.players.get(&id) {
                    Some(p) => na::distance(&center, &p.center),
                    None => continue,
                };

                if dist < self.config.max_distance && best.map_or(true, |(_, d)| dist < d) {
                    best = Some((id, dist));
                }
            }

            let id = match best.and_then(|(id, _)| self.players.get_mut(&id)) {
                Some(player) => {
                    player.center = center;
                    player.bbox = *bbox;
                    player.missed = 0;
                    player.id
                }
                None => {
                    self.max_id += 1;
                    self.players.insert(
                        self.max_id,
                        TrackedPlayer {
                            id: self.max_id,
                            team: self.team,
                            center,
                            bbox: *bbox,
                            missed: 0,
                        },
                    );
                    debug!(team = ?self.team, id = self.max_id, "new player id");
                    self.max_id
                }
            };

            assigned.insert(id);
            ids.push(id);
        }

        for (id, player) in self.players.iter_mut() {
            if !assigned.contains(id) {
                player.missed += 1;
            }
        }

        if let Some(limit) = self.config.max_missed_frames {
            self.players.retain(|_, p| p.missed <= limit);
        }

        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(cx: f32, cy: f32) -> BBox<Ltrb> {
        BBox::ltrb(cx - 20.0, cy - 50.0, cx + 20.0, cy + 50.0)
    }

    #[test]
    fn keeps_ids_for_small_motion() {
        let mut t = PlayerTracker::new(TeamSlot::A, TrackerConfig::default());

        assert_eq!(t.update(&[player(100.0, 300.0), player(300.0, 300.0)]), vec![1, 2]);
        assert_eq!(t.update(&[player(310.0, 305.0), player(110.0, 290.0)]), vec![2, 1]);
        assert_eq!(t.get(1).map(|p| p.center), Some(na::Point2::new(110.0, 290.0)));
    }

    #[test]
    fn far_detection_gets_new_id() {
        let mut t = PlayerTracker::new(TeamSlot::B, TrackerConfig::default());

        t.update(&[player(100.0, 300.0)]);
        assert_eq!(t.update(&[player(160.0, 300.0)]), vec![2]);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn id_is_not_assigned_twice() {
        let mut t = PlayerTracker::new(TeamSlot::A, TrackerConfig::default());

        t.update(&[player(100.0, 300.0)]);
        let ids = t.update(&[player(105.0, 300.0), player(102.0, 300.0)]);

        // greedy: the first detection takes id 1 even though the second is closer
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let config = TrackerConfig {
            max_missed_frames: Some(2),
            ..Default::default()
        };
        let mut t = PlayerTracker::new(TeamSlot::A, config);
        let mut seen = Vec::new();

        for round in 0..10 {
            let x = 100.0 + round as f32 * 200.0;
            let ids = t.update(&[player(x % 1200.0, 300.0)]);

            for _ in 0..3 {
                t.update(&[]);
            }

            seen.extend(ids);
        }

        assert!(seen.windows(2).all(|w| w[0] < w[1]), "{:?}", seen);
        assert!(t.is_empty());
    }

    #[test]
    fn expiry_can_be_disabled() {
        let config = TrackerConfig {
            max_missed_frames: None,
            ..Default::default()
        };
        let mut t = PlayerTracker::new(TeamSlot::A, config);

        t.update(&[player(100.0, 300.0)]);
        for _ in 0..100 {
            t.update(&[]);
        }

        assert_eq!(t.get(1).map(|p| p.missed), Some(100));
    }

    #[test]
    fn repeated_update_is_stable() {
        let mut t = PlayerTracker::new(TeamSlot::A, TrackerConfig::default());
        let dets = [player(100.0, 300.0), player(200.0, 300.0), player(300.0, 300.0)];

        let first = t.update(&dets);
        let second = t.update(&dets);

        assert_eq!(first, second);
        assert_eq!(t.max_id(), 3);
    }

    #[test]
    fn closest_player() {
        let mut t = PlayerTracker::new(TeamSlot::A, TrackerConfig::default());
        t.update(&[player(100.0, 300.0), player(400.0, 300.0)]);

        let (p, d) = t.closest(&na::Point2::new(390.0, 300.0)).unwrap();
        assert_eq!(p.id, 2);
        assert_eq!(d, 10.0);
    }
}
