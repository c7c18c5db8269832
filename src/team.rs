//! Online two-cluster jersey color classification.
//!
//! The first detection seeds team A, the first detection with a different
//! color seeds team B, everything after joins the closer team. There is no
//! re-seeding: noisy first detections stay baked in.

use serde_derive::{Deserialize, Serialize};
use tracing::info;

use crate::circular_queue::CircularQueue;
use crate::color::Hsv;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TeamSlot {
    A,
    B,
}

impl TeamSlot {
    pub const ALL: [TeamSlot; 2] = [TeamSlot::A, TeamSlot::B];

    #[inline]
    pub fn opposite(self) -> TeamSlot {
        match self {
            TeamSlot::A => TeamSlot::B,
            TeamSlot::B => TeamSlot::A,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            TeamSlot::A => 0,
            TeamSlot::B => 1,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TeamConfig {
    pub history: usize,
    /// Pixels need saturation and value above this to count as jersey evidence.
    pub min_saturation_value: f32,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            history: 10,
            min_saturation_value: 40.0,
        }
    }
}

/// Bounded color history of one team and its median.
#[derive(Debug, Clone)]
pub struct TeamColorModel {
    history: CircularQueue<Hsv>,
    representative: Option<Hsv>,
}

impl TeamColorModel {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: CircularQueue::with_capacity(capacity.max(1)),
            representative: None,
        }
    }

    pub fn push(&mut self, hsv: Hsv) {
        self.history.push(hsv);
        self.representative = Hsv::median_of(self.history.iter());
    }

    #[inline]
    pub fn representative(&self) -> Option<Hsv> {
        self.representative
    }

    #[inline]
    pub fn is_seeded(&self) -> bool {
        self.representative.is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    #[inline]
    pub fn distance(&self, hsv: &Hsv) -> Option<f32> {
        self.representative.map(|r| r.distance(hsv))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Assignment {
    /// The detection seeded this team's representative color.
    Seeded(TeamSlot),
    Joined(TeamSlot),
}

impl Assignment {
    #[inline]
    pub fn slot(&self) -> TeamSlot {
        match *self {
            Assignment::Seeded(s) | Assignment::Joined(s) => s,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamClassifier {
    teams: [TeamColorModel; 2],
}

impl TeamClassifier {
    pub fn new(config: &TeamConfig) -> Self {
        Self {
            teams: [
                TeamColorModel::new(config.history),
                TeamColorModel::new(config.history),
            ],
        }
    }

    #[inline]
    pub fn model(&self, slot: TeamSlot) -> &TeamColorModel {
        &self.teams[slot.index()]
    }

    #[inline]
    pub fn representative(&self, slot: TeamSlot) -> Option<Hsv> {
        self.model(slot).representative()
    }

    /// Closest seeded team; ties go to team A.
    pub fn nearest(&self, hsv: &Hsv) -> Option<TeamSlot> {
        let da = self.teams[0].distance(hsv);
        let db = self.teams[1].distance(hsv);

        match (da, db) {
            (Some(a), Some(b)) if b < a => Some(TeamSlot::B),
            (Some(_), _) => Some(TeamSlot::A),
            (None, Some(_)) => Some(TeamSlot::B),
            (None, None) => None,
        }
    }

    /// Assigns `hsv` to a team and folds it into that team's history.
    pub fn classify(&mut self, hsv: Hsv) -> Assignment {
        let assignment = match self.teams[0].representative() {
            None => Assignment::Seeded(TeamSlot::A),
            Some(a) if !self.teams[1].is_seeded() && a != hsv => Assignment::Seeded(TeamSlot::B),
            Some(_) => Assignment::Joined(self.nearest(&hsv).unwrap_or(TeamSlot::A)),
        };

        let slot = assignment.slot();
        self.teams[slot.index()].push(hsv);

        if let Assignment::Seeded(slot) = assignment {
            info!(?slot, h = hsv.h, s = hsv.s, v = hsv.v, "team color seeded");
        }

        assignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_in_order_then_picks_closer() {
        let mut c = TeamClassifier::new(&TeamConfig::default());

        assert_eq!(
            c.classify(Hsv::new(10.0, 200.0, 200.0)),
            Assignment::Seeded(TeamSlot::A)
        );
        assert_eq!(
            c.classify(Hsv::new(120.0, 200.0, 200.0)),
            Assignment::Seeded(TeamSlot::B)
        );
        assert_eq!(
            c.classify(Hsv::new(15.0, 190.0, 195.0)),
            Assignment::Joined(TeamSlot::A)
        );
    }

    #[test]
    fn same_color_does_not_seed_second_team() {
        let mut c = TeamClassifier::new(&TeamConfig::default());
        let red = Hsv::new(0.0, 255.0, 255.0);

        c.classify(red);
        assert_eq!(c.classify(red), Assignment::Joined(TeamSlot::A));
        assert!(!c.model(TeamSlot::B).is_seeded());
        assert_eq!(c.model(TeamSlot::A).len(), 2);
    }

    #[test]
    fn history_is_bounded() {
        let mut c = TeamClassifier::new(&TeamConfig::default());

        c.classify(Hsv::new(10.0, 200.0, 200.0));
        c.classify(Hsv::new(120.0, 200.0, 200.0));

        for i in 0..50 {
            c.classify(Hsv::new(10.0 + (i % 3) as f32, 200.0, 200.0));
            assert!(c.model(TeamSlot::A).len() <= 10);
        }

        assert_eq!(c.model(TeamSlot::A).len(), 10);
        assert_eq!(c.model(TeamSlot::B).len(), 1);
    }

    #[test]
    fn representatives_converge() {
        let mut c = TeamClassifier::new(&TeamConfig::default());
        let red = Hsv::new(2.0, 220.0, 210.0);
        let blue = Hsv::new(118.0, 230.0, 190.0);

        // noisy seeds
        c.classify(Hsv::new(8.0, 180.0, 240.0));
        c.classify(Hsv::new(110.0, 250.0, 160.0));

        for i in 0..40 {
            let jitter = if i % 2 == 0 { 1.0 } else { -1.0 };
            c.classify(Hsv::new(red.h + jitter, red.s + jitter, red.v - jitter));
            c.classify(Hsv::new(blue.h - jitter, blue.s + jitter, blue.v + jitter));
        }

        let a = c.representative(TeamSlot::A).unwrap();
        let b = c.representative(TeamSlot::B).unwrap();

        assert!(a.distance(&red) < 2.0, "{:?}", a);
        assert!(b.distance(&blue) < 2.0, "{:?}", b);
    }

    #[test]
    fn nearest_requires_a_seed() {
        let c = TeamClassifier::new(&TeamConfig::default());
        assert_eq!(c.nearest(&Hsv::new(0.0, 0.0, 0.0)), None);
    }
}
