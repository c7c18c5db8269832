use serde_derive::{Deserialize, Serialize};

use crate::detection::{ObjectClass, RawDetection};

/// Detector trust thresholds and player plausibility filters.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    pub ball_confidence: f32,
    pub hoop_confidence: f32,
    pub player_confidence: f32,
    /// Players whose center lies above this fraction of the frame height are ignored (stands).
    pub player_min_y: f32,
    /// Players within this fraction of the frame width from either edge are ignored.
    pub player_margin_x: f32,
    pub player_min_area: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            ball_confidence: 0.15,
            hoop_confidence: 0.3,
            player_confidence: 0.4,
            player_min_y: 0.4,
            player_margin_x: 0.05,
            player_min_area: 2000.0,
        }
    }
}

/// Detections of both detectors for one video frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub dims: (u32, u32),
    pub detections: Vec<RawDetection>,
}

impl Frame {
    pub fn new(index: u64, dims: (u32, u32), detections: Vec<RawDetection>) -> Self {
        Self {
            index,
            dims,
            detections,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &RawDetection> {
        self.detections.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn balls<'a>(&'a self, gate: &'a GateConfig) -> impl Iterator<Item = &'a RawDetection> + 'a {
        self.iter()
            .filter(move |d| d.class == ObjectClass::Ball && d.confidence > gate.ball_confidence)
    }

    pub fn hoops<'a>(&'a self, gate: &'a GateConfig) -> impl Iterator<Item = &'a RawDetection> + 'a {
        self.iter()
            .filter(move |d| d.class == ObjectClass::Hoop && d.confidence > gate.hoop_confidence)
    }

    pub fn players<'a>(&'a self, gate: &'a GateConfig) -> impl Iterator<Item = &'a RawDetection> + 'a {
        let (fw, fh) = (self.dims.0 as f32, self.dims.1 as f32);

        self.iter().filter(move |d| {
            if d.class != ObjectClass::Person || d.confidence < gate.player_confidence {
                return false;
            }

            let c = d.bbox.center();

            c.y >= fh * gate.player_min_y
                && c.x >= fw * gate.player_margin_x
                && c.x <= fw * (1.0 - gate.player_margin_x)
                && d.bbox.area() >= gate.player_min_area
        })
    }
}
