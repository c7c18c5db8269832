use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb, Xywh};
use crate::color::Hsv;
use crate::team::TeamSlot;

/// Object classes produced by the two detectors (ball/hoop model and person model).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Ball,
    Hoop,
    Person,
}

/// One box as reported by an external detector for a single frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub class: ObjectClass,
    pub bbox: BBox<Ltrb>,
    #[serde(rename = "p")]
    pub confidence: f32,
}

impl RawDetection {
    pub fn new(class: ObjectClass, bbox: BBox<Ltrb>, confidence: f32) -> Self {
        Self {
            class,
            bbox,
            confidence,
        }
    }
}

/// A gated person detection with its jersey color, team and tracked id.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PlayerObservation {
    pub bbox: BBox<Ltrb>,
    pub hsv: Hsv,
    pub team: TeamSlot,
    pub id: u32,
}

/// Contains (x,y) of the center and (width,height) of bbox, stamped with
/// the index of the frame it was observed in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(rename = "p")]
    pub confidence: f32,
    #[serde(rename = "f")]
    pub frame: u64,
}

impl Detection {
    pub fn new(x: f32, y: f32, w: f32, h: f32, confidence: f32, frame: u64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            confidence,
            frame,
        }
    }

    pub fn from_raw(raw: &RawDetection, frame: u64) -> Self {
        let b = raw.bbox.as_xywh();

        Self::new(b.cx(), b.cy(), b.width(), b.height(), raw.confidence, frame)
    }

    #[inline(always)]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(self.x, self.y)
    }

    #[inline(always)]
    pub fn bbox(&self) -> BBox<Xywh> {
        BBox::xywh(self.x, self.y, self.w, self.h)
    }

    #[inline]
    pub fn diagonal(&self) -> f32 {
        (self.w * self.w + self.h * self.h).sqrt()
    }

    #[inline]
    pub fn distance(&self, other: &Detection) -> f32 {
        na::distance(&self.center(), &other.center())
    }

    /// False when one side exceeds `limit` times the other.
    #[inline]
    pub fn is_squarish(&self, limit: f32) -> bool {
        !(self.w > limit * self.h || self.h > limit * self.w)
    }

    #[inline(always)]
    pub fn xmax(&self) -> f32 {
        self.x + self.w / 2.
    }

    #[inline(always)]
    pub fn ymax(&self) -> f32 {
        self.y + self.h / 2.
    }

    #[inline(always)]
    pub fn xmin(&self) -> f32 {
        self.x - self.w / 2.
    }

    #[inline(always)]
    pub fn ymin(&self) -> f32 {
        self.y - self.h / 2.
    }
}
