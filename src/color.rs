use image::RgbImage;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::error::Error;
use crate::math::median;

/// HSV in the 8-bit convention: hue in [0, 180), saturation and value in [0, 255].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    pub const fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

        let mut h = if delta <= 0.0 {
            0.0
        } else if max == r {
            60.0 * (g - b) / delta
        } else if max == g {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };

        if h < 0.0 {
            h += 360.0;
        }

        Self::new(h / 2.0, s, max)
    }

    /// Euclidean distance over the raw channels (hue is not wrapped).
    #[inline]
    pub fn distance(&self, other: &Hsv) -> f32 {
        let dh = self.h - other.h;
        let ds = self.s - other.s;
        let dv = self.v - other.v;

        (dh * dh + ds * ds + dv * dv).sqrt()
    }

    /// Channel-wise median.
    pub fn median_of<'a, I: IntoIterator<Item = &'a Hsv>>(items: I) -> Option<Hsv> {
        let (mut h, mut s, mut v) = (Vec::new(), Vec::new(), Vec::new());

        for c in items {
            h.push(c.h);
            s.push(c.s);
            v.push(c.v);
        }

        Some(Hsv::new(median(&mut h)?, median(&mut s)?, median(&mut v)?))
    }
}

/// Median HSV of the torso band of `bbox`, ignoring washed-out and shadowed
/// pixels (saturation or value not above `min_sv`).
pub fn torso_hsv(image: &RgbImage, bbox: &BBox<Ltrb>, min_sv: f32) -> Result<Hsv, Error> {
    let torso = bbox.torso();
    let (iw, ih) = image.dimensions();

    let clamp = |v: f32, hi: u32| (v.max(0.0) as u32).min(hi);
    let (x1, x2) = (clamp(torso.left(), iw), clamp(torso.right(), iw));
    let (y1, y2) = (clamp(torso.top(), ih), clamp(torso.bottom(), ih));

    let mut samples = Vec::new();

    for y in y1..y2 {
        for x in x1..x2 {
            let [r, g, b] = image.get_pixel(x, y).0;
            let hsv = Hsv::from_rgb(r, g, b);

            if hsv.s > min_sv && hsv.v > min_sv {
                samples.push(hsv);
            }
        }
    }

    Hsv::median_of(&samples).ok_or(Error::NoColorEvidence)
}
