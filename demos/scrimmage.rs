//! Runs a synthetic scrimmage through the pipeline and prints events as JSON lines.
//!
//! `cargo run --example scrimmage [config.json]`, with `RUST_LOG=hooptrack=debug`
//! for stage logs.

use std::cell::Cell;
use std::rc::Rc;

use hooptrack::bbox::BBox;
use hooptrack::events::JsonLinesSink;
use hooptrack::{
    Config, Detector, Error, FrameReport, FrameSource, ObjectClass, Pipeline, RawDetection,
    RenderSink, Session, TeamSlot,
};
use image::{Rgb, RgbImage};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const FRAMES: u64 = 90;
const CYCLE: u64 = 30;

const HOOP: [f32; 4] = [302.0, 105.0, 338.0, 135.0];

fn red_player(frame: u64) -> [f32; 4] {
    let x = 300.0 + (frame % CYCLE) as f32;
    [x, 250.0, x + 40.0, 350.0]
}

fn blue_player(frame: u64) -> [f32; 4] {
    let x = 460.0 - (frame % CYCLE) as f32;
    [x, 260.0, x + 40.0, 360.0]
}

/// Ball center, if the ball is in the air. Odd cycles are long shots.
fn ball(frame: u64) -> Option<(f32, f32)> {
    let t = (frame % CYCLE) as f32;
    if t > 10.0 {
        return None;
    }

    let x0 = if (frame / CYCLE) % 2 == 0 { 290.0 } else { 240.0 };
    let dx = (320.0 - x0) / 8.0;

    Some((x0 + dx * t, 40.0 + 14.0 * t))
}

fn paint(image: &mut RgbImage, [l, t, r, b]: [f32; 4], color: [u8; 3]) {
    for y in (t as u32)..(b as u32).min(HEIGHT) {
        for x in (l as u32)..(r as u32).min(WIDTH) {
            image.put_pixel(x, y, Rgb(color));
        }
    }
}

struct Court {
    cursor: Rc<Cell<u64>>,
}

impl FrameSource for Court {
    fn next_frame(&mut self) -> Result<Option<(u64, RgbImage)>, Error> {
        let index = self.cursor.get();
        if index >= FRAMES {
            return Ok(None);
        }

        let mut image = RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([150, 110, 70]));
        paint(&mut image, red_player(index), [220, 20, 20]);
        paint(&mut image, blue_player(index), [20, 40, 220]);

        self.cursor.set(index + 1);

        Ok(Some((index, image)))
    }

    fn seek(&mut self, index: u64) -> Result<(), Error> {
        if index >= FRAMES {
            return Err(Error::FrameSource(format!("frame {} out of range", index)));
        }

        self.cursor.set(index);
        Ok(())
    }
}

/// Reports the ground truth of the frame the source just produced.
struct GroundTruth {
    cursor: Rc<Cell<u64>>,
    persons: bool,
}

impl Detector for GroundTruth {
    fn detect(&mut self, _image: &RgbImage) -> Result<Vec<RawDetection>, Error> {
        let index = self.cursor.get().saturating_sub(1);
        let ltrb = |[l, t, r, b]: [f32; 4]| BBox::ltrb(l, t, r, b);

        if self.persons {
            return Ok(vec![
                RawDetection::new(ObjectClass::Person, ltrb(red_player(index)), 0.9),
                RawDetection::new(ObjectClass::Person, ltrb(blue_player(index)), 0.85),
            ]);
        }

        let mut out = vec![RawDetection::new(ObjectClass::Hoop, ltrb(HOOP), 0.8)];

        if let Some((x, y)) = ball(index) {
            out.push(RawDetection::new(
                ObjectClass::Ball,
                BBox::ltrb(x - 10.0, y - 10.0, x + 10.0, y + 10.0),
                0.7,
            ));
        }

        Ok(out)
    }
}

struct Summary;

impl RenderSink for Summary {
    fn render(&mut self, _image: &RgbImage, report: &FrameReport) -> Result<(), Error> {
        if let Some(overlay) = &report.shot_overlay {
            if overlay.remaining == overlay.total {
                tracing::info!(
                    frame = report.frame,
                    text = %overlay.text,
                    shot = report.shot_type_label().unwrap_or("-"),
                    "banner"
                );
            }
        }

        Ok(())
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let cursor = Rc::new(Cell::new(0));
    let mut pipeline = Pipeline::new(
        Court {
            cursor: cursor.clone(),
        },
        GroundTruth {
            cursor: cursor.clone(),
            persons: false,
        },
        GroundTruth {
            cursor,
            persons: true,
        },
        Session::new(config),
    );

    let mut events = JsonLinesSink::new(std::io::stdout());
    let processed = pipeline.run(&mut events, &mut Summary)?;

    let session = pipeline.session();
    let board = session.scoreboard();

    tracing::info!(
        processed,
        makes = board.makes,
        attempts = board.attempts,
        a = board.team_points(TeamSlot::A),
        b = board.team_points(TeamSlot::B),
        "final score"
    );

    Ok(())
}
