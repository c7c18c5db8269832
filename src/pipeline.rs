use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, warn};

use crate::detection::RawDetection;
use crate::error::Error;
use crate::events::EventSink;
use crate::frame::Frame;
use crate::render::FrameReport;
use crate::session::Session;

/// Opaque object detector. Boxes are in pixel coordinates of the given raster.
pub trait Detector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<RawDetection>, Error>;
}

/// Sequential video frames with random access.
pub trait FrameSource {
    /// Next frame and its index, `None` at the end of the stream.
    fn next_frame(&mut self) -> Result<Option<(u64, RgbImage)>, Error>;

    fn seek(&mut self, index: u64) -> Result<(), Error>;
}

/// External renderer. Draws nothing inside this crate.
pub trait RenderSink {
    fn render(&mut self, image: &RgbImage, report: &FrameReport) -> Result<(), Error>;
}

impl RenderSink for Vec<FrameReport> {
    fn render(&mut self, _image: &RgbImage, report: &FrameReport) -> Result<(), Error> {
        self.push(report.clone());
        Ok(())
    }
}

pub struct Pipeline<S, O, P> {
    source: S,
    objects: O,
    persons: P,
    session: Session,
    stop: Arc<AtomicBool>,
}

impl<S: FrameSource, O: Detector, P: Detector> Pipeline<S, O, P> {
    /// `objects` reports balls and hoops, `persons` reports players.
    pub fn new(source: S, objects: O, persons: P, session: Session) -> Self {
        Self {
            source,
            objects,
            persons,
            session,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Raising the flag makes [`Pipeline::run`] return before the next frame.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn seek(&mut self, index: u64) -> Result<(), Error> {
        debug!(index, "seeking frame source");
        self.source.seek(index)
    }

    /// Processes one frame. Returns `Ok(None)` once the source is exhausted.
    pub fn step<E, R>(&mut self, events: &mut E, render: &mut R) -> Result<Option<FrameReport>, Error>
    where
        E: EventSink + ?Sized,
        R: RenderSink + ?Sized,
    {
        let (index, image) = match self.source.next_frame()? {
            Some(next) => next,
            None => return Ok(None),
        };

        let mut detections = self.objects.detect(&image)?;
        detections.extend(self.persons.detect(&image)?);

        let frame = Frame::new(index, image.dimensions(), detections);
        let report = self.session.process(&frame, &image, events);

        if let Err(err) = render.render(&image, &report) {
            warn!(%err, frame = index, "render sink failed");
        }

        Ok(Some(report))
    }

    /// Runs until the source ends or the stop flag is raised. Returns the
    /// number of processed frames.
    pub fn run<E, R>(&mut self, events: &mut E, render: &mut R) -> Result<u64, Error>
    where
        E: EventSink + ?Sized,
        R: RenderSink + ?Sized,
    {
        let mut processed = 0;

        while !self.stop.load(Ordering::Relaxed) {
            if self.step(events, render)?.is_none() {
                break;
            }

            processed += 1;
        }

        debug!(processed, "pipeline finished");

        Ok(processed)
    }

    pub fn into_session(self) -> Session {
        self.session
    }
}
