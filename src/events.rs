use std::io::Write;

use serde_derive::{Deserialize, Serialize};

use crate::color::Hsv;
use crate::error::Error;
use crate::team::TeamSlot;

/// A resolved shot attempt. `team` is `None` when no tracked player could
/// be credited with a make (and always `None` for misses).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShotEvent {
    pub match_id: u64,
    pub frame: u64,
    pub team: Option<TeamSlot>,
    pub points: u8,
    pub made: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FoulEvent {
    pub match_id: u64,
    pub frame: u64,
    pub team: TeamSlot,
    /// Seconds from the start of the video.
    pub time: f32,
}

/// A team's representative jersey color was established.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TeamSeeded {
    pub match_id: u64,
    pub team: TeamSlot,
    pub hsv: Hsv,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Shot(ShotEvent),
    Foul(FoulEvent),
    TeamSeeded(TeamSeeded),
}

/// Persistence collaborator. Failures are reported back but never stop the
/// analytics pipeline.
pub trait EventSink {
    fn emit(&mut self, event: &Event) -> Result<(), Error>;
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: &Event) -> Result<(), Error> {
        self.push(event.clone());
        Ok(())
    }
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    #[inline]
    fn emit(&mut self, _event: &Event) -> Result<(), Error> {
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: &Event) -> Result<(), Error> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        Ok(())
    }
}
