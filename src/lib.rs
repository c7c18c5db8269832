pub mod bbox;
pub mod color;
pub mod config;
pub mod detection;
pub mod error;
pub mod events;
pub mod filter;
pub mod foul;
pub mod frame;
pub mod history;
pub mod math;
pub mod pipeline;
pub mod render;
pub mod score;
pub mod session;
pub mod shot;
pub mod team;
pub mod tracker;

mod circular_queue;

pub use config::Config;
pub use detection::{Detection, ObjectClass, RawDetection};
pub use error::Error;
pub use events::{Event, EventSink};
pub use frame::Frame;
pub use pipeline::{Detector, FrameSource, Pipeline, RenderSink};
pub use render::FrameReport;
pub use session::Session;
pub use team::TeamSlot;
