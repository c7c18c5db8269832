use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Insufficient data: {0}")]
    InsufficientData(&'static str),

    #[error("Degenerate trajectory fit")]
    DegenerateFit,

    #[error("No color evidence in torso region")]
    NoColorEvidence,

    #[error("Persistence Error: {0}")]
    Persistence(String),

    #[error("Detector Error: {0}")]
    Detector(String),

    #[error("Frame Source Error: {0}")]
    FrameSource(String),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}
