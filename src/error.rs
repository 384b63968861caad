use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a placement listener. It is handed back to whoever
/// delivered the overlap.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("frame_skip must be at least 1")]
    InvalidFrameSkip,
    #[error("{name} must be a non-negative number, got {value}")]
    NegativeThreshold { name: &'static str, value: f32 },
    #[error("no material named {0:?} is available")]
    MissingMaterial(String),
    #[error("grouped bounds requested for a subtree without any renderer")]
    EmptySubtree,
    #[error("placement listener failed")]
    Listener(#[source] ListenerError),
    #[error("could not read config {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config")]
    Json(#[from] serde_json::Error),
}
