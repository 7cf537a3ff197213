use klickwahl_core::{ArmId, Context};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BanditError {
    #[error("Arm catalog is empty")]
    EmptyCatalog,
    #[error("Unseen context: {0}")]
    UnseenContext(Context),
    #[error("Unknown arm {arm} (catalog has {len} arms)")]
    UnknownArm { arm: ArmId, len: usize },
    #[error("Invalid epsilon: {0} (expected a finite value in [0, 1])")]
    InvalidEpsilon(f64),
    #[error("Corrupt policy state: {0}")]
    CorruptState(String),
    #[error("Snapshot (de)serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BanditError>;
