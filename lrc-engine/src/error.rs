//! Engine error taxonomy.
//!
//! Everything terminal bubbles to the single update loop as a typed
//! value; the engine itself never logs or prints from the hot path —
//! reporting is the presentation layer's job. Out-of-range wire
//! offsets are not here: the document store clamps or pads them and
//! they never become errors.

use lrc_proto::ProtocolError;

/// A terminal engine failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Malformed wire event or JSON record. The connection is
    /// considered broken.
    #[error("decode error: {0}")]
    Decode(String),

    /// Socket read/write failure, terminal for the affected task.
    #[error("socket error: {0}")]
    Socket(String),

    /// Record creation failed even after the single
    /// refresh-and-retry. The local draft is cleared regardless.
    #[error("publish error: {0}")]
    Publish(String),

    /// Channel discovery/resolution failure.
    #[error("directory error: {0}")]
    Directory(String),

    /// The connection or its outbound channel has closed.
    #[error("connection closed")]
    Closed,
}

impl From<ProtocolError> for EngineError {
    fn from(e: ProtocolError) -> Self {
        EngineError::Decode(e.to_string())
    }
}
