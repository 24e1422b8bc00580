//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating wire
/// values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, unknown action type, or a
    /// field of the wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room identifier is empty, too long, or contains characters
    /// outside `[A-Za-z0-9]`.
    #[error("invalid room id {0:?}")]
    InvalidRoomId(String),
}
