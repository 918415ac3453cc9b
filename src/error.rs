use std::fmt;

/// A scene/palette/effect definition that failed construction-time checks.
/// Fatal to that load, never to the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Segment extends outside the configured strip, or has zero length.
    BadRange {
        segment: u32,
        start: u32,
        length: u32,
        strip_len: u32,
    },
    /// Two segments in the same scene claim overlapping LED indices.
    OverlappingSegments { first: u32, second: u32 },
    /// A segment references an effect id the scene does not define.
    UnknownEffect { segment: u32, effect: u32 },
    /// An effect references a palette slot with no binding, or a binding
    /// points at a palette the scene does not define.
    UnknownPalette { what: String },
    EmptyPalette { palette: String },
    /// A numeric effect parameter is outside its documented range.
    BadParameter { effect: u32, message: String },
    /// The payload could not be parsed at all (bad JSON, unknown effect kind).
    Malformed { message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::BadRange {
                segment,
                start,
                length,
                strip_len,
            } => write!(
                f,
                "segment {segment} range [{start}, {}) exceeds strip length {strip_len}",
                start + length
            ),
            ValidationError::OverlappingSegments { first, second } => {
                write!(f, "segments {first} and {second} overlap")
            }
            ValidationError::UnknownEffect { segment, effect } => {
                write!(f, "segment {segment} references unknown effect {effect}")
            }
            ValidationError::UnknownPalette { what } => {
                write!(f, "unknown palette reference: {what}")
            }
            ValidationError::EmptyPalette { palette } => {
                write!(f, "palette {palette} has no colors")
            }
            ValidationError::BadParameter { effect, message } => {
                write!(f, "effect {effect}: {message}")
            }
            ValidationError::Malformed { message } => write!(f, "malformed scene: {message}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Structured error type for the engine. Every rejection carries an error
/// kind plus a human-readable message so the administrative layer can report
/// it without string matching.
#[derive(Debug, Clone)]
pub enum EngineError {
    /// A scene load failed validation (see [`ValidationError`]).
    Validation(ValidationError),
    /// An out-of-range or unknown-reference command argument. The command is
    /// rejected; engine state is untouched.
    InvalidParameter { message: String },
    /// Inbound/outbound OSC I/O failure. Surfaced to the engine only as
    /// "no new commands" / "frame not delivered".
    Transport { message: String },
    Io { message: String },
}

impl EngineError {
    pub fn invalid<T: Into<String>>(message: T) -> Self {
        EngineError::InvalidParameter {
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Validation(e) => write!(f, "validation failed: {e}"),
            EngineError::InvalidParameter { message } => {
                write!(f, "invalid parameter: {message}")
            }
            EngineError::Transport { message } => write!(f, "transport error: {message}"),
            EngineError::Io { message } => write!(f, "I/O error: {message}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ValidationError> for EngineError {
    fn from(e: ValidationError) -> Self {
        EngineError::Validation(e)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Validation(ValidationError::Malformed {
            message: e.to_string(),
        })
    }
}
