// ---------------------------------------------------------------------------
// TerrainError: configuration and build failures
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors raised while validating terrain settings or starting a heightfield
/// build.
///
/// Everything else in the streaming pipeline degrades gracefully (missing
/// observer, empty iteration list, odd tile counts) and is only logged.
#[derive(Debug)]
pub enum TerrainError {
    /// A preset file could not be read or written.
    Io(std::io::Error),
    /// A heightfield needs at least two samples per axis so the sample
    /// spacing `1 / (resolution - 1)` is defined.
    ResolutionTooSmall { resolution: usize, minimum: usize },
    /// High and low detail share the same sample count, so a tile's detail
    /// level could not be told apart from its heightfield.
    AmbiguousResolution(usize),
    /// A world scale factor is zero, negative or not finite.
    InvalidScale { field: &'static str, value: f32 },
    /// A terrain preset could not be parsed.
    Preset(String),
}

impl fmt::Display for TerrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerrainError::Io(e) => write!(f, "I/O error: {e}"),
            TerrainError::ResolutionTooSmall {
                resolution,
                minimum,
            } => write!(
                f,
                "Heightfield resolution {resolution} is too small (minimum {minimum})"
            ),
            TerrainError::AmbiguousResolution(resolution) => write!(
                f,
                "High and distant resolution are both {resolution}; they must differ"
            ),
            TerrainError::InvalidScale { field, value } => {
                write!(f, "Invalid {field}: {value} (must be finite and positive)")
            }
            TerrainError::Preset(msg) => write!(f, "Invalid terrain preset: {msg}"),
        }
    }
}

impl std::error::Error for TerrainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TerrainError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TerrainError {
    fn from(e: std::io::Error) -> Self {
        TerrainError::Io(e)
    }
}

impl From<serde_json::Error> for TerrainError {
    fn from(e: serde_json::Error) -> Self {
        TerrainError::Preset(e.to_string())
    }
}
