use std::fmt;

/// Failures of grid-editing operations. None of these are fatal: the
/// controller turns them into no-ops or user-visible messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Cell index outside the grid extents.
    OutOfBounds { col: i32, row: i32 },
    /// Paint attempted with nothing chosen in the palette.
    NoTemplateSelected,
    /// A destructive resize was requested without user confirmation.
    DestructiveActionUnconfirmed,
    /// Thumbnail could not be produced for a template.
    PreviewGenerationFailed(String),
    /// Grid dimensions must both be at least 1.
    InvalidDimensions { cols: u32, rows: u32 },
    /// The host could not instantiate a piece from a template.
    Instantiate(String),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { col, row } => write!(f, "cell ({col}, {row}) is outside the grid"),
            Self::NoTemplateSelected => write!(f, "no piece selected"),
            Self::DestructiveActionUnconfirmed => write!(f, "resize was not confirmed"),
            Self::PreviewGenerationFailed(reason) => write!(f, "preview generation failed: {reason}"),
            Self::InvalidDimensions { cols, rows } => {
                write!(f, "invalid grid size {cols}x{rows} (both must be at least 1)")
            }
            Self::Instantiate(reason) => write!(f, "could not place piece: {reason}"),
        }
    }
}

impl std::error::Error for EditError {}
