use thiserror::Error;

/// Errors surfaced by the data layer.
///
/// Every operation is atomic: when one of these comes back, the [`Workspace`]
/// is exactly as it was before the call.
///
/// [`Workspace`]: crate::store::Workspace
#[derive(Debug, Error)]
pub enum DataError {
    /// Structural problem in the input: inconsistent column counts, a missing
    /// data table, undecodable text, or a malformed JSON shape.
    #[error("malformed input at line {row}: {message}")]
    Format { row: u64, message: String },

    /// A field that should be numeric is not.
    #[error("line {row}, {column}: '{value}' is not a number")]
    Parse {
        row: u64,
        column: String,
        value: String,
    },

    /// The input parsed but contained zero data rows.
    #[error("no data rows in input")]
    EmptyData,

    /// No open spectrum with this identifier.
    #[error("no open spectrum '{0}'")]
    NotFound(String),

    /// Parallel wavelength/intensity sequences of unequal length.
    #[error("length mismatch: {wavelengths} wavelengths vs {intensities} intensities")]
    LengthMismatch {
        wavelengths: usize,
        intensities: usize,
    },

    /// Edit index past the end of a spectrum.
    #[error("point {index} out of range for '{id}' ({len} points)")]
    PointOutOfRange {
        id: String,
        index: usize,
        len: usize,
    },

    /// Underlying read or write failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        let row = err.position().map(|p| p.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(e) => DataError::Io(e),
            csv::ErrorKind::UnequalLengths {
                pos,
                expected_len,
                len,
            } => DataError::Format {
                row: pos.map(|p| p.line()).unwrap_or(row),
                message: format!("expected {expected_len} columns, found {len}"),
            },
            csv::ErrorKind::Utf8 { .. } => DataError::Format {
                row,
                message: "invalid UTF-8".to_string(),
            },
            other => DataError::Format {
                row,
                message: format!("{other:?}"),
            },
        }
    }
}
