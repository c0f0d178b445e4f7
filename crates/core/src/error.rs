use thiserror::Error;

pub type BrainResult<T> = Result<T, BrainError>;

/// Error taxonomy for the analysis pipeline. Parsing and aggregation
/// failures keep their kind all the way to the API boundary, where the
/// kind string is echoed in the error payload and mapped to a status code.
#[derive(Error, Debug)]
pub enum BrainError {
    /// A required column is absent from the upload's header row.
    #[error("missing required column(s): {0}")]
    Schema(String),

    /// A cell could not be converted to its expected type, or a row
    /// failed validation. `row` is the 1-based data row number (the
    /// header row is not counted).
    #[error("row {row}: {message}")]
    Parse { row: usize, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BrainError {
    /// Stable machine-readable kind, used in error payloads and metrics
    /// labels.
    pub fn kind(&self) -> &'static str {
        match self {
            BrainError::Schema(_) => "schema",
            BrainError::Parse { .. } => "parse",
            BrainError::Config(_) => "config",
            BrainError::Serialization(_) => "serialization",
            BrainError::Io(_) => "io",
            BrainError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings_are_stable() {
        assert_eq!(BrainError::Schema("Reach".into()).kind(), "schema");
        assert_eq!(
            BrainError::Parse {
                row: 3,
                message: "bad cell".into()
            }
            .kind(),
            "parse"
        );
        assert_eq!(
            BrainError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk")).kind(),
            "io"
        );
    }

    #[test]
    fn test_parse_error_message_carries_row() {
        let err = BrainError::Parse {
            row: 7,
            message: "column 'Reach': cannot parse 'n/a'".into(),
        };
        assert_eq!(err.to_string(), "row 7: column 'Reach': cannot parse 'n/a'");
    }
}
