use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    MissingArtifact,
    SchemaMismatch,
    MalformedTable,
    ArtifactWriteFailed,
    InvalidJson,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::MissingArtifact => "E2001",
            Self::SchemaMismatch => "E2002",
            Self::MalformedTable => "E2003",
            Self::ArtifactWriteFailed => "E5001",
            Self::InvalidJson => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::MissingArtifact => "Input artifact not found",
            Self::SchemaMismatch => "Input artifact is missing required columns",
            Self::MalformedTable => "Input artifact could not be read",
            Self::ArtifactWriteFailed => "Artifact write failed",
            Self::InvalidJson => "JSON serialization failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in coauthor.toml and retry."),
            Self::MissingArtifact => {
                Some("Run the producing stage first (`coauthor edges`, then `coauthor top`).")
            }
            Self::SchemaMismatch => {
                Some("Regenerate the artifact; edge tables need `source,target`, degree tables `author,degree`.")
            }
            Self::MalformedTable => None,
            Self::ArtifactWriteFailed => Some("Check disk space and write permissions."),
            Self::InvalidJson => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fatal errors raised at artifact boundaries.
///
/// Malformed individual records and rows are not errors; they are skipped
/// and tallied by the stage that reads them.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("required artifact not found: {0}")]
    MissingFile(PathBuf),

    #[error("{path} is missing required column(s): {}", .missing.join(", "))]
    SchemaMismatch { path: PathBuf, missing: Vec<String> },

    #[error("failed to read table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write table {path}: {source}")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write JSON to {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    /// The stable code reported for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Config { .. } => ErrorCode::ConfigParseError,
            Self::MissingFile(_) => ErrorCode::MissingArtifact,
            Self::SchemaMismatch { .. } => ErrorCode::SchemaMismatch,
            Self::Csv { .. } => ErrorCode::MalformedTable,
            Self::CsvWrite { .. } => ErrorCode::ArtifactWriteFailed,
            Self::Io { .. } => ErrorCode::ArtifactWriteFailed,
            Self::Json { .. } => ErrorCode::InvalidJson,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, PipelineError};
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::MissingArtifact,
            ErrorCode::SchemaMismatch,
            ErrorCode::MalformedTable,
            ErrorCode::ArtifactWriteFailed,
            ErrorCode::InvalidJson,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::SchemaMismatch.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn schema_mismatch_lists_missing_columns() {
        let err = PipelineError::SchemaMismatch {
            path: PathBuf::from("author_edges.csv"),
            missing: vec!["source".to_string(), "target".to_string()],
        };
        assert_eq!(err.code(), ErrorCode::SchemaMismatch);
        assert_eq!(
            err.to_string(),
            "author_edges.csv is missing required column(s): source, target"
        );
    }
}
