use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyllabusSplitterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unreadable PDF input: {reason}")]
    UnreadableInput { reason: String },

    #[error("Failed to write segment '{name}': {reason}")]
    SegmentWrite { name: String, reason: String },

    #[error("Invalid page ranges: {reason}")]
    InvalidRanges { reason: String },

    #[error("Output directory error: {reason}")]
    OutputDirectory { reason: String },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Result not found: {id}")]
    UnknownResult { id: String },

    #[error("File '{filename}' not found in result {id}")]
    UnknownFile { id: String, filename: String },

    #[error("HTTP status error: {status}")]
    HttpStatus { status: u16 },
}

pub type Result<T> = std::result::Result<T, SyllabusSplitterError>;
