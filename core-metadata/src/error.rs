use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to extract metadata: {0}")]
    ExtractionFailed(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupted file: {0}")]
    CorruptedFile(String),

    #[error("Lyrics fetch failed: {0}")]
    LyricsFetchFailed(String),

    #[error("Unknown lyrics provider: {0}")]
    UnknownProvider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

impl MetadataError {
    /// The file is not an audio container we can read tags from.
    pub fn is_not_audio(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_) | Self::CorruptedFile(_))
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
