/// Metadata-specific errors
use thiserror::Error;

/// Result type alias using `MetadataError`
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Metadata error types
///
/// These never leave the parser: `TabMetadataParser` turns every one of them
/// into `TabMetadata { is_valid: false, .. }` after logging it.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Recognised format family that this parser intentionally does not decode
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Version header did not match any known family
    #[error("Unknown version string: {0:?}")]
    UnknownVersion(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<MetadataError> for tabvault_core::VaultError {
    fn from(err: MetadataError) -> Self {
        tabvault_core::VaultError::metadata(err.to_string())
    }
}
