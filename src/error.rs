//! Error types for the icon-cover-overlay crate.

use std::path::PathBuf;

/// Errors that can occur while overwriting or reverting icons.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to load or decode the cover image.
    #[error("failed to load cover image '{}': {source}", path.display())]
    CoverLoad {
        /// Path the cover image was loaded from.
        path: PathBuf,
        /// Underlying decode error.
        source: image::ImageError,
    },

    /// A freshly saved asset has no configurable import handle.
    ///
    /// This is a contract violation with the asset store, not a recoverable
    /// runtime condition; it aborts the whole pass.
    #[error("no configurable import handle for asset '{path}'")]
    AssetConfiguration {
        /// Path or name of the offending asset.
        path: String,
    },

    /// An I/O error occurred while reading or writing store files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Failed to encode or decode import settings metadata.
    #[error("import settings metadata error: {0}")]
    ImportMeta(#[from] serde_json::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
