use ndimage_core::{CoreError, DataType};
use ndimage_image::ImageError;

use crate::parallel::ParallelError;

/// An error type for the framework crate.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FrameworkError {
    /// An array parameter does not have one element per image or dimension.
    #[error("Array parameter has the wrong length: expected {expected}, got {actual}")]
    ArraySizeMismatch {
        /// Required length.
        expected: usize,
        /// Length passed.
        actual: usize,
    },

    /// A line filter asked for a buffer with a type other than the one it was given.
    #[error("Buffer type mismatch: the buffer holds {actual}, not {expected}")]
    BufferTypeMismatch {
        /// Type asked for.
        expected: DataType,
        /// Type of the buffer.
        actual: DataType,
    },

    /// A line filter asked for a buffer that does not exist.
    #[error("No buffer with index {0}")]
    NoSuchBuffer(usize),

    /// A line filter failed.
    #[error("Line filter failed: {0}")]
    Filter(String),

    /// Error from the image layer.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error from the core layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error setting up the worker threads.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}
