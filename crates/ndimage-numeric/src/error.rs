/// An error type for the numeric helpers.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum NumericError {
    /// The input slice does not hold the number of values the matrix size implies.
    #[error("Array parameter has the wrong number of elements: expected {expected}, got {actual}")]
    ArraySizeMismatch {
        /// Number of values the matrix size implies.
        expected: usize,
        /// Number of values passed in.
        actual: usize,
    },

    /// The matrix size is not supported.
    #[error("Matrix size {0} is not supported")]
    InvalidMatrixSize(usize),
}
