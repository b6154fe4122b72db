use crate::allocator::DataAllocatorError;
use crate::datatype::DataType;

/// An error type for the core crate.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CoreError {
    /// A string does not name any data type.
    #[error("Unknown data type name: {0}")]
    UnknownDataTypeName(String),

    /// An operation was dispatched on a data type outside the family it supports.
    #[error("Data type not supported: {data_type} is not {family}")]
    DataTypeNotSupported {
        /// The data type that was requested.
        data_type: DataType,
        /// The family of types the operation accepts.
        family: &'static str,
    },

    /// A data segment of the requested size cannot be addressed.
    #[error("Size exceeds address limit: {0} bytes")]
    SizeExceedsLimit(usize),

    /// The allocator failed.
    #[error(transparent)]
    Allocation(#[from] DataAllocatorError),
}

impl CoreError {
    /// Creates a [`CoreError::DataTypeNotSupported`].
    pub fn data_type_not_supported(data_type: DataType, family: &'static str) -> Self {
        Self::DataTypeNotSupported { data_type, family }
    }
}
