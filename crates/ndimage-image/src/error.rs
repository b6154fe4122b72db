use ndimage_core::{CoreError, DataType};

/// An error type for image operations.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// The operation needs pixel data, but the image is raw.
    #[error("Image is not forged")]
    ImageNotForged,

    /// The operation changes properties that are fixed once the image is forged.
    #[error("Image is not raw")]
    ImageNotRaw,

    /// Forging an image with a zero size or zero tensor elements.
    #[error("Cannot forge an image without pixels (sizes must be > 0)")]
    EmptyImage,

    /// The number of samples overflows the address space.
    #[error("Image size exceeds address limit")]
    SizeExceedsLimit,

    /// A dimension index is out of range.
    #[error("Illegal dimension {dim} for an image with {dimensionality} dimensions")]
    IllegalDimension {
        /// The offending dimension.
        dim: usize,
        /// The dimensionality of the image.
        dimensionality: usize,
    },

    /// A permutation lists the same dimension twice.
    #[error("Cannot duplicate a dimension: {0}")]
    DuplicateDimension(usize),

    /// A permutation drops a dimension whose size is not 1.
    #[error("Cannot discard non-singleton dimension: {0}")]
    CannotDiscardNonSingleton(usize),

    /// An array argument has the wrong number of elements.
    #[error("Array parameter has {actual} elements, expected {expected}")]
    ArraySizeMismatch {
        /// The expected number of elements.
        expected: usize,
        /// The number of elements given.
        actual: usize,
    },

    /// A coordinate or index falls outside the image.
    #[error("Index out of range")]
    IndexOutOfRange,

    /// Image sizes cannot be matched, not even through singleton expansion.
    #[error("Sizes don't match")]
    SizesDontMatch,

    /// Tensor sizes cannot be matched.
    #[error("Number of tensor elements doesn't match")]
    TensorElementsDontMatch,

    /// The operation requires a scalar image.
    #[error("Image is not scalar")]
    NotScalar,

    /// The operation requires a complex image.
    #[error("Image is not complex")]
    NotComplex,

    /// The image data type is not one the operation handles.
    #[error("Data type not supported: {0}")]
    DataTypeNotSupported(DataType),

    /// A tensor shape and dimensions do not agree.
    #[error("Invalid tensor shape: {0}")]
    InvalidTensorShape(String),

    /// A parameter has a value the operation cannot use.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An external interface returned strides that do not fit the image.
    #[error("External interface returned invalid strides")]
    InvalidStrides,

    /// An external interface returned a block too small for the strides it chose.
    #[error("External interface allocated a data block that is too small")]
    ExternalAllocationTooSmall,

    /// Error from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),
}
