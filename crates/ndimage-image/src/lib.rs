#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! An [`Image`] is an n-dimensional array of pixels, where every pixel is a small tensor of
//! samples of one [`DataType`](ndimage_core::DataType). The pixels live in a reference-counted
//! data block that any number of images can share, each looking at it through its own
//! origin, sizes and strides.
//!
//! An image is either *raw*, holding only properties, or *forged*, holding data. Properties
//! such as sizes and strides are set on a raw image, then [`Image::forge`] allocates the data.
//! Views, dimension permutations and mirroring never copy samples; they only produce new
//! strides into the same block, and [`alias`] tells whether two such views can touch the same
//! samples.
//!
//! ```rust
//! use ndimage_core::DataType;
//! use ndimage_image::{alias, Image};
//!
//! let img = Image::new(&[256, 256], 3, DataType::UInt8).unwrap();
//! let mut rotated = img.clone();
//! rotated.swap_dimensions(0, 1).unwrap().mirror(&[true, false]).unwrap();
//! assert!(alias(&img, &rotated));
//! assert_eq!(rotated.strides(), &[-768, 3]);
//! ```

/// Overlap analysis between views of a data block.
pub mod alias;

/// Error types for the image crate.
pub mod error;

/// Hooks for allocating image data outside of the default allocator.
pub mod external;

/// The image type, its properties and its forge/strip life cycle.
pub mod image;

/// Iteration over the lines of one or more images.
pub mod iterator;

/// Shape manipulation without copying samples.
pub mod manip;

/// Copying, conversion and single-sample access.
pub mod ops;

/// Physical quantities and pixel sizes.
pub mod physical;

/// Arithmetic on sizes, strides and coordinates.
pub mod strides;

/// Tensor shapes of pixels.
pub mod tensor;

/// Views sharing the data of an image.
pub mod views;

pub use crate::alias::alias;
pub use crate::error::ImageError;
pub use crate::external::{AlignedAllocInterface, ExternalAllocation, ExternalInterface};
pub use crate::image::Image;
pub use crate::iterator::LineIterator;
pub use crate::physical::{PhysicalQuantity, PixelSize};
pub use crate::strides::CoordinatesComputer;
pub use crate::tensor::{Tensor, TensorShape};
