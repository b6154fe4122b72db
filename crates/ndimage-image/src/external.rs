//! Hooks for allocating image data outside of the default allocator.
//!
//! An image carrying an [`ExternalInterface`] asks it for memory each time it is forged. The
//! interface decides the strides and returns the block, or declines and lets the image allocate
//! as usual.

use std::fmt;

use ndimage_core::{DataSegment, DataType};
use ndimage_numeric::round_up;

use crate::error::ImageError;
use crate::strides::number_of_pixels;
use crate::tensor::Tensor;

/// A block of memory handed out by an [`ExternalInterface`].
#[derive(Debug, Clone)]
pub struct ExternalAllocation {
    /// The block; the image keeps it alive.
    pub segment: DataSegment,
    /// Byte offset of the first pixel inside the block.
    pub origin: usize,
}

/// Allocates data for images, for example inside buffers owned by another library.
pub trait ExternalInterface: Send + Sync + fmt::Debug {
    /// Allocates the data for an image about to be forged.
    ///
    /// `strides` and `tensor_stride` arrive as set on the raw image and may be overwritten;
    /// strides count samples. Returning `Ok(None)` declines, and the image is forged with the
    /// default allocator.
    ///
    /// # Errors
    ///
    /// Any error is passed on to the caller of `forge`.
    fn allocate_data(
        &self,
        data_type: DataType,
        sizes: &[usize],
        strides: &mut Vec<isize>,
        tensor: &Tensor,
        tensor_stride: &mut isize,
    ) -> Result<Option<ExternalAllocation>, ImageError>;
}

/// Allocates images whose lines along dimension 0 each start at an `alignment`-byte boundary.
///
/// Lines are padded at their end to a multiple of `alignment` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedAllocInterface {
    alignment: usize,
}

impl AlignedAllocInterface {
    /// An interface for the given alignment in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidParameter`] unless `alignment` is a power of two.
    pub fn new(alignment: usize) -> Result<Self, ImageError> {
        if !alignment.is_power_of_two() {
            return Err(ImageError::InvalidParameter(format!(
                "alignment must be a power of two, got {alignment}"
            )));
        }
        Ok(Self { alignment })
    }

    /// The alignment in bytes.
    pub fn alignment(&self) -> usize {
        self.alignment
    }
}

impl ExternalInterface for AlignedAllocInterface {
    fn allocate_data(
        &self,
        data_type: DataType,
        sizes: &[usize],
        strides: &mut Vec<isize>,
        tensor: &Tensor,
        tensor_stride: &mut isize,
    ) -> Result<Option<ExternalAllocation>, ImageError> {
        let sample_size = data_type.size_of();
        if self.alignment % sample_size != 0 {
            return Err(ImageError::InvalidParameter(format!(
                "alignment {} is not a multiple of the {data_type} sample size",
                self.alignment
            )));
        }
        let telems = tensor.elements();
        let line = sizes.first().copied().unwrap_or(1);
        let line_bytes = line
            .checked_mul(telems * sample_size)
            .ok_or(ImageError::SizeExceedsLimit)?;
        let padded = round_up(line_bytes, self.alignment);
        let lines = number_of_pixels(sizes.get(1..).unwrap_or(&[]))?;
        let total = padded
            .checked_mul(lines)
            .and_then(|b| b.checked_add(self.alignment))
            .ok_or(ImageError::SizeExceedsLimit)?;

        *tensor_stride = 1;
        strides.clear();
        let mut stride = telems as isize;
        for (d, &n) in sizes.iter().enumerate() {
            strides.push(stride);
            stride = if d == 0 {
                (padded / sample_size) as isize
            } else {
                stride * n as isize
            };
        }

        let segment = DataSegment::allocate(total)?;
        let address = segment.as_ptr() as usize;
        let origin = round_up(address, self.alignment) - address;
        Ok(Some(ExternalAllocation { segment, origin }))
    }
}
