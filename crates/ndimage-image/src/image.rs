use std::fmt;
use std::sync::Arc;

use ndimage_core::{DataSegment, DataType, Sample};

use crate::error::ImageError;
use crate::external::ExternalInterface;
use crate::physical::PixelSize;
use crate::strides::{
    coordinates_to_index, data_block_size_and_start, data_block_size_and_start_with_tensor,
    has_valid_strides, index_to_coordinates, normal_strides, number_of_pixels,
    simple_stride_and_start, CoordinatesComputer,
};
use crate::tensor::Tensor;

/// An n-dimensional image with a tensor of samples at each pixel.
///
/// An image is either *raw*, holding only its properties, or *forged*, bound to a block of
/// memory. Sizes, strides, tensor and data type can only be changed while raw. Views created
/// from a forged image share its block; the block is released when the last image holding it
/// is stripped or dropped.
///
/// Strides count samples and may be negative or zero. The origin is the byte offset of the
/// first sample of the first pixel inside the block.
///
/// # Examples
///
/// ```rust
/// use ndimage_core::DataType;
/// use ndimage_image::Image;
///
/// let mut img = Image::raw(&[5, 8, 7], 3, DataType::SFloat);
/// assert!(!img.is_forged());
///
/// img.forge().unwrap();
/// assert_eq!(img.strides(), &[3, 15, 120]);
/// assert_eq!(img.tensor_stride(), 1);
/// assert_eq!(img.number_of_samples(), 840);
/// ```
#[derive(Debug, Clone)]
pub struct Image {
    pub(crate) data_type: DataType,
    pub(crate) sizes: Vec<usize>,
    pub(crate) strides: Vec<isize>,
    pub(crate) tensor: Tensor,
    pub(crate) tensor_stride: isize,
    pub(crate) protect: bool,
    pub(crate) color_space: String,
    pub(crate) pixel_size: PixelSize,
    pub(crate) data_block: Option<DataSegment>,
    pub(crate) origin: usize,
    pub(crate) external_data: bool,
    pub(crate) external_interface: Option<Arc<dyn ExternalInterface>>,
}

impl Default for Image {
    fn default() -> Self {
        Self::raw(&[], 1, DataType::SFloat)
    }
}

impl Image {
    /// Creates a raw image with a column-vector tensor of `tensor_elements` elements.
    pub fn raw(sizes: &[usize], tensor_elements: usize, data_type: DataType) -> Self {
        Self {
            data_type,
            sizes: sizes.to_vec(),
            strides: normal_strides(sizes, tensor_elements),
            tensor: Tensor::vector(tensor_elements),
            tensor_stride: 1,
            protect: false,
            color_space: String::new(),
            pixel_size: PixelSize::default(),
            data_block: None,
            origin: 0,
            external_data: false,
            external_interface: None,
        }
    }

    /// Creates a forged image with a column-vector tensor of `tensor_elements` elements.
    ///
    /// The samples are zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the image has no pixels or is too large.
    pub fn new(
        sizes: &[usize],
        tensor_elements: usize,
        data_type: DataType,
    ) -> Result<Self, ImageError> {
        let mut img = Self::raw(sizes, tensor_elements, data_type);
        img.forge()?;
        Ok(img)
    }

    /// A raw image with the properties of `self`: sizes, strides, tensor, data type, pixel
    /// size, color space and external interface.
    pub fn similar(&self) -> Self {
        Self {
            protect: false,
            data_block: None,
            origin: 0,
            external_data: false,
            ..self.clone()
        }
    }

    /// As [`Image::similar`], with a different data type.
    pub fn similar_with_type(&self, data_type: DataType) -> Self {
        let mut out = self.similar();
        out.data_type = data_type;
        out
    }

    /// A forged 0-D image holding `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails.
    pub fn from_scalar<T: Sample>(value: T) -> Result<Self, ImageError> {
        Self::from_vec(&[], 1, vec![value])
    }

    /// A forged image that takes ownership of `data`, with normal strides.
    ///
    /// `data` holds the tensor elements of each pixel together, pixels with dimension 0
    /// running fastest.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ArraySizeMismatch`] if `data` does not hold exactly one sample per
    /// pixel and tensor element, and [`ImageError::EmptyImage`] if it holds none.
    pub fn from_vec<T: Sample>(
        sizes: &[usize],
        tensor_elements: usize,
        data: Vec<T>,
    ) -> Result<Self, ImageError> {
        let expected = number_of_pixels(sizes)?
            .checked_mul(tensor_elements)
            .ok_or(ImageError::SizeExceedsLimit)?;
        if expected == 0 {
            return Err(ImageError::EmptyImage);
        }
        if data.len() != expected {
            return Err(ImageError::ArraySizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let mut img = Self::raw(sizes, tensor_elements, T::DATA_TYPE);
        img.data_block = Some(DataSegment::from_vec(data));
        // the block has the alignment of `T`; reusing it for another type is not allowed
        img.external_data = true;
        Ok(img)
    }

    pub(crate) fn check_forged(&self) -> Result<(), ImageError> {
        if self.is_forged() {
            Ok(())
        } else {
            Err(ImageError::ImageNotForged)
        }
    }

    fn check_raw(&self) -> Result<(), ImageError> {
        if self.is_forged() {
            Err(ImageError::ImageNotRaw)
        } else {
            Ok(())
        }
    }

    /// Sets the sizes of a raw image. The strides are reset to normal strides.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotRaw`] if the image is forged.
    pub fn set_sizes(&mut self, sizes: &[usize]) -> Result<(), ImageError> {
        self.check_raw()?;
        self.sizes = sizes.to_vec();
        self.strides = normal_strides(sizes, self.tensor.elements());
        self.tensor_stride = 1;
        Ok(())
    }

    /// Sets the strides of a raw image, to be used by [`Image::forge`] if they are valid.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotRaw`] if the image is forged and
    /// [`ImageError::ArraySizeMismatch`] if there is not one stride per dimension.
    pub fn set_strides(&mut self, strides: &[isize]) -> Result<(), ImageError> {
        self.check_raw()?;
        if strides.len() != self.sizes.len() {
            return Err(ImageError::ArraySizeMismatch {
                expected: self.sizes.len(),
                actual: strides.len(),
            });
        }
        self.strides = strides.to_vec();
        Ok(())
    }

    /// Sets the tensor stride of a raw image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotRaw`] if the image is forged.
    pub fn set_tensor_stride(&mut self, tensor_stride: isize) -> Result<(), ImageError> {
        self.check_raw()?;
        self.tensor_stride = tensor_stride;
        Ok(())
    }

    /// Sets the tensor of a raw image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotRaw`] if the image is forged.
    pub fn set_tensor(&mut self, tensor: Tensor) -> Result<(), ImageError> {
        self.check_raw()?;
        self.tensor = tensor;
        Ok(())
    }

    /// Sets the data type of a raw image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotRaw`] if the image is forged.
    pub fn set_data_type(&mut self, data_type: DataType) -> Result<(), ImageError> {
        self.check_raw()?;
        self.data_type = data_type;
        Ok(())
    }

    /// Sets the interface that allocates data when the image is forged.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotRaw`] if the image is forged.
    pub fn set_external_interface(
        &mut self,
        interface: Option<Arc<dyn ExternalInterface>>,
    ) -> Result<(), ImageError> {
        self.check_raw()?;
        self.external_interface = interface;
        Ok(())
    }

    /// Sets the physical pixel size.
    pub fn set_pixel_size(&mut self, pixel_size: PixelSize) {
        self.pixel_size = pixel_size;
    }

    /// Sets the name of the color space.
    pub fn set_color_space(&mut self, color_space: impl Into<String>) {
        self.color_space = color_space.into();
    }

    /// Sets the protect flag and returns its previous value.
    ///
    /// [`Image::reforge`] never changes the data type of a protected image.
    pub fn protect(&mut self, protect: bool) -> bool {
        std::mem::replace(&mut self.protect, protect)
    }

    /// Binds the image to a block of memory.
    ///
    /// Does nothing if the image is already forged. The external interface, if any, is asked
    /// for the memory first. Otherwise the strides are kept if they are valid and address
    /// exactly as many samples as the image has, and replaced by normal strides if not.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::EmptyImage`] if a size or the number of tensor elements is zero,
    /// [`ImageError::SizeExceedsLimit`] if the number of bytes overflows, and any error from
    /// the external interface or the allocator.
    pub fn forge(&mut self) -> Result<(), ImageError> {
        if self.is_forged() {
            return Ok(());
        }
        let telems = self.tensor.elements();
        let npix = number_of_pixels(&self.sizes)?;
        if npix == 0 || telems == 0 {
            return Err(ImageError::EmptyImage);
        }
        let sample_size = self.data_type.size_of();
        let nsamples = npix
            .checked_mul(telems)
            .ok_or(ImageError::SizeExceedsLimit)?;
        let nbytes = nsamples
            .checked_mul(sample_size)
            .filter(|&n| n <= isize::MAX as usize)
            .ok_or(ImageError::SizeExceedsLimit)?;

        if let Some(interface) = self.external_interface.clone() {
            let mut strides = self.strides.clone();
            let mut tensor_stride = self.tensor_stride;
            let allocation = interface.allocate_data(
                self.data_type,
                &self.sizes,
                &mut strides,
                &self.tensor,
                &mut tensor_stride,
            )?;
            if let Some(allocation) = allocation {
                if strides.len() != self.sizes.len() {
                    return Err(ImageError::InvalidStrides);
                }
                let (span, start) = data_block_size_and_start_with_tensor(
                    &self.sizes,
                    &strides,
                    telems,
                    tensor_stride,
                );
                let lowest = allocation.origin as isize + start * sample_size as isize;
                let highest = lowest + (span * sample_size) as isize;
                if lowest < 0 || highest as usize > allocation.segment.len() {
                    return Err(ImageError::ExternalAllocationTooSmall);
                }
                self.strides = strides;
                self.tensor_stride = tensor_stride;
                self.origin = allocation.origin;
                self.data_block = Some(allocation.segment);
                self.external_data = true;
                return Ok(());
            }
            log::debug!("external interface declined, allocating {nbytes} bytes");
        }

        let (span, mut start) = data_block_size_and_start_with_tensor(
            &self.sizes,
            &self.strides,
            telems,
            self.tensor_stride,
        );
        if !has_valid_strides(&self.sizes, &self.strides, telems, self.tensor_stride)
            || span != nsamples
        {
            log::debug!(
                "strides {:?} with tensor stride {} are not compact, using normal strides",
                self.strides,
                self.tensor_stride
            );
            self.strides = normal_strides(&self.sizes, telems);
            self.tensor_stride = 1;
            start = 0;
        }
        self.data_block = Some(DataSegment::allocate(nbytes)?);
        self.origin = start.unsigned_abs() * sample_size;
        self.external_data = false;
        Ok(())
    }

    /// Releases the image's reference to its block. The image becomes raw.
    ///
    /// The block itself is freed when no other image refers to it.
    pub fn strip(&mut self) {
        self.data_block = None;
        self.origin = 0;
        self.external_data = false;
    }

    /// Makes the image forged with the given sizes, tensor elements and data type.
    ///
    /// Nothing happens if the image already has these properties. If the block is owned by
    /// this image alone, is compact and has the right number of bytes, it is reused with
    /// normal strides. Otherwise the image is stripped and forged anew, which resets its
    /// tensor shape, color space and pixel size. A protected image keeps its data type.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Image::forge`].
    pub fn reforge(
        &mut self,
        sizes: &[usize],
        tensor_elements: usize,
        data_type: DataType,
    ) -> Result<(), ImageError> {
        let data_type = if self.protect {
            self.data_type
        } else {
            data_type
        };
        if self.is_forged() && !self.is_singleton_expanded() {
            if self.sizes == sizes
                && self.tensor.elements() == tensor_elements
                && self.data_type == data_type
            {
                return Ok(());
            }
            let old_bytes = self.number_of_samples().saturating_mul(self.data_type.size_of());
            let new_bytes = number_of_pixels(sizes)?
                .checked_mul(tensor_elements)
                .and_then(|n| n.checked_mul(data_type.size_of()))
                .ok_or(ImageError::SizeExceedsLimit)?;
            if !self.external_data
                && !self.protect
                && !self.is_shared()
                && self.has_contiguous_data()
                && old_bytes == new_bytes
            {
                log::debug!("reforge reuses the data block of {old_bytes} bytes");
                self.data_type = data_type;
                self.sizes = sizes.to_vec();
                self.tensor = Tensor::vector(tensor_elements);
                self.tensor_stride = 1;
                self.strides = normal_strides(sizes, tensor_elements);
                self.origin = 0;
                return Ok(());
            }
        }
        self.strip();
        self.tensor = Tensor::vector(tensor_elements);
        self.color_space.clear();
        self.pixel_size.clear();
        self.data_type = data_type;
        self.sizes = sizes.to_vec();
        self.strides = normal_strides(sizes, tensor_elements);
        self.tensor_stride = 1;
        self.forge()
    }

    /// As [`Image::reforge`], taking sizes, tensor and data type from `other`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Image::forge`].
    pub fn reforge_like(&mut self, other: &Image) -> Result<(), ImageError> {
        self.reforge(&other.sizes, other.tensor.elements(), other.data_type)?;
        self.tensor = other.tensor;
        Ok(())
    }

    /// The sample type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Size of one sample in bytes.
    #[inline]
    pub fn sample_size(&self) -> usize {
        self.data_type.size_of()
    }

    /// Number of spatial dimensions.
    #[inline]
    pub fn dimensionality(&self) -> usize {
        self.sizes.len()
    }

    /// Size along each dimension.
    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Size along dimension `dim`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::IllegalDimension`] if `dim` is not a dimension of the image.
    pub fn size(&self, dim: usize) -> Result<usize, ImageError> {
        self.sizes
            .get(dim)
            .copied()
            .ok_or(ImageError::IllegalDimension {
                dim,
                dimensionality: self.sizes.len(),
            })
    }

    /// Number of pixels, 1 for a 0-D image.
    ///
    /// Saturates at `usize::MAX` for raw images too large to forge.
    pub fn number_of_pixels(&self) -> usize {
        number_of_pixels(&self.sizes).unwrap_or(usize::MAX)
    }

    /// Number of samples: pixels times tensor elements. Saturates like
    /// [`Image::number_of_pixels`].
    pub fn number_of_samples(&self) -> usize {
        self.number_of_pixels().saturating_mul(self.tensor.elements())
    }

    /// Stride along each dimension, in samples.
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Stride along dimension `dim`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::IllegalDimension`] if `dim` is not a dimension of the image.
    pub fn stride(&self, dim: usize) -> Result<isize, ImageError> {
        self.strides
            .get(dim)
            .copied()
            .ok_or(ImageError::IllegalDimension {
                dim,
                dimensionality: self.sizes.len(),
            })
    }

    /// The tensor at each pixel.
    #[inline]
    pub fn tensor(&self) -> &Tensor {
        &self.tensor
    }

    /// Number of tensor elements.
    #[inline]
    pub fn tensor_elements(&self) -> usize {
        self.tensor.elements()
    }

    /// Distance in samples between the tensor elements of a pixel.
    #[inline]
    pub fn tensor_stride(&self) -> isize {
        self.tensor_stride
    }

    /// Returns true if there is a single tensor element.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.tensor.is_scalar()
    }

    /// Name of the color space, empty if none.
    pub fn color_space(&self) -> &str {
        &self.color_space
    }

    /// Returns true if a color space is set.
    pub fn is_color(&self) -> bool {
        !self.color_space.is_empty()
    }

    /// The physical pixel size.
    pub fn pixel_size(&self) -> &PixelSize {
        &self.pixel_size
    }

    /// Returns true if the protect flag is set.
    pub fn is_protected(&self) -> bool {
        self.protect
    }

    /// The interface used to allocate data, if any.
    pub fn external_interface(&self) -> Option<&Arc<dyn ExternalInterface>> {
        self.external_interface.as_ref()
    }

    /// Returns true if the data block was not allocated by [`Image::forge`] itself.
    pub fn is_external_data(&self) -> bool {
        self.external_data
    }

    /// Returns true if the image is bound to a block of memory.
    #[inline]
    pub fn is_forged(&self) -> bool {
        self.data_block.is_some()
    }

    /// The data block, if forged.
    pub fn data_block(&self) -> Option<&DataSegment> {
        self.data_block.as_ref()
    }

    /// Byte offset of the origin inside the data block.
    #[inline]
    pub fn origin_offset(&self) -> usize {
        self.origin
    }

    /// Pointer to the first sample of the first pixel.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotForged`] if the image is raw.
    pub fn origin(&self) -> Result<*mut u8, ImageError> {
        match &self.data_block {
            Some(block) => Ok(block.as_ptr().wrapping_add(self.origin)),
            None => Err(ImageError::ImageNotForged),
        }
    }

    /// Pointer to the sample `offset` samples away from the origin. Not checked.
    pub(crate) fn pointer_at(&self, offset: isize) -> *mut u8 {
        match &self.data_block {
            Some(block) => block
                .as_ptr()
                .wrapping_add(self.origin)
                .wrapping_offset(offset * self.sample_size() as isize),
            None => std::ptr::null_mut(),
        }
    }

    /// Number of images sharing the data block, 0 if raw.
    pub fn share_count(&self) -> usize {
        self.data_block.as_ref().map_or(0, |b| b.strong_count())
    }

    /// Returns true if another image shares the data block.
    pub fn is_shared(&self) -> bool {
        self.share_count() > 1
    }

    /// Returns true if both images are bound to the same block.
    pub fn shares_data(&self, other: &Image) -> bool {
        match (&self.data_block, &other.data_block) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Span in samples of the pixels and the offset of the lowest one, tensor elements
    /// included.
    pub fn data_block_size_and_start(&self) -> (usize, isize) {
        data_block_size_and_start_with_tensor(
            &self.sizes,
            &self.strides,
            self.tensor.elements(),
            self.tensor_stride,
        )
    }

    /// Returns true if no two pixels or tensor elements share a sample.
    pub fn has_valid_strides(&self) -> bool {
        has_valid_strides(
            &self.sizes,
            &self.strides,
            self.tensor.elements(),
            self.tensor_stride,
        )
    }

    /// Returns true if the strides are those [`Image::forge`] uses by default.
    pub fn has_normal_strides(&self) -> bool {
        (self.tensor.is_scalar() || self.tensor_stride == 1)
            && self
                .sizes
                .iter()
                .zip(&self.strides)
                .zip(normal_strides(&self.sizes, self.tensor.elements()))
                .all(|((&n, &s), normal)| n == 1 || s == normal)
    }

    /// Returns true if the samples fill their span without gaps, in any order.
    pub fn has_contiguous_data(&self) -> bool {
        self.is_forged()
            && self.has_valid_strides()
            && self.data_block_size_and_start().0 == self.number_of_samples()
    }

    /// The simple stride and the offset of the lowest pixel, if all pixels lie on one line
    /// with constant step. Tensor elements are not considered.
    pub fn simple_stride_and_origin(&self) -> Option<(isize, isize)> {
        simple_stride_and_start(&self.sizes, &self.strides)
    }

    /// Returns true if all pixels lie on one line with constant step.
    pub fn has_simple_stride(&self) -> bool {
        self.simple_stride_and_origin().is_some()
    }

    /// Returns true if a dimension longer than 1 has stride 0, or the tensor has more than
    /// one element and tensor stride 0.
    pub fn is_singleton_expanded(&self) -> bool {
        (self.tensor.elements() > 1 && self.tensor_stride == 0)
            || self
                .sizes
                .iter()
                .zip(&self.strides)
                .any(|(&n, &s)| n > 1 && s == 0)
    }

    /// Returns true if any dimension has size 1.
    pub fn has_singleton_dimension(&self) -> bool {
        self.sizes.contains(&1)
    }

    /// Returns true if both images order their dimensions by stride the same way.
    ///
    /// Dimensions of size 1 are ignored. Images of different dimensionality never match.
    pub fn has_same_dimension_order(&self, other: &Image) -> bool {
        if self.sizes.len() != other.sizes.len() {
            return false;
        }
        let order = |img: &Image| {
            let mut dims: Vec<usize> = (0..img.sizes.len())
                .filter(|&d| img.sizes[d] > 1)
                .collect();
            dims.sort_by_key(|&d| img.strides[d].abs());
            dims
        };
        order(self) == order(other)
    }

    /// Offset in samples of the pixel at `coords` from the origin.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ArraySizeMismatch`] if `coords` has the wrong length and
    /// [`ImageError::IndexOutOfRange`] if it lies outside the image.
    pub fn offset(&self, coords: &[usize]) -> Result<isize, ImageError> {
        self.check_coordinates(coords)?;
        Ok(coords
            .iter()
            .zip(&self.strides)
            .map(|(&c, &s)| c as isize * s)
            .sum())
    }

    /// Pointer to the first tensor element of the pixel at `coords`.
    ///
    /// # Errors
    ///
    /// As [`Image::offset`], and [`ImageError::ImageNotForged`] if the image is raw.
    pub fn pointer(&self, coords: &[usize]) -> Result<*mut u8, ImageError> {
        let offset = self.offset(coords)?;
        self.origin()?;
        Ok(self.pointer_at(offset))
    }

    /// Linear index of the pixel at `coords`, dimension 0 running fastest.
    ///
    /// # Errors
    ///
    /// As [`Image::offset`].
    pub fn index(&self, coords: &[usize]) -> Result<usize, ImageError> {
        self.check_coordinates(coords)?;
        Ok(coordinates_to_index(&self.sizes, coords))
    }

    /// Coordinates of the pixel with linear index `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::IndexOutOfRange`] if there is no such pixel.
    pub fn index_to_coordinates(&self, index: usize) -> Result<Vec<usize>, ImageError> {
        if index >= self.number_of_pixels() {
            return Err(ImageError::IndexOutOfRange);
        }
        Ok(index_to_coordinates(&self.sizes, index))
    }

    /// Coordinates of the pixel at `offset` samples from the origin.
    ///
    /// The offset must be that of a pixel of the image, otherwise the result is meaningless.
    pub fn offset_to_coordinates(&self, offset: isize) -> Vec<usize> {
        CoordinatesComputer::new(&self.sizes, &self.strides).coordinates(offset)
    }

    /// Returns a computer that repeatedly converts offsets to coordinates.
    pub fn offset_to_coordinates_computer(&self) -> CoordinatesComputer {
        CoordinatesComputer::new(&self.sizes, &self.strides)
    }

    pub(crate) fn check_coordinates(&self, coords: &[usize]) -> Result<(), ImageError> {
        if coords.len() != self.sizes.len() {
            return Err(ImageError::ArraySizeMismatch {
                expected: self.sizes.len(),
                actual: coords.len(),
            });
        }
        if coords.iter().zip(&self.sizes).any(|(&c, &n)| c >= n) {
            return Err(ImageError::IndexOutOfRange);
        }
        Ok(())
    }

    pub(crate) fn span_without_tensor(&self) -> (usize, isize) {
        data_block_size_and_start(&self.sizes, &self.strides)
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_forged() { "Forged" } else { "Raw" };
        writeln!(
            f,
            "{state} image, {}D, {}, {}",
            self.sizes.len(),
            self.data_type,
            self.tensor
        )?;
        writeln!(f, "  sizes: {:?}", self.sizes)?;
        writeln!(
            f,
            "  strides: {:?}, tensor stride: {}",
            self.strides, self.tensor_stride
        )?;
        if !self.pixel_size.is_defined() {
            writeln!(f, "  pixel size: undefined")?;
        } else {
            writeln!(f, "  pixel size: {}", self.pixel_size)?;
        }
        if self.is_color() {
            writeln!(f, "  color space: {}", self.color_space)?;
        }
        if let Some(block) = &self.data_block {
            writeln!(
                f,
                "  data block: {} bytes, origin at byte {}, shared by {}",
                block.len(),
                self.origin,
                block.strong_count()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::AlignedAllocInterface;

    #[test]
    fn test_forge_normal_strides() -> Result<(), ImageError> {
        let mut img = Image::raw(&[5, 8, 7], 3, DataType::UInt16);
        img.forge()?;
        assert_eq!(img.strides(), &[3, 15, 120]);
        assert_eq!(img.tensor_stride(), 1);
        assert_eq!(img.origin_offset(), 0);
        assert_eq!(img.data_block().map(|b| b.len()), Some(840 * 2));
        assert!(img.has_normal_strides());
        assert!(img.has_contiguous_data());
        Ok(())
    }

    #[test]
    fn test_forge_custom_strides() -> Result<(), ImageError> {
        let mut img = Image::raw(&[5, 8, 7], 3, DataType::SFloat);
        img.set_tensor_stride(5)?;
        img.set_strides(&[1, 15, 120])?;
        img.forge()?;
        assert_eq!(img.strides(), &[1, 15, 120]);
        assert_eq!(img.tensor_stride(), 5);
        assert_eq!(img.origin_offset(), 0);
        assert!(!img.has_normal_strides());

        // not compact: replaced by normal strides
        img.strip();
        img.set_tensor_stride(5)?;
        img.set_strides(&[1, 20, 160])?;
        img.forge()?;
        assert_eq!(img.strides(), &[3, 15, 120]);
        assert_eq!(img.tensor_stride(), 1);

        // mirrored: the origin moves to the far end of the block
        img.strip();
        img.set_tensor_stride(5)?;
        img.set_strides(&[1, -15, 120])?;
        img.forge()?;
        assert_eq!(img.strides(), &[1, -15, 120]);
        assert_eq!(img.origin_offset(), 15 * 7 * 4);
        Ok(())
    }

    #[test]
    fn test_forge_errors() -> Result<(), ImageError> {
        let mut img = Image::raw(&[0, 4], 1, DataType::UInt8);
        assert_eq!(img.forge(), Err(ImageError::EmptyImage));
        let mut img = Image::raw(&[usize::MAX / 2, 4], 1, DataType::UInt8);
        assert_eq!(img.number_of_pixels(), usize::MAX);
        assert_eq!(img.number_of_samples(), usize::MAX);
        assert!(!img.has_simple_stride());
        assert_eq!(img.forge(), Err(ImageError::SizeExceedsLimit));
        let mut img = Image::raw(&[3, 3], 2, DataType::SFloat);
        img.set_sizes(&[usize::MAX, 3])?;
        assert_eq!(img.forge(), Err(ImageError::SizeExceedsLimit));
        let mut img = Image::raw(&[2, 2], usize::MAX / 2, DataType::DComplex);
        assert_eq!(img.forge(), Err(ImageError::SizeExceedsLimit));
        let mut img = Image::default();
        assert_eq!(
            img.reforge(&[usize::MAX, 2], 1, DataType::UInt8),
            Err(ImageError::SizeExceedsLimit)
        );
        Ok(())
    }

    #[test]
    fn test_raw_only_setters() -> Result<(), ImageError> {
        let mut img = Image::new(&[4, 4], 1, DataType::UInt8)?;
        assert_eq!(img.set_sizes(&[2, 2]), Err(ImageError::ImageNotRaw));
        assert_eq!(img.set_data_type(DataType::SFloat), Err(ImageError::ImageNotRaw));
        img.set_color_space("sRGB");
        assert!(img.is_color());
        img.strip();
        img.set_sizes(&[2, 2])?;
        assert_eq!(img.strides(), &[1, 2]);
        assert_eq!(
            img.set_strides(&[1]),
            Err(ImageError::ArraySizeMismatch {
                expected: 2,
                actual: 1
            })
        );
        Ok(())
    }

    #[test]
    fn test_strip_releases_block() -> Result<(), ImageError> {
        let mut img = Image::new(&[10, 10], 1, DataType::SFloat)?;
        let mut view = img.clone();
        assert_eq!(img.share_count(), 2);
        assert!(img.shares_data(&view));
        img.strip();
        assert!(!img.is_forged());
        assert_eq!(view.share_count(), 1);
        view.strip();
        assert_eq!(view.share_count(), 0);
        Ok(())
    }

    #[test]
    fn test_reforge() -> Result<(), ImageError> {
        let mut img = Image::new(&[10, 20], 1, DataType::SFloat)?;
        let before = img.origin()?;
        // same number of bytes: the block is reused
        img.reforge(&[20, 10], 2, DataType::UInt16)?;
        assert_eq!(img.origin()?, before);
        assert_eq!(img.strides(), &[2, 40]);
        // shared: a new block is allocated
        let other = img.clone();
        img.reforge(&[20, 10], 1, DataType::SFloat)?;
        assert!(!img.shares_data(&other));
        // protected: the data type is kept
        img.protect(true);
        img.reforge(&[5, 5], 1, DataType::UInt8)?;
        assert_eq!(img.data_type(), DataType::SFloat);
        assert_eq!(img.sizes(), &[5, 5]);
        Ok(())
    }

    #[test]
    fn test_queries() -> Result<(), ImageError> {
        let img = Image::new(&[4, 3, 2], 1, DataType::SInt32)?;
        assert_eq!(img.dimensionality(), 3);
        assert_eq!(img.size(1)?, 3);
        assert!(img.size(3).is_err());
        assert_eq!(img.stride(2)?, 12);
        assert_eq!(img.offset(&[1, 2, 1])?, 1 + 8 + 12);
        assert_eq!(img.offset(&[4, 0, 0]), Err(ImageError::IndexOutOfRange));
        assert_eq!(img.index(&[1, 2, 1])?, 21);
        assert_eq!(img.index_to_coordinates(21)?, vec![1, 2, 1]);
        assert_eq!(img.offset_to_coordinates(21), vec![1, 2, 1]);
        assert!(img.has_simple_stride());
        assert!(!img.is_singleton_expanded());
        assert!(img.to_string().starts_with("Forged image, 3D, SINT32"));
        Ok(())
    }

    #[test]
    fn test_from_vec_and_scalar() -> Result<(), ImageError> {
        let img = Image::from_vec(&[3, 2], 1, vec![1u8, 2, 3, 4, 5, 6])?;
        assert_eq!(img.data_type(), DataType::UInt8);
        assert!(img.is_external_data());
        let value = unsafe { *img.pointer(&[1, 1])? };
        assert_eq!(value, 5);
        assert!(matches!(
            Image::from_vec(&[3, 2], 1, vec![1u8]),
            Err(ImageError::ArraySizeMismatch { .. })
        ));
        let scalar = Image::from_scalar(2.5f64)?;
        assert_eq!(scalar.dimensionality(), 0);
        assert_eq!(scalar.number_of_pixels(), 1);
        Ok(())
    }

    #[test]
    fn test_external_interface() -> Result<(), ImageError> {
        let mut img = Image::raw(&[10, 3], 1, DataType::UInt8);
        img.set_external_interface(Some(Arc::new(AlignedAllocInterface::new(16)?)))?;
        img.forge()?;
        assert_eq!(img.strides(), &[1, 16]);
        assert!(img.is_external_data());
        assert_eq!(img.origin()? as usize % 16, 0);
        assert!(!img.has_contiguous_data());
        Ok(())
    }
}
