//! Line buffers handed to line filters.
//!
//! A [`LineBuffer`] describes one line of samples: either pixels inside an image or a
//! temporary buffer the framework filled by converting them. Filters read and write through
//! the typed [`InputLine`] and [`OutputLine`] views, which check the buffer type once and the
//! pixel index on every access.

use std::marker::PhantomData;

use ndimage_core::{ConstLine, DataSegment, DataType, MutLine, Sample};
use ndimage_image::Image;

use crate::error::FrameworkError;

/// Description of one line of samples.
///
/// Strides count samples, not bytes. `border` pixels before the first and after the last pixel
/// of the line are readable too.
#[derive(Debug, Clone, Copy)]
pub struct LineBuffer {
    pub(crate) ptr: *mut u8,
    pub(crate) data_type: DataType,
    pub(crate) length: usize,
    pub(crate) border: usize,
    pub(crate) stride: isize,
    pub(crate) tensor_stride: isize,
    pub(crate) tensor_length: usize,
}

impl LineBuffer {
    pub(crate) fn new(data_type: DataType, tensor_length: usize) -> Self {
        Self {
            ptr: std::ptr::null_mut(),
            data_type,
            length: 0,
            border: 0,
            stride: tensor_length as isize,
            tensor_stride: 1,
            tensor_length,
        }
    }

    /// A line of `img` running along `dim`, not yet pointing anywhere.
    pub(crate) fn image_line(img: &Image, dim: usize) -> Self {
        Self {
            stride: img.strides()[dim],
            tensor_stride: img.tensor_stride(),
            ..Self::new(img.data_type(), img.tensor_elements())
        }
    }

    pub(crate) fn as_const_line(&self) -> ConstLine {
        ConstLine {
            ptr: self.ptr.cast_const(),
            data_type: self.data_type,
            stride: self.stride,
            tensor_stride: self.tensor_stride,
        }
    }

    pub(crate) fn as_mut_line(&self) -> MutLine {
        MutLine {
            ptr: self.ptr,
            data_type: self.data_type,
            stride: self.stride,
            tensor_stride: self.tensor_stride,
        }
    }

    /// Type of the samples.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Number of pixels on the line, not counting the border.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of extra pixels available at each end.
    pub fn border(&self) -> usize {
        self.border
    }

    /// Distance between pixels. 0 means all pixels are the same sample.
    pub fn stride(&self) -> isize {
        self.stride
    }

    /// Distance between tensor elements.
    pub fn tensor_stride(&self) -> isize {
        self.tensor_stride
    }

    /// Number of tensor elements per pixel.
    pub fn tensor_length(&self) -> usize {
        self.tensor_length
    }

    /// Pointer to the first tensor element of the first pixel.
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr
    }

    fn typed<T: Sample>(&self) -> Result<*mut T, FrameworkError> {
        if T::DATA_TYPE != self.data_type {
            return Err(FrameworkError::BufferTypeMismatch {
                expected: T::DATA_TYPE,
                actual: self.data_type,
            });
        }
        Ok(self.ptr.cast())
    }

    fn sample_offset(&self, pixel: isize, tensor_index: usize) -> isize {
        let border = self.border as isize;
        assert!(
            pixel >= -border && pixel < self.length as isize + border,
            "pixel {pixel} outside of line of length {} with border {border}",
            self.length
        );
        assert!(
            tensor_index < self.tensor_length,
            "tensor element {tensor_index} outside of {} elements",
            self.tensor_length
        );
        pixel * self.stride + tensor_index as isize * self.tensor_stride
    }
}

/// Read access to a line, as samples of type `T`.
#[derive(Debug, Clone, Copy)]
pub struct InputLine<'a, T> {
    buffer: LineBuffer,
    ptr: *const T,
    _marker: PhantomData<&'a T>,
}

impl<'a, T: Sample> InputLine<'a, T> {
    pub(crate) fn new(buffer: &'a LineBuffer) -> Result<Self, FrameworkError> {
        let ptr = buffer.typed::<T>()?;
        Ok(Self {
            buffer: *buffer,
            ptr,
            _marker: PhantomData,
        })
    }

    /// Number of pixels on the line.
    pub fn len(&self) -> usize {
        self.buffer.length
    }

    /// Returns true if the line has no pixels.
    pub fn is_empty(&self) -> bool {
        self.buffer.length == 0
    }

    /// Number of tensor elements per pixel.
    pub fn tensor_length(&self) -> usize {
        self.buffer.tensor_length
    }

    /// Number of border pixels readable at each end.
    pub fn border(&self) -> usize {
        self.buffer.border
    }

    /// Tensor element `tensor_index` of pixel `pixel`.
    ///
    /// # Panics
    ///
    /// Panics if the pixel or tensor element is outside the line.
    pub fn get(&self, pixel: usize, tensor_index: usize) -> T {
        self.get_with_border(pixel as isize, tensor_index)
    }

    /// As [`InputLine::get`], also accepting pixels in the border, from `-border` to
    /// `len + border - 1`.
    ///
    /// # Panics
    ///
    /// Panics if the pixel or tensor element is outside the line and its border.
    pub fn get_with_border(&self, pixel: isize, tensor_index: usize) -> T {
        let offset = self.buffer.sample_offset(pixel, tensor_index);
        // SAFETY: the framework guarantees that every pixel of the line and its border is
        // readable for the duration of the filter call, and the offset was bounds checked
        unsafe { *self.ptr.offset(offset) }
    }

    /// The samples of tensor element `tensor_index` along the line.
    pub fn samples(&self, tensor_index: usize) -> impl Iterator<Item = T> + '_ {
        (0..self.len()).map(move |i| self.get(i, tensor_index))
    }
}

/// Write access to a line, as samples of type `T`.
///
/// The framework hands each line to exactly one filter call, so writes never race.
#[derive(Debug)]
pub struct OutputLine<'a, T> {
    buffer: LineBuffer,
    ptr: *mut T,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T: Sample> OutputLine<'a, T> {
    pub(crate) fn new(buffer: &'a LineBuffer) -> Result<Self, FrameworkError> {
        let ptr = buffer.typed::<T>()?;
        Ok(Self {
            buffer: *buffer,
            ptr,
            _marker: PhantomData,
        })
    }

    /// Number of pixels on the line.
    pub fn len(&self) -> usize {
        self.buffer.length
    }

    /// Returns true if the line has no pixels.
    pub fn is_empty(&self) -> bool {
        self.buffer.length == 0
    }

    /// Number of tensor elements per pixel.
    pub fn tensor_length(&self) -> usize {
        self.buffer.tensor_length
    }

    /// Tensor element `tensor_index` of pixel `pixel`.
    ///
    /// # Panics
    ///
    /// Panics if the pixel or tensor element is outside the line.
    pub fn get(&self, pixel: usize, tensor_index: usize) -> T {
        let offset = self.buffer.sample_offset(pixel as isize, tensor_index);
        // SAFETY: see `set`
        unsafe { *self.ptr.offset(offset) }
    }

    /// Writes tensor element `tensor_index` of pixel `pixel`.
    ///
    /// # Panics
    ///
    /// Panics if the pixel or tensor element is outside the line.
    pub fn set(&mut self, pixel: usize, tensor_index: usize, value: T) {
        let offset = self.buffer.sample_offset(pixel as isize, tensor_index);
        // SAFETY: the framework guarantees that the line is writable, and not accessed by any
        // other filter call, for the duration of this filter call
        unsafe { *self.ptr.offset(offset) = value }
    }
}

/// Temporary storage for one line of converted samples.
pub(crate) struct ScratchLine {
    _segment: DataSegment,
    pub(crate) buffer: LineBuffer,
}

impl ScratchLine {
    /// Room for `length + 2 * border` pixels of `tensor_length` samples, pixels contiguous.
    ///
    /// With `repeated` set, a single pixel is stored and the stride is 0.
    pub(crate) fn allocate(
        data_type: DataType,
        tensor_length: usize,
        length: usize,
        border: usize,
        repeated: bool,
    ) -> Result<Self, FrameworkError> {
        let pixels = if repeated { 1 } else { length + 2 * border };
        let segment = DataSegment::allocate(pixels * tensor_length * data_type.size_of())?;
        let mut buffer = LineBuffer::new(data_type, tensor_length);
        buffer.length = length;
        if repeated {
            buffer.stride = 0;
            buffer.ptr = segment.as_ptr();
        } else {
            buffer.border = border;
            buffer.ptr = segment
                .as_ptr()
                .wrapping_add(border * tensor_length * data_type.size_of());
        }
        Ok(Self {
            _segment: segment,
            buffer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access() -> Result<(), FrameworkError> {
        let mut data = [1.0f32, 10.0, 2.0, 20.0, 3.0, 30.0];
        let mut buffer = LineBuffer::new(DataType::SFloat, 2);
        buffer.ptr = data.as_mut_ptr().cast();
        buffer.length = 3;

        let input = InputLine::<f32>::new(&buffer)?;
        assert_eq!(input.get(1, 1), 20.0);
        assert_eq!(input.samples(0).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            InputLine::<f64>::new(&buffer),
            Err(FrameworkError::BufferTypeMismatch { .. })
        ));

        let mut output = OutputLine::<f32>::new(&buffer)?;
        output.set(2, 0, -1.0);
        assert_eq!(output.get(2, 0), -1.0);
        assert_eq!(data[4], -1.0);
        Ok(())
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_panics() {
        let mut data = [0u8; 4];
        let mut buffer = LineBuffer::new(DataType::UInt8, 1);
        buffer.ptr = data.as_mut_ptr();
        buffer.length = 4;
        if let Ok(line) = InputLine::<u8>::new(&buffer) {
            line.get(4, 0);
        }
    }

    #[test]
    fn test_scratch_border() -> Result<(), FrameworkError> {
        let scratch = ScratchLine::allocate(DataType::UInt16, 3, 10, 2, false)?;
        assert_eq!(scratch.buffer.border(), 2);
        assert_eq!(scratch.buffer.stride(), 3);
        let line = InputLine::<u16>::new(&scratch.buffer)?;
        assert_eq!(line.get_with_border(-2, 0), 0);
        assert_eq!(line.get_with_border(11, 2), 0);

        let repeated = ScratchLine::allocate(DataType::UInt16, 3, 10, 0, true)?;
        assert_eq!(repeated.buffer.stride(), 0);
        Ok(())
    }
}
