//! Operations that read or write samples: copying, conversion, filling and single-sample
//! access. All type conversions saturate, see [`ndimage_core::clamp_cast`].

use ndimage_core::{copy_buffer, fill_buffer, ConstLine, DataType, MutLine, Sample};

use crate::error::ImageError;
use crate::image::Image;
use crate::iterator::LineIterator;
use crate::strides::{normal_strides, optimal_processing_dim};

impl Image {
    fn const_line(&self, offset: isize, stride: isize) -> ConstLine {
        ConstLine {
            ptr: self.pointer_at(offset).cast_const(),
            data_type: self.data_type,
            stride,
            tensor_stride: self.tensor_stride,
        }
    }

    fn mut_line(&self, offset: isize, stride: isize) -> MutLine {
        MutLine {
            ptr: self.pointer_at(offset),
            data_type: self.data_type,
            stride,
            tensor_stride: self.tensor_stride,
        }
    }

    /// A deep copy with normal strides, not sharing data with `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotForged`] if the image is raw, and allocation errors.
    pub fn copy(&self) -> Result<Image, ImageError> {
        self.check_forged()?;
        let mut out = Image::raw(&self.sizes, self.tensor.elements(), self.data_type);
        out.tensor = self.tensor;
        out.pixel_size = self.pixel_size.clone();
        out.color_space = self.color_space.clone();
        out.forge()?;
        out.copy_from(self)?;
        Ok(out)
    }

    /// Copies the samples of `src` into `self`, converting to the data type of `self`.
    ///
    /// If the two images share samples in any way other than being identical views, `src` is
    /// copied to a temporary image first.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotForged`] if either image is raw,
    /// [`ImageError::SizesDontMatch`] or [`ImageError::TensorElementsDontMatch`] if the shapes
    /// differ.
    pub fn copy_from(&mut self, src: &Image) -> Result<(), ImageError> {
        self.check_forged()?;
        src.check_forged()?;
        if self.sizes != src.sizes {
            return Err(ImageError::SizesDontMatch);
        }
        if self.tensor.elements() != src.tensor.elements() {
            return Err(ImageError::TensorElementsDontMatch);
        }
        if self.is_identical_view(src) {
            return Ok(());
        }
        if self.aliases(src) {
            log::debug!("source and destination overlap, copying through a temporary image");
            let tmp = src.copy()?;
            return self.copy_from(&tmp);
        }
        let proc_dim = optimal_processing_dim(&self.sizes, &self.strides);
        let mut it = LineIterator::for_images(&[&*self, src], proc_dim);
        let (len, telems) = (it.line_length(), self.tensor.elements());
        let (dst_stride, src_stride) = (it.line_stride(0), it.line_stride(1));
        loop {
            // SAFETY: both images are forged and the iterator only produces offsets of pixels
            // inside them; the lines do not overlap
            unsafe {
                copy_buffer(
                    src.const_line(it.offset(1), src_stride),
                    self.mut_line(it.offset(0), dst_stride),
                    len,
                    telems,
                );
            }
            if !it.next_line() {
                break;
            }
        }
        Ok(())
    }

    /// Changes the data type of the samples.
    ///
    /// The conversion happens in place when both types have the same size and nothing else
    /// refers to the block; otherwise the image gets a new block with normal strides. A raw
    /// image just has its data type changed.
    ///
    /// # Errors
    ///
    /// Returns allocation errors.
    pub fn convert(&mut self, data_type: DataType) -> Result<(), ImageError> {
        if self.data_type == data_type {
            return Ok(());
        }
        if !self.is_forged() {
            self.data_type = data_type;
            return Ok(());
        }
        if data_type.size_of() == self.data_type.size_of()
            && !self.is_shared()
            && !self.external_data
            && !self.is_singleton_expanded()
        {
            let proc_dim = optimal_processing_dim(&self.sizes, &self.strides);
            let mut it = LineIterator::for_images(&[&*self], proc_dim);
            let (len, telems, stride) =
                (it.line_length(), self.tensor.elements(), it.line_stride(0));
            let mut dst = self.clone();
            dst.data_type = data_type;
            loop {
                // SAFETY: source and destination are the same samples; each sample is read
                // before it is overwritten by a value of the same size
                unsafe {
                    copy_buffer(
                        self.const_line(it.offset(0), stride),
                        dst.mut_line(it.offset(0), stride),
                        len,
                        telems,
                    );
                }
                if !it.next_line() {
                    break;
                }
            }
            self.data_type = data_type;
            return Ok(());
        }
        let mut out = Image::raw(&self.sizes, self.tensor.elements(), data_type);
        out.tensor = self.tensor;
        out.pixel_size = self.pixel_size.clone();
        out.color_space = self.color_space.clone();
        out.external_interface = self.external_interface.clone();
        out.forge()?;
        out.copy_from(self)?;
        out.protect = self.protect;
        *self = out;
        Ok(())
    }

    /// Sets every sample to `value`, converted to the image's data type.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotForged`] if the image is raw.
    pub fn fill<T: Sample>(&mut self, value: T) -> Result<(), ImageError> {
        self.check_forged()?;
        let proc_dim = optimal_processing_dim(&self.sizes, &self.strides);
        let mut it = LineIterator::for_images(&[&*self], proc_dim);
        let (len, telems, stride) = (it.line_length(), self.tensor.elements(), it.line_stride(0));
        loop {
            // SAFETY: the iterator only produces offsets of pixels inside the image
            unsafe { fill_buffer(self.mut_line(it.offset(0), stride), len, telems, value) };
            if !it.next_line() {
                break;
            }
        }
        Ok(())
    }

    /// Reads tensor element `tensor_index` of the pixel at `coords`, converted to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotForged`] if the image is raw and
    /// [`ImageError::IndexOutOfRange`] if the sample does not exist.
    pub fn sample<T: Sample>(&self, coords: &[usize], tensor_index: usize) -> Result<T, ImageError> {
        let offset = self.sample_offset(coords, tensor_index)?;
        let mut value = T::default();
        let dst = MutLine {
            ptr: (&mut value as *mut T).cast(),
            data_type: T::DATA_TYPE,
            stride: 0,
            tensor_stride: 0,
        };
        // SAFETY: the offset was checked to address a sample of the image
        unsafe { copy_buffer(self.const_line(offset, 0), dst, 1, 1) };
        Ok(value)
    }

    /// Writes `value`, converted to the image's data type, into tensor element
    /// `tensor_index` of the pixel at `coords`.
    ///
    /// # Errors
    ///
    /// As [`Image::sample`].
    pub fn set_sample<T: Sample>(
        &mut self,
        coords: &[usize],
        tensor_index: usize,
        value: T,
    ) -> Result<(), ImageError> {
        let offset = self.sample_offset(coords, tensor_index)?;
        // SAFETY: the offset was checked to address a sample of the image
        unsafe { fill_buffer(self.mut_line(offset, 0), 1, 1, value) };
        Ok(())
    }

    /// All samples converted to `T`, with the tensor elements of each pixel together and
    /// dimension 0 running fastest.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotForged`] if the image is raw.
    pub fn to_vec<T: Sample>(&self) -> Result<Vec<T>, ImageError> {
        self.check_forged()?;
        let telems = self.tensor.elements();
        let mut out = vec![T::default(); self.number_of_samples()];
        let proc_dim = optimal_processing_dim(&self.sizes, &self.strides);
        let mut it = LineIterator::new(
            &self.sizes,
            proc_dim,
            vec![self.strides.clone(), normal_strides(&self.sizes, telems)],
        );
        let (len, src_stride, dst_stride) = (it.line_length(), it.line_stride(0), it.line_stride(1));
        let base: *mut T = out.as_mut_ptr();
        loop {
            let dst = MutLine {
                ptr: base.wrapping_offset(it.offset(1)).cast(),
                data_type: T::DATA_TYPE,
                stride: dst_stride,
                tensor_stride: 1,
            };
            // SAFETY: `out` holds one sample per pixel and tensor element, laid out with
            // normal strides
            unsafe { copy_buffer(self.const_line(it.offset(0), src_stride), dst, len, telems) };
            if !it.next_line() {
                break;
            }
        }
        Ok(out)
    }

    fn sample_offset(&self, coords: &[usize], tensor_index: usize) -> Result<isize, ImageError> {
        self.check_forged()?;
        if tensor_index >= self.tensor.elements() {
            return Err(ImageError::IndexOutOfRange);
        }
        Ok(self.offset(coords)? + tensor_index as isize * self.tensor_stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndimage_core::{Bin, DComplex};

    #[test]
    fn test_fill_and_convert() -> Result<(), ImageError> {
        let mut img = Image::new(&[3, 2], 1, DataType::UInt8)?;
        img.fill(5u8)?;
        img.convert(DataType::SInt8)?;
        assert_eq!(img.data_type(), DataType::SInt8);
        assert_eq!(img.to_vec::<i8>()?, vec![5; 6]);

        img.fill(-7i32)?;
        img.convert(DataType::DFloat)?;
        assert_eq!(img.sample::<f64>(&[2, 1], 0)?, -7.0);
        Ok(())
    }

    #[test]
    fn test_saturating_writes() -> Result<(), ImageError> {
        let mut img = Image::new(&[2], 1, DataType::UInt8)?;
        img.set_sample(&[0], 0, 300i32)?;
        img.set_sample(&[1], 0, -3.5f32)?;
        assert_eq!(img.to_vec::<u8>()?, vec![255, 0]);
        img.fill(Bin::TRUE)?;
        assert_eq!(img.to_vec::<u8>()?, vec![1, 1]);
        Ok(())
    }

    #[test]
    fn test_convert_saturates() -> Result<(), ImageError> {
        let mut img = Image::new(&[3, 2], 1, DataType::SInt32)?;
        img.fill(300i32)?;
        img.convert(DataType::UInt8)?;
        assert_eq!(img.data_type(), DataType::UInt8);
        assert_eq!(img.to_vec::<u8>()?, vec![255u8; 6]);

        let mut img = Image::new(&[4], 1, DataType::SFloat)?;
        img.fill(-7.5f32)?;
        img.convert(DataType::UInt16)?;
        assert_eq!(img.to_vec::<u16>()?, vec![0u16; 4]);
        Ok(())
    }

    #[test]
    fn test_view_writes_are_visible() -> Result<(), ImageError> {
        let img = Image::new(&[4, 4], 1, DataType::SInt16)?;
        let mut roi = img.view(&[1, 1], &[2, 2], &[1, 1])?;
        roi.fill(9i16)?;
        assert_eq!(img.sample::<i16>(&[1, 1], 0)?, 9);
        assert_eq!(img.sample::<i16>(&[2, 2], 0)?, 9);
        assert_eq!(img.sample::<i16>(&[3, 3], 0)?, 0);
        assert_eq!(img.sample::<i16>(&[0, 1], 0)?, 0);
        Ok(())
    }

    #[test]
    fn test_copy_is_deep() -> Result<(), ImageError> {
        let mut img = Image::from_vec(&[2, 2], 2, vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])?;
        img.mirror(&[true, false])?;
        let copy = img.copy()?;
        assert!(!copy.shares_data(&img));
        assert!(copy.has_normal_strides());
        assert_eq!(copy.to_vec::<f32>()?, vec![3.0, 4.0, 1.0, 2.0, 7.0, 8.0, 5.0, 6.0]);
        img.fill(0.0f32)?;
        assert_eq!(copy.sample::<f32>(&[0, 0], 1)?, 4.0);
        Ok(())
    }

    #[test]
    fn test_copy_from_overlapping() -> Result<(), ImageError> {
        let img = Image::from_vec(&[5], 1, vec![1u8, 2, 3, 4, 5])?;
        let src = img.view(&[0], &[4], &[1])?;
        let mut dst = img.view(&[1], &[4], &[1])?;
        dst.copy_from(&src)?;
        assert_eq!(img.to_vec::<u8>()?, vec![1, 1, 2, 3, 4]);
        assert_eq!(
            dst.copy_from(&img).err(),
            Some(ImageError::SizesDontMatch)
        );
        Ok(())
    }

    #[test]
    fn test_convert_shared_allocates() -> Result<(), ImageError> {
        let mut img = Image::new(&[2, 2], 1, DataType::SComplex)?;
        img.set_sample(&[1, 0], 0, DComplex::new(3.0, 4.0))?;
        let view = img.clone();
        img.convert(DataType::SFloat)?;
        assert!(!img.shares_data(&view));
        // the modulus of a complex value
        assert_eq!(img.sample::<f32>(&[1, 0], 0)?, 5.0);
        img.convert(DataType::Bin)?;
        assert_eq!(img.to_vec::<Bin>()?, vec![Bin::FALSE, Bin::TRUE, Bin::FALSE, Bin::FALSE]);
        Ok(())
    }

    #[test]
    fn test_zero_dimensional() -> Result<(), ImageError> {
        let mut img = Image::from_scalar(42u16)?;
        assert_eq!(img.sample::<u16>(&[], 0)?, 42);
        img.fill(7u8)?;
        assert_eq!(img.to_vec::<f64>()?, vec![7.0]);
        Ok(())
    }
}
