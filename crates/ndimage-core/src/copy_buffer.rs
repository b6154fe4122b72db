//! Copying strided lines of samples between buffers of possibly different types.
//!
//! These functions sit underneath image conversion, the scan framework's input and output
//! buffers, and `fill`. Both sample types are resolved once per call; the inner loop is typed.

use std::marker::PhantomData;

use crate::datatype::DataType;
use crate::dispatch::{dispatch, SampleVisitor};
use crate::sample::{clamp_cast, Sample};

/// A strided line of samples to read from.
///
/// Strides count samples of `data_type`, not bytes. A `stride` of 0 repeats the first pixel
/// along the whole line.
#[derive(Debug, Clone, Copy)]
pub struct ConstLine {
    /// Pointer to the first tensor element of the first pixel.
    pub ptr: *const u8,
    /// Type of the samples.
    pub data_type: DataType,
    /// Distance between consecutive pixels.
    pub stride: isize,
    /// Distance between consecutive tensor elements of a pixel.
    pub tensor_stride: isize,
}

/// A strided line of samples to write to.
///
/// Strides count samples of `data_type`, not bytes.
#[derive(Debug, Clone, Copy)]
pub struct MutLine {
    /// Pointer to the first tensor element of the first pixel.
    pub ptr: *mut u8,
    /// Type of the samples.
    pub data_type: DataType,
    /// Distance between consecutive pixels.
    pub stride: isize,
    /// Distance between consecutive tensor elements of a pixel.
    pub tensor_stride: isize,
}

impl MutLine {
    /// The same line, for reading.
    pub fn as_const(&self) -> ConstLine {
        ConstLine {
            ptr: self.ptr,
            data_type: self.data_type,
            stride: self.stride,
            tensor_stride: self.tensor_stride,
        }
    }
}

/// Copies `pixels` pixels of `tensor_elements` samples each from `src` to `dst`, converting with
/// [`clamp_cast`] when the types differ.
///
/// # Safety
///
/// Every sample addressed by `src` must be readable and every sample addressed by `dst` must be
/// writable, both properly aligned for their type. The two lines may overlap only if they are
/// identical or both contiguous with the same type.
pub unsafe fn copy_buffer(src: ConstLine, dst: MutLine, pixels: usize, tensor_elements: usize) {
    dispatch(
        src.data_type,
        CopyFrom {
            src,
            dst,
            pixels,
            tensor_elements,
        },
    )
}

/// Writes `value`, converted to the type of `dst`, into `pixels` pixels of `tensor_elements`
/// samples each.
///
/// # Safety
///
/// Every sample addressed by `dst` must be writable and properly aligned for its type.
pub unsafe fn fill_buffer<T: Sample>(dst: MutLine, pixels: usize, tensor_elements: usize, value: T) {
    dispatch(
        dst.data_type,
        FillWith {
            dst,
            pixels,
            tensor_elements,
            value,
        },
    )
}

struct CopyFrom {
    src: ConstLine,
    dst: MutLine,
    pixels: usize,
    tensor_elements: usize,
}

impl SampleVisitor for CopyFrom {
    type Output = ();

    fn visit<S: Sample>(self) {
        dispatch(
            self.dst.data_type,
            CopyInto::<S> {
                src: self.src,
                dst: self.dst,
                pixels: self.pixels,
                tensor_elements: self.tensor_elements,
                _src: PhantomData,
            },
        )
    }
}

struct CopyInto<S> {
    src: ConstLine,
    dst: MutLine,
    pixels: usize,
    tensor_elements: usize,
    _src: PhantomData<S>,
}

impl<S: Sample> SampleVisitor for CopyInto<S> {
    type Output = ();

    fn visit<D: Sample>(self) {
        let CopyInto {
            src,
            dst,
            pixels,
            tensor_elements,
            ..
        } = self;
        let sp = src.ptr as *const S;
        let telems = tensor_elements as isize;
        // SAFETY: the caller of `copy_buffer` guarantees the lines are valid
        unsafe {
            if S::DATA_TYPE == D::DATA_TYPE
                && (tensor_elements == 1 || (src.tensor_stride == 1 && dst.tensor_stride == 1))
                && src.stride == telems
                && dst.stride == telems
            {
                std::ptr::copy(sp, dst.ptr as *mut S, pixels * tensor_elements);
                return;
            }
            let dp = dst.ptr as *mut D;
            for p in 0..pixels as isize {
                for t in 0..telems {
                    let v = sp.offset(p * src.stride + t * src.tensor_stride).read();
                    dp.offset(p * dst.stride + t * dst.tensor_stride)
                        .write(clamp_cast::<D, S>(v));
                }
            }
        }
    }
}

struct FillWith<T> {
    dst: MutLine,
    pixels: usize,
    tensor_elements: usize,
    value: T,
}

impl<T: Sample> SampleVisitor for FillWith<T> {
    type Output = ();

    fn visit<D: Sample>(self) {
        let v: D = clamp_cast(self.value);
        let dp = self.dst.ptr as *mut D;
        // SAFETY: the caller of `fill_buffer` guarantees the line is valid
        unsafe {
            for p in 0..self.pixels as isize {
                for t in 0..self.tensor_elements as isize {
                    dp.offset(p * self.dst.stride + t * self.dst.tensor_stride)
                        .write(v);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Bin;

    fn const_line<T: Sample>(data: &[T], stride: isize, tensor_stride: isize) -> ConstLine {
        ConstLine {
            ptr: data.as_ptr() as *const u8,
            data_type: T::DATA_TYPE,
            stride,
            tensor_stride,
        }
    }

    fn mut_line<T: Sample>(data: &mut [T], stride: isize, tensor_stride: isize) -> MutLine {
        MutLine {
            ptr: data.as_mut_ptr() as *mut u8,
            data_type: T::DATA_TYPE,
            stride,
            tensor_stride,
        }
    }

    #[test]
    fn test_copy_same_type_contiguous() {
        let src = [1u16, 2, 3, 4, 5, 6];
        let mut dst = [0u16; 6];
        unsafe { copy_buffer(const_line(&src, 2, 1), mut_line(&mut dst, 2, 1), 3, 2) };
        assert_eq!(dst, src);
    }

    #[test]
    fn test_copy_converting_and_strided() {
        let src = [-5i32, 100, 300, 7];
        let mut dst = [0u8; 8];
        unsafe { copy_buffer(const_line(&src, 1, 1), mut_line(&mut dst, 2, 1), 4, 1) };
        assert_eq!(dst, [0, 0, 100, 0, 255, 0, 7, 0]);
    }

    #[test]
    fn test_copy_tensor_transposed() {
        // two pixels with three tensor elements, stored pixel-interleaved in the source
        let src = [1.0f32, 2.0, 3.0, 10.0, 20.0, 30.0];
        let mut dst = [0.0f64; 6];
        unsafe { copy_buffer(const_line(&src, 3, 1), mut_line(&mut dst, 1, 2), 2, 3) };
        assert_eq!(dst, [1.0, 10.0, 2.0, 20.0, 3.0, 30.0]);
    }

    #[test]
    fn test_copy_zero_stride_repeats() {
        let src = [42i8];
        let mut dst = [Bin::FALSE; 3];
        unsafe { copy_buffer(const_line(&src, 0, 0), mut_line(&mut dst, 1, 1), 3, 1) };
        assert_eq!(dst, [Bin::TRUE; 3]);
    }

    #[test]
    fn test_fill_buffer_saturates() {
        let mut dst = [0u8; 4];
        unsafe { fill_buffer(mut_line(&mut dst, 1, 1), 4, 1, 300.0f32) };
        assert_eq!(dst, [255; 4]);
    }
}
