//! Helpers shared by the frameworks, also useful to line filter authors.

use ndimage_image::{strides, Image, ImageError};

use crate::error::FrameworkError;

/// Sizes all of `images` can be singleton-expanded to.
///
/// # Errors
///
/// Returns [`ImageError::SizesDontMatch`] if two images differ in a dimension where neither
/// is a singleton.
///
/// # Examples
///
/// ```rust
/// use ndimage_core::DataType;
/// use ndimage_framework::singleton_expanded_size;
/// use ndimage_image::Image;
///
/// let a = Image::new(&[8, 1], 1, DataType::UInt8).unwrap();
/// let b = Image::new(&[1, 5, 3], 1, DataType::UInt8).unwrap();
/// assert_eq!(singleton_expanded_size(&[&a, &b]).unwrap(), vec![8, 5, 3]);
/// ```
pub fn singleton_expanded_size(images: &[&Image]) -> Result<Vec<usize>, FrameworkError> {
    let Some((first, rest)) = images.split_first() else {
        return Ok(Vec::new());
    };
    let mut sizes = first.sizes().to_vec();
    for img in rest {
        strides::singleton_expanded_sizes(&mut sizes, img.sizes())?;
    }
    Ok(sizes)
}

/// Number of tensor elements all of `images` can be expanded to: the common count, with
/// scalar images matching anything.
///
/// # Errors
///
/// Returns [`ImageError::TensorElementsDontMatch`] if two non-scalar images differ.
pub fn singleton_expanded_tensor_elements(images: &[&Image]) -> Result<usize, FrameworkError> {
    let mut n = 1;
    for img in images {
        let m = img.tensor_elements();
        if m != n {
            if n == 1 {
                n = m;
            } else if m != 1 {
                return Err(ImageError::TensorElementsDontMatch.into());
            }
        }
    }
    Ok(n)
}

/// Best dimension to process lines of `img` along.
///
/// # Errors
///
/// Returns [`ImageError::ImageNotForged`] if the image is raw.
pub fn optimal_processing_dim(img: &Image) -> Result<usize, FrameworkError> {
    if !img.is_forged() {
        return Err(ImageError::ImageNotForged.into());
    }
    Ok(strides::optimal_processing_dim(img.sizes(), img.strides()))
}

/// As [`optimal_processing_dim`], never picking a dimension where the kernel has size 1.
///
/// # Errors
///
/// Returns [`FrameworkError::ArraySizeMismatch`] if `kernel_sizes` does not have one element
/// per dimension.
pub fn optimal_processing_dim_for_kernel(
    img: &Image,
    kernel_sizes: &[usize],
) -> Result<usize, FrameworkError> {
    if !img.is_forged() {
        return Err(ImageError::ImageNotForged.into());
    }
    if kernel_sizes.len() != img.dimensionality() {
        return Err(FrameworkError::ArraySizeMismatch {
            expected: img.dimensionality(),
            actual: kernel_sizes.len(),
        });
    }
    let sizes: Vec<usize> = img
        .sizes()
        .iter()
        .zip(kernel_sizes)
        .map(|(&n, &k)| if k == 1 { 1 } else { n })
        .collect();
    Ok(strides::optimal_processing_dim(&sizes, img.strides()))
}

/// Color space of the first input that is a color image with `tensor_elements` elements.
pub(crate) fn output_color_space(inputs: &[&Image], tensor_elements: usize) -> String {
    inputs
        .iter()
        .find(|img| img.is_color() && img.tensor_elements() == tensor_elements)
        .map(|img| img.color_space().to_string())
        .unwrap_or_default()
}

/// Expands `array` to `n` elements: empty gives `default`, one element is repeated.
///
/// # Errors
///
/// Returns [`FrameworkError::ArraySizeMismatch`] for any other length.
pub(crate) fn use_parameter<T: Clone>(
    array: &[T],
    n: usize,
    default: T,
) -> Result<Vec<T>, FrameworkError> {
    match array.len() {
        0 => Ok(vec![default; n]),
        1 => Ok(vec![array[0].clone(); n]),
        len if len == n => Ok(array.to_vec()),
        len => Err(FrameworkError::ArraySizeMismatch {
            expected: n,
            actual: len,
        }),
    }
}

/// Pointer to the sample `offset` samples away from the origin of a forged image.
pub(crate) fn sample_pointer(img: &Image, offset: isize) -> Result<*mut u8, FrameworkError> {
    Ok(img
        .origin()?
        .wrapping_offset(offset * img.sample_size() as isize))
}

/// Returns true if `a` and `b` lay out their pixels in the same order and direction, so that
/// flattening both gives the same pixel order.
pub(crate) fn same_layout(a: &Image, b: &Image) -> bool {
    a.has_same_dimension_order(b)
        && a.sizes()
            .iter()
            .zip(a.strides().iter().zip(b.strides()))
            .all(|(&n, (&sa, &sb))| n == 1 || (sa < 0) == (sb < 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndimage_core::DataType;

    #[test]
    fn test_singleton_expansion() -> Result<(), FrameworkError> {
        let a = Image::new(&[4, 1], 3, DataType::UInt8)?;
        let b = Image::new(&[1, 6], 1, DataType::UInt8)?;
        let c = Image::new(&[4, 5], 2, DataType::UInt8)?;
        assert_eq!(singleton_expanded_size(&[&a, &b])?, vec![4, 6]);
        assert_eq!(
            singleton_expanded_size(&[&b, &c]),
            Err(FrameworkError::Image(ImageError::SizesDontMatch))
        );
        assert_eq!(singleton_expanded_tensor_elements(&[&b, &a])?, 3);
        assert_eq!(
            singleton_expanded_tensor_elements(&[&a, &c]),
            Err(FrameworkError::Image(ImageError::TensorElementsDontMatch))
        );
        Ok(())
    }

    #[test]
    fn test_processing_dim() -> Result<(), FrameworkError> {
        let mut img = Image::new(&[200, 300], 1, DataType::SFloat)?;
        assert_eq!(optimal_processing_dim(&img)?, 0);
        img.swap_dimensions(0, 1)?;
        assert_eq!(optimal_processing_dim(&img)?, 1);
        assert_eq!(optimal_processing_dim_for_kernel(&img, &[5, 1])?, 0);
        assert!(matches!(
            optimal_processing_dim_for_kernel(&img, &[5]),
            Err(FrameworkError::ArraySizeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_same_layout() -> Result<(), FrameworkError> {
        let a = Image::new(&[10, 10], 1, DataType::UInt8)?;
        let mut b = Image::new(&[10, 10], 1, DataType::SInt16)?;
        assert!(same_layout(&a, &b));
        b.mirror(&[true, false])?;
        assert!(a.has_same_dimension_order(&b));
        assert!(!same_layout(&a, &b));
        Ok(())
    }

    #[test]
    fn test_use_parameter() -> Result<(), FrameworkError> {
        assert_eq!(use_parameter::<usize>(&[], 3, 0)?, vec![0, 0, 0]);
        assert_eq!(use_parameter(&[2], 2, 0)?, vec![2, 2]);
        assert!(use_parameter(&[1, 2], 3, 0).is_err());
        Ok(())
    }
}
