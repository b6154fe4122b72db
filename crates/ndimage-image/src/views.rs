//! Views: new images that share the data block of an existing one.

use crate::error::ImageError;
use crate::image::Image;
use crate::tensor::{Tensor, TensorShape};

impl Image {
    /// A region of interest: `sizes` pixels from `origin`, every `spacing` pixels.
    ///
    /// The view shares the data block; writing to it changes `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ArraySizeMismatch`] if an array does not have one element per
    /// dimension, [`ImageError::InvalidParameter`] for a zero size or spacing, and
    /// [`ImageError::IndexOutOfRange`] if the region extends beyond the image.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ndimage_core::DataType;
    /// use ndimage_image::Image;
    ///
    /// let img = Image::new(&[10, 10], 1, DataType::UInt8).unwrap();
    /// let every_other_row = img.view(&[0, 1], &[10, 5], &[1, 2]).unwrap();
    /// assert_eq!(every_other_row.strides(), &[1, 20]);
    /// ```
    pub fn view(
        &self,
        origin: &[usize],
        sizes: &[usize],
        spacing: &[usize],
    ) -> Result<Image, ImageError> {
        self.check_forged()?;
        let nd = self.sizes.len();
        for array in [origin, sizes, spacing] {
            if array.len() != nd {
                return Err(ImageError::ArraySizeMismatch {
                    expected: nd,
                    actual: array.len(),
                });
            }
        }
        if sizes.contains(&0) || spacing.contains(&0) {
            return Err(ImageError::InvalidParameter(
                "view sizes and spacing must be positive".to_string(),
            ));
        }
        for d in 0..nd {
            let last = (sizes[d] - 1)
                .checked_mul(spacing[d])
                .and_then(|e| e.checked_add(origin[d]))
                .ok_or(ImageError::IndexOutOfRange)?;
            if last >= self.sizes[d] {
                return Err(ImageError::IndexOutOfRange);
            }
        }
        let offset = self.offset(origin)?;
        let mut out = self.clone();
        out.origin = self.byte_offset(offset);
        out.sizes = sizes.to_vec();
        for (d, &s) in spacing.iter().enumerate() {
            out.strides[d] *= s as isize;
            out.pixel_size.scale(d, s as f64);
        }
        Ok(out)
    }

    /// A 0-D view of the pixel at `coords`.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is raw or `coords` is outside the image.
    pub fn at(&self, coords: &[usize]) -> Result<Image, ImageError> {
        self.check_forged()?;
        let offset = self.offset(coords)?;
        let mut out = self.clone();
        out.origin = self.byte_offset(offset);
        out.sizes.clear();
        out.strides.clear();
        Ok(out)
    }

    /// A scalar view of tensor element `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::IndexOutOfRange`] if there is no such element.
    pub fn tensor_element(&self, index: usize) -> Result<Image, ImageError> {
        self.check_forged()?;
        if index >= self.tensor.elements() {
            return Err(ImageError::IndexOutOfRange);
        }
        let mut out = self.clone();
        out.origin = self.byte_offset(index as isize * self.tensor_stride);
        out.tensor = Tensor::scalar();
        out.color_space.clear();
        Ok(out)
    }

    /// A scalar view of the tensor element at `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::IndexOutOfRange`] if the element is outside the tensor or not
    /// stored.
    pub fn tensor_element_at(&self, row: usize, col: usize) -> Result<Image, ImageError> {
        let index = self.tensor.index(row, col)?;
        self.tensor_element(index)
    }

    /// A view of the tensor diagonal, as a column vector.
    ///
    /// Vectors keep their first element only.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotForged`] if the image is raw.
    pub fn diagonal(&self) -> Result<Image, ImageError> {
        self.check_forged()?;
        let mut out = self.clone();
        let t = &self.tensor;
        if t.is_scalar() || t.is_diagonal() {
            out.tensor = Tensor::vector(t.elements());
        } else if t.is_vector() {
            out.tensor = Tensor::scalar();
        } else if t.is_symmetric() || t.is_triangular() {
            // the diagonal is stored first
            out.tensor = Tensor::vector(t.rows());
        } else {
            let (m, n) = (t.rows(), t.columns());
            out.tensor = Tensor::vector(m.min(n));
            let step = if t.shape() == TensorShape::ColMajorMatrix {
                m + 1
            } else {
                n + 1
            };
            out.tensor_stride = step as isize * self.tensor_stride;
        }
        if out.tensor.elements() != t.elements() {
            out.color_space.clear();
        }
        Ok(out)
    }

    /// A view of the real part of a complex image.
    ///
    /// Images of other types are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotForged`] if the image is raw.
    pub fn real(&self) -> Result<Image, ImageError> {
        self.check_forged()?;
        match self.data_type.real_counterpart() {
            Some(real) if self.data_type.is_complex() => Ok(self.complex_part(real, 0)),
            _ => Ok(self.clone()),
        }
    }

    /// A view of the imaginary part of a complex image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::NotComplex`] if the image is not complex.
    pub fn imaginary(&self) -> Result<Image, ImageError> {
        self.check_forged()?;
        match self.data_type.real_counterpart() {
            Some(real) if self.data_type.is_complex() => Ok(self.complex_part(real, 1)),
            _ => Err(ImageError::NotComplex),
        }
    }

    fn complex_part(&self, real: ndimage_core::DataType, part: usize) -> Image {
        let mut out = self.clone();
        out.data_type = real;
        out.strides.iter_mut().for_each(|s| *s *= 2);
        out.tensor_stride *= 2;
        out.origin += part * real.size_of();
        out
    }

    /// Byte offset inside the block of the sample `offset` samples from the origin.
    pub(crate) fn byte_offset(&self, offset: isize) -> usize {
        (self.origin as isize + offset * self.sample_size() as isize) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndimage_core::DataType;

    #[test]
    fn test_view_checks() -> Result<(), ImageError> {
        let img = Image::new(&[10, 8], 1, DataType::UInt16)?;
        let roi = img.view(&[1, 1], &[2, 2], &[1, 1])?;
        assert_eq!(roi.sizes(), &[2, 2]);
        assert_eq!(roi.origin_offset(), (1 + 10) * 2);
        assert!(roi.shares_data(&img));
        assert_eq!(
            img.view(&[9, 0], &[2, 8], &[1, 1]).err(),
            Some(ImageError::IndexOutOfRange)
        );
        assert!(matches!(
            img.view(&[0, 0], &[2, 2], &[0, 1]),
            Err(ImageError::InvalidParameter(_))
        ));
        assert!(matches!(
            img.view(&[0], &[2], &[1]),
            Err(ImageError::ArraySizeMismatch { .. })
        ));
        assert_eq!(
            Image::raw(&[4], 1, DataType::UInt8).view(&[0], &[1], &[1]).err(),
            Some(ImageError::ImageNotForged)
        );
        Ok(())
    }

    #[test]
    fn test_at() -> Result<(), ImageError> {
        let img = Image::new(&[4, 3], 2, DataType::SInt8)?;
        let px = img.at(&[3, 2])?;
        assert_eq!(px.dimensionality(), 0);
        assert_eq!(px.tensor_elements(), 2);
        assert_eq!(px.origin_offset(), (3 + 2 * 4) * 2);
        Ok(())
    }

    #[test]
    fn test_tensor_views() -> Result<(), ImageError> {
        let mut img = Image::raw(&[5, 5], 1, DataType::DFloat);
        img.set_tensor(Tensor::matrix(2, 3))?;
        img.forge()?;
        img.set_color_space("custom");
        let e = img.tensor_element_at(1, 2)?;
        assert!(e.is_scalar());
        assert_eq!(e.origin_offset(), 5 * 8);
        assert!(!e.is_color());

        let d = img.diagonal()?;
        assert_eq!(d.tensor_elements(), 2);
        assert_eq!(d.tensor_stride(), 3);

        let mut sym = Image::raw(&[5], 1, DataType::SFloat);
        sym.set_tensor(Tensor::with_shape(TensorShape::SymmetricMatrix, 3, 3)?)?;
        sym.forge()?;
        let d = sym.diagonal()?;
        assert_eq!(d.tensor_elements(), 3);
        assert_eq!(d.tensor_stride(), 1);
        Ok(())
    }

    #[test]
    fn test_complex_parts() -> Result<(), ImageError> {
        let img = Image::new(&[4, 4], 1, DataType::DComplex)?;
        let re = img.real()?;
        let im = img.imaginary()?;
        assert_eq!(re.data_type(), DataType::DFloat);
        assert_eq!(re.strides(), &[2, 8]);
        assert_eq!(im.origin_offset(), 8);
        let float = Image::new(&[4], 1, DataType::SFloat)?;
        assert_eq!(float.imaginary().err(), Some(ImageError::NotComplex));
        assert_eq!(float.real()?.data_type(), DataType::SFloat);
        Ok(())
    }
}
