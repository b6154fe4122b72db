//! Changing the shape of a forged image without touching its samples.
//!
//! These operations rewrite sizes, strides, tensor and origin only. The image keeps sharing
//! its data block with any other view.

use crate::error::ImageError;
use crate::image::Image;
use crate::physical::PhysicalQuantity;
use crate::strides::singleton_expanded_sizes;
use crate::tensor::Tensor;

impl Image {
    fn check_dimension(&self, dim: usize) -> Result<(), ImageError> {
        if dim < self.sizes.len() {
            Ok(())
        } else {
            Err(ImageError::IllegalDimension {
                dim,
                dimensionality: self.sizes.len(),
            })
        }
    }

    /// Reorders the dimensions: new dimension `i` is old dimension `order[i]`.
    ///
    /// Dimensions not listed are removed, which is only allowed for singleton dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::IllegalDimension`] for an index that is not a dimension,
    /// [`ImageError::DuplicateDimension`] if an index repeats and
    /// [`ImageError::CannotDiscardNonSingleton`] if a dropped dimension has size > 1.
    pub fn permute_dimensions(&mut self, order: &[usize]) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        let nd = self.sizes.len();
        let mut keep = vec![false; nd];
        for &d in order {
            self.check_dimension(d)?;
            if keep[d] {
                return Err(ImageError::DuplicateDimension(d));
            }
            keep[d] = true;
        }
        if let Some(d) = (0..nd).find(|&d| !keep[d] && self.sizes[d] != 1) {
            return Err(ImageError::CannotDiscardNonSingleton(d));
        }
        self.sizes = order.iter().map(|&d| self.sizes[d]).collect();
        self.strides = order.iter().map(|&d| self.strides[d]).collect();
        self.pixel_size.permute(order);
        Ok(self)
    }

    /// Swaps two dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::IllegalDimension`] if either is not a dimension.
    pub fn swap_dimensions(&mut self, dim1: usize, dim2: usize) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        self.check_dimension(dim1)?;
        self.check_dimension(dim2)?;
        self.sizes.swap(dim1, dim2);
        self.strides.swap(dim1, dim2);
        self.pixel_size.swap(dim1, dim2);
        Ok(self)
    }

    /// Removes all singleton dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotForged`] if the image is raw.
    pub fn squeeze(&mut self) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        for d in (0..self.sizes.len()).rev() {
            if self.sizes[d] == 1 {
                self.sizes.remove(d);
                self.strides.remove(d);
                self.pixel_size.erase(d);
            }
        }
        Ok(self)
    }

    /// Inserts a singleton dimension with stride 0 before dimension `dim`.
    ///
    /// `dim` may equal the dimensionality, which appends the new dimension.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::IllegalDimension`] if `dim` exceeds the dimensionality.
    pub fn add_singleton(&mut self, dim: usize) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        if dim > self.sizes.len() {
            return Err(ImageError::IllegalDimension {
                dim,
                dimensionality: self.sizes.len(),
            });
        }
        self.sizes.insert(dim, 1);
        self.strides.insert(dim, 0);
        self.pixel_size.insert(dim, PhysicalQuantity::pixel());
        Ok(self)
    }

    /// Appends singleton dimensions until the image has `n` dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotForged`] if the image is raw.
    pub fn expand_dimensionality(&mut self, n: usize) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        while self.sizes.len() < n {
            self.sizes.push(1);
            self.strides.push(0);
        }
        Ok(self)
    }

    /// Repeats the single pixel along singleton dimension `dim` `size` times, with stride 0.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::IllegalDimension`] if `dim` is not a dimension and
    /// [`ImageError::InvalidParameter`] if it is not a singleton or `size` is 0.
    pub fn expand_singleton_dimension(
        &mut self,
        dim: usize,
        size: usize,
    ) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        self.check_dimension(dim)?;
        if self.sizes[dim] != 1 || size == 0 {
            return Err(ImageError::InvalidParameter(format!(
                "cannot expand dimension {dim} of size {} to {size}",
                self.sizes[dim]
            )));
        }
        self.sizes[dim] = size;
        self.strides[dim] = 0;
        Ok(self)
    }

    /// Expands singleton dimensions, adding dimensions as needed, to reach `sizes`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::SizesDontMatch`] if the image has more dimensions than `sizes` or
    /// a non-singleton size differs.
    pub fn expand_singleton_dimensions(&mut self, sizes: &[usize]) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        if self.sizes.len() > sizes.len() {
            return Err(ImageError::SizesDontMatch);
        }
        let mut expanded = self.sizes.clone();
        singleton_expanded_sizes(&mut expanded, sizes)?;
        if expanded != sizes {
            return Err(ImageError::SizesDontMatch);
        }
        self.expand_dimensionality(sizes.len())?;
        for (d, &n) in sizes.iter().enumerate() {
            if self.sizes[d] != n {
                self.expand_singleton_dimension(d, n)?;
            }
        }
        Ok(self)
    }

    /// Turns dimensions with stride 0 back into singleton dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotForged`] if the image is raw.
    pub fn unexpand_singleton_dimensions(&mut self) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        for (n, &s) in self.sizes.iter_mut().zip(&self.strides) {
            if s == 0 {
                *n = 1;
            }
        }
        Ok(self)
    }

    /// Turns dimension `dim` back into a singleton dimension if it has stride 0.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::IllegalDimension`] if `dim` is not a dimension and
    /// [`ImageError::InvalidParameter`] if its stride is not 0.
    pub fn unexpand_singleton_dimension(&mut self, dim: usize) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        self.check_dimension(dim)?;
        if self.strides[dim] != 0 {
            return Err(ImageError::InvalidParameter(format!(
                "dimension {dim} is not singleton-expanded"
            )));
        }
        self.sizes[dim] = 1;
        Ok(self)
    }

    /// Repeats the single tensor element of a scalar image `n` times, with tensor stride 0.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::NotScalar`] if the image has more than one tensor element.
    pub fn expand_singleton_tensor(&mut self, n: usize) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        if !self.tensor.is_scalar() {
            return Err(ImageError::NotScalar);
        }
        self.tensor = Tensor::vector(n);
        self.tensor_stride = 0;
        Ok(self)
    }

    /// Reverses the flagged dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ArraySizeMismatch`] unless there is one flag per dimension.
    pub fn mirror(&mut self, process: &[bool]) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        if process.len() != self.sizes.len() {
            return Err(ImageError::ArraySizeMismatch {
                expected: self.sizes.len(),
                actual: process.len(),
            });
        }
        for d in 0..self.sizes.len() {
            if process[d] && self.sizes[d] > 1 {
                let last = (self.sizes[d] - 1) as isize * self.strides[d];
                self.origin = self.byte_offset(last);
                self.strides[d] = -self.strides[d];
            }
        }
        Ok(self)
    }

    /// Reshapes the image to a single dimension holding all pixels.
    ///
    /// If the pixels are not on a single line with constant step, the samples are first
    /// copied into a new block with normal strides, and the image stops sharing its data.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageNotForged`] if the image is raw, and allocation errors.
    pub fn flatten(&mut self) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        let (stride, start) = match self.simple_stride_and_origin() {
            Some(found) => found,
            None => {
                log::debug!("flattening an image without a simple stride copies its samples");
                let copy = self.copy()?;
                *self = copy;
                (self.tensor.elements() as isize, 0)
            }
        };
        self.origin = self.byte_offset(start);
        self.sizes = vec![self.number_of_pixels()];
        self.strides = vec![stride];
        if self.pixel_size.is_isotropic() {
            let q = self.pixel_size.get(0);
            self.pixel_size = crate::physical::PixelSize::isotropic(q);
        } else {
            self.pixel_size.clear();
        }
        Ok(self)
    }

    /// Moves the tensor dimension into the spatial dimensions, at `dim`.
    ///
    /// The image becomes scalar.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::IllegalDimension`] if `dim` exceeds the dimensionality.
    pub fn tensor_to_spatial(&mut self, dim: usize) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        if dim > self.sizes.len() {
            return Err(ImageError::IllegalDimension {
                dim,
                dimensionality: self.sizes.len(),
            });
        }
        self.sizes.insert(dim, self.tensor.elements());
        self.strides.insert(dim, self.tensor_stride);
        self.pixel_size.insert(dim, PhysicalQuantity::pixel());
        self.tensor = Tensor::scalar();
        self.tensor_stride = 1;
        self.color_space.clear();
        Ok(self)
    }

    /// Moves spatial dimension `dim` into the tensor, as a `rows` by `cols` matrix.
    ///
    /// Passing 0 for both `rows` and `cols` makes a column vector.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::NotScalar`] if the image already has a tensor and
    /// [`ImageError::InvalidParameter`] if `rows * cols` differs from the size of `dim`.
    pub fn spatial_to_tensor(
        &mut self,
        dim: usize,
        rows: usize,
        cols: usize,
    ) -> Result<&mut Self, ImageError> {
        self.check_forged()?;
        if !self.tensor.is_scalar() {
            return Err(ImageError::NotScalar);
        }
        self.check_dimension(dim)?;
        let n = self.sizes[dim];
        let (rows, cols) = if rows == 0 && cols == 0 { (n, 1) } else { (rows, cols) };
        if rows.checked_mul(cols) != Some(n) {
            return Err(ImageError::InvalidParameter(format!(
                "a {rows}x{cols} tensor cannot hold dimension {dim} of size {n}"
            )));
        }
        self.tensor = Tensor::matrix(rows, cols);
        self.tensor_stride = self.strides[dim];
        self.sizes.remove(dim);
        self.strides.remove(dim);
        self.pixel_size.erase(dim);
        Ok(self)
    }

    /// Transposes the tensor. The samples stay in place.
    pub fn transpose_tensor(&mut self) -> &mut Self {
        self.tensor = self.tensor.transposed();
        self
    }

    /// Reinterprets the tensor elements as a `rows` by `cols` column-major matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidTensorShape`] if the number of elements differs or the
    /// tensor does not store all matrix elements in normal order.
    pub fn reshape_tensor(&mut self, rows: usize, cols: usize) -> Result<&mut Self, ImageError> {
        if rows.checked_mul(cols) != Some(self.tensor.elements()) {
            return Err(ImageError::InvalidTensorShape(format!(
                "{} elements do not make a {rows}x{cols} matrix",
                self.tensor.elements()
            )));
        }
        self.tensor = self.tensor.reshaped(rows)?;
        Ok(self)
    }

    /// Gives the tensor the shape of `tensor`, which must have as many elements.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidTensorShape`] if the number of elements differs.
    pub fn reshape_tensor_as(&mut self, tensor: &Tensor) -> Result<&mut Self, ImageError> {
        if tensor.elements() != self.tensor.elements() {
            return Err(ImageError::InvalidTensorShape(format!(
                "{} elements do not make a tensor of {}",
                self.tensor.elements(),
                tensor.elements()
            )));
        }
        self.tensor = *tensor;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndimage_core::DataType;

    #[test]
    fn test_permute() -> Result<(), ImageError> {
        let mut img = Image::new(&[4, 1, 3], 1, DataType::UInt8)?;
        img.permute_dimensions(&[2, 0])?;
        assert_eq!(img.sizes(), &[3, 4]);
        assert_eq!(img.strides(), &[4, 1]);
        img.permute_dimensions(&[1, 0])?;
        assert_eq!(img.sizes(), &[4, 3]);
        assert_eq!(img.strides(), &[1, 4]);

        assert_eq!(
            img.permute_dimensions(&[0, 0]).err(),
            Some(ImageError::DuplicateDimension(0))
        );
        assert_eq!(
            img.permute_dimensions(&[0]).err(),
            Some(ImageError::CannotDiscardNonSingleton(1))
        );
        assert_eq!(
            img.permute_dimensions(&[0, 2]).err(),
            Some(ImageError::IllegalDimension {
                dim: 2,
                dimensionality: 2
            })
        );
        Ok(())
    }

    #[test]
    fn test_squeeze_and_singletons() -> Result<(), ImageError> {
        let mut img = Image::new(&[1, 5, 1, 2], 1, DataType::SInt16)?;
        img.squeeze()?;
        assert_eq!(img.sizes(), &[5, 2]);
        assert_eq!(img.strides(), &[1, 5]);
        img.add_singleton(1)?;
        assert_eq!(img.sizes(), &[5, 1, 2]);
        assert_eq!(img.strides(), &[1, 0, 5]);
        img.expand_dimensionality(4)?;
        assert_eq!(img.sizes(), &[5, 1, 2, 1]);
        img.expand_singleton_dimension(1, 7)?;
        assert!(img.is_singleton_expanded());
        img.unexpand_singleton_dimensions()?;
        assert_eq!(img.sizes(), &[5, 1, 2, 1]);
        assert!(img.add_singleton(5).is_err());
        assert!(img.expand_singleton_dimension(0, 3).is_err());
        Ok(())
    }

    #[test]
    fn test_expand_singleton_dimensions() -> Result<(), ImageError> {
        let mut img = Image::new(&[1, 4], 1, DataType::UInt8)?;
        img.expand_singleton_dimensions(&[3, 4, 2])?;
        assert_eq!(img.sizes(), &[3, 4, 2]);
        assert_eq!(img.strides(), &[0, 1, 0]);
        img.unexpand_singleton_dimension(2)?;
        assert_eq!(img.sizes(), &[3, 4, 1]);
        assert!(matches!(
            img.unexpand_singleton_dimension(1),
            Err(ImageError::InvalidParameter(_))
        ));
        img.unexpand_singleton_dimensions()?;
        assert_eq!(img.sizes(), &[1, 4, 1]);
        let mut img = Image::new(&[2, 4], 1, DataType::UInt8)?;
        assert_eq!(
            img.expand_singleton_dimensions(&[3, 4]).err(),
            Some(ImageError::SizesDontMatch)
        );
        let mut scalar = Image::new(&[2], 1, DataType::UInt8)?;
        scalar.expand_singleton_tensor(3)?;
        assert_eq!(scalar.tensor_elements(), 3);
        assert!(scalar.is_singleton_expanded());
        Ok(())
    }

    #[test]
    fn test_mirror_twice_is_identity() -> Result<(), ImageError> {
        let mut img = Image::new(&[6, 4], 2, DataType::SFloat)?;
        let origin = img.origin_offset();
        img.mirror(&[true, true])?;
        assert_eq!(img.strides(), &[-2, -12]);
        assert_eq!(img.origin_offset(), (5 * 2 + 3 * 12) * 4);
        img.mirror(&[true, true])?;
        assert_eq!(img.strides(), &[2, 12]);
        assert_eq!(img.origin_offset(), origin);
        Ok(())
    }

    #[test]
    fn test_flatten() -> Result<(), ImageError> {
        let mut img = Image::new(&[4, 5], 1, DataType::UInt8)?;
        img.mirror(&[false, true])?;
        img.swap_dimensions(0, 1)?;
        let block = img.data_block().cloned();
        img.flatten()?;
        assert_eq!(img.sizes(), &[20]);
        assert_eq!(img.strides(), &[1]);
        assert_eq!(img.origin_offset(), 0);
        assert!(img.data_block().zip(block.as_ref()).is_some_and(|(a, b)| a.ptr_eq(b)));

        // no simple stride: the samples are copied
        let base = Image::new(&[4, 5], 1, DataType::UInt8)?;
        let mut roi = base.view(&[0, 0], &[2, 5], &[1, 1])?;
        roi.flatten()?;
        assert_eq!(roi.sizes(), &[10]);
        assert!(!roi.shares_data(&base));

        // interleaved tensor elements leave the pixels on one line
        let color = Image::new(&[4, 5], 3, DataType::UInt8)?;
        let mut flat = color.clone();
        flat.flatten()?;
        assert_eq!(flat.sizes(), &[20]);
        assert_eq!(flat.strides(), &[3]);
        assert!(flat.shares_data(&color));
        Ok(())
    }

    #[test]
    fn test_tensor_spatial_round_trip() -> Result<(), ImageError> {
        let mut plane = Image::new(&[6, 2], 1, DataType::UInt8)?;
        assert!(matches!(
            plane.spatial_to_tensor(0, usize::MAX, 2),
            Err(ImageError::InvalidParameter(_))
        ));
        assert!(plane.reshape_tensor(usize::MAX, 2).is_err());

        let mut img = Image::new(&[4, 5], 6, DataType::UInt16)?;
        img.tensor_to_spatial(0)?;
        assert_eq!(img.sizes(), &[6, 4, 5]);
        assert_eq!(img.strides(), &[1, 6, 24]);
        assert!(img.is_scalar());
        img.spatial_to_tensor(0, 2, 3)?;
        assert_eq!(img.sizes(), &[4, 5]);
        assert_eq!(img.tensor().sizes(), vec![2, 3]);
        assert_eq!(img.tensor_stride(), 1);
        assert_eq!(img.spatial_to_tensor(0, 0, 0).err(), Some(ImageError::NotScalar));
        img.transpose_tensor();
        assert_eq!(img.tensor().sizes(), vec![3, 2]);
        // a row-major tensor does not store its elements in normal order
        assert!(img.reshape_tensor(6, 1).is_err());
        img.transpose_tensor().reshape_tensor(3, 2)?;
        assert_eq!(img.tensor().sizes(), vec![3, 2]);
        Ok(())
    }
}
