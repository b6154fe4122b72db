//! Stride arithmetic on plain size and stride arrays.
//!
//! Strides are in samples, not bytes, and may be negative or zero.

use crate::error::ImageError;

/// Dimensions no longer than this lose to a longer one when picking a processing dimension.
const SMALL_IMAGE: usize = 63;

/// Number of pixels, or an error if the product overflows.
pub fn number_of_pixels(sizes: &[usize]) -> Result<usize, ImageError> {
    sizes
        .iter()
        .try_fold(1usize, |acc, &s| acc.checked_mul(s))
        .ok_or(ImageError::SizeExceedsLimit)
}

/// Strides of a compact image with interleaved tensor elements.
///
/// The tensor stride is 1, the first spatial stride is `tensor_elements` and every following
/// stride is the previous stride times the previous size.
///
/// Strides of images too large to address saturate at `isize::MAX`; such images fail to
/// forge.
pub fn normal_strides(sizes: &[usize], tensor_elements: usize) -> Vec<isize> {
    let mut stride = isize::try_from(tensor_elements).unwrap_or(isize::MAX);
    sizes
        .iter()
        .map(|&s| {
            let out = stride;
            stride = stride.saturating_mul(isize::try_from(s).unwrap_or(isize::MAX));
            out
        })
        .collect()
}

/// Span of the samples addressed by `sizes` and `strides`.
///
/// Returns the number of samples between the lowest and highest addressed sample, inclusive,
/// and the offset of the lowest one relative to the origin, which is zero or negative.
pub fn data_block_size_and_start(sizes: &[usize], strides: &[isize]) -> (usize, isize) {
    let mut size = 1usize;
    let mut start = 0isize;
    for (&n, &s) in sizes.iter().zip(strides) {
        if n == 0 {
            continue;
        }
        let extent = (n - 1) as isize * s;
        if s < 0 {
            start += extent;
        }
        size += extent.unsigned_abs();
    }
    (size, start)
}

/// As [`data_block_size_and_start`], including the tensor dimension.
pub fn data_block_size_and_start_with_tensor(
    sizes: &[usize],
    strides: &[isize],
    tensor_elements: usize,
    tensor_stride: isize,
) -> (usize, isize) {
    let (mut sizes, mut strides) = (sizes.to_vec(), strides.to_vec());
    sizes.push(tensor_elements);
    strides.push(tensor_stride);
    data_block_size_and_start(&sizes, &strides)
}

/// Returns true if no two pixels or tensor elements share a sample.
///
/// Dimensions are sorted by stride magnitude; each stride must exceed the extent of all
/// smaller dimensions together. The tensor dimension takes part when it has more than one
/// element.
pub fn has_valid_strides(
    sizes: &[usize],
    strides: &[isize],
    tensor_elements: usize,
    tensor_stride: isize,
) -> bool {
    if sizes.len() != strides.len() {
        return false;
    }
    let mut dims: Vec<(isize, usize)> = strides
        .iter()
        .map(|s| s.abs())
        .zip(sizes.iter().copied())
        .collect();
    if tensor_elements > 1 {
        dims.push((tensor_stride.abs(), tensor_elements));
    }
    dims.sort_unstable();
    if let Some(&(s, _)) = dims.first() {
        if s == 0 {
            return false;
        }
    }
    dims.windows(2)
        .all(|w| w[1].0 > w[0].0 * (w[0].1 as isize - 1))
}

/// The simple stride of an image and the offset of its lowest sample.
///
/// An image has a simple stride when all its pixels can be visited with a single stride from
/// the lowest one: the samples form a single line with constant step. The stride is the
/// smallest one among dimensions longer than 1, or 1 if there is none. Tensor elements are not
/// considered. Returns `None` if the pixels cannot be traversed that way.
pub fn simple_stride_and_start(sizes: &[usize], strides: &[isize]) -> Option<(isize, isize)> {
    let stride = sizes
        .iter()
        .zip(strides)
        .filter(|&(&n, _)| n > 1)
        .map(|(_, s)| s.abs())
        .min()
        .unwrap_or(1);
    let npix = number_of_pixels(sizes).ok()?;
    if stride == 0 || npix == 0 {
        return None;
    }
    let (size, start) = data_block_size_and_start(sizes, strides);
    let span = (npix - 1).checked_mul(stride.unsigned_abs())?.checked_add(1)?;
    (span == size).then_some((stride, start))
}

/// Best dimension to process lines along.
///
/// That is the dimension with the smallest non-zero stride, unless it is short and another
/// dimension is longer.
pub fn optimal_processing_dim(sizes: &[usize], strides: &[isize]) -> usize {
    let mut dim = 0;
    for ii in 1..strides.len().min(sizes.len()) {
        if strides[ii] != 0 && strides[ii].abs() < strides[dim].abs() {
            if sizes[ii] > SMALL_IMAGE || sizes[ii] > sizes[dim] {
                dim = ii;
            }
        } else if sizes[dim] <= SMALL_IMAGE && sizes[ii] > sizes[dim] {
            dim = ii;
        }
    }
    dim
}

/// Expands `sizes` so that `other` can be singleton-expanded to it.
///
/// Missing trailing dimensions count as 1; a size of 1 grows to the other size.
///
/// # Errors
///
/// Returns [`ImageError::SizesDontMatch`] if two sizes differ and neither is 1.
pub fn singleton_expanded_sizes(sizes: &mut Vec<usize>, other: &[usize]) -> Result<(), ImageError> {
    if sizes.len() < other.len() {
        sizes.resize(other.len(), 1);
    }
    for (s, &o) in sizes.iter_mut().zip(other) {
        if *s != o {
            if *s == 1 {
                *s = o;
            } else if o != 1 {
                return Err(ImageError::SizesDontMatch);
            }
        }
    }
    Ok(())
}

/// Converts sample offsets back into coordinates.
///
/// Works for any strides for which [`has_valid_strides`] holds, including negative ones.
#[derive(Debug, Clone)]
pub struct CoordinatesComputer {
    sizes: Vec<usize>,
    strides: Vec<isize>,
    order: Vec<usize>,
    start: isize,
}

impl CoordinatesComputer {
    /// Prepares the conversion for the given sizes and strides.
    pub fn new(sizes: &[usize], strides: &[isize]) -> Self {
        let (_, start) = data_block_size_and_start(sizes, strides);
        let mut order: Vec<usize> = (0..sizes.len())
            .filter(|&d| strides[d] != 0)
            .collect();
        order.sort_by_key(|&d| std::cmp::Reverse(strides[d].abs()));
        Self {
            sizes: sizes.to_vec(),
            strides: strides.to_vec(),
            order,
            start,
        }
    }

    /// Coordinates of the pixel at `offset` samples from the origin.
    pub fn coordinates(&self, offset: isize) -> Vec<usize> {
        let mut coords = vec![0; self.sizes.len()];
        let mut rest = offset - self.start;
        for &d in &self.order {
            let s = self.strides[d].abs();
            let c = (rest / s) as usize;
            rest %= s;
            coords[d] = if self.strides[d] < 0 {
                self.sizes[d] - 1 - c
            } else {
                c
            };
        }
        coords
    }
}

/// Coordinates of the pixel with linear index `index`, dimension 0 running fastest.
pub fn index_to_coordinates(sizes: &[usize], mut index: usize) -> Vec<usize> {
    sizes
        .iter()
        .map(|&n| {
            let c = index % n.max(1);
            index /= n.max(1);
            c
        })
        .collect()
}

/// Linear index of the pixel at `coords`, dimension 0 running fastest.
pub fn coordinates_to_index(sizes: &[usize], coords: &[usize]) -> usize {
    let mut index = 0;
    let mut step = 1;
    for (&n, &c) in sizes.iter().zip(coords) {
        index += c * step;
        step *= n;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_normal_strides() {
        assert_eq!(normal_strides(&[5, 8, 7], 3), vec![3, 15, 120]);
        assert_eq!(normal_strides(&[5, 8, 7], 1), vec![1, 5, 40]);
        assert!(normal_strides(&[], 3).is_empty());
        // strides of an image too large to address saturate instead of wrapping
        assert_eq!(
            normal_strides(&[usize::MAX / 2, 4, 2], 1),
            vec![1, isize::MAX, isize::MAX]
        );
        assert_eq!(normal_strides(&[usize::MAX, 2], 2), vec![2, isize::MAX]);
    }

    #[test]
    fn test_block_size() {
        assert_eq!(data_block_size_and_start(&[5, 8], &[1, 5]), (40, 0));
        assert_eq!(data_block_size_and_start(&[5, 8], &[-1, 5]), (40, -4));
        assert_eq!(data_block_size_and_start(&[5, 8], &[0, 5]), (36, 0));
        assert_eq!(
            data_block_size_and_start_with_tensor(&[5, 8, 7], &[1, -15, 120], 3, 5),
            (840, -105)
        );
    }

    #[test]
    fn test_valid_strides() {
        assert!(has_valid_strides(&[5, 8, 7], &[3, 15, 120], 3, 1));
        assert!(has_valid_strides(&[5, 8, 7], &[1, 15, 120], 3, 5));
        assert!(has_valid_strides(&[5, 8, 7], &[1, -15, 120], 3, 5));
        assert!(has_valid_strides(&[5, 8, 7], &[1, 20, 160], 3, 5));
        // tensor elements interleave with pixels
        assert!(!has_valid_strides(&[5, 8, 7], &[1, 15, 120], 3, 2));
        assert!(!has_valid_strides(&[5, 8], &[0, 5], 1, 1));
        assert!(!has_valid_strides(&[5, 8], &[1], 1, 1));
    }

    #[test]
    fn test_simple_stride() {
        assert_eq!(simple_stride_and_start(&[5, 8], &[1, 5]), Some((1, 0)));
        assert_eq!(simple_stride_and_start(&[5, 8], &[8, 1]), Some((1, 0)));
        assert_eq!(simple_stride_and_start(&[5, 8], &[-2, 10]), Some((2, -8)));
        assert_eq!(simple_stride_and_start(&[5, 8], &[1, 6]), None);
        assert_eq!(simple_stride_and_start(&[1, 1], &[3, 7]), Some((1, 0)));
    }

    #[test]
    fn test_optimal_processing_dim() {
        assert_eq!(optimal_processing_dim(&[100, 100], &[1, 100]), 0);
        assert_eq!(optimal_processing_dim(&[100, 100], &[100, 1]), 1);
        // the short dimension with the smallest stride loses to a long one
        assert_eq!(optimal_processing_dim(&[3, 200], &[1, 3]), 1);
        assert_eq!(optimal_processing_dim(&[200, 3], &[3, 1]), 0);
    }

    #[test]
    fn test_singleton_expanded_sizes() -> Result<(), ImageError> {
        let mut sizes = vec![1, 5];
        singleton_expanded_sizes(&mut sizes, &[4, 1, 3])?;
        assert_eq!(sizes, vec![4, 5, 3]);
        assert_eq!(
            singleton_expanded_sizes(&mut sizes, &[3]),
            Err(ImageError::SizesDontMatch)
        );
        Ok(())
    }

    #[test]
    fn test_coordinates_round_trip() {
        let mut rng = rand::rng();
        let sizes = [6, 4, 5];
        let strides = [-20, 1, 4];
        let computer = CoordinatesComputer::new(&sizes, &strides);
        for _ in 0..50 {
            let coords: Vec<usize> = sizes.iter().map(|&n| rng.random_range(0..n)).collect();
            let offset: isize = coords
                .iter()
                .zip(&strides)
                .map(|(&c, &s)| c as isize * s)
                .sum();
            assert_eq!(computer.coordinates(offset), coords);
        }
        for index in 0..120 {
            let coords = index_to_coordinates(&sizes, index);
            assert_eq!(coordinates_to_index(&sizes, &coords), index);
        }
    }
}
