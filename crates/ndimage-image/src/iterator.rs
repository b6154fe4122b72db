//! Walking the lines of one or more images of equal sizes.

use crate::image::Image;

/// Visits all lines along a processing dimension of images that share their sizes.
///
/// Each image contributes its own strides; the iterator tracks the current coordinates and,
/// for every image, the offset in samples of the first pixel of the current line. Moving to
/// the next line is an odometer step over the other dimensions, so any number of dimensions
/// is handled without recursion.
///
/// A 0-D image is treated as a single line of one pixel.
///
/// # Examples
///
/// ```rust
/// use ndimage_image::LineIterator;
///
/// let mut it = LineIterator::new(&[4, 3], 0, vec![vec![1, 4]]);
/// let mut starts = vec![it.offset(0)];
/// while it.next_line() {
///     starts.push(it.offset(0));
/// }
/// assert_eq!(starts, vec![0, 4, 8]);
/// ```
#[derive(Debug, Clone)]
pub struct LineIterator {
    sizes: Vec<usize>,
    proc_dim: usize,
    strides: Vec<Vec<isize>>,
    coords: Vec<usize>,
    offsets: Vec<isize>,
}

impl LineIterator {
    /// Starts at the first line.
    ///
    /// `strides` holds one stride array per image, each with one stride per dimension.
    pub fn new(sizes: &[usize], proc_dim: usize, strides: Vec<Vec<isize>>) -> Self {
        let (sizes, strides, proc_dim) = if sizes.is_empty() {
            (vec![1], strides.iter().map(|_| vec![0]).collect(), 0)
        } else {
            (sizes.to_vec(), strides, proc_dim)
        };
        let offsets = vec![0; strides.len()];
        Self {
            coords: vec![0; sizes.len()],
            sizes,
            proc_dim,
            strides,
            offsets,
        }
    }

    /// Iterates over the lines of several images of the same sizes.
    pub fn for_images(images: &[&Image], proc_dim: usize) -> Self {
        let sizes = images.first().map_or(&[][..], |img| img.sizes());
        let strides = images.iter().map(|img| img.strides().to_vec()).collect();
        Self::new(sizes, proc_dim, strides)
    }

    /// The processing dimension.
    pub fn processing_dimension(&self) -> usize {
        self.proc_dim
    }

    /// Number of pixels on each line.
    pub fn line_length(&self) -> usize {
        self.sizes[self.proc_dim]
    }

    /// Total number of lines.
    pub fn number_of_lines(&self) -> usize {
        self.sizes
            .iter()
            .enumerate()
            .filter(|&(d, _)| d != self.proc_dim)
            .map(|(_, &n)| n)
            .product()
    }

    /// Coordinates of the first pixel of the current line.
    pub fn coordinates(&self) -> &[usize] {
        &self.coords
    }

    /// Offset in samples of the first pixel of the current line in image `image`.
    pub fn offset(&self, image: usize) -> isize {
        self.offsets[image]
    }

    /// Stride along the line in image `image`.
    pub fn line_stride(&self, image: usize) -> isize {
        self.strides[image][self.proc_dim]
    }

    /// Jumps to line number `line`, counting lines with the lowest dimension fastest.
    pub fn seek(&mut self, mut line: usize) {
        for d in 0..self.sizes.len() {
            if d == self.proc_dim {
                self.coords[d] = 0;
                continue;
            }
            self.coords[d] = line % self.sizes[d];
            line /= self.sizes[d];
        }
        for (offset, strides) in self.offsets.iter_mut().zip(&self.strides) {
            *offset = self
                .coords
                .iter()
                .zip(strides)
                .map(|(&c, &s)| c as isize * s)
                .sum();
        }
    }

    /// Moves to the next line. Returns false, and wraps to the first line, after the last.
    pub fn next_line(&mut self) -> bool {
        for d in 0..self.sizes.len() {
            if d == self.proc_dim {
                continue;
            }
            self.coords[d] += 1;
            for (offset, strides) in self.offsets.iter_mut().zip(&self.strides) {
                *offset += strides[d];
            }
            if self.coords[d] < self.sizes[d] {
                return true;
            }
            for (offset, strides) in self.offsets.iter_mut().zip(&self.strides) {
                *offset -= strides[d] * self.sizes[d] as isize;
            }
            self.coords[d] = 0;
        }
        false
    }
}
