//! Deciding whether two views of the same data block can share samples.
//!
//! The test never misses an overlap. It may report an overlap for some unusual stride
//! combinations where the views actually interleave without touching.

use ndimage_numeric::gcd;

use crate::image::Image;

/// Largest modulus tried when comparing the residues of two footprints.
const MAX_MODULUS: isize = 1 << 16;

/// Largest number of residue updates spent on one modulus.
const MAX_RESIDUE_WORK: usize = 1 << 22;

/// The addresses an image touches: an origin plus `(stride, size)` dimensions with positive
/// strides, in units counted from the start of the data block.
struct Footprint {
    origin: isize,
    dims: Vec<(isize, usize)>,
}

/// Sizes and strides with the tensor dimension appended when it has more than one element.
fn with_tensor_dimension(img: &Image) -> (Vec<usize>, Vec<isize>) {
    let mut sizes = img.sizes.clone();
    let mut strides = img.strides.clone();
    if img.tensor.elements() > 1 {
        sizes.push(img.tensor.elements());
        strides.push(img.tensor_stride);
    }
    (sizes, strides)
}

impl Footprint {
    /// Expresses `img` in units of `unit` bytes. Every sample spans `sample_size / unit`
    /// consecutive units, added as an extra dimension.
    fn new(img: &Image, unit: usize) -> Self {
        let scale = (img.sample_size() / unit) as isize;
        let mut origin = (img.origin / unit) as isize;
        let (sizes, strides) = with_tensor_dimension(img);
        let mut dims = Vec::with_capacity(sizes.len() + 1);
        for (&n, &s) in sizes.iter().zip(&strides) {
            if n < 2 || s == 0 {
                continue;
            }
            let s = s * scale;
            if s < 0 {
                origin += (n as isize - 1) * s;
            }
            dims.push((s.abs(), n));
        }
        if scale > 1 {
            dims.push((1, scale as usize));
        }
        Footprint { origin, dims }
    }

    /// The last unit touched.
    fn end(&self) -> isize {
        self.origin + self.dims.iter().map(|&(s, n)| (n as isize - 1) * s).sum::<isize>()
    }

    /// Marks every value the addresses take modulo `modulus`, or `None` if that is too much
    /// work.
    fn residues(&self, modulus: isize) -> Option<Vec<bool>> {
        let m = modulus as usize;
        let mut set = vec![false; m];
        set[self.origin.rem_euclid(modulus) as usize] = true;
        let mut work = 0usize;
        for &(s, n) in &self.dims {
            let step = s.rem_euclid(modulus) as usize;
            if step == 0 {
                continue;
            }
            // k * step repeats modulo m after this many steps
            let count = n.min(m / gcd(step, m));
            work += m * count;
            if work > MAX_RESIDUE_WORK {
                return None;
            }
            let mut next = vec![false; m];
            for r in (0..m).filter(|&r| set[r]) {
                let mut v = r;
                for _ in 0..count {
                    next[v] = true;
                    v = (v + step) % m;
                }
            }
            set = next;
        }
        Some(set)
    }
}

impl Image {
    /// Returns true if writing to `self` could change the samples of `other`.
    ///
    /// Raw images and images with different data blocks never alias.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ndimage_core::DataType;
    /// use ndimage_image::Image;
    ///
    /// let img = Image::new(&[50, 80], 3, DataType::UInt8).unwrap();
    /// let red = img.tensor_element(0).unwrap();
    /// let green = img.tensor_element(1).unwrap();
    /// assert!(img.aliases(&red));
    /// assert!(!red.aliases(&green));
    /// ```
    pub fn aliases(&self, other: &Image) -> bool {
        let (Some(block1), Some(block2)) = (&self.data_block, &other.data_block) else {
            return false;
        };
        if !block1.ptr_eq(block2) {
            return false;
        }
        if self.origin == other.origin {
            return true;
        }

        // the largest unit both origins and both sample sizes are multiples of
        let unit = [other.sample_size(), self.origin, other.origin]
            .into_iter()
            .fold(self.sample_size(), gcd)
            .max(1);
        let fp1 = Footprint::new(self, unit);
        let fp2 = Footprint::new(other, unit);

        if fp1.end() < fp2.origin || fp2.end() < fp1.origin {
            return false;
        }

        // shared addresses leave the same remainder for any modulus
        let grid = fp1
            .dims
            .iter()
            .chain(&fp2.dims)
            .fold(0, |g, &(s, _)| gcd(g, s));
        if grid > 1 && (fp1.origin - fp2.origin) % grid != 0 {
            return false;
        }
        let mut moduli: Vec<isize> = fp1
            .dims
            .iter()
            .chain(&fp2.dims)
            .map(|&(s, _)| s)
            .filter(|&s| s > 1 && s <= MAX_MODULUS)
            .collect();
        moduli.sort_unstable();
        moduli.dedup();
        for modulus in moduli {
            let (Some(r1), Some(r2)) = (fp1.residues(modulus), fp2.residues(modulus)) else {
                continue;
            };
            if !r1.iter().zip(&r2).any(|(&a, &b)| a && b) {
                return false;
            }
        }
        true
    }


    /// Returns true if both images address the same samples in the same way.
    pub fn is_identical_view(&self, other: &Image) -> bool {
        self.shares_data(other)
            && self.origin == other.origin
            && self.data_type == other.data_type
            && self.sizes == other.sizes
            && self.strides == other.strides
            && self.tensor.elements() == other.tensor.elements()
            && (self.tensor.elements() == 1 || self.tensor_stride == other.tensor_stride)
    }

    /// Returns true if the images share samples without being identical views.
    ///
    /// Writing one pixel at a time from such an image into the other would read samples
    /// already overwritten.
    pub fn is_overlapping_view(&self, other: &Image) -> bool {
        self.aliases(other) && !self.is_identical_view(other)
    }

    /// Returns true if `self` is an overlapping view of any of `others`.
    pub fn is_overlapping_view_of_any(&self, others: &[&Image]) -> bool {
        others.iter().any(|o| self.is_overlapping_view(o))
    }
}

/// Returns true if writing to `a` could change the samples of `b`. See [`Image::aliases`].
pub fn alias(a: &Image, b: &Image) -> bool {
    a.aliases(b)
}
