use std::fmt;

/// A magnitude with units, such as `0.5 µm`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalQuantity {
    /// The numeric value.
    pub magnitude: f64,
    /// The units, `px` for pixels.
    pub units: String,
}

impl PhysicalQuantity {
    /// Creates a quantity.
    pub fn new(magnitude: f64, units: impl Into<String>) -> Self {
        Self {
            magnitude,
            units: units.into(),
        }
    }

    /// One pixel, the size of a pixel without physical calibration.
    pub fn pixel() -> Self {
        Self::new(1.0, "px")
    }

    /// Returns true if the units are pixels.
    pub fn is_pixel(&self) -> bool {
        self.units == "px"
    }
}

impl Default for PhysicalQuantity {
    fn default() -> Self {
        Self::pixel()
    }
}

impl fmt::Display for PhysicalQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.units)
    }
}

/// The physical size of a pixel along each dimension.
///
/// The last stored value repeats for all higher dimensions, so an isotropic pixel size needs a
/// single value. An empty pixel size is one pixel along every dimension.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PixelSize {
    sizes: Vec<PhysicalQuantity>,
}

impl PixelSize {
    /// An isotropic pixel size.
    pub fn isotropic(size: PhysicalQuantity) -> Self {
        Self { sizes: vec![size] }
    }

    /// A pixel size with one value per dimension.
    pub fn from_sizes(sizes: Vec<PhysicalQuantity>) -> Self {
        let mut out = Self { sizes };
        out.compact();
        out
    }

    /// Size along dimension `dim`.
    pub fn get(&self, dim: usize) -> PhysicalQuantity {
        match self.sizes.get(dim).or(self.sizes.last()) {
            Some(q) => q.clone(),
            None => PhysicalQuantity::pixel(),
        }
    }

    /// Sets the size along dimension `dim`, keeping all other dimensions unchanged.
    pub fn set(&mut self, dim: usize, size: PhysicalQuantity) {
        self.expand(dim + 2);
        self.sizes[dim] = size;
        self.compact();
    }

    /// Returns true if any dimension has physical units.
    pub fn is_defined(&self) -> bool {
        self.sizes.iter().any(|q| !q.is_pixel())
    }

    /// Returns true if all dimensions have the same size.
    pub fn is_isotropic(&self) -> bool {
        self.sizes.windows(2).all(|w| w[0] == w[1])
    }

    /// Forgets all sizes.
    pub fn clear(&mut self) {
        self.sizes.clear();
    }

    /// Reorders the first `order.len()` dimensions so that new dimension `i` is old dimension
    /// `order[i]`.
    pub fn permute(&mut self, order: &[usize]) {
        if self.is_isotropic() {
            return;
        }
        let n = order.iter().copied().max().map_or(0, |m| m + 1);
        self.expand(n.max(order.len()) + 1);
        let old = self.sizes.clone();
        let mut sizes: Vec<_> = order.iter().map(|&d| old[d].clone()).collect();
        sizes.push(old[old.len() - 1].clone());
        self.sizes = sizes;
        self.compact();
    }

    /// Swaps two dimensions.
    pub fn swap(&mut self, d1: usize, d2: usize) {
        if self.is_isotropic() {
            return;
        }
        self.expand(d1.max(d2) + 2);
        self.sizes.swap(d1, d2);
        self.compact();
    }

    /// Inserts a dimension at `dim` with the given size.
    pub fn insert(&mut self, dim: usize, size: PhysicalQuantity) {
        if self.sizes.is_empty() && size.is_pixel() {
            return;
        }
        self.expand(dim + 1);
        self.sizes.insert(dim, size);
        self.compact();
    }

    /// Removes dimension `dim`.
    pub fn erase(&mut self, dim: usize) {
        if self.is_isotropic() {
            return;
        }
        self.expand(dim + 2);
        self.sizes.remove(dim);
        self.compact();
    }

    /// Multiplies the size along `dim` by `factor`.
    pub fn scale(&mut self, dim: usize, factor: f64) {
        if factor == 1.0 {
            return;
        }
        let mut q = self.get(dim);
        q.magnitude *= factor;
        self.set(dim, q);
    }

    fn expand(&mut self, n: usize) {
        let last = self.sizes.last().cloned().unwrap_or_default();
        if self.sizes.len() < n {
            self.sizes.resize(n, last);
        }
    }

    fn compact(&mut self) {
        while let [.., a, b] = self.sizes.as_slice() {
            if a != b {
                break;
            }
            self.sizes.pop();
        }
        if self.sizes.len() == 1 && self.sizes[0].is_pixel() && self.sizes[0].magnitude == 1.0 {
            self.sizes.clear();
        }
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sizes.is_empty() {
            return f.write_str("undefined");
        }
        let parts: Vec<String> = self.sizes.iter().map(|q| q.to_string()).collect();
        write!(f, "{}", parts.join(" x "))
    }
}
