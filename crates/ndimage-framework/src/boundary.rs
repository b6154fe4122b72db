//! Filling the border of a line buffer.

use std::fmt;
use std::str::FromStr;

use ndimage_core::{dispatch, Sample, SampleVisitor};

use crate::buffer::LineBuffer;
use crate::error::FrameworkError;

/// How the values beyond the ends of an image line are made up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryCondition {
    /// The line is mirrored at its ends, repeating the edge pixel: `c b a | a b c | c b a`.
    #[default]
    SymmetricMirror,
    /// The line repeats: `a b c | a b c | a b c`.
    Periodic,
    /// The edge pixel is repeated: `a a a | a b c | c c c`.
    ZeroOrderExtrapolate,
    /// Zeros: `0 0 0 | a b c | 0 0 0`.
    AddZeros,
}

impl BoundaryCondition {
    /// The pixel of a line of `length` pixels that provides the value at `index`, which may
    /// lie outside `0..length`. `None` means the value is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ndimage_framework::BoundaryCondition;
    ///
    /// let bc = BoundaryCondition::SymmetricMirror;
    /// assert_eq!(bc.source_index(-1, 3), Some(0));
    /// assert_eq!(bc.source_index(4, 3), Some(1));
    /// ```
    pub fn source_index(self, index: isize, length: usize) -> Option<usize> {
        let n = length as isize;
        if n == 0 {
            return None;
        }
        if (0..n).contains(&index) {
            return Some(index as usize);
        }
        match self {
            BoundaryCondition::SymmetricMirror => {
                let m = index.rem_euclid(2 * n);
                let src = if m < n { m } else { 2 * n - 1 - m };
                Some(src as usize)
            }
            BoundaryCondition::Periodic => Some(index.rem_euclid(n) as usize),
            BoundaryCondition::ZeroOrderExtrapolate => Some(index.clamp(0, n - 1) as usize),
            BoundaryCondition::AddZeros => None,
        }
    }

    /// The name accepted by [`BoundaryCondition::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            BoundaryCondition::SymmetricMirror => "mirror",
            BoundaryCondition::Periodic => "periodic",
            BoundaryCondition::ZeroOrderExtrapolate => "zero order",
            BoundaryCondition::AddZeros => "add zeros",
        }
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BoundaryCondition {
    type Err = FrameworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "default" | "mirror" | "symmetric mirror" => Ok(BoundaryCondition::SymmetricMirror),
            "periodic" => Ok(BoundaryCondition::Periodic),
            "zero order" => Ok(BoundaryCondition::ZeroOrderExtrapolate),
            "add zeros" => Ok(BoundaryCondition::AddZeros),
            _ => Err(FrameworkError::Filter(format!(
                "unknown boundary condition {s:?}"
            ))),
        }
    }
}

/// Fills the `border` pixels at both ends of `line` according to `condition`.
///
/// # Safety
///
/// The line, including `line.border()` pixels at each end, must be valid for reads and writes
/// of its data type.
pub(crate) unsafe fn expand_border(line: &LineBuffer, condition: BoundaryCondition) {
    if line.border == 0 || line.length == 0 {
        return;
    }
    dispatch(
        line.data_type,
        ExpandBorder {
            line: *line,
            condition,
        },
    )
}

struct ExpandBorder {
    line: LineBuffer,
    condition: BoundaryCondition,
}

impl SampleVisitor for ExpandBorder {
    type Output = ();

    fn visit<T: Sample>(self) {
        let ExpandBorder { line, condition } = self;
        let ptr = line.ptr.cast::<T>();
        let (n, border) = (line.length as isize, line.border as isize);
        let outside = (-border..0).chain(n..n + border);
        for t in 0..line.tensor_length as isize {
            let element = ptr.wrapping_offset(t * line.tensor_stride);
            for index in outside.clone() {
                let value = match condition.source_index(index, line.length) {
                    // SAFETY: the source pixel lies on the line
                    Some(src) => unsafe { *element.wrapping_offset(src as isize * line.stride) },
                    None => T::default(),
                };
                // SAFETY: the caller guarantees the border is writable
                unsafe { *element.wrapping_offset(index * line.stride) = value };
            }
        }
    }
}
