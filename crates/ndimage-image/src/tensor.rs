//! The shape of the tensor stored at each pixel.
//!
//! Samples of a pixel are stored along the tensor dimension in the order given by
//! [`TensorShape`]. Symmetric and triangular matrices store only the elements that carry
//! information: the diagonal first, followed by the upper triangle row by row. For a 3x3
//! symmetric matrix that is `xx, yy, zz, xy, xz, yz`.

use std::fmt;

use crate::error::ImageError;

/// How the tensor elements of a pixel map to rows and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TensorShape {
    /// A column vector, or a scalar when it has one element.
    #[default]
    ColVector,
    /// A row vector.
    RowVector,
    /// A full matrix stored column by column.
    ColMajorMatrix,
    /// A full matrix stored row by row.
    RowMajorMatrix,
    /// A square matrix of which only the diagonal is stored.
    DiagonalMatrix,
    /// A square symmetric matrix; the diagonal and upper triangle are stored.
    SymmetricMatrix,
    /// A square upper triangular matrix; the diagonal and upper triangle are stored.
    UpperTriangularMatrix,
    /// A square lower triangular matrix; the diagonal and lower triangle are stored.
    LowerTriangularMatrix,
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TensorShape::ColVector => "column vector",
            TensorShape::RowVector => "row vector",
            TensorShape::ColMajorMatrix => "column-major matrix",
            TensorShape::RowMajorMatrix => "row-major matrix",
            TensorShape::DiagonalMatrix => "diagonal matrix",
            TensorShape::SymmetricMatrix => "symmetric matrix",
            TensorShape::UpperTriangularMatrix => "upper triangular matrix",
            TensorShape::LowerTriangularMatrix => "lower triangular matrix",
        };
        f.write_str(name)
    }
}

/// The tensor of a pixel: a shape, a number of elements and a number of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tensor {
    shape: TensorShape,
    elements: usize,
    rows: usize,
}

impl Default for Tensor {
    fn default() -> Self {
        Self::scalar()
    }
}

impl Tensor {
    /// A scalar: a column vector with one element.
    pub const fn scalar() -> Self {
        Self {
            shape: TensorShape::ColVector,
            elements: 1,
            rows: 1,
        }
    }

    /// A column vector with `n` elements.
    pub const fn vector(n: usize) -> Self {
        Self {
            shape: TensorShape::ColVector,
            elements: n,
            rows: n,
        }
    }

    /// A full `rows` by `cols` matrix in column-major order.
    ///
    /// A single column gives a column vector and a single row a row vector.
    pub const fn matrix(rows: usize, cols: usize) -> Self {
        if cols == 1 {
            Self::vector(rows)
        } else if rows == 1 {
            Self {
                shape: TensorShape::RowVector,
                elements: cols,
                rows: 1,
            }
        } else {
            Self {
                shape: TensorShape::ColMajorMatrix,
                elements: rows * cols,
                rows,
            }
        }
    }

    /// A tensor of the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidTensorShape`] if the sizes are zero or do not fit the
    /// shape, such as a non-square symmetric matrix.
    pub fn with_shape(shape: TensorShape, rows: usize, cols: usize) -> Result<Self, ImageError> {
        if rows == 0 || cols == 0 {
            return Err(ImageError::InvalidTensorShape(format!(
                "{shape} of {rows}x{cols}"
            )));
        }
        let square = || {
            if rows == cols {
                Ok(())
            } else {
                Err(ImageError::InvalidTensorShape(format!(
                    "{shape} must be square, got {rows}x{cols}"
                )))
            }
        };
        let tensor = match shape {
            TensorShape::ColVector | TensorShape::RowVector
                if (shape == TensorShape::ColVector && cols != 1)
                    || (shape == TensorShape::RowVector && rows != 1) =>
            {
                return Err(ImageError::InvalidTensorShape(format!(
                    "{shape} of {rows}x{cols}"
                )));
            }
            TensorShape::ColVector | TensorShape::RowVector | TensorShape::ColMajorMatrix => {
                Self::matrix(rows, cols)
            }
            TensorShape::RowMajorMatrix => {
                let mut t = Self::matrix(rows, cols);
                if t.shape == TensorShape::ColMajorMatrix {
                    t.shape = TensorShape::RowMajorMatrix;
                }
                t
            }
            TensorShape::DiagonalMatrix => {
                square()?;
                Self {
                    shape,
                    elements: rows,
                    rows,
                }
            }
            TensorShape::SymmetricMatrix
            | TensorShape::UpperTriangularMatrix
            | TensorShape::LowerTriangularMatrix => {
                square()?;
                Self {
                    shape,
                    elements: rows * (rows + 1) / 2,
                    rows,
                }
            }
        };
        Ok(tensor)
    }

    /// The storage shape.
    #[inline]
    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    /// Number of stored elements.
    #[inline]
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        match self.shape {
            TensorShape::ColVector => 1,
            TensorShape::RowVector => self.elements,
            TensorShape::ColMajorMatrix | TensorShape::RowMajorMatrix => self.elements / self.rows,
            _ => self.rows,
        }
    }

    /// `[rows]` for a column vector, `[rows, columns]` otherwise.
    pub fn sizes(&self) -> Vec<usize> {
        if self.shape == TensorShape::ColVector {
            vec![self.rows]
        } else {
            vec![self.rows, self.columns()]
        }
    }

    /// Returns true if there is a single element.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.elements == 1
    }

    /// Returns true for row and column vectors, including scalars.
    #[inline]
    pub fn is_vector(&self) -> bool {
        matches!(self.shape, TensorShape::ColVector | TensorShape::RowVector)
    }

    /// Returns true for diagonal matrices.
    #[inline]
    pub fn is_diagonal(&self) -> bool {
        self.shape == TensorShape::DiagonalMatrix
    }

    /// Returns true for symmetric matrices.
    #[inline]
    pub fn is_symmetric(&self) -> bool {
        self.shape == TensorShape::SymmetricMatrix
    }

    /// Returns true for upper and lower triangular matrices.
    #[inline]
    pub fn is_triangular(&self) -> bool {
        matches!(
            self.shape,
            TensorShape::UpperTriangularMatrix | TensorShape::LowerTriangularMatrix
        )
    }

    /// Returns true if the rows equal the columns.
    pub fn is_square(&self) -> bool {
        self.rows == self.columns()
    }

    /// Returns true if every matrix element is stored, in column-major order.
    pub fn has_normal_order(&self) -> bool {
        matches!(
            self.shape,
            TensorShape::ColVector | TensorShape::ColMajorMatrix
        )
    }

    /// The transposed tensor. The stored elements keep their order.
    pub fn transposed(&self) -> Self {
        let mut out = *self;
        match self.shape {
            TensorShape::ColVector if self.elements > 1 => {
                out.shape = TensorShape::RowVector;
                out.rows = 1;
            }
            TensorShape::RowVector => {
                out.shape = TensorShape::ColVector;
                out.rows = self.elements;
            }
            TensorShape::ColMajorMatrix => {
                out.shape = TensorShape::RowMajorMatrix;
                out.rows = self.columns();
            }
            TensorShape::RowMajorMatrix => {
                out.shape = TensorShape::ColMajorMatrix;
                out.rows = self.columns();
            }
            TensorShape::UpperTriangularMatrix => out.shape = TensorShape::LowerTriangularMatrix,
            TensorShape::LowerTriangularMatrix => out.shape = TensorShape::UpperTriangularMatrix,
            _ => {}
        }
        out
    }

    /// Reinterprets the elements as a column-major matrix with `rows` rows.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidTensorShape`] unless `rows` divides the number of elements
    /// and the elements are stored in normal order.
    pub fn reshaped(&self, rows: usize) -> Result<Self, ImageError> {
        if rows == 0 || self.elements % rows != 0 || !self.has_normal_order() {
            return Err(ImageError::InvalidTensorShape(format!(
                "cannot reshape {} elements into {rows} rows",
                self.elements
            )));
        }
        Ok(Self::matrix(rows, self.elements / rows))
    }

    /// Position along the tensor dimension of the element at `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::IndexOutOfRange`] if the element is outside the matrix or is not
    /// stored, such as an off-diagonal element of a diagonal matrix.
    pub fn index(&self, row: usize, col: usize) -> Result<usize, ImageError> {
        let m = self.rows;
        let n = self.columns();
        if row >= m || col >= n {
            return Err(ImageError::IndexOutOfRange);
        }
        let (mut i, mut j) = (row, col);
        let index = match self.shape {
            TensorShape::ColVector => i,
            TensorShape::RowVector => j,
            TensorShape::ColMajorMatrix => i + j * m,
            TensorShape::RowMajorMatrix => i * n + j,
            TensorShape::DiagonalMatrix => {
                if i != j {
                    return Err(ImageError::IndexOutOfRange);
                }
                i
            }
            TensorShape::SymmetricMatrix
            | TensorShape::UpperTriangularMatrix
            | TensorShape::LowerTriangularMatrix => {
                if self.shape == TensorShape::LowerTriangularMatrix {
                    std::mem::swap(&mut i, &mut j);
                }
                if i > j {
                    if self.shape != TensorShape::SymmetricMatrix {
                        return Err(ImageError::IndexOutOfRange);
                    }
                    std::mem::swap(&mut i, &mut j);
                }
                if i == j {
                    i
                } else {
                    // rows before `i` hold m-1, m-2, ... off-diagonal elements
                    let before: usize = (1..=i).map(|r| m - r).sum();
                    m + before + (j - i - 1)
                }
            }
        };
        Ok(index)
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_scalar() {
            f.write_str("scalar")
        } else {
            write!(f, "{}x{} {}", self.rows, self.columns(), self.shape)
        }
    }
}
