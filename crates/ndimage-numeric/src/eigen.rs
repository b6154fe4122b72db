use crate::error::NumericError;

const MAX_SWEEPS: usize = 64;

/// Eigenvalues and eigenvectors of a real symmetric matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenDecomposition {
    /// Eigenvalues, sorted from largest to smallest.
    pub values: Vec<f64>,
    /// Unit eigenvectors, stored column-major: column `i` belongs to `values[i]`.
    pub vectors: Vec<f64>,
}

impl EigenDecomposition {
    /// Returns the eigenvector for eigenvalue `index`.
    pub fn vector(&self, index: usize) -> &[f64] {
        let n = self.values.len();
        &self.vectors[index * n..(index + 1) * n]
    }
}

/// Computes the eigen-decomposition of an `n`x`n` real symmetric matrix.
///
/// The matrix is given column-major in `input`; only the symmetric part is meaningful.
/// Uses cyclic Jacobi rotations, which are accurate for the small matrices found in tensor
/// images.
///
/// # Errors
///
/// Returns an error if `n` is zero or `input` does not hold `n * n` values.
pub fn symmetric_eigen_decomposition(
    n: usize,
    input: &[f64],
) -> Result<EigenDecomposition, NumericError> {
    if n == 0 {
        return Err(NumericError::InvalidMatrixSize(n));
    }
    if input.len() != n * n {
        return Err(NumericError::ArraySizeMismatch {
            expected: n * n,
            actual: input.len(),
        });
    }
    if n == 2 {
        return Ok(symmetric_eigen_decomposition_2d(input[0], input[2], input[3]));
    }

    let mut a = input.to_vec();
    let mut v = vec![0.0; n * n];
    for i in 0..n {
        v[i + i * n] = 1.0;
    }

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        let mut diag = 0.0;
        for j in 0..n {
            diag += a[j + j * n] * a[j + j * n];
            for i in 0..j {
                off += a[i + j * n] * a[i + j * n];
            }
        }
        if off <= f64::EPSILON * f64::EPSILON * diag || off == 0.0 {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p + q * n];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[q + q * n] - a[p + p * n]) / (2.0 * apq);
                let sign = if theta >= 0.0 { 1.0 } else { -1.0 };
                let t = sign / (theta.abs() + theta.hypot(1.0));
                let c = 1.0 / t.hypot(1.0);
                let s = t * c;
                for k in 0..n {
                    let akp = a[k + p * n];
                    let akq = a[k + q * n];
                    a[k + p * n] = c * akp - s * akq;
                    a[k + q * n] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p + k * n];
                    let aqk = a[q + k * n];
                    a[p + k * n] = c * apk - s * aqk;
                    a[q + k * n] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[k + p * n];
                    let vkq = v[k + q * n];
                    v[k + p * n] = c * vkp - s * vkq;
                    v[k + q * n] = s * vkp + c * vkq;
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[j + j * n].total_cmp(&a[i + i * n]));
    let values = order.iter().map(|&i| a[i + i * n]).collect();
    let vectors = order
        .iter()
        .flat_map(|&i| v[i * n..(i + 1) * n].iter().copied())
        .collect();
    Ok(EigenDecomposition { values, vectors })
}

/// Eigen-decomposition of a symmetric matrix in packed tensor storage.
///
/// Packed storage holds the diagonal first, followed by the upper triangle row by row.
/// For a 3x3 matrix that is `xx, yy, zz, xy, xz, yz`.
///
/// # Errors
///
/// Returns an error if `n` is zero or `input` does not hold `n * (n + 1) / 2` values.
pub fn symmetric_eigen_decomposition_packed(
    n: usize,
    input: &[f64],
) -> Result<EigenDecomposition, NumericError> {
    if n == 0 {
        return Err(NumericError::InvalidMatrixSize(n));
    }
    let expected = n * (n + 1) / 2;
    if input.len() != expected {
        return Err(NumericError::ArraySizeMismatch {
            expected,
            actual: input.len(),
        });
    }
    let mut full = vec![0.0; n * n];
    for i in 0..n {
        full[i + i * n] = input[i];
    }
    let mut k = n;
    for row in 0..n {
        for col in row + 1..n {
            full[row + col * n] = input[k];
            full[col + row * n] = input[k];
            k += 1;
        }
    }
    symmetric_eigen_decomposition(n, &full)
}

/// Closed-form eigen-decomposition of the 2x2 symmetric matrix `[[xx, xy], [xy, yy]]`.
pub fn symmetric_eigen_decomposition_2d(xx: f64, xy: f64, yy: f64) -> EigenDecomposition {
    let mean = (xx + yy) / 2.0;
    let half_diff = (xx - yy) / 2.0;
    let d = half_diff.hypot(xy);
    let l1 = mean + d;
    let l2 = mean - d;
    let (vx, vy) = if xy != 0.0 {
        let (x, y) = (l1 - yy, xy);
        let norm = x.hypot(y);
        (x / norm, y / norm)
    } else if xx >= yy {
        (1.0, 0.0)
    } else {
        (0.0, 1.0)
    };
    EigenDecomposition {
        values: vec![l1, l2],
        vectors: vec![vx, vy, -vy, vx],
    }
}
