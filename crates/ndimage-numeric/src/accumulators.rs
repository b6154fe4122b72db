use std::ops::AddAssign;

/// Accumulates the first four central moments of a stream of values.
///
/// Uses the single-pass update formulas of Pébay, which stay stable for large counts. Two
/// accumulators filled on different threads can be merged with `+=`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatisticsAccumulator {
    n: usize,
    m1: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl StatisticsAccumulator {
    /// Adds a value.
    pub fn push(&mut self, x: f64) {
        self.n += 1;
        let n = self.n as f64;
        let delta = x - self.m1;
        let term1 = delta / n;
        let term2 = term1 * term1;
        let term3 = delta * term1 * (n - 1.0);
        self.m4 += term3 * term2 * (n * n - 3.0 * n + 3.0) + 6.0 * term2 * self.m2
            - 4.0 * term1 * self.m3;
        // m3 and m4 use the previous m2
        self.m3 += term3 * term1 * (n - 2.0) - 3.0 * term1 * self.m2;
        self.m2 += term3;
        self.m1 += term1;
    }

    /// Number of values added.
    pub fn number(&self) -> usize {
        self.n
    }

    /// Mean of the values, `0` when empty.
    pub fn mean(&self) -> f64 {
        self.m1
    }

    /// Unbiased variance estimate.
    pub fn variance(&self) -> f64 {
        if self.n > 1 {
            self.m2 / (self.n as f64 - 1.0)
        } else {
            0.0
        }
    }

    /// Square root of [`Self::variance`].
    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Unbiased skewness estimate.
    pub fn skewness(&self) -> f64 {
        if self.n > 2 && self.m2 != 0.0 {
            let n = self.n as f64;
            (n * n) / ((n - 1.0) * (n - 2.0)) * (self.m3 / (n * self.variance().powf(1.5)))
        } else {
            0.0
        }
    }

    /// Unbiased excess kurtosis estimate.
    pub fn excess_kurtosis(&self) -> f64 {
        if self.n > 3 && self.m2 != 0.0 {
            let n = self.n as f64;
            (n - 1.0) / ((n - 2.0) * (n - 3.0))
                * ((n + 1.0) * n * self.m4 / (self.m2 * self.m2) - 3.0 * (n - 1.0))
        } else {
            0.0
        }
    }
}

impl AddAssign for StatisticsAccumulator {
    fn add_assign(&mut self, b: Self) {
        if b.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = b;
            return;
        }
        let an = self.n as f64;
        let an2 = an * an;
        let bn = b.n as f64;
        let bn2 = bn * bn;
        let xn2 = an * bn;
        self.n += b.n;
        let nn = self.n as f64;
        let n2 = nn * nn;
        let delta = b.m1 - self.m1;
        let delta2 = delta * delta;
        self.m4 += b.m4
            + delta2 * delta2 * xn2 * (an2 - xn2 + bn2) / (n2 * nn)
            + 6.0 * delta2 * (an2 * b.m2 + bn2 * self.m2) / n2
            + 4.0 * delta * (an * b.m3 - bn * self.m3) / nn;
        self.m3 += b.m3
            + delta * delta2 * xn2 * (an - bn) / n2
            + 3.0 * delta * (an * b.m2 - bn * self.m2) / nn;
        self.m2 += b.m2 + delta2 * xn2 / nn;
        self.m1 += bn * delta / nn;
    }
}

/// Accumulates mean and variance with Welford's method.
///
/// Values can also be removed again, which sliding-window filters use.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VarianceAccumulator {
    n: usize,
    m1: f64,
    m2: f64,
}

impl VarianceAccumulator {
    /// Adds a value.
    pub fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.m1;
        self.m1 += delta / self.n as f64;
        self.m2 += delta * (x - self.m1);
    }

    /// Removes a value previously added. Does nothing when empty.
    pub fn pop(&mut self, x: f64) {
        match self.n {
            0 => {}
            1 => *self = Self::default(),
            n => {
                let delta = x - self.m1;
                self.m1 = (self.m1 * n as f64 - x) / (n - 1) as f64;
                self.m2 -= delta * (x - self.m1);
                self.n -= 1;
            }
        }
    }

    /// Number of values added.
    pub fn number(&self) -> usize {
        self.n
    }

    /// Mean of the values.
    pub fn mean(&self) -> f64 {
        self.m1
    }

    /// Unbiased variance estimate.
    pub fn variance(&self) -> f64 {
        if self.n > 1 {
            self.m2 / (self.n as f64 - 1.0)
        } else {
            0.0
        }
    }

    /// Square root of [`Self::variance`].
    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }
}

impl AddAssign for VarianceAccumulator {
    fn add_assign(&mut self, b: Self) {
        if b.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = b;
            return;
        }
        let old_n = self.n as f64;
        self.n += b.n;
        let n = self.n as f64;
        let bn = b.n as f64;
        let delta = b.m1 - self.m1;
        self.m1 += bn * delta / n;
        self.m2 += b.m2 + delta * delta * (old_n * bn) / n;
    }
}

/// Tracks the minimum and maximum of a stream of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxAccumulator {
    min: f64,
    max: f64,
}

impl Default for MinMaxAccumulator {
    fn default() -> Self {
        Self {
            min: f64::MAX,
            max: f64::MIN,
        }
    }
}

impl MinMaxAccumulator {
    /// Adds a value. NaN values are ignored.
    pub fn push(&mut self, x: f64) {
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    /// Adds two values at once, with one comparison between them.
    pub fn push_pair(&mut self, x: f64, y: f64) {
        if x > y {
            self.max = self.max.max(x);
            self.min = self.min.min(y);
        } else {
            self.max = self.max.max(y);
            self.min = self.min.min(x);
        }
    }

    /// Smallest value seen, `f64::MAX` when empty.
    pub fn minimum(&self) -> f64 {
        self.min
    }

    /// Largest value seen, `f64::MIN` when empty.
    pub fn maximum(&self) -> f64 {
        self.max
    }
}

impl AddAssign for MinMaxAccumulator {
    fn add_assign(&mut self, b: Self) {
        self.min = self.min.min(b.min);
        self.max = self.max.max(b.max);
    }
}
