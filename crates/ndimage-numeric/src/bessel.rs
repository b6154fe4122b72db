//! Bessel functions of integer order.
//!
//! Rational and asymptotic approximations with single-precision accuracy, which is plenty for
//! building filter kernels and much faster than series evaluation.

const TWO_OVER_PI: f64 = 0.636619772;

/// Bessel function of the first kind, order 0.
pub fn bessel_j0(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 8.0 {
        let y = x * x;
        let ans1 = 57568490574.0
            + y * (-13362590354.0
                + y * (651619640.7 + y * (-11214424.18 + y * (77392.33017 + y * -184.9052456))));
        let ans2 = 57568490411.0
            + y * (1029532985.0 + y * (9494680.718 + y * (59272.64853 + y * (267.8532712 + y))));
        return ans1 / ans2;
    }
    let z = 8.0 / ax;
    let y = z * z;
    let xx = ax - 0.785398164;
    let (p, q) = asymptotic_0(y);
    (TWO_OVER_PI / ax).sqrt() * (xx.cos() * p - z * xx.sin() * q)
}

/// Bessel function of the first kind, order 1.
pub fn bessel_j1(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 8.0 {
        let y = x * x;
        let ans1 = x
            * (72362614232.0
                + y * (-7895059235.0
                    + y * (242396853.1
                        + y * (-2972611.439 + y * (15704.48260 + y * -30.16036606)))));
        let ans2 = 144725228442.0
            + y * (2300535178.0 + y * (18583304.74 + y * (99447.43394 + y * (376.9991397 + y))));
        return ans1 / ans2;
    }
    let z = 8.0 / ax;
    let y = z * z;
    let xx = ax - 2.356194491;
    let (p, q) = asymptotic_1(y);
    let ans = (TWO_OVER_PI / ax).sqrt() * (xx.cos() * p - z * xx.sin() * q);
    if x < 0.0 {
        -ans
    } else {
        ans
    }
}

/// Bessel function of the first kind, order `n`.
///
/// Uses upward recurrence when `|x| > n` and Miller's downward recurrence otherwise.
pub fn bessel_jn(x: f64, n: usize) -> f64 {
    match n {
        0 => return bessel_j0(x),
        1 => return bessel_j1(x),
        _ => {}
    }
    if x == 0.0 {
        return 0.0;
    }
    let ax = x.abs();
    let tox = 2.0 / ax;
    let ans = if ax > n as f64 {
        let mut bjm = bessel_j0(ax);
        let mut bj = bessel_j1(ax);
        for j in 1..n {
            let tmp = j as f64 * tox * bj - bjm;
            bjm = bj;
            bj = tmp;
        }
        bj
    } else {
        const ACC: f64 = 40.0;
        const BIGNO: f64 = 1.0e10;
        const BIGNI: f64 = 1.0e-10;
        let m = 2 * ((n + (ACC * n as f64).sqrt() as usize) / 2);
        let mut jsum = false;
        let mut bjp = 0.0;
        let mut sum = 0.0;
        let mut bj = 1.0;
        let mut ans = 0.0;
        for j in (1..=m).rev() {
            let tmp = j as f64 * tox * bj - bjp;
            bjp = bj;
            bj = tmp;
            if bj.abs() > BIGNO {
                bj *= BIGNI;
                bjp *= BIGNI;
                ans *= BIGNI;
                sum *= BIGNI;
            }
            if jsum {
                sum += bj;
            }
            jsum = !jsum;
            if j == n {
                ans = bjp;
            }
        }
        sum = 2.0 * sum - bj;
        ans / sum
    };
    if x < 0.0 && n % 2 == 1 {
        -ans
    } else {
        ans
    }
}

/// Bessel function of the second kind, order 0. Defined for `x > 0`.
pub fn bessel_y0(x: f64) -> f64 {
    if x < 8.0 {
        let y = x * x;
        let ans1 = -2957821389.0
            + y * (7062834065.0
                + y * (-512359803.6 + y * (10879881.29 + y * (-86327.92757 + y * 228.4622733))));
        let ans2 = 40076544269.0
            + y * (745249964.8 + y * (7189466.438 + y * (47447.26470 + y * (226.1030244 + y))));
        return ans1 / ans2 + TWO_OVER_PI * bessel_j0(x) * x.ln();
    }
    let z = 8.0 / x;
    let y = z * z;
    let xx = x - 0.785398164;
    let (p, q) = asymptotic_0(y);
    (TWO_OVER_PI / x).sqrt() * (xx.sin() * p + z * xx.cos() * q)
}

/// Bessel function of the second kind, order 1. Defined for `x > 0`.
pub fn bessel_y1(x: f64) -> f64 {
    if x < 8.0 {
        let y = x * x;
        let ans1 = x
            * (-0.4900604943e13
                + y * (0.1275274390e13
                    + y * (-0.5153438139e11
                        + y * (0.7349264551e9 + y * (-0.4237922726e7 + y * 0.8511937935e4)))));
        let ans2 = 0.2499580570e14
            + y * (0.4244419664e12
                + y * (0.3733650367e10
                    + y * (0.2245904002e8 + y * (0.1020426050e6 + y * (0.3549632885e3 + y)))));
        return ans1 / ans2 + TWO_OVER_PI * (bessel_j1(x) * x.ln() - 1.0 / x);
    }
    let z = 8.0 / x;
    let y = z * z;
    let xx = x - 2.356194491;
    let (p, q) = asymptotic_1(y);
    (TWO_OVER_PI / x).sqrt() * (xx.sin() * p + z * xx.cos() * q)
}

/// Bessel function of the second kind, order `n`, by upward recurrence. Defined for `x > 0`.
pub fn bessel_yn(x: f64, n: usize) -> f64 {
    match n {
        0 => return bessel_y0(x),
        1 => return bessel_y1(x),
        _ => {}
    }
    let tox = 2.0 / x;
    let mut by = bessel_y1(x);
    let mut bym = bessel_y0(x);
    for j in 1..n {
        let tmp = j as f64 * tox * by - bym;
        bym = by;
        by = tmp;
    }
    by
}

fn asymptotic_0(y: f64) -> (f64, f64) {
    let p = 1.0
        + y * (-0.1098628627e-2 + y * (0.2734510407e-4 + y * (-0.2073370639e-5 + y * 0.2093887211e-6)));
    let q = -0.1562499995e-1
        + y * (0.1430488765e-3
            + y * (-0.6911147651e-5 + y * (0.7621095161e-6 - y * 0.934935152e-7)));
    (p, q)
}

fn asymptotic_1(y: f64) -> (f64, f64) {
    let p = 1.0
        + y * (0.183105e-2 + y * (-0.3516396496e-4 + y * (0.2457520174e-5 + y * -0.240337019e-6)));
    let q = 0.04687499995
        + y * (-0.2002690873e-3
            + y * (0.8449199096e-5 + y * (-0.88228987e-6 + y * 0.105787412e-6)));
    (p, q)
}
