//! Spherical Bessel functions of the first kind and their zeros.
//!
//! The radial part of every jY basis function is `j_l(z r / rcut)` with `z` a
//! zero of `j_l`, so the functions here are the only special functions the
//! two-center integrator depends on.

use std::f64::consts::PI;

/// Spherical Bessel function of the first kind `j_l(x)`.
///
/// Below `x < l` the power series is summed (upward recurrence loses digits
/// there); otherwise the upward recurrence from `j_0` and `j_1` is stable.
pub fn sphbesj(l: usize, x: f64) -> f64 {
    if x < 0.0 {
        let sign = if l % 2 == 0 { 1.0 } else { -1.0 };
        return sign * sphbesj(l, -x);
    }

    if l == 0 {
        return if x < 1e-4 {
            1.0 - x * x / 6.0 * (1.0 - x * x / 20.0)
        } else {
            x.sin() / x
        };
    }

    if x < l as f64 {
        return sphbesj_series(l, x);
    }

    let (sin_x, cos_x) = x.sin_cos();
    let mut j_prev = sin_x / x;
    let mut j = sin_x / (x * x) - cos_x / x;
    for n in 1..l {
        let j_next = (2 * n + 1) as f64 / x * j - j_prev;
        j_prev = j;
        j = j_next;
    }
    j
}

// j_l(x) = x^l / (2l+1)!! * Σ_k (-x²/2)^k / (k! (2l+3)(2l+5)...(2l+2k+1))
fn sphbesj_series(l: usize, x: f64) -> f64 {
    let prefactor = (1..=l).fold(1.0, |acc, i| acc * x / (2 * i + 1) as f64);
    if prefactor == 0.0 {
        return 0.0;
    }

    let half_x2 = 0.5 * x * x;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..200 {
        term *= -half_x2 / (k * (2 * l + 2 * k + 1)) as f64;
        sum += term;
        if term.abs() < 1e-17 * sum.abs() {
            break;
        }
    }
    prefactor * sum
}

/// First derivative `j_l'(x) = (l/x) j_l(x) - j_{l+1}(x)`.
pub fn dsphbesj(l: usize, x: f64) -> f64 {
    if x.abs() < 1e-12 {
        return if l == 1 { 1.0 / 3.0 } else { 0.0 };
    }
    l as f64 / x * sphbesj(l, x) - sphbesj(l + 1, x)
}

/// First `n` positive zeros of `j_l`.
///
/// With `return_all` the zeros of every order `0..=l` are returned, laid out
/// as `zeros[l' * n + q]`; otherwise only the `n` zeros of order `l`.
///
/// Zeros of `j_0` are `kπ`. Zeros of `j_{l+1}` interlace those of `j_l`, so
/// each one is bracketed by two consecutive zeros of the lower order and
/// refined by bisection. Getting `n` zeros of order `l` therefore needs
/// `n + l` zeros of `j_0`.
pub fn sphbes_zeros(l: usize, n: usize, return_all: bool) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }

    let mut current: Vec<f64> = (1..=n + l).map(|k| k as f64 * PI).collect();
    let mut zeros = Vec::with_capacity(if return_all { (l + 1) * n } else { n });
    if return_all || l == 0 {
        zeros.extend_from_slice(&current[..n]);
    }

    for order in 1..=l {
        current = current
            .windows(2)
            .map(|bracket| bisect(|x| sphbesj(order, x), bracket[0], bracket[1]))
            .collect();
        if return_all || order == l {
            zeros.extend_from_slice(&current[..n]);
        }
    }

    zeros
}

fn bisect<F>(f: F, mut lo: f64, mut hi: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let mut f_lo = f(lo);
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let f_mid = f(mid);
        if f_mid == 0.0 {
            return mid;
        }
        if (f_mid > 0.0) == (f_lo > 0.0) {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}
