//! Real spherical harmonics.
//!
//! Layout is flat, `Y_lm` at `l² + l + m`. For `m > 0` the harmonic goes as
//! `cos(mφ)`, for `m < 0` as `sin(|m|φ)`; no Condon-Shortley phase.

use nalgebra::Vector3;
use std::f64::consts::PI;

/// Position of `Y_lm` in the flat layout returned by [`real_ylm`].
#[inline]
pub fn ylm_index(l: usize, m: i32) -> usize {
    ((l * l + l) as i32 + m) as usize
}

/// Number of harmonics with `l <= lmax`.
#[inline]
pub fn ylm_count(lmax: usize) -> usize {
    (lmax + 1) * (lmax + 1)
}

/// Evaluates every real harmonic with `l <= lmax` in the direction of `r`.
///
/// `r` need not be normalised. The zero vector has no direction; only `Y_00`
/// is non-zero there.
pub fn real_ylm(lmax: usize, r: &Vector3<f64>) -> Vec<f64> {
    let mut ylm = vec![0.0; ylm_count(lmax)];
    real_ylm_into(lmax, r, &mut ylm);
    ylm
}

/// Same as [`real_ylm`] but writes into a caller-provided buffer.
pub fn real_ylm_into(lmax: usize, r: &Vector3<f64>, ylm: &mut [f64]) {
    assert!(ylm.len() >= ylm_count(lmax), "ylm buffer too small");

    let norm = r.norm();
    if norm < 1e-14 {
        ylm.iter_mut().for_each(|y| *y = 0.0);
        ylm[0] = 0.5 / PI.sqrt();
        return;
    }
    let (x, y, z) = (r.x / norm, r.y / norm, r.z / norm);

    // sin^m θ cos(mφ) and sin^m θ sin(mφ) from (x + iy)^m
    let mut cos_m = vec![1.0; lmax + 1];
    let mut sin_m = vec![0.0; lmax + 1];
    for m in 1..=lmax {
        cos_m[m] = cos_m[m - 1] * x - sin_m[m - 1] * y;
        sin_m[m] = sin_m[m - 1] * x + cos_m[m - 1] * y;
    }

    for m in 0..=lmax {
        // associated Legendre P_l^m divided by sin^m θ
        let mut q_prev = 0.0;
        let mut q = (1..=m).fold(1.0, |acc, i| acc * (2 * i - 1) as f64);
        for l in m..=lmax {
            if l > m {
                let q_next = ((2 * l - 1) as f64 * z * q - (l + m - 1) as f64 * q_prev)
                    / (l - m) as f64;
                q_prev = q;
                q = q_next;
            }

            let factorial_ratio = ((l - m + 1)..=(l + m)).fold(1.0, |acc, k| acc / k as f64);
            let norm_lm = ((2 * l + 1) as f64 / (4.0 * PI) * factorial_ratio).sqrt();

            if m == 0 {
                ylm[ylm_index(l, 0)] = norm_lm * q;
            } else {
                let scaled = std::f64::consts::SQRT_2 * norm_lm * q;
                ylm[ylm_index(l, m as i32)] = scaled * cos_m[m];
                ylm[ylm_index(l, -(m as i32))] = scaled * sin_m[m];
            }
        }
    }
}
