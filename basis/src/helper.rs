#[cfg(test)]
use nalgebra::Vector3;
#[cfg(test)]
use rayon::prelude::*;
use std::f64::consts::PI;

// Simpson's rule integration
#[cfg(test)]
pub(crate) fn simpson_integration<F>(f: F, a: f64, b: f64, n: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    let n = if n % 2 == 0 { n } else { n + 1 };
    let h = (b - a) / n as f64;

    let mut sum = f(a) + f(b);
    for i in 1..n {
        let x = a + i as f64 * h;
        sum += if i % 2 == 0 { 2.0 * f(x) } else { 4.0 * f(x) };
    }
    sum * h / 3.0
}

// Helper function to determine Simpson's weight for a given index and max index
#[cfg(test)]
fn simpson_weight(i: usize, n: usize) -> f64 {
    if i == 0 || i == n {
        1.0
    } else if i % 2 == 1 {
        4.0
    } else {
        2.0
    }
}

/// Parallel Simpson's rule integration in 3D.
///
/// Integrates f(x,y,z) over the box defined by [a.x,b.x] x [a.y,b.y] x [a.z,b.z].
/// Uses Simpson's rule with nx, ny, nz subdivisions (adjusted up if not even).
/// Only used as a brute-force reference for the two-center integrals.
#[cfg(test)]
pub(crate) fn simpson_integration_3d<F>(
    f: F,
    a: Vector3<f64>,
    b: Vector3<f64>,
    nx: usize,
    ny: usize,
    nz: usize,
) -> f64
where
    F: Fn(f64, f64, f64) -> f64 + Sync,
{
    let nx = if nx % 2 == 0 { nx } else { nx + 1 };
    let ny = if ny % 2 == 0 { ny } else { ny + 1 };
    let nz = if nz % 2 == 0 { nz } else { nz + 1 };

    let hx = (b.x - a.x) / nx as f64;
    let hy = (b.y - a.y) / ny as f64;
    let hz = (b.z - a.z) / nz as f64;

    let y_weights: Vec<f64> = (0..=ny).map(|j| simpson_weight(j, ny)).collect();
    let z_weights: Vec<f64> = (0..=nz).map(|k| simpson_weight(k, nz)).collect();

    let sum: f64 = (0..=nx)
        .into_par_iter()
        .map(|i| {
            let x = a.x + i as f64 * hx;
            let wx = simpson_weight(i, nx);
            let mut plane = 0.0;
            for (j, wy) in y_weights.iter().enumerate() {
                let y = a.y + j as f64 * hy;
                for (k, wz) in z_weights.iter().enumerate() {
                    let z = a.z + k as f64 * hz;
                    plane += wy * wz * f(x, y, z);
                }
            }
            wx * plane
        })
        .sum();

    // Simpson's rule in 3D: (hx*hy*hz/27)* sum_of_weights
    sum * (hx * hy * hz) / 27.0
}

/// Gauss-Legendre nodes and weights on `[a, b]`.
///
/// Roots of `P_n` are located by Newton iteration from the Tricomi estimate;
/// the rule integrates polynomials of degree `2n - 1` exactly.
pub fn gauss_legendre(n: usize, a: f64, b: f64) -> (Vec<f64>, Vec<f64>) {
    assert!(n > 0, "Gauss-Legendre rule needs at least one point");

    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    let mid = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    for i in 0..(n + 1) / 2 {
        let mut z = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp = 1.0;
        for _ in 0..100 {
            let (p, p_prev) = legendre_pair(n, z);
            dp = n as f64 * (z * p - p_prev) / (z * z - 1.0);
            let dz = p / dp;
            z -= dz;
            if dz.abs() < 1e-15 {
                break;
            }
        }
        let w = 2.0 * half / ((1.0 - z * z) * dp * dp);
        nodes[i] = mid - half * z;
        nodes[n - 1 - i] = mid + half * z;
        weights[i] = w;
        weights[n - 1 - i] = w;
    }

    (nodes, weights)
}

// (P_n(z), P_{n-1}(z)) by the three-term recurrence
fn legendre_pair(n: usize, z: f64) -> (f64, f64) {
    let mut p = 1.0;
    let mut p_prev = 0.0;
    for j in 0..n {
        let next = ((2 * j + 1) as f64 * z * p - j as f64 * p_prev) / (j + 1) as f64;
        p_prev = p;
        p = next;
    }
    (p, p_prev)
}

/// Uniform azimuthal rule on `[0, 2π)`: `(cos φ_k, sin φ_k)` and the common weight.
///
/// Exact for trigonometric polynomials of degree below `n`.
pub fn azimuthal_rule(n: usize) -> (Vec<(f64, f64)>, f64) {
    assert!(n > 0, "azimuthal rule needs at least one point");
    let step = 2.0 * PI / n as f64;
    let points = (0..n)
        .map(|k| {
            let phi = k as f64 * step;
            (phi.cos(), phi.sin())
        })
        .collect();
    (points, step)
}
