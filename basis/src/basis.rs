/* Truncated spherical-Bessel ("jY") basis.

   A jY function is j_l(z r / rcut) Y_lm(r̂) inside the cutoff sphere and zero
   outside, with z a zero of j_l so that the function vanishes continuously at
   rcut. All angular momenta share rcut and the number of radial channels.
*/

use crate::error::{IntegralError, Result};
use crate::sphbes::{dsphbesj, sphbes_zeros, sphbesj};
use crate::ylm::{real_ylm, ylm_index};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub trait Basis {
    fn evaluate(&self, r: &Vector3<f64>) -> f64;
}

/// Cutoff radius, channel count and the Bessel zeros fixing each channel.
///
/// Fields are fixed at construction; deserialized values pass the same
/// checks as [`RadialBasisSpec::from_zeros`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RadialBasisTable")]
pub struct RadialBasisSpec {
    rcut: f64,
    nbes: usize,
    lmax: usize,
    // zeros[l * nbes + q]
    zeros: Vec<f64>,
}

// unchecked wire form of RadialBasisSpec
#[derive(Deserialize)]
struct RadialBasisTable {
    rcut: f64,
    nbes: usize,
    lmax: usize,
    zeros: Vec<f64>,
}

impl TryFrom<RadialBasisTable> for RadialBasisSpec {
    type Error = IntegralError;

    fn try_from(table: RadialBasisTable) -> Result<Self> {
        Self::from_zeros(table.lmax, table.nbes, table.rcut, table.zeros)
    }
}

impl RadialBasisSpec {
    /// Builds the radial basis with zeros from [`sphbes_zeros`].
    pub fn new(lmax: usize, nbes: usize, rcut: f64) -> Result<Self> {
        Self::check_shape(nbes, rcut)?;
        let zeros = sphbes_zeros(lmax, nbes, true);
        Ok(Self {
            rcut,
            nbes,
            lmax,
            zeros,
        })
    }

    /// Builds the radial basis from an externally supplied zero table, laid out
    /// `zeros[l * nbes + q]` for `l = 0..=lmax`.
    pub fn from_zeros(lmax: usize, nbes: usize, rcut: f64, zeros: Vec<f64>) -> Result<Self> {
        Self::check_shape(nbes, rcut)?;
        let expected = (lmax + 1) * nbes;
        if zeros.len() != expected {
            return Err(IntegralError::ZeroTableSize {
                expected,
                found: zeros.len(),
            });
        }
        for (l, shell) in zeros.chunks(nbes).enumerate() {
            let ascending = shell.windows(2).all(|p| p[0] < p[1]);
            if !ascending || shell[0] <= 0.0 {
                return Err(IntegralError::UnsortedZeros { l });
            }
        }
        Ok(Self {
            rcut,
            nbes,
            lmax,
            zeros,
        })
    }

    fn check_shape(nbes: usize, rcut: f64) -> Result<()> {
        if !(rcut > 0.0 && rcut.is_finite()) {
            return Err(IntegralError::InvalidCutoff(rcut));
        }
        if nbes == 0 {
            return Err(IntegralError::NoRadialChannels);
        }
        Ok(())
    }

    pub fn rcut(&self) -> f64 {
        self.rcut
    }

    pub fn nbes(&self) -> usize {
        self.nbes
    }

    pub fn lmax(&self) -> usize {
        self.lmax
    }

    pub fn zero(&self, l: usize, q: usize) -> f64 {
        self.zeros[l * self.nbes + q]
    }

    pub fn zeros(&self, l: usize) -> &[f64] {
        &self.zeros[l * self.nbes..(l + 1) * self.nbes]
    }

    pub fn all_zeros(&self) -> &[f64] {
        &self.zeros
    }

    /// Wave number `k = z / rcut` of channel `(l, q)`.
    pub fn wavenumber(&self, l: usize, q: usize) -> f64 {
        self.zero(l, q) / self.rcut
    }

    /// Radial function of channel `(l, q)`, zero beyond the cutoff.
    pub fn radial(&self, l: usize, q: usize, r: f64) -> f64 {
        if r >= self.rcut {
            0.0
        } else {
            sphbesj(l, self.wavenumber(l, q) * r)
        }
    }

    /// Outward radial derivative just inside the cutoff, `k j_l'(z)`.
    ///
    /// The truncation turns this slope into a surface term of `-∇²`.
    pub fn boundary_slope(&self, l: usize, q: usize) -> f64 {
        self.wavenumber(l, q) * dsphbesj(l, self.zero(l, q))
    }

    /// `<jY|jY>` for one channel: `rcut³/2 j_{l+1}(z)²`.
    pub fn overlap_diag(&self, l: usize, q: usize) -> f64 {
        self.rcut.powi(3) * 0.5 * sphbesj(l + 1, self.zero(l, q)).powi(2)
    }

    /// `<jY|-∇²|jY>` for one channel: `rcut/2 (z j_{l+1}(z))²`.
    pub fn kinetic_diag(&self, l: usize, q: usize) -> f64 {
        let z = self.zero(l, q);
        0.5 * self.rcut * (z * sphbesj(l + 1, z)).powi(2)
    }

    pub fn orbital(&self, center: Vector3<f64>, l: usize, m: i32, q: usize) -> JyOrbital {
        JyOrbital {
            center,
            l,
            m,
            k: self.wavenumber(l, q),
            rcut: self.rcut,
        }
    }
}

/// A single jY function centred on an atom.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JyOrbital {
    pub center: Vector3<f64>,
    pub l: usize,
    pub m: i32,
    pub k: f64,
    pub rcut: f64,
}

impl Basis for JyOrbital {
    fn evaluate(&self, r: &Vector3<f64>) -> f64 {
        let d = r - self.center;
        let dist = d.norm();
        if dist >= self.rcut {
            return 0.0;
        }
        sphbesj(self.l, self.k * dist) * real_ylm(self.l, &d)[ylm_index(self.l, self.m)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_rejects_bad_shape() {
        assert_eq!(
            RadialBasisSpec::new(2, 3, 0.0).unwrap_err(),
            IntegralError::InvalidCutoff(0.0)
        );
        assert_eq!(
            RadialBasisSpec::new(2, 0, 6.0).unwrap_err(),
            IntegralError::NoRadialChannels
        );
        assert!(RadialBasisSpec::new(2, 3, f64::NAN).is_err());
    }

    #[test]
    fn test_from_zeros_validates_table() {
        let good = sphbes_zeros(1, 3, true);
        assert!(RadialBasisSpec::from_zeros(1, 3, 5.0, good.clone()).is_ok());
        assert_eq!(
            RadialBasisSpec::from_zeros(2, 3, 5.0, good.clone()).unwrap_err(),
            IntegralError::ZeroTableSize {
                expected: 9,
                found: 6
            }
        );
        let mut unsorted = good;
        unsorted.swap(3, 4);
        assert_eq!(
            RadialBasisSpec::from_zeros(1, 3, 5.0, unsorted).unwrap_err(),
            IntegralError::UnsortedZeros { l: 1 }
        );
    }

    #[test]
    fn test_deserialize_checks_zero_table() {
        let spec = RadialBasisSpec::new(1, 2, 4.0).unwrap();
        let text = serde_json::to_string(&spec).unwrap();
        let restored: RadialBasisSpec = serde_json::from_str(&text).unwrap();
        assert_eq!(restored, spec);

        // nbes and lmax disagree with the number of zeros
        let mismatched = r#"{"rcut":4.0,"nbes":5,"lmax":1,"zeros":[3.14,6.28]}"#;
        let err = serde_json::from_str::<RadialBasisSpec>(mismatched).unwrap_err();
        assert!(err.to_string().contains("expected 10 Bessel zeros, got 2"), "{err}");

        let bad_cutoff = r#"{"rcut":-1.0,"nbes":1,"lmax":0,"zeros":[3.14]}"#;
        assert!(serde_json::from_str::<RadialBasisSpec>(bad_cutoff).is_err());
    }

    #[test]
    fn test_radial_vanishes_at_cutoff() {
        let spec = RadialBasisSpec::new(3, 5, 7.0).unwrap();
        for l in 0..=3 {
            for q in 0..5 {
                assert!(spec.radial(l, q, 7.0 - 1e-12).abs() < 1e-10);
                assert_eq!(spec.radial(l, q, 7.5), 0.0);
            }
        }
    }

    #[test]
    fn test_kinetic_diag_is_k2_times_overlap_diag() {
        let spec = RadialBasisSpec::new(3, 4, 6.0).unwrap();
        for l in 0..=3 {
            for q in 0..4 {
                let k = spec.wavenumber(l, q);
                let lhs = spec.kinetic_diag(l, q);
                let rhs = k * k * spec.overlap_diag(l, q);
                assert!((lhs - rhs).abs() < 1e-12 * lhs.abs());
                // j_l'(z) = -j_{l+1}(z) at a zero of j_l
                let slope = spec.boundary_slope(l, q);
                let expected = -k * sphbesj(l + 1, spec.zero(l, q));
                assert!((slope - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_orbital_evaluate() {
        let spec = RadialBasisSpec::new(1, 2, 4.0).unwrap();
        let center = Vector3::new(1.0, 0.0, 0.0);
        let orb = spec.orbital(center, 1, 0, 1);
        let p = Vector3::new(1.0, 0.0, 2.0);
        let expected = sphbesj(1, spec.wavenumber(1, 1) * 2.0) * (3.0 / (4.0 * std::f64::consts::PI)).sqrt();
        assert!((orb.evaluate(&p) - expected).abs() < 1e-14);
        assert_eq!(orb.evaluate(&Vector3::new(6.0, 0.0, 0.0)), 0.0);
    }
}
