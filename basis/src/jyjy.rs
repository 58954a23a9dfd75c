//! Two-center integrals `<jY|jY>` and `<jY|-∇²|jY>`.
//!
//! Every pair of sites is integrated in a frame whose polar axis is the
//! inter-atomic vector `R = B - A`, with spherical coordinates around `A`:
//!
//! * azimuth: radial parts do not depend on φ and both harmonics are
//!   trigonometric polynomials of degree `<= lmax`, so a uniform rule with
//!   `2 lmax + 2` points is exact;
//! * polar angle: the support of `f_B` seen from `A` is a cone (`R > rcut`) or
//!   the full sphere; the `cos θ` range is split where the ray's far end
//!   switches from the `B` sphere to the `A` sphere, and a square-root
//!   substitution absorbs the tangent-cone edge;
//! * radius: each ray is integrated over the exact interval where both
//!   functions are non-zero, where the integrand is smooth.
//!
//! `j_l(kr) Y_lm` solves `∇²f = -k²f` inside the cutoff and its truncation
//! adds a single layer on the cutoff sphere, so
//!
//! `<f_A|-∇²|f_B> = k_B² <f_A|f_B> + k_B j_l'(z_B) rcut² ∮ f_A(B + rcut n̂) Y_B(n̂) dΩ`.

use crate::basis::RadialBasisSpec;
use crate::error::{IntegralError, Result};
use crate::helper::{azimuthal_rule, gauss_legendre};
use crate::index::CompositeIndex;
use crate::sphbes::sphbesj;
use crate::ylm::{real_ylm_into, ylm_count, ylm_index};
use itertools::iproduct;
use nalgebra::{DMatrix, Vector3};
use ndarray::Array4;
use num_complex::Complex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `<jY|jY>`
    Overlap,
    /// `<jY|-∇²|jY>`
    Kinetic,
}

/// Positions per atom type (`tau_cart[itype][iatom]`), Bohr.
pub type TauCart = [Vec<Vector3<f64>>];

/// Computes `S` (or `T`) over all orbital pairs and radial channel pairs.
///
/// The result is indexed `[i, j, q1, q2]` with `i, j` positions in `index`.
pub fn cal_overlap_sq(
    op: Operator,
    lmax: usize,
    nbes: usize,
    rcut: f64,
    tau_cart: &TauCart,
    index: &[CompositeIndex],
) -> Result<Array4<Complex<f64>>> {
    let spec = RadialBasisSpec::new(lmax, nbes, rcut)?;
    TwoCenterIntegrator::new(spec).compute(op, tau_cart, index)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SiteOrbital {
    pub l: usize,
    pub m: i32,
}

struct Site {
    center: Vector3<f64>,
    orbitals: Vec<SiteOrbital>,
    // positions of the orbitals in the composite index
    positions: Vec<usize>,
}

struct PairBlocks {
    a: usize,
    b: usize,
    overlap: DMatrix<f64>,
    kinetic: Option<DMatrix<f64>>,
}

// orthonormal frame with ez along the inter-atomic axis
struct Frame {
    e1: Vector3<f64>,
    e2: Vector3<f64>,
    ez: Vector3<f64>,
}

impl Frame {
    fn along(axis: &Vector3<f64>) -> Self {
        let norm = axis.norm();
        let ez = if norm > 1e-12 { axis / norm } else { Vector3::z() };
        let helper = if ez.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let e1 = (helper - ez * helper.dot(&ez)).normalize();
        let e2 = ez.cross(&e1);
        Self { e1, e2, ez }
    }

    fn direction(&self, sin_t: f64, cos_t: f64, (cos_p, sin_p): (f64, f64)) -> Vector3<f64> {
        self.e1 * (sin_t * cos_p) + self.e2 * (sin_t * sin_p) + self.ez * cos_t
    }
}

pub struct TwoCenterIntegrator {
    spec: RadialBasisSpec,
    // Gauss-Legendre rules on [0, 1]
    radial_rule: (Vec<f64>, Vec<f64>),
    polar_rule: (Vec<f64>, Vec<f64>),
    azimuthal_order: usize,
}

impl TwoCenterIntegrator {
    pub fn new(spec: RadialBasisSpec) -> Self {
        let order = 16 + 4 * (spec.nbes() + spec.lmax());
        let azimuthal_order = 2 * spec.lmax() + 2;
        Self {
            radial_rule: gauss_legendre(order, 0.0, 1.0),
            polar_rule: gauss_legendre(order, 0.0, 1.0),
            azimuthal_order,
            spec,
        }
    }

    /// Overrides the number of Gauss-Legendre points along each ray and per
    /// polar segment. Both orders must be positive.
    pub fn with_quadrature(mut self, radial: usize, polar: usize) -> Result<Self> {
        if radial == 0 || polar == 0 {
            return Err(IntegralError::InvalidQuadrature { radial, polar });
        }
        self.radial_rule = gauss_legendre(radial, 0.0, 1.0);
        self.polar_rule = gauss_legendre(polar, 0.0, 1.0);
        Ok(self)
    }

    pub fn spec(&self) -> &RadialBasisSpec {
        &self.spec
    }

    pub fn quadrature_orders(&self) -> (usize, usize, usize) {
        (
            self.radial_rule.0.len(),
            self.polar_rule.0.len(),
            self.azimuthal_order,
        )
    }

    /// Checks that every orbital in `index` has a position and fits the radial basis.
    pub fn validate(&self, tau_cart: &TauCart, index: &[CompositeIndex]) -> Result<()> {
        for &idx in index {
            let natom = tau_cart
                .get(idx.itype)
                .map(|atoms| atoms.len())
                .ok_or(IntegralError::MissingType {
                    index: idx,
                    itype: idx.itype,
                    ntype: tau_cart.len(),
                })?;
            if idx.iatom >= natom {
                return Err(IntegralError::MissingAtom {
                    index: idx,
                    itype: idx.itype,
                    iatom: idx.iatom,
                    natom,
                });
            }
            if idx.l > self.spec.lmax() {
                return Err(IntegralError::AngularMomentumTooLarge {
                    index: idx,
                    l: idx.l,
                    lmax: self.spec.lmax(),
                });
            }
            if idx.m.unsigned_abs() as usize > idx.l {
                return Err(IntegralError::InvalidMagneticNumber { index: idx });
            }
        }
        Ok(())
    }

    /// One tensor, `S` or `T`.
    pub fn compute(
        &self,
        op: Operator,
        tau_cart: &TauCart,
        index: &[CompositeIndex],
    ) -> Result<Array4<Complex<f64>>> {
        let (sites, blocks) = self.site_pairs(tau_cart, index, op == Operator::Kinetic)?;
        Ok(match op {
            Operator::Overlap => self.gather(index.len(), &sites, &blocks, |p| Some(&p.overlap)),
            Operator::Kinetic => self.gather(index.len(), &sites, &blocks, |p| p.kinetic.as_ref()),
        })
    }

    /// Both tensors `(S, T)` from a single pass over the atom pairs.
    pub fn tabulate(
        &self,
        tau_cart: &TauCart,
        index: &[CompositeIndex],
    ) -> Result<(Array4<Complex<f64>>, Array4<Complex<f64>>)> {
        let (sites, blocks) = self.site_pairs(tau_cart, index, true)?;
        let overlap = self.gather(index.len(), &sites, &blocks, |p| Some(&p.overlap));
        let kinetic = self.gather(index.len(), &sites, &blocks, |p| p.kinetic.as_ref());
        Ok((overlap, kinetic))
    }

    // blocks of every site pair within reach, the same-site ones included
    fn site_pairs(
        &self,
        tau_cart: &TauCart,
        index: &[CompositeIndex],
        with_kinetic: bool,
    ) -> Result<(Vec<Site>, Vec<PairBlocks>)> {
        self.validate(tau_cart, index)?;

        let sites = group_sites(tau_cart, index);
        let reach = 2.0 * self.spec.rcut();
        let pairs: Vec<(usize, usize)> = (0..sites.len())
            .flat_map(|a| (a..sites.len()).map(move |b| (a, b)))
            .filter(|&(a, b)| a == b || (sites[b].center - sites[a].center).norm() < reach)
            .collect();
        debug!(
            "two-center integrals: {} orbitals on {} sites, {} site pairs within {:.3} Bohr",
            index.len(),
            sites.len(),
            pairs.len(),
            reach
        );

        let blocks: Vec<PairBlocks> = pairs
            .par_iter()
            .map(|&(a, b)| {
                let (overlap, kinetic) = if a == b {
                    self.same_site_blocks(&sites[a].orbitals, with_kinetic)
                } else {
                    self.pair_blocks(
                        &sites[a].center,
                        &sites[a].orbitals,
                        &sites[b].center,
                        &sites[b].orbitals,
                        with_kinetic,
                    )
                };
                PairBlocks {
                    a,
                    b,
                    overlap,
                    kinetic,
                }
            })
            .collect();

        Ok((sites, blocks))
    }

    // scatters the block picked by `select` from every pair into a full tensor
    fn gather<'a>(
        &self,
        nao: usize,
        sites: &[Site],
        blocks: &'a [PairBlocks],
        select: impl Fn(&'a PairBlocks) -> Option<&'a DMatrix<f64>>,
    ) -> Array4<Complex<f64>> {
        let nbes = self.spec.nbes();
        let mut tensor = Array4::<Complex<f64>>::zeros((nao, nao, nbes, nbes));
        for pair in blocks {
            if let Some(block) = select(pair) {
                scatter(&mut tensor, block, &sites[pair.a], &sites[pair.b], nbes);
            }
        }
        tensor
    }

    fn same_site_blocks(
        &self,
        orbitals: &[SiteOrbital],
        with_kinetic: bool,
    ) -> (DMatrix<f64>, Option<DMatrix<f64>>) {
        let nbes = self.spec.nbes();
        let dim = orbitals.len() * nbes;
        let mut overlap = DMatrix::zeros(dim, dim);
        let mut kinetic = with_kinetic.then(|| DMatrix::zeros(dim, dim));

        for ((oa, a), (ob, b)) in iproduct!(orbitals.iter().enumerate(), orbitals.iter().enumerate()) {
            if a != b {
                continue;
            }
            for q in 0..nbes {
                overlap[(oa * nbes + q, ob * nbes + q)] = self.spec.overlap_diag(a.l, q);
                if let Some(t) = kinetic.as_mut() {
                    t[(oa * nbes + q, ob * nbes + q)] = self.spec.kinetic_diag(a.l, q);
                }
            }
        }

        (overlap, kinetic)
    }

    /// Overlap (and kinetic) block between orbitals on two distinct sites.
    ///
    /// Rows run over `(orbital on A, q)`, columns over `(orbital on B, q)`.
    pub(crate) fn pair_blocks(
        &self,
        center_a: &Vector3<f64>,
        orbitals_a: &[SiteOrbital],
        center_b: &Vector3<f64>,
        orbitals_b: &[SiteOrbital],
        with_kinetic: bool,
    ) -> (DMatrix<f64>, Option<DMatrix<f64>>) {
        let nbes = self.spec.nbes();
        let rows = orbitals_a.len() * nbes;
        let cols = orbitals_b.len() * nbes;

        let rvec = center_b - center_a;
        let dist = rvec.norm();
        if dist >= 2.0 * self.spec.rcut() {
            let kinetic = with_kinetic.then(|| DMatrix::zeros(rows, cols));
            return (DMatrix::zeros(rows, cols), kinetic);
        }
        let frame = Frame::along(&rvec);

        // summed in node order so repeated runs agree bit for bit
        let overlap_data = self
            .polar_nodes(dist)
            .par_iter()
            .map(|&(cos_t, w_t)| {
                self.overlap_cone(&frame, dist, cos_t, w_t, orbitals_a, orbitals_b)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .fold(vec![0.0; rows * cols], add_assign);
        let overlap = DMatrix::from_row_slice(rows, cols, &overlap_data);

        if !with_kinetic {
            return (overlap, None);
        }

        let surface = self.surface_term(&frame, dist, orbitals_a, orbitals_b);
        let mut kinetic = DMatrix::zeros(rows, cols);
        for ((ob, b), qb) in iproduct!(orbitals_b.iter().enumerate(), 0..nbes) {
            let k = self.spec.wavenumber(b.l, qb);
            let col = ob * nbes + qb;
            for row in 0..rows {
                kinetic[(row, col)] = k * k * overlap[(row, col)] + surface[row * cols + col];
            }
        }

        (overlap, Some(kinetic))
    }

    // (cos θ, weight) nodes covering the part of the A sphere that sees B's support
    fn polar_nodes(&self, dist: f64) -> Vec<(f64, f64)> {
        let rcut = self.spec.rcut();
        let split = (dist / (2.0 * rcut)).min(1.0);
        let (xs, ws) = &self.polar_rule;
        let mut nodes = Vec::with_capacity(2 * xs.len());

        if dist > rcut {
            // chord length goes as sqrt(cos θ - cos θ_min); integrate in u² = cos θ - cos θ_min
            let cos_min = (1.0 - (rcut / dist).powi(2)).sqrt();
            let u_split = (split - cos_min).max(0.0).sqrt();
            let u_top = (1.0 - cos_min).sqrt();
            for (lo, hi) in [(0.0, u_split), (u_split, u_top)] {
                let span = hi - lo;
                if span <= 0.0 {
                    continue;
                }
                nodes.extend(xs.iter().zip(ws).map(|(x, w)| {
                    let u = lo + span * x;
                    (cos_min + u * u, 2.0 * u * span * w)
                }));
            }
        } else {
            for (lo, hi) in [(-1.0, split), (split, 1.0)] {
                let span = hi - lo;
                nodes.extend(xs.iter().zip(ws).map(|(x, w)| (lo + span * x, span * w)));
            }
        }

        nodes
    }

    // contribution of one polar node to the overlap block, row-major
    fn overlap_cone(
        &self,
        frame: &Frame,
        dist: f64,
        cos_t: f64,
        w_t: f64,
        orbitals_a: &[SiteOrbital],
        orbitals_b: &[SiteOrbital],
    ) -> Vec<f64> {
        let spec = &self.spec;
        let (rcut, nbes, lmax) = (spec.rcut(), spec.nbes(), spec.lmax());
        let cols = orbitals_b.len() * nbes;
        let mut block = vec![0.0; orbitals_a.len() * nbes * cols];

        let disc = rcut * rcut - dist * dist * (1.0 - cos_t * cos_t);
        if disc <= 0.0 {
            return block;
        }
        let half_chord = disc.sqrt();
        let r_lo = (dist * cos_t - half_chord).max(0.0);
        let r_hi = (dist * cos_t + half_chord).min(rcut);
        if r_hi <= r_lo {
            return block;
        }

        let sin_t = (1.0 - cos_t * cos_t).max(0.0).sqrt();
        let (phis, w_phi) = azimuthal_rule(self.azimuthal_order);
        let directions: Vec<Vector3<f64>> = phis
            .iter()
            .map(|&phi| frame.direction(sin_t, cos_t, phi))
            .collect();
        let rvec = frame.ez * dist;

        let ny = ylm_count(lmax);
        let mut ya = vec![0.0; ny];
        let mut yb = vec![0.0; ny];
        let mut angular = vec![0.0; ny * ny];
        let mut radial_a = vec![0.0; (lmax + 1) * nbes];
        let mut radial_b = vec![0.0; (lmax + 1) * nbes];

        let (xs, ws) = &self.radial_rule;
        let length = r_hi - r_lo;
        for (x, w) in xs.iter().zip(ws) {
            let r = r_lo + length * x;
            let weight = w_t * w * length * r * r * w_phi;
            let dist_b = (r * r + dist * dist - 2.0 * r * dist * cos_t).max(0.0).sqrt();

            angular.iter_mut().for_each(|v| *v = 0.0);
            for dir in &directions {
                let u = dir * r;
                real_ylm_into(lmax, &u, &mut ya);
                real_ylm_into(lmax, &(u - rvec), &mut yb);
                accumulate_outer(&mut angular, &ya, &yb, ny);
            }

            fill_radial(spec, r, &mut radial_a);
            fill_radial(spec, dist_b, &mut radial_b);

            accumulate_block(
                &mut block,
                cols,
                weight,
                &angular,
                ny,
                (orbitals_a, radial_a.as_slice()),
                (orbitals_b, radial_b.as_slice()),
                nbes,
            );
        }

        block
    }

    // k_B j_l'(z_B) rcut² ∮ f_A(B + rcut n̂) Y_B(n̂) dΩ, row-major
    fn surface_term(
        &self,
        frame: &Frame,
        dist: f64,
        orbitals_a: &[SiteOrbital],
        orbitals_b: &[SiteOrbital],
    ) -> Vec<f64> {
        let spec = &self.spec;
        let (rcut, nbes, lmax) = (spec.rcut(), spec.nbes(), spec.lmax());
        let cols = orbitals_b.len() * nbes;
        let mut surface = vec![0.0; orbitals_a.len() * nbes * cols];

        // n̂ is measured from the B -> A axis; only the cap inside A's sphere contributes
        let back = Frame {
            e1: frame.e1,
            e2: -frame.e2,
            ez: -frame.ez,
        };
        let rvec = frame.ez * dist;
        let cap = (dist / (2.0 * rcut)).min(1.0);
        let span = 1.0 - cap;
        if span <= 0.0 {
            return surface;
        }

        let (phis, w_phi) = azimuthal_rule(self.azimuthal_order);
        let ny = ylm_count(lmax);
        let mut ya = vec![0.0; ny];
        let mut yb = vec![0.0; ny];
        let mut angular = vec![0.0; ny * ny];
        let mut radial_a = vec![0.0; (lmax + 1) * nbes];
        let slopes: Vec<f64> = iproduct!(0..=lmax, 0..nbes)
            .map(|(l, q)| spec.boundary_slope(l, q))
            .collect();

        let (xs, ws) = &self.polar_rule;
        for (x, w) in xs.iter().zip(ws) {
            let cos_a = cap + span * x;
            let sin_a = (1.0 - cos_a * cos_a).max(0.0).sqrt();
            let weight = w * span * w_phi * rcut * rcut;
            let dist_a = (rcut * rcut + dist * dist - 2.0 * rcut * dist * cos_a)
                .max(0.0)
                .sqrt();

            angular.iter_mut().for_each(|v| *v = 0.0);
            for &phi in &phis {
                let n = back.direction(sin_a, cos_a, phi);
                real_ylm_into(lmax, &(rvec + n * rcut), &mut ya);
                real_ylm_into(lmax, &n, &mut yb);
                accumulate_outer(&mut angular, &ya, &yb, ny);
            }

            fill_radial(spec, dist_a, &mut radial_a);
            accumulate_block(
                &mut surface,
                cols,
                weight,
                &angular,
                ny,
                (orbitals_a, radial_a.as_slice()),
                (orbitals_b, slopes.as_slice()),
                nbes,
            );
        }

        surface
    }
}

// j_l(k_{lq} r) for every channel; the quadrature only visits r inside the support
fn fill_radial(spec: &RadialBasisSpec, r: f64, out: &mut [f64]) {
    let nbes = spec.nbes();
    for l in 0..=spec.lmax() {
        for q in 0..nbes {
            out[l * nbes + q] = sphbesj(l, spec.wavenumber(l, q) * r);
        }
    }
}

fn accumulate_outer(angular: &mut [f64], ya: &[f64], yb: &[f64], ny: usize) {
    for (ia, &va) in ya.iter().enumerate() {
        if va == 0.0 {
            continue;
        }
        let row = &mut angular[ia * ny..(ia + 1) * ny];
        for (dst, &vb) in row.iter_mut().zip(yb) {
            *dst += va * vb;
        }
    }
}

// block[(a, qa), (b, qb)] += weight * angular[a, b] * radial_a[la, qa] * radial_b[lb, qb]
#[allow(clippy::too_many_arguments)]
fn accumulate_block(
    block: &mut [f64],
    cols: usize,
    weight: f64,
    angular: &[f64],
    ny: usize,
    (orbitals_a, radial_a): (&[SiteOrbital], &[f64]),
    (orbitals_b, radial_b): (&[SiteOrbital], &[f64]),
    nbes: usize,
) {
    for (oa, a) in orbitals_a.iter().enumerate() {
        let ia = ylm_index(a.l, a.m);
        for (ob, b) in orbitals_b.iter().enumerate() {
            let g = weight * angular[ia * ny + ylm_index(b.l, b.m)];
            if g == 0.0 {
                continue;
            }
            let rb = &radial_b[b.l * nbes..(b.l + 1) * nbes];
            for qa in 0..nbes {
                let fa = g * radial_a[a.l * nbes + qa];
                let start = (oa * nbes + qa) * cols + ob * nbes;
                for (qb, dst) in block[start..start + nbes].iter_mut().enumerate() {
                    *dst += fa * rb[qb];
                }
            }
        }
    }
}

fn add_assign(mut lhs: Vec<f64>, rhs: Vec<f64>) -> Vec<f64> {
    lhs.iter_mut().zip(rhs).for_each(|(l, r)| *l += r);
    lhs
}

// writes block (A, B) and its mirror (B, A); real values, so the mirror is a plain transpose
fn scatter(
    tensor: &mut Array4<Complex<f64>>,
    block: &DMatrix<f64>,
    site_a: &Site,
    site_b: &Site,
    nbes: usize,
) {
    for (oa, &i) in site_a.positions.iter().enumerate() {
        for (ob, &j) in site_b.positions.iter().enumerate() {
            for (q1, q2) in iproduct!(0..nbes, 0..nbes) {
                let value = Complex::new(block[(oa * nbes + q1, ob * nbes + q2)], 0.0);
                tensor[[i, j, q1, q2]] = value;
                tensor[[j, i, q2, q1]] = value.conj();
            }
        }
    }
}

fn group_sites(tau_cart: &TauCart, index: &[CompositeIndex]) -> Vec<Site> {
    let mut lookup: HashMap<(usize, usize), usize> = HashMap::new();
    let mut sites: Vec<Site> = Vec::new();
    for (pos, idx) in index.iter().enumerate() {
        let slot = *lookup.entry(idx.site()).or_insert_with(|| {
            sites.push(Site {
                center: tau_cart[idx.itype][idx.iatom],
                orbitals: Vec::new(),
                positions: Vec::new(),
            });
            sites.len() - 1
        });
        sites[slot].orbitals.push(SiteOrbital { l: idx.l, m: idx.m });
        sites[slot].positions.push(pos);
    }
    sites
}
