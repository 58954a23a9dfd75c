//! Composite orbital indices `(type, atom, l, m)`.
//!
//! Every tensor produced by the integrator is laid out in the order generated
//! by [`indexgen`]: type, then atom, then `l`, then `m` following the linear
//! scan `M = 0..2l` mapped by [`abacus_m`] (`0, 1, -1, 2, -2, ...`).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompositeIndex {
    pub itype: usize,
    pub iatom: usize,
    pub l: usize,
    pub m: i32,
}

impl CompositeIndex {
    pub fn new(itype: usize, iatom: usize, l: usize, m: i32) -> Self {
        Self { itype, iatom, l, m }
    }

    /// `(type, atom)` pair identifying the site this orbital lives on.
    pub fn site(&self) -> (usize, usize) {
        (self.itype, self.iatom)
    }
}

impl From<(usize, usize, usize, i32)> for CompositeIndex {
    fn from((itype, iatom, l, m): (usize, usize, usize, i32)) -> Self {
        Self::new(itype, iatom, l, m)
    }
}

impl From<CompositeIndex> for (usize, usize, usize, i32) {
    fn from(idx: CompositeIndex) -> Self {
        (idx.itype, idx.iatom, idx.l, idx.m)
    }
}

impl fmt::Display for CompositeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {:+})", self.itype, self.iatom, self.l, self.m)
    }
}

/// Maps the linear scan index `M` inside a shell to the magnetic quantum number.
///
/// Even `M` gives `-M/2`, odd `M` gives `(M+1)/2`.
#[inline]
pub fn abacus_m(mm: usize) -> i32 {
    if mm % 2 == 0 {
        -((mm / 2) as i32)
    } else {
        ((mm + 1) / 2) as i32
    }
}

/// Inverse of [`abacus_m`].
#[inline]
pub fn abacus_mm(m: i32) -> usize {
    if m > 0 {
        (2 * m - 1) as usize
    } else {
        (-2 * m) as usize
    }
}

/// Enumerates composite indices for `natom[t]` atoms of type `t`, each
/// carrying every shell `l = 0..=lmax[t]`.
pub fn indexgen(natom: &[usize], lmax: &[usize]) -> Vec<CompositeIndex> {
    assert_eq!(
        natom.len(),
        lmax.len(),
        "indexgen: one atom count and one lmax per atom type are required"
    );

    let size: usize = natom
        .iter()
        .zip(lmax.iter())
        .map(|(&na, &lm)| na * (lm + 1) * (lm + 1))
        .sum();

    let mut index = Vec::with_capacity(size);
    for (itype, (&na, &lm)) in natom.iter().zip(lmax.iter()).enumerate() {
        for iatom in 0..na {
            for l in 0..=lm {
                for mm in 0..2 * l + 1 {
                    index.push(CompositeIndex::new(itype, iatom, l, abacus_m(mm)));
                }
            }
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexgen_order() {
        let natom = [1, 2, 3];
        let lmax = [2, 1, 2];
        let index = indexgen(&natom, &lmax);

        let mut idx = 0;
        for (it, (&na, &lm)) in natom.iter().zip(lmax.iter()).enumerate() {
            for ia in 0..na {
                for l in 0..=lm {
                    for mm in 0..2 * l + 1 {
                        let m = if mm % 2 == 0 {
                            -(mm as i32) / 2
                        } else {
                            (mm as i32 + 1) / 2
                        };
                        assert_eq!(<(usize, usize, usize, i32)>::from(index[idx]), (it, ia, l, m));
                        idx += 1;
                    }
                }
            }
        }
        assert_eq!(idx, index.len());
    }

    #[test]
    fn test_indexgen_leading_entries() {
        let index = indexgen(&[1, 2, 3], &[2, 1, 2]);
        let expected: Vec<CompositeIndex> = [
            (0, 0, 0, 0),
            (0, 0, 1, 0),
            (0, 0, 1, 1),
            (0, 0, 1, -1),
            (0, 0, 2, 0),
            (0, 0, 2, 1),
            (0, 0, 2, -1),
            (0, 0, 2, 2),
            (0, 0, 2, -2),
            (1, 0, 0, 0),
        ]
        .into_iter()
        .map(CompositeIndex::from)
        .collect();
        assert_eq!(&index[..10], expected.as_slice());
    }

    #[test]
    fn test_indexgen_length() {
        // 1*9 + 2*4 + 3*9
        assert_eq!(indexgen(&[1, 2, 3], &[2, 1, 2]).len(), 44);
        assert!(indexgen(&[0, 0], &[3, 1]).is_empty());
        assert!(indexgen(&[], &[]).is_empty());
    }

    #[test]
    fn test_indexgen_is_deterministic() {
        assert_eq!(indexgen(&[2, 1], &[3, 0]), indexgen(&[2, 1], &[3, 0]));
    }

    #[test]
    fn test_abacus_m_round_trip() {
        let ms: Vec<i32> = (0..7).map(abacus_m).collect();
        assert_eq!(ms, vec![0, 1, -1, 2, -2, 3, -3]);
        for mm in 0..21 {
            assert_eq!(abacus_mm(abacus_m(mm)), mm);
        }
    }

    #[test]
    #[should_panic]
    fn test_indexgen_rejects_mismatched_lengths() {
        indexgen(&[1, 2], &[1]);
    }
}
