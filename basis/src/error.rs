use crate::index::CompositeIndex;

/// Precondition violations detected when setting up a two-center calculation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegralError {
    #[error("cutoff radius must be positive and finite, got {0}")]
    InvalidCutoff(f64),

    #[error("at least one radial channel is required")]
    NoRadialChannels,

    #[error("expected {expected} Bessel zeros, got {found}")]
    ZeroTableSize { expected: usize, found: usize },

    #[error("Bessel zeros for l={l} must be positive and strictly ascending")]
    UnsortedZeros { l: usize },

    #[error("quadrature needs at least one point per rule, got radial={radial}, polar={polar}")]
    InvalidQuadrature { radial: usize, polar: usize },

    #[error("orbital {index} refers to atom type {itype}, but only {ntype} types have positions")]
    MissingType {
        index: CompositeIndex,
        itype: usize,
        ntype: usize,
    },

    #[error("orbital {index} refers to atom {iatom}, but type {itype} has {natom} atoms")]
    MissingAtom {
        index: CompositeIndex,
        itype: usize,
        iatom: usize,
        natom: usize,
    },

    #[error("orbital {index} has l={l} above the radial basis lmax={lmax}")]
    AngularMomentumTooLarge {
        index: CompositeIndex,
        l: usize,
        lmax: usize,
    },

    #[error("orbital {index} has |m| > l")]
    InvalidMagneticNumber { index: CompositeIndex },
}

pub type Result<T> = std::result::Result<T, IntegralError>;
