// Truncated spherical-Bessel basis and its two-center integrals

pub mod basis;
pub mod error;
pub mod helper;
pub mod index;
pub mod jyjy;
pub mod sphbes;
pub mod tables;
pub mod ylm;

pub use basis::{Basis, JyOrbital, RadialBasisSpec};
pub use error::{IntegralError, Result};
pub use index::{abacus_m, indexgen, CompositeIndex};
pub use jyjy::{cal_overlap_sq, Operator, TwoCenterIntegrator};
pub use tables::IntegralTables;
