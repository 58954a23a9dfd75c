use crate::error::Result;
use crate::index::CompositeIndex;
use crate::jyjy::{Operator, TauCart, TwoCenterIntegrator};
use ndarray::Array4;
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};

/// Overlap and/or kinetic tensors together with the basis they were computed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegralTables {
    pub rcut: f64,
    pub nbes: usize,
    pub lmax: usize,
    pub index: Vec<CompositeIndex>,
    pub overlap: Option<Array4<Complex<f64>>>,
    pub kinetic: Option<Array4<Complex<f64>>>,
}

impl IntegralTables {
    /// Both tensors from a single pass.
    pub fn build(
        integrator: &TwoCenterIntegrator,
        tau_cart: &TauCart,
        index: &[CompositeIndex],
    ) -> Result<Self> {
        let (overlap, kinetic) = integrator.tabulate(tau_cart, index)?;
        Ok(Self::assemble(integrator, index, Some(overlap), Some(kinetic)))
    }

    /// Only the tensor of `op`.
    pub fn build_one(
        integrator: &TwoCenterIntegrator,
        op: Operator,
        tau_cart: &TauCart,
        index: &[CompositeIndex],
    ) -> Result<Self> {
        let tensor = integrator.compute(op, tau_cart, index)?;
        Ok(match op {
            Operator::Overlap => Self::assemble(integrator, index, Some(tensor), None),
            Operator::Kinetic => Self::assemble(integrator, index, None, Some(tensor)),
        })
    }

    fn assemble(
        integrator: &TwoCenterIntegrator,
        index: &[CompositeIndex],
        overlap: Option<Array4<Complex<f64>>>,
        kinetic: Option<Array4<Complex<f64>>>,
    ) -> Self {
        let spec = integrator.spec();
        Self {
            rcut: spec.rcut(),
            nbes: spec.nbes(),
            lmax: spec.lmax(),
            index: index.to_vec(),
            overlap,
            kinetic,
        }
    }

    pub fn get(&self, op: Operator) -> Option<&Array4<Complex<f64>>> {
        match op {
            Operator::Overlap => self.overlap.as_ref(),
            Operator::Kinetic => self.kinetic.as_ref(),
        }
    }

    /// Operators present in this container, overlap first.
    pub fn operators(&self) -> Vec<Operator> {
        [Operator::Overlap, Operator::Kinetic]
            .into_iter()
            .filter(|&op| self.get(op).is_some())
            .collect()
    }

    pub fn nao(&self) -> usize {
        self.index.len()
    }

    /// Largest `|M[i,j,a,b] - conj(M[j,i,b,a])|` over the tensor of `op`.
    pub fn max_asymmetry(&self, op: Operator) -> Option<f64> {
        self.get(op).map(|m| {
            m.indexed_iter()
                .map(|((i, j, a, b), v)| (v - m[[j, i, b, a]].conj()).norm())
                .fold(0.0, f64::max)
        })
    }

    // Serialize to pickle format
    pub fn to_pickle(&self) -> std::result::Result<Vec<u8>, serde_pickle::Error> {
        let options = serde_pickle::SerOptions::new();
        serde_pickle::to_vec(self, options)
    }

    // Deserialize from pickle format
    pub fn from_pickle(bytes: &[u8]) -> std::result::Result<Self, serde_pickle::Error> {
        let options = serde_pickle::DeOptions::new();
        serde_pickle::from_slice(bytes, options)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    // Save to file in pickle format
    pub fn save_to_file(&self, filename: &str) -> std::io::Result<()> {
        let serialized = self
            .to_pickle()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        let mut file = File::create(filename)?;
        file.write_all(&serialized)
    }

    // Load from file in pickle format
    pub fn load_from_file(filename: &str) -> std::io::Result<Self> {
        let mut file = File::open(filename)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        Self::from_pickle(&buffer).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}
