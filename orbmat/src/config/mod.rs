//! Configuration management for two-center integral runs
//!
//! This module handles the YAML configuration, its defaults, and the
//! command-line overrides.

mod args;

pub use args::{Args, OperatorChoice};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Bohr per Angstrom.
pub const ANGSTROM_TO_BOHR: f64 = 1.0 / 0.529_177_210_903;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub species: Vec<Species>,
    #[serde(default)]
    pub radial: RadialParams,
    pub quadrature: Option<QuadratureParams>,
    pub length_unit: Option<LengthUnit>,
    pub output: Option<OutputParams>,
}

/// One atom type: its element, the shells it carries and where its atoms sit
#[derive(Debug, Deserialize, Serialize)]
pub struct Species {
    pub element: String,
    pub lmax: usize,
    pub positions: Vec<[f64; 3]>,
}

/// Radial jY basis shared by every species
#[derive(Debug, Deserialize, Serialize)]
pub struct RadialParams {
    pub rcut: Option<f64>,
    pub nbes: Option<usize>,
    /// Defaults to the largest species `lmax`
    pub lmax: Option<usize>,
}

impl Default for RadialParams {
    fn default() -> Self {
        RadialParams {
            rcut: Some(7.0),
            nbes: Some(7),
            lmax: None,
        }
    }
}

impl RadialParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.rcut.is_none() {
            self.rcut = defaults.rcut;
        }
        if self.nbes.is_none() {
            self.nbes = defaults.nbes;
        }
        self
    }
}

/// Gauss-Legendre orders; unset fields keep the integrator's own choice
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct QuadratureParams {
    pub radial: Option<usize>,
    pub polar: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Bohr,
    Angstrom,
}

impl LengthUnit {
    /// Factor converting this unit to Bohr
    pub fn to_bohr(self) -> f64 {
        match self {
            LengthUnit::Bohr => 1.0,
            LengthUnit::Angstrom => ANGSTROM_TO_BOHR,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatrixFormat {
    #[default]
    Text,
    Json,
    Pickle,
}

/// Where the computed tensors go
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct OutputParams {
    pub path: Option<String>,
    pub format: Option<MatrixFormat>,
}

impl OutputParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.format.is_none() {
            self.format = Some(MatrixFormat::default());
        }
        self
    }
}

impl Config {
    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        self.radial = self.radial.with_defaults();
        if self.radial.lmax.is_none() {
            self.radial.lmax = self.species.iter().map(|s| s.lmax).max();
        }
        if self.length_unit.is_none() {
            self.length_unit = Some(LengthUnit::default());
        }
        if let Some(output) = self.output.take() {
            self.output = Some(output.with_defaults());
        }
        self
    }

    pub fn unit_scale(&self) -> f64 {
        self.length_unit.unwrap_or_default().to_bohr()
    }

    pub fn output_path(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.path.as_deref())
    }

    pub fn output_format(&self) -> Option<MatrixFormat> {
        self.output.as_ref().and_then(|o| o.format)
    }
}
