//! Command-line argument parsing

use super::MatrixFormat;
use clap::{Parser, ValueEnum};
use nao_basis::Operator;

/// Which tensors to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OperatorChoice {
    Overlap,
    Kinetic,
    #[default]
    Both,
}

impl OperatorChoice {
    /// `None` means both tensors.
    pub fn single(self) -> Option<Operator> {
        match self {
            OperatorChoice::Overlap => Some(Operator::Overlap),
            OperatorChoice::Kinetic => Some(Operator::Kinetic),
            OperatorChoice::Both => None,
        }
    }
}

/// Two-center <jY|jY> and <jY|-∇²|jY> integrals from a YAML configuration
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override output file for the log: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write the computed tensors to this file
    #[arg(short, long)]
    pub matrix_file: Option<String>,

    /// Format of the matrix file
    #[arg(long, value_enum)]
    pub format: Option<MatrixFormat>,

    /// Override cutoff radius (Bohr)
    #[arg(long)]
    pub rcut: Option<f64>,

    /// Override number of radial channels per l
    #[arg(long)]
    pub nbes: Option<usize>,

    /// Operator(s) to evaluate
    #[arg(long, value_enum, default_value_t = OperatorChoice::Both)]
    pub operator: OperatorChoice,
}
