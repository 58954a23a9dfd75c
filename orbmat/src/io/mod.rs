//! Input/Output operations
//!
//! This module handles logging setup and writing the computed tensors.

mod matrix;
mod output;

pub use matrix::{write_matrix_file, write_text};
pub use output::setup_output;
