//! Writers for the computed tensors

use crate::config::MatrixFormat;
use color_eyre::eyre::{Result, WrapErr};
use nao_basis::{IntegralTables, Operator};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use tracing::info;

/// Entries with every tensor below this magnitude are left out of the text format
pub const TEXT_THRESHOLD: f64 = 1e-12;

pub fn write_matrix_file(tables: &IntegralTables, path: &str, format: MatrixFormat) -> Result<()> {
    match format {
        MatrixFormat::Text => {
            let file = File::create(path)
                .wrap_err_with(|| format!("Unable to create matrix file: {}", path))?;
            let mut writer = BufWriter::new(file);
            write_text(&mut writer, tables)?;
            writer.flush()?;
        }
        MatrixFormat::Json => {
            let text = tables.to_json().wrap_err("Failed to serialize tables to JSON")?;
            fs::write(path, text).wrap_err_with(|| format!("Unable to write matrix file: {}", path))?;
        }
        MatrixFormat::Pickle => {
            tables
                .save_to_file(path)
                .wrap_err_with(|| format!("Unable to write matrix file: {}", path))?;
        }
    }
    info!("Tensors written to {} ({:?})", path, format);
    Ok(())
}

/// One line per non-negligible `(i, j, q1, q2)` with both composite indices
/// and the value of every tensor present.
pub fn write_text<W: Write>(writer: &mut W, tables: &IntegralTables) -> Result<()> {
    let ops = tables.operators();
    let tensors: Vec<_> = ops.iter().filter_map(|&op| tables.get(op)).collect();
    let labels: Vec<&str> = ops
        .iter()
        .map(|op| match op {
            Operator::Overlap => "S",
            Operator::Kinetic => "T",
        })
        .collect();

    writeln!(
        writer,
        "# rcut = {:.6}  nbes = {}  lmax = {}  nao = {}",
        tables.rcut,
        tables.nbes,
        tables.lmax,
        tables.nao()
    )?;
    writeln!(writer, "# i j q1 q2 (type, atom, l, m) (type, atom, l, m) {}", labels.join(" "))?;

    for (i, a) in tables.index.iter().enumerate() {
        for (j, b) in tables.index.iter().enumerate() {
            for q1 in 0..tables.nbes {
                for q2 in 0..tables.nbes {
                    let values: Vec<f64> = tensors.iter().map(|t| t[[i, j, q1, q2]].re).collect();
                    if values.iter().all(|v| v.abs() <= TEXT_THRESHOLD) {
                        continue;
                    }
                    write!(writer, "{} {} {} {} {} {}", i, j, q1, q2, a, b)?;
                    for v in values {
                        write!(writer, " {:+.12e}", v)?;
                    }
                    writeln!(writer)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use nao_basis::{indexgen, RadialBasisSpec, TwoCenterIntegrator};

    #[test]
    fn test_text_lists_only_present_operators() {
        let spec = RadialBasisSpec::new(0, 2, 3.0).unwrap();
        let integrator = TwoCenterIntegrator::new(spec).with_quadrature(20, 20).unwrap();
        // second atom out of reach
        let tau_cart = vec![vec![Vector3::zeros(), Vector3::new(0.0, 0.0, 10.0)]];
        let index = indexgen(&[2], &[0]);
        let tables = IntegralTables::build_one(&integrator, Operator::Overlap, &tau_cart, &index).unwrap();

        let mut buffer = Vec::new();
        write_text(&mut buffer, &tables).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[1].ends_with("(type, atom, l, m) S"));
        // only the two same-site diagonals survive
        assert_eq!(lines.len(), 2 + 4);
        assert!(lines[2].starts_with("0 0 0 0 (0, 0, 0, +0) (0, 0, 0, +0) +"));
        assert!(lines.iter().skip(2).all(|l| l.split_whitespace().count() == 4 + 8 + 1));
    }
}
