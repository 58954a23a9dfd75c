use super::geometry::Geometry;
use nao_basis::{IntegralTables, Operator, RadialBasisSpec};
use tracing::info;

/// Largest deviation of the same-orbital, same-channel entries from their closed forms.
pub fn closed_form_deviation(tables: &IntegralTables, spec: &RadialBasisSpec, op: Operator) -> Option<f64> {
    let tensor = tables.get(op)?;
    let mut worst: f64 = 0.0;
    for (i, idx) in tables.index.iter().enumerate() {
        for q in 0..tables.nbes {
            let exact = match op {
                Operator::Overlap => spec.overlap_diag(idx.l, q),
                Operator::Kinetic => spec.kinetic_diag(idx.l, q),
            };
            worst = worst.max((tensor[[i, i, q, q]].re - exact).abs());
        }
    }
    Some(worst)
}

pub fn report_summary(tables: &IntegralTables, geometry: &Geometry, spec: &RadialBasisSpec) {
    info!("Two-center integrals finished.");
    info!(
        "  {} orbitals on {} atoms ({} types), {} radial channels, rcut = {:.4} Bohr",
        tables.nao(),
        geometry.natom().iter().sum::<usize>(),
        geometry.elements.len(),
        tables.nbes,
        tables.rcut
    );
    for (element, (atoms, lmax)) in geometry
        .elements
        .iter()
        .zip(geometry.tau_cart.iter().zip(geometry.lmax.iter()))
    {
        info!("  {:>2}: {} atoms, lmax = {}", element.get_symbol(), atoms.len(), lmax);
    }
    info!(
        "  Atom pairs within 2 rcut: {}",
        geometry.pairs_within(2.0 * tables.rcut)
    );

    for op in tables.operators() {
        let label = match op {
            Operator::Overlap => "S",
            Operator::Kinetic => "T",
        };
        if let Some(deviation) = closed_form_deviation(tables, spec, op) {
            info!("  {}: max deviation from closed-form diagonal = {:.3e}", label, deviation);
        }
        if let Some(asymmetry) = tables.max_asymmetry(op) {
            info!("  {}: max Hermitian asymmetry = {:.3e}", label, asymmetry);
        }
    }
}
