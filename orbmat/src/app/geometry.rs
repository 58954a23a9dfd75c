use crate::config::Config;
use color_eyre::eyre::{ensure, eyre, Result};
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;
use tracing::info;

/// Atom types and their Cartesian positions (Bohr) prepared from the user
/// configuration.
pub struct Geometry {
    pub elements: Vec<Element>,
    pub tau_cart: Vec<Vec<Vector3<f64>>>,
    pub lmax: Vec<usize>,
}

impl Geometry {
    pub fn natom(&self) -> Vec<usize> {
        self.tau_cart.iter().map(|atoms| atoms.len()).collect()
    }

    /// Atom pairs (distinct atoms, unordered) closer than `reach`.
    pub fn pairs_within(&self, reach: f64) -> usize {
        let atoms: Vec<&Vector3<f64>> = self.tau_cart.iter().flatten().collect();
        atoms
            .iter()
            .enumerate()
            .map(|(i, a)| atoms[i + 1..].iter().filter(|b| (**b - *a).norm() < reach).count())
            .sum()
    }
}

/// Build the atom types defined in the YAML configuration.
pub fn build_geometry(config: &Config) -> Result<Geometry> {
    info!("Preparing geometry...");
    ensure!(!config.species.is_empty(), "Configuration lists no species");

    let scale = config.unit_scale();
    let mut elements = Vec::with_capacity(config.species.len());
    let mut tau_cart = Vec::with_capacity(config.species.len());
    let mut lmax = Vec::with_capacity(config.species.len());

    for species in &config.species {
        let element = Element::from_symbol(&species.element)
            .ok_or_else(|| eyre!("Invalid element symbol: {}", species.element))?;
        let positions = species
            .positions
            .iter()
            .map(|p| Vector3::new(p[0], p[1], p[2]) * scale)
            .collect();
        elements.push(element);
        tau_cart.push(positions);
        lmax.push(species.lmax);
    }

    Ok(Geometry {
        elements,
        tau_cart,
        lmax,
    })
}
