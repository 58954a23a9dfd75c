mod geometry;
mod report;

pub use geometry::{build_geometry, Geometry};
pub use report::{closed_form_deviation, report_summary};

use crate::config::{Args, Config};
use crate::io::{setup_output, write_matrix_file};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use nao_basis::{indexgen, IntegralTables, RadialBasisSpec, TwoCenterIntegrator};
use std::fs;
use tracing::info;

pub struct OrbmatApplication {
    args: Args,
    config: Config,
}

impl OrbmatApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args.config_file)?;
        Ok(Self { args, config })
    }

    pub fn new(args: Args, config: Config) -> Self {
        Self { args, config }
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref());
        self.execute()?;
        Ok(())
    }

    /// Geometry, index, integrals, summary and (optionally) the matrix file.
    pub fn execute(&self) -> Result<IntegralTables> {
        info!("Configuration loaded:\n{:?}", self.config);

        let geometry = build_geometry(&self.config)?;
        let index = indexgen(&geometry.natom(), &geometry.lmax);

        let rcut = self.args.rcut.or(self.config.radial.rcut).unwrap_or(7.0);
        let nbes = self.args.nbes.or(self.config.radial.nbes).unwrap_or(7);
        let lmax = self.config.radial.lmax.unwrap_or(0);
        let spec = RadialBasisSpec::new(lmax, nbes, rcut).wrap_err("Invalid radial basis")?;

        let mut integrator = TwoCenterIntegrator::new(spec.clone());
        if let Some(quadrature) = &self.config.quadrature {
            let (radial, polar, _) = integrator.quadrature_orders();
            integrator = integrator
                .with_quadrature(
                    quadrature.radial.unwrap_or(radial),
                    quadrature.polar.unwrap_or(polar),
                )
                .wrap_err("Invalid quadrature section")?;
        }
        let (radial, polar, azimuthal) = integrator.quadrature_orders();
        info!(
            "Radial basis: lmax = {}, nbes = {}, rcut = {:.4} Bohr; quadrature {}x{}x{}",
            lmax, nbes, rcut, radial, polar, azimuthal
        );

        let tables = match self.args.operator.single() {
            Some(op) => IntegralTables::build_one(&integrator, op, &geometry.tau_cart, &index),
            None => IntegralTables::build(&integrator, &geometry.tau_cart, &index),
        }
        .wrap_err("Two-center integration failed")?;

        report_summary(&tables, &geometry, &spec);

        let matrix_file = self.args.matrix_file.as_deref().or(self.config.output_path());
        if let Some(path) = matrix_file {
            let format = self
                .args
                .format
                .or(self.config.output_format())
                .unwrap_or_default();
            write_matrix_file(&tables, path, format)?;
        }

        Ok(tables)
    }
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", path))?;

    let config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();

    Ok(config)
}
