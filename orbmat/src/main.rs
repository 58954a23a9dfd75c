//! Two-center integral command-line interface
//!
//! Reads a YAML configuration, evaluates the overlap and kinetic tensors of
//! the jY basis and writes them out.

use color_eyre::eyre::Result;
use orbmat::app::OrbmatApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    OrbmatApplication::from_cli()?.run()
}
