//! End-to-end runs of the driver on the example YAML files

use std::path::PathBuf;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use nao_basis::{IntegralTables, Operator, RadialBasisSpec};
    use orbmat::app::{closed_form_deviation, load_config, OrbmatApplication};
    use orbmat::config::{Args, MatrixFormat, OperatorChoice, QuadratureParams};

    /// Helper function to get the path to example files
    fn example_path(filename: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("example")
            .join(filename)
    }

    fn scratch_path(filename: &str) -> PathBuf {
        std::env::temp_dir().join(format!("orbmat_{}_{}", std::process::id(), filename))
    }

    #[test]
    fn test_h2o_json_output() {
        let config = load_config(example_path("h2o.yaml").to_str().unwrap()).unwrap();
        let matrix_file = scratch_path("h2o.json");
        let args = Args {
            matrix_file: Some(matrix_file.to_string_lossy().to_string()),
            format: Some(MatrixFormat::Json),
            ..Args::default()
        };

        let tables = OrbmatApplication::new(args, config).execute().unwrap();
        // O: 9 orbitals, 2 H: 4 each
        assert_eq!(tables.nao(), 17);
        assert_eq!((tables.nbes, tables.lmax), (3, 2));
        assert_eq!(tables.max_asymmetry(Operator::Overlap), Some(0.0));
        assert_eq!(tables.max_asymmetry(Operator::Kinetic), Some(0.0));

        let spec = RadialBasisSpec::new(2, 3, 5.0).unwrap();
        assert!(closed_form_deviation(&tables, &spec, Operator::Overlap).unwrap() < 1e-12);
        assert!(closed_form_deviation(&tables, &spec, Operator::Kinetic).unwrap() < 1e-12);

        let text = std::fs::read_to_string(&matrix_file).unwrap();
        std::fs::remove_file(&matrix_file).ok();
        let restored = IntegralTables::from_json(&text).unwrap();
        assert_eq!(restored.index, tables.index);
    }

    #[test]
    fn test_three_atoms_with_overrides() {
        let config = load_config(example_path("three_atoms.yaml").to_str().unwrap()).unwrap();
        let matrix_file = scratch_path("three_atoms.txt");
        let args = Args {
            nbes: Some(2),
            rcut: Some(6.0),
            operator: OperatorChoice::Overlap,
            matrix_file: Some(matrix_file.to_string_lossy().to_string()),
            ..Args::default()
        };

        let tables = OrbmatApplication::new(args, config).execute().unwrap();
        assert_eq!(tables.nao(), 48);
        assert_eq!(tables.nbes, 2);
        assert_eq!(tables.rcut, 6.0);
        assert!(tables.kinetic.is_none());

        let overlap = tables.overlap.as_ref().unwrap();
        for (i, a) in tables.index.iter().enumerate() {
            for (j, b) in tables.index.iter().enumerate() {
                if (a.iatom == 2) != (b.iatom == 2) {
                    assert!(overlap
                        .slice(ndarray::s![i, j, .., ..])
                        .iter()
                        .all(|v| v.re == 0.0 && v.im == 0.0));
                }
            }
        }

        // text is the default format
        let text = std::fs::read_to_string(&matrix_file).unwrap();
        std::fs::remove_file(&matrix_file).ok();
        assert!(text.starts_with("# rcut = 6.000000  nbes = 2  lmax = 3  nao = 48"));
        assert!(text.lines().nth(1).unwrap().ends_with(" S"));
    }

    #[test]
    fn test_zero_quadrature_order_is_an_error() {
        let mut config = load_config(example_path("h2o.yaml").to_str().unwrap()).unwrap();
        config.quadrature = Some(QuadratureParams {
            radial: Some(0),
            polar: None,
        });
        let err = OrbmatApplication::new(Args::default(), config)
            .execute()
            .unwrap_err();
        assert!(format!("{err:?}").contains("Invalid quadrature section"));
    }

    #[test]
    fn test_missing_config_is_an_error() {
        assert!(load_config(example_path("does_not_exist.yaml").to_str().unwrap()).is_err());
    }
}
