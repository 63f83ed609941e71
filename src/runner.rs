//! One round trip to the solver: assemble a script from the requested
//! dumps, hand it to whatever runs the solver, and decode the output.

use std::collections::BTreeMap;

use nalgebra_sparse::CooMatrix;

use crate::{
    catalog::VariationalFormulationSpec,
    config::ScriptConfig,
    error::BridgeError,
    matrix::{build_matrix_export_fragment, parse_matrix},
    mesh::LabeledMesh,
    mesher::{build_mesh_export_fragment, parse_mesh_in_output},
    script::{freefemize, header_frame, NameStyle},
};

/// What the solver process handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverRun {
    pub stdout: String,
    pub success: bool,
}

/// Executes a complete solver script and captures its standard output.
///
/// Implementations own the process, its environment and any timeout.
pub trait SolverRunner {
    fn run(&self, script: &str) -> Result<SolverRun, BridgeError>;
}

#[derive(Debug, Clone, Default)]
pub struct ExportResult {
    pub mesh: Option<LabeledMesh>,
    /// Parsed matrices keyed by matrix name.
    pub matrices: BTreeMap<String, CooMatrix<f64>>,
}

/// A set of dumps to request from one solver run.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    config: ScriptConfig,
    mesh: bool,
    matrices: Vec<VariationalFormulationSpec>,
}

impl ExportRequest {
    pub fn new(config: ScriptConfig) -> ExportRequest {
        ExportRequest {
            config,
            mesh: false,
            matrices: Vec::new(),
        }
    }

    pub fn with_mesh(mut self) -> ExportRequest {
        self.mesh = true;
        self
    }

    /// Adds a matrix dump. A matrix name already requested is ignored.
    pub fn with_matrix(mut self, spec: &VariationalFormulationSpec) -> ExportRequest {
        if !self
            .matrices
            .iter()
            .any(|m| m.matrix_name() == spec.matrix_name())
        {
            self.matrices.push(spec.clone());
        }
        self
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    pub fn matrices(&self) -> &[VariationalFormulationSpec] {
        &self.matrices
    }

    /// The full script: `prelude` (which must declare the mesh, the space
    /// and the trial/test functions), then each requested fragment in
    /// request order, mesh first.
    pub fn script(&self, prelude: &str) -> Result<String, BridgeError> {
        self.config.validate()?;

        let mut script = String::from(prelude);
        if !script.is_empty() && !script.ends_with('\n') {
            script.push('\n');
        }

        if self.mesh {
            script.push_str(&header_frame("MESH EXPORT"));
            script.push_str(&build_mesh_export_fragment(&self.config));
        }
        for spec in &self.matrices {
            script.push_str(&header_frame(&format!(
                "MATRIX EXPORT {}",
                freefemize(spec.matrix_name(), NameStyle::Header)
            )));
            script.push_str(&build_matrix_export_fragment(spec, &self.config));
        }

        Ok(script)
    }

    /// Decodes every requested dump from one captured output.
    pub fn parse(&self, output: &str) -> Result<ExportResult, BridgeError> {
        let mesh = if self.mesh {
            Some(parse_mesh_in_output(output)?)
        } else {
            None
        };

        let mut matrices = BTreeMap::new();
        for spec in &self.matrices {
            let matrix = parse_matrix(output, spec.matrix_name())?;
            matrices.insert(spec.matrix_name().to_owned(), matrix);
        }

        Ok(ExportResult { mesh, matrices })
    }

    /// Runs the script through `runner` and parses what it printed. The
    /// run's success flag is not consulted; missing dumps surface as
    /// parse errors.
    pub fn run<R: SolverRunner>(&self, runner: &R, prelude: &str) -> Result<ExportResult, BridgeError> {
        let script = self.script(prelude)?;
        let run = runner.run(&script)?;
        self.parse(&run.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{boundary_grammian, GRAMMIAN, STIFFNESS};

    struct CannedRunner(&'static str);

    impl SolverRunner for CannedRunner {
        fn run(&self, _script: &str) -> Result<SolverRun, BridgeError> {
            Ok(SolverRun {
                stdout: self.0.to_owned(),
                success: false,
            })
        }
    }

    #[test]
    fn test_script_order() {
        let request = ExportRequest::new(ScriptConfig::default())
            .with_matrix(&STIFFNESS)
            .with_mesh()
            .with_matrix(&GRAMMIAN);
        let script = request.script("mesh Th = square(2, 2);\nfespace Vh(Th, P1);").unwrap();

        assert!(script.starts_with("mesh Th = square(2, 2);\nfespace Vh(Th, P1);\n"));
        let mesh = script.find("# FLAG > MESH").unwrap();
        let stiffness = script.find("# FLAG > STIFFNESS").unwrap();
        let grammian = script.find("# FLAG > GRAMMIAN").unwrap();
        assert!(mesh < stiffness && stiffness < grammian);
    }

    #[test]
    fn test_duplicate_matrix_requested_once() {
        let request = ExportRequest::default()
            .with_matrix(&GRAMMIAN)
            .with_matrix(&boundary_grammian(&[3]).unwrap())
            .with_matrix(&GRAMMIAN);
        assert_eq!(request.matrices().len(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ScriptConfig {
            fespace: "V h".to_owned(),
            ..ScriptConfig::default()
        };
        let request = ExportRequest::new(config).with_mesh();
        assert!(matches!(request.script(""), Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_run_ignores_status_and_parses() {
        let runner = CannedRunner(
            "# FLAG > GRAMMIAN\n1\n0 0 0.5\n# FLAG > MESH\n3\n0 0 0\n1 0 0\n0 1 0\n1\n0 1 2 0\n1 0 0\n",
        );
        let request = ExportRequest::new(ScriptConfig::default())
            .with_mesh()
            .with_matrix(&GRAMMIAN);
        let result = request.run(&runner, "").unwrap();

        let mesh = result.mesh.unwrap();
        assert_eq!(mesh.boundary_label(0, 0), 1);
        assert_eq!(result.matrices["Grammian"].nnz(), 1);
    }

    #[test]
    fn test_run_reports_missing_dump() {
        let runner = CannedRunner("Error line 3: syntax error\n");
        let request = ExportRequest::new(ScriptConfig::default()).with_matrix(&STIFFNESS);
        assert!(matches!(
            request.run(&runner, ""),
            Err(BridgeError::NotFound(_))
        ));
    }
}
