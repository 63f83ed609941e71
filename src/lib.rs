//! Script generation and output decoding for a text-driven 2-D
//! finite-element solver.
//!
//! The solver is driven with script fragments ([`mesher`], [`matrix`])
//! and answers with text dumps that are decoded back into a
//! [`LabeledMesh`] or sparse matrices. Running the solver itself is left
//! to a [`SolverRunner`].

pub mod catalog;
pub mod config;
pub mod datatypes;
pub mod error;
pub mod matrix;
pub mod mesh;
pub mod mesher;
pub mod record;
pub mod runner;
pub mod script;

pub use catalog::{boundary_grammian, VariationalFormulationSpec, GRAMMIAN, STIFFNESS};
pub use config::ScriptConfig;
pub use datatypes::{EdgeKey, Node, Triangle};
pub use error::BridgeError;
pub use matrix::{build_matrix_export_fragment, parse_matrix, parse_matrix_with_shape, render_matrix_dump};
pub use mesh::{LabelMerge, LabeledMesh};
pub use mesher::{
    build_mesh_export_fragment, parse_mesh, parse_mesh_in_output, parse_mesh_prefix, read_mesh_file,
    render_mesh_dump, write_mesh_file,
};
pub use runner::{ExportRequest, ExportResult, SolverRun, SolverRunner};
