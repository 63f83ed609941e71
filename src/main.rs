use clap::{Parser, Subcommand};

use ffbridge::{
    catalog::{self, VariationalFormulationSpec},
    config, BridgeError,
};

#[derive(Parser)]
#[command(name = "ffbridge", about = "Generate solver export scripts and decode their output")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the matrix catalog
    Catalog,
    /// Print the script fragment that dumps the mesh
    MeshScript {
        /// JSON file naming the mesh and finite-element space
        #[arg(long)]
        config: Option<String>,
    },
    /// Print the script fragment that dumps one catalog matrix
    MatrixScript {
        /// Catalog entry: stiffness, Grammian, mass or boundary-grammian
        entry: String,
        /// Boundary labels for boundary-grammian
        #[arg(long, num_args = 1..)]
        labels: Vec<u32>,
        #[arg(long)]
        config: Option<String>,
    },
    /// Decode the mesh dump from captured solver output
    ParseMesh {
        /// File holding the captured output
        output: String,
        /// Also write the mesh to this file
        #[arg(long)]
        save: Option<String>,
    },
    /// Decode one matrix dump from captured solver output
    ParseMatrix {
        output: String,
        entry: String,
        #[arg(long, num_args = 1..)]
        labels: Vec<u32>,
        /// Expected number of rows and columns
        #[arg(long, num_args = 2, value_names = ["ROWS", "COLS"])]
        shape: Option<Vec<usize>>,
    },
}

/// Resolves a catalog entry name, building a boundary Grammian from
/// `labels` when asked for one.
fn resolve_entry(entry: &str, labels: &[u32]) -> Result<VariationalFormulationSpec, BridgeError> {
    if entry == "boundary-grammian" || entry == "BoundaryGrammian" {
        return catalog::boundary_grammian(labels);
    }
    match catalog::lookup(entry) {
        Some(spec) => Ok(spec.clone()),
        None => Err(BridgeError::Config(format!(
            "unknown catalog entry '{entry}'"
        ))),
    }
}

fn read_output(path: &str) -> Result<String, BridgeError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(err) => Err(BridgeError::Config(format!(
            "Unable to open solver output {path}: {err}"
        ))),
    }
}

fn run(cli: Cli) -> Result<(), BridgeError> {
    match cli.command {
        Command::Catalog => {
            let script_config = config::ScriptConfig::default();
            for spec in catalog::entries() {
                println!(
                    "{:<12} {:<12} {}",
                    spec.name(),
                    spec.matrix_name(),
                    spec.formulation(&script_config.mesh)
                );
            }
            println!(
                "{:<12} {:<12} int1d({}, <labels>)( u*v )",
                "BoundaryGrammian", "(per labels)", script_config.mesh
            );
        }
        Command::MeshScript {
            config: config_file,
        } => {
            let script_config = config::load(config_file.as_deref())?;
            print!("{}", ffbridge::build_mesh_export_fragment(&script_config));
        }
        Command::MatrixScript {
            entry,
            labels,
            config: config_file,
        } => {
            let script_config = config::load(config_file.as_deref())?;
            let spec = resolve_entry(&entry, &labels)?;
            print!(
                "{}",
                ffbridge::build_matrix_export_fragment(&spec, &script_config)
            );
        }
        Command::ParseMesh { output, save } => {
            let contents = read_output(&output)?;
            let mesh = ffbridge::parse_mesh_in_output(&contents)?;
            println!(
                "info: loaded {} nodes, {} triangles and {} boundary edges",
                mesh.nodes().len(),
                mesh.triangles().len(),
                mesh.boundary_edges().len()
            );
            for k in mesh.degenerate_triangles() {
                eprintln!("warning [mesh]: triangle {k} is degenerate (zero area)");
            }
            for label in mesh.boundary_labels() {
                println!(
                    "info: boundary {label}: {} edges",
                    mesh.edges_with_label(label).len()
                );
            }
            if let Some(path) = save {
                ffbridge::write_mesh_file(&mesh, &path)?;
                println!("info: wrote mesh to {path}");
            }
        }
        Command::ParseMatrix {
            output,
            entry,
            labels,
            shape,
        } => {
            let contents = read_output(&output)?;
            let spec = resolve_entry(&entry, &labels)?;
            let shape = shape.map(|s| (s[0], s[1]));
            let matrix =
                ffbridge::parse_matrix_with_shape(&contents, spec.matrix_name(), shape)?;
            println!(
                "info: loaded {}x{} matrix '{}' with {} entries",
                matrix.nrows(),
                matrix.ncols(),
                spec.matrix_name(),
                matrix.nnz()
            );
            for (row, col, value) in matrix.triplet_iter() {
                println!("{row} {col} {value:?}");
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1)
    }
}
