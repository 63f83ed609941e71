//! Mesh dump: the script fragment that prints it and the parser that
//! reads it back.
//!
//! Layout of a dump (also used for persisted mesh files):
//!
//! ```text
//! <node count>
//! <x> <y> <node label>                  one line per node
//! <triangle count>
//! <n0> <n1> <n2> <region label>         one line per triangle
//! <label0> <label1> <label2>            one line per triangle
//! ```
//!
//! `labelI` is the boundary label of the side opposite local corner `I`,
//! 0 for an interior side. Node labels are written for the solver's
//! benefit and ignored on parse.

use std::{collections::BTreeMap, path::Path};

use crate::{
    config::ScriptConfig,
    datatypes::{EdgeKey, Node, Triangle, INTERIOR_LABEL},
    error::BridgeError,
    mesh::LabeledMesh,
    record::{
        after_marker, parse_index, parse_label, parse_real, Field, RecordReader, RecordWriter,
    },
    script::{flagize, print_flag},
};

/// Name of the block the mesh fragment prints.
pub const MESH_BLOCK: &str = "mesh";

/// Builds the script fragment that prints the mesh named in `config`.
///
/// The per-triangle side labels come from the solver's boundary-edge
/// list; when the solver lists a side twice, the later entry wins.
pub fn build_mesh_export_fragment(config: &ScriptConfig) -> String {
    let th = &config.mesh;
    let mut fragment = String::new();

    fragment.push_str(&format!("// Export mesh {th}\n"));
    fragment.push_str("{\n");
    fragment.push_str(&format!("int[int] ffbEdgeLabels(3*{th}.nt);\n"));
    fragment.push_str("ffbEdgeLabels = 0;\n");
    fragment.push_str(&format!(
        "for (int i = 0; i < {th}.nbe; i++)\n  \
        ffbEdgeLabels[3*{th}.be(i).Element + {th}.be(i).whoinElement] = {th}.be(i).label;\n"
    ));
    fragment.push_str(&format!("cout.precision({});\n", config.precision));
    fragment.push_str(&print_flag(MESH_BLOCK));
    fragment.push_str(&format!("cout << {th}.nv << endl;\n"));
    fragment.push_str(&format!(
        "for (int i = 0; i < {th}.nv; i++)\n  \
        cout << {th}(i).x << \" \" << {th}(i).y << \" \" << {th}(i).label << endl;\n"
    ));
    fragment.push_str(&format!("cout << {th}.nt << endl;\n"));
    fragment.push_str(&format!(
        "for (int k = 0; k < {th}.nt; k++)\n  \
        cout << {th}[k][0] << \" \" << {th}[k][1] << \" \" << {th}[k][2] << \" \" << {th}[k].label << endl;\n"
    ));
    fragment.push_str(&format!(
        "for (int k = 0; k < {th}.nt; k++)\n  \
        cout << ffbEdgeLabels[3*k] << \" \" << ffbEdgeLabels[3*k+1] << \" \" << ffbEdgeLabels[3*k+2] << endl;\n"
    ));
    fragment.push_str("}\n");

    fragment
}

/// Parses a mesh dump that starts at the beginning of `text`.
///
/// Text after the last side-label line is ignored; see
/// [`parse_mesh_prefix`] to get hold of it.
pub fn parse_mesh(text: &str) -> Result<LabeledMesh, BridgeError> {
    parse_mesh_prefix(text).map(|(mesh, _)| mesh)
}

/// Parses a mesh dump at the beginning of `text` and returns the mesh
/// together with the text that follows it.
///
/// Nothing is returned unless the whole dump parses.
pub fn parse_mesh_prefix(text: &str) -> Result<(LabeledMesh, &str), BridgeError> {
    let mut reader = RecordReader::new(text);

    let num_nodes = reader.count("node")?;
    let mut nodes: Vec<Node> = Vec::with_capacity(reader.capacity_for(num_nodes));
    for _ in 0..num_nodes {
        let [x, y, _label] = reader.row::<3>("node")?;
        let x = parse_real(x).map_err(|err| reader.at_line(err))?;
        let y = parse_real(y).map_err(|err| reader.at_line(err))?;
        nodes.push(Node::new(x, y));
    }

    let num_triangles = reader.count("triangle")?;
    let mut triangles: Vec<Triangle> = Vec::with_capacity(reader.capacity_for(num_triangles));
    for k in 0..num_triangles {
        let [n0, n1, n2, region] = reader.row::<4>("triangle")?;
        let mut vertices = [0usize; 3];
        for (slot, token) in vertices.iter_mut().zip([n0, n1, n2]) {
            let node = parse_index(token).map_err(|err| reader.at_line(err))?;
            if node >= num_nodes {
                return Err(BridgeError::Index(format!(
                    "line {}: triangle {k} references node {node} but the mesh has {num_nodes} nodes",
                    reader.line_number()
                )));
            }
            *slot = node;
        }
        let region = parse_label(region).map_err(|err| reader.at_line(err))?;
        triangles.push(Triangle::with_region(vertices, region));
    }

    let mut boundary: BTreeMap<EdgeKey, u32> = BTreeMap::new();
    for k in 0..num_triangles {
        let labels = reader.row::<3>("triangle side labels")?;
        for (corner, token) in labels.into_iter().enumerate() {
            let label = parse_label(token).map_err(|err| reader.at_line(err))?;
            if label != INTERIOR_LABEL {
                boundary.insert(EdgeKey::new(k, corner), label);
            }
        }
    }

    let remainder = reader.remainder();
    let mesh = LabeledMesh::new(nodes, triangles, boundary)?;

    Ok((mesh, remainder))
}

/// Locates the mesh dump in captured solver output by its marker line and
/// parses it.
pub fn parse_mesh_in_output(output: &str) -> Result<LabeledMesh, BridgeError> {
    match after_marker(output, &flagize(MESH_BLOCK)) {
        Some(dump) => parse_mesh(dump),
        None => Err(BridgeError::NotFound(format!(
            "no mesh dump (marker '{}') in solver output",
            flagize(MESH_BLOCK)
        ))),
    }
}

/// Renders `mesh` in the exact layout the mesh fragment prints.
///
/// Each node is written with the label of the first boundary side that
/// touches it, or 0.
pub fn render_mesh_dump(mesh: &LabeledMesh) -> String {
    let mut node_labels = vec![INTERIOR_LABEL; mesh.nodes().len()];
    for (key, label) in mesh.boundary_edges() {
        let nodes = mesh.triangles()[key.triangle].nodes;
        for node in [nodes[(key.corner + 1) % 3], nodes[(key.corner + 2) % 3]] {
            if node_labels[node] == INTERIOR_LABEL {
                node_labels[node] = *label;
            }
        }
    }

    let mut writer = RecordWriter::new();

    writer.header(mesh.nodes().len());
    for (node, label) in mesh.nodes().iter().zip(node_labels) {
        writer.row(&[Field::Real(node.x), Field::Real(node.y), Field::Label(label)]);
    }

    writer.header(mesh.triangles().len());
    for triangle in mesh.triangles() {
        let [n0, n1, n2] = triangle.nodes;
        writer.row(&[
            Field::Index(n0),
            Field::Index(n1),
            Field::Index(n2),
            Field::Label(triangle.region),
        ]);
    }

    for k in 0..mesh.triangles().len() {
        let labels = mesh.triangle_labels(k).map(Field::Label);
        writer.row(&labels);
    }

    writer.finish()
}

/// Writes `mesh` to `path` in dump layout.
pub fn write_mesh_file<P: AsRef<Path>>(mesh: &LabeledMesh, path: P) -> Result<(), BridgeError> {
    std::fs::write(path, render_mesh_dump(mesh))?;
    Ok(())
}

/// Reads a mesh file written by [`write_mesh_file`]. Anything but
/// whitespace after the dump is an error.
pub fn read_mesh_file<P: AsRef<Path>>(path: P) -> Result<LabeledMesh, BridgeError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let (mesh, remainder) = parse_mesh_prefix(&contents)?;
    if !remainder.trim().is_empty() {
        return Err(BridgeError::Format(format!(
            "trailing data after mesh in {}",
            path.as_ref().display()
        )));
    }
    Ok(mesh)
}
