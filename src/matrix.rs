//! Sparse-matrix dumps.
//!
//! A dump is a marker line naming the matrix, a count line, then one
//! `row col value` line per stored entry in the solver's own traversal
//! order. Several dumps may share one captured output; the marker tells
//! them apart.

use nalgebra_sparse::CooMatrix;

use crate::{
    catalog::VariationalFormulationSpec,
    config::ScriptConfig,
    error::BridgeError,
    record::{after_marker, parse_index, parse_real, Field, RecordReader, RecordWriter},
    script::{flagize, print_flag},
};

/// Builds the script fragment that assembles `spec` on the configured
/// finite-element space and prints its entries.
pub fn build_matrix_export_fragment(spec: &VariationalFormulationSpec, config: &ScriptConfig) -> String {
    let varf = spec.varf_identifier();
    let matrix = spec.matrix_identifier();
    let vh = &config.fespace;

    let mut fragment = String::new();
    fragment.push_str(&format!("// Export matrix {}\n", spec.matrix_name()));
    fragment.push_str(&format!(
        "varf {varf}({}, {}) = {};\n",
        spec.trial_symbol(),
        spec.test_symbol(),
        spec.formulation(&config.mesh)
    ));
    fragment.push_str(&format!("matrix {matrix} = {varf}({vh}, {vh});\n"));
    fragment.push_str("{\n");
    fragment.push_str("int[int] ffbRows(1), ffbCols(1);\n");
    fragment.push_str("real[int] ffbValues(1);\n");
    fragment.push_str(&format!("[ffbRows, ffbCols, ffbValues] = {matrix};\n"));
    fragment.push_str(&format!("cout.precision({});\n", config.precision));
    fragment.push_str(&print_flag(spec.matrix_name()));
    fragment.push_str("cout << ffbRows.n << endl;\n");
    fragment.push_str(
        "for (int k = 0; k < ffbRows.n; k++)\n  \
        cout << ffbRows[k] << \" \" << ffbCols[k] << \" \" << ffbValues[k] << endl;\n",
    );
    fragment.push_str("}\n");

    fragment
}

/// Finds the dump of `matrix_name` in `text` and parses it. The shape is
/// `(max row + 1, max col + 1)`.
///
/// Names are compared after [`freefemize`] in header style, so `"a"`,
/// `"A"` and `"a b"` versus `"a_b"` select the same dump.
///
/// [`freefemize`]: crate::script::freefemize
pub fn parse_matrix(text: &str, matrix_name: &str) -> Result<CooMatrix<f64>, BridgeError> {
    parse_matrix_with_shape(text, matrix_name, None)
}

/// Like [`parse_matrix`], but when `shape` is given every entry must fall
/// inside it and the result has exactly that shape.
///
/// If the marker appears more than once, the first dump is used.
pub fn parse_matrix_with_shape(
    text: &str,
    matrix_name: &str,
    shape: Option<(usize, usize)>,
) -> Result<CooMatrix<f64>, BridgeError> {
    let marker = flagize(matrix_name);
    let dump = match after_marker(text, &marker) {
        Some(dump) => dump,
        None => {
            return Err(BridgeError::NotFound(format!(
                "no dump of matrix '{matrix_name}' (marker '{marker}') in solver output"
            )))
        }
    };

    let mut reader = RecordReader::new(dump);
    let num_entries = reader.count("matrix entry")?;

    let mut rows: Vec<usize> = Vec::with_capacity(reader.capacity_for(num_entries));
    let mut cols: Vec<usize> = Vec::with_capacity(reader.capacity_for(num_entries));
    let mut values: Vec<f64> = Vec::with_capacity(reader.capacity_for(num_entries));

    for _ in 0..num_entries {
        let [row, col, value] = reader.row::<3>("matrix entry")?;
        let row = parse_index(row).map_err(|err| reader.at_line(err))?;
        let col = parse_index(col).map_err(|err| reader.at_line(err))?;
        let value = parse_real(value).map_err(|err| reader.at_line(err))?;

        if let Some((nrows, ncols)) = shape {
            if row >= nrows || col >= ncols {
                return Err(BridgeError::Index(format!(
                    "matrix '{matrix_name}' entry ({row}, {col}) lies outside the expected {nrows}x{ncols} shape"
                )));
            }
        }

        rows.push(row);
        cols.push(col);
        values.push(value);
    }

    let (nrows, ncols) = match shape {
        Some(shape) => shape,
        None => (
            rows.iter().max().map_or(0, |r| r + 1),
            cols.iter().max().map_or(0, |c| c + 1),
        ),
    };

    CooMatrix::try_from_triplets(nrows, ncols, rows, cols, values).map_err(|err| {
        BridgeError::Index(format!("matrix '{matrix_name}' could not be built: {err}"))
    })
}

/// Renders `matrix` exactly as the matrix fragment prints it, marker
/// included, entries in storage order.
pub fn render_matrix_dump(matrix_name: &str, matrix: &CooMatrix<f64>) -> String {
    let mut writer = RecordWriter::new();
    writer.line(&flagize(matrix_name));
    writer.header(matrix.nnz());
    for (row, col, value) in matrix.triplet_iter() {
        writer.row(&[Field::Index(row), Field::Index(col), Field::Real(*value)]);
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{boundary_grammian, GRAMMIAN, STIFFNESS};

    fn triplets(matrix: &CooMatrix<f64>) -> Vec<(usize, usize, f64)> {
        let mut entries: Vec<(usize, usize, f64)> =
            matrix.triplet_iter().map(|(r, c, v)| (r, c, *v)).collect();
        entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        entries
    }

    #[test]
    fn test_parse_named_matrix() {
        let text = "noise\n# FLAG > STIFFNESS\n3\n0 0 2.0\n1 0 -1.0\n1 2 0.5\n";
        let matrix = parse_matrix(text, "stiffness").unwrap();

        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.ncols(), 3);
        assert_eq!(
            triplets(&matrix),
            vec![(0, 0, 2.0), (1, 0, -1.0), (1, 2, 0.5)]
        );
    }

    #[test]
    fn test_missing_matrix() {
        let text = "# FLAG > STIFFNESS\n0\n";
        assert!(matches!(
            parse_matrix(text, "missing"),
            Err(BridgeError::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_entries() {
        let short = "# FLAG > A\n1\n0 0\n";
        assert!(matches!(parse_matrix(short, "A"), Err(BridgeError::Format(_))));

        let bad_count = "# FLAG > A\nmany\n0 0 1.0\n";
        assert!(matches!(parse_matrix(bad_count, "A"), Err(BridgeError::Format(_))));

        let bad_value = "# FLAG > A\n1\n0 0 x\n";
        assert!(matches!(parse_matrix(bad_value, "A"), Err(BridgeError::Format(_))));

        let truncated = "# FLAG > A\n2\n0 0 1.0\n";
        assert!(matches!(parse_matrix(truncated, "A"), Err(BridgeError::Format(_))));
    }

    #[test]
    fn test_huge_count_is_format_error() {
        for text in ["# FLAG > A\n18446744073709551615\n", "# FLAG > A\n18446744073709551615\n0 0 1.0\n"] {
            assert!(matches!(parse_matrix(text, "A"), Err(BridgeError::Format(_))), "{text:?}");
        }
    }

    #[test]
    fn test_truncated_block_next_to_another() {
        // A is one entry short, so its last row lands on B's marker
        let text = "# FLAG > A\n2\n0 0 1.0\n# FLAG > B\n1\n0 0 2.0\n";
        assert!(matches!(parse_matrix(text, "A"), Err(BridgeError::Format(_))));
        assert_eq!(triplets(&parse_matrix(text, "B").unwrap()), vec![(0, 0, 2.0)]);

        let text = "# FLAG > A\n1\n0 0 1.0\n# FLAG > B\n3\n0 0 2.0\n";
        assert!(matches!(parse_matrix(text, "B"), Err(BridgeError::Format(_))));
        assert_eq!(triplets(&parse_matrix(text, "A").unwrap()), vec![(0, 0, 1.0)]);
    }

    #[test]
    fn test_names_match_after_normalization() {
        let text = "# FLAG > A B\n1\n0 0 1.0\n";
        assert_eq!(parse_matrix(text, "a b").unwrap().nnz(), 1);
        assert_eq!(parse_matrix(text, "A_B").unwrap().nnz(), 1);
        assert!(matches!(parse_matrix(text, "AB"), Err(BridgeError::NotFound(_))));
    }

    #[test]
    fn test_expected_shape() {
        let text = "# FLAG > A\n2\n0 0 1.0\n3 1 2.0\n";

        let matrix = parse_matrix_with_shape(text, "A", Some((5, 5))).unwrap();
        assert_eq!((matrix.nrows(), matrix.ncols()), (5, 5));

        assert!(matches!(
            parse_matrix_with_shape(text, "A", Some((3, 3))),
            Err(BridgeError::Index(_))
        ));
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = parse_matrix("# FLAG > A\n0\n", "A").unwrap();
        assert_eq!((matrix.nrows(), matrix.ncols(), matrix.nnz()), (0, 0, 0));
    }

    #[test]
    fn test_marker_must_match_whole_line() {
        let text = "# FLAG > AB\n1\n0 0 9.0\n# FLAG > A\n1\n1 1 4.0\n";
        let matrix = parse_matrix(text, "A").unwrap();
        assert_eq!(triplets(&matrix), vec![(1, 1, 4.0)]);
    }

    #[test]
    fn test_render_layout() {
        let matrix =
            CooMatrix::try_from_triplets(2, 2, vec![1, 0], vec![0, 1], vec![0.25, -3.0]).unwrap();
        assert_eq!(
            render_matrix_dump("Grammian", &matrix),
            "# FLAG > GRAMMIAN\n2\n1 0 0.25\n0 1 -3.0\n"
        );
    }

    #[test]
    fn test_fragment_statement_order() {
        let config = ScriptConfig::default();
        let fragment = build_matrix_export_fragment(&STIFFNESS, &config);

        let varf = fragment
            .find("varf stiffnessVarf(u, v) = int2d(Th)( dx(u)*dx(v) + dy(u)*dy(v) );")
            .unwrap();
        let assemble = fragment
            .find("matrix stiffnessMatrix = stiffnessVarf(Vh, Vh);")
            .unwrap();
        let extract = fragment
            .find("[ffbRows, ffbCols, ffbValues] = stiffnessMatrix;")
            .unwrap();
        let flag = fragment.find("cout << \"# FLAG > STIFFNESS\" << endl;").unwrap();
        let count = fragment.find("cout << ffbRows.n << endl;").unwrap();
        assert!(varf < assemble && assemble < extract && extract < flag && flag < count);
    }

    #[test]
    fn test_fragment_boundary_grammian() {
        let spec = boundary_grammian(&[1, 2]).unwrap();
        let fragment = build_matrix_export_fragment(&spec, &ScriptConfig::default());

        assert!(fragment.contains("int1d(Th, 1, 2)( u*v )"));
        assert!(fragment.contains("# FLAG > BOUNDARYGRAMMIAN 1 2"));

        let plain = build_matrix_export_fragment(&GRAMMIAN, &ScriptConfig::default());
        assert!(plain.contains("# FLAG > GRAMMIAN\""));
        assert!(!plain.contains("BOUNDARY"));
    }
}
