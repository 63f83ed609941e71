//! Named variational-formulation templates.
//!
//! The fixed entries are plain statics: built at compile time and never
//! mutated, so any thread may read them. [`boundary_grammian`] is the only
//! way to build a parameterized one.

use std::borrow::Cow;

use crate::{
    datatypes::INTERIOR_LABEL,
    error::BridgeError,
    script::{freefemize, NameStyle},
};

/// Symbol of the trial (unknown) function in every catalog template.
pub const TRIAL_SYMBOL: &str = "u";
/// Symbol of the test function in every catalog template.
pub const TEST_SYMBOL: &str = "v";

/// A bilinear form the solver can assemble into a sparse matrix.
///
/// The trial and test symbols must name functions the surrounding script
/// has already declared on the finite-element space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationalFormulationSpec {
    name: Cow<'static, str>,
    trial_symbol: &'static str,
    test_symbol: &'static str,
    matrix_name: Cow<'static, str>,
    integrand: &'static str,
    boundary_labels: Cow<'static, [u32]>,
}

/// ∫ ∇u·∇v over the domain.
pub static STIFFNESS: VariationalFormulationSpec = VariationalFormulationSpec {
    name: Cow::Borrowed("stiffness"),
    trial_symbol: TRIAL_SYMBOL,
    test_symbol: TEST_SYMBOL,
    matrix_name: Cow::Borrowed("stiffness"),
    integrand: "dx(u)*dx(v) + dy(u)*dy(v)",
    boundary_labels: Cow::Borrowed(&[]),
};

/// ∫ u·v over the domain (the mass matrix).
pub static GRAMMIAN: VariationalFormulationSpec = VariationalFormulationSpec {
    name: Cow::Borrowed("Grammian"),
    trial_symbol: TRIAL_SYMBOL,
    test_symbol: TEST_SYMBOL,
    matrix_name: Cow::Borrowed("Grammian"),
    integrand: "u*v",
    boundary_labels: Cow::Borrowed(&[]),
};

/// ∫ u·v over the boundary sides carrying any of `labels`.
///
/// Labels are sorted and deduplicated, so the same set always yields the
/// same matrix name. An empty set, or label 0, is rejected.
pub fn boundary_grammian(labels: &[u32]) -> Result<VariationalFormulationSpec, BridgeError> {
    if labels.is_empty() {
        return Err(BridgeError::Config(
            "boundary Grammian needs at least one boundary label".to_owned(),
        ));
    }
    if labels.contains(&INTERIOR_LABEL) {
        return Err(BridgeError::Config(
            "label 0 marks interior sides and cannot restrict a boundary integral".to_owned(),
        ));
    }

    let mut labels = labels.to_vec();
    labels.sort_unstable();
    labels.dedup();

    let suffix: Vec<String> = labels.iter().map(|l| l.to_string()).collect();

    Ok(VariationalFormulationSpec {
        name: Cow::Borrowed("BoundaryGrammian"),
        trial_symbol: TRIAL_SYMBOL,
        test_symbol: TEST_SYMBOL,
        matrix_name: Cow::Owned(format!("BoundaryGrammian_{}", suffix.join("_"))),
        integrand: "u*v",
        boundary_labels: Cow::Owned(labels),
    })
}

/// The fixed catalog entries.
pub fn entries() -> [&'static VariationalFormulationSpec; 2] {
    [&STIFFNESS, &GRAMMIAN]
}

/// Finds a fixed entry by name; `mass` is accepted for the Grammian.
pub fn lookup(name: &str) -> Option<&'static VariationalFormulationSpec> {
    match name {
        "stiffness" => Some(&STIFFNESS),
        "Grammian" | "grammian" | "mass" => Some(&GRAMMIAN),
        _ => None,
    }
}

impl VariationalFormulationSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trial_symbol(&self) -> &str {
        self.trial_symbol
    }

    pub fn test_symbol(&self) -> &str {
        self.test_symbol
    }

    /// Name the dump of this matrix is marked with.
    pub fn matrix_name(&self) -> &str {
        &self.matrix_name
    }

    pub fn integrand(&self) -> &str {
        self.integrand
    }

    /// Labels the integral is restricted to; empty for a domain integral.
    pub fn boundary_labels(&self) -> &[u32] {
        &self.boundary_labels
    }

    /// The integral expression over the mesh called `mesh`, e.g.
    /// `int2d(Th)( u*v )` or `int1d(Th, 1, 2)( u*v )`.
    pub fn formulation(&self, mesh: &str) -> String {
        if self.boundary_labels.is_empty() {
            format!("int2d({mesh})( {} )", self.integrand)
        } else {
            let labels: Vec<String> = self.boundary_labels.iter().map(|l| l.to_string()).collect();
            format!("int1d({mesh}, {})( {} )", labels.join(", "), self.integrand)
        }
    }

    /// Script identifier of the `varf` the export fragment declares.
    pub fn varf_identifier(&self) -> String {
        format!("{}Varf", freefemize(&self.matrix_name, NameStyle::Variable))
    }

    /// Script identifier of the assembled matrix.
    pub fn matrix_identifier(&self) -> String {
        format!("{}Matrix", freefemize(&self.matrix_name, NameStyle::Variable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_entries() {
        assert_eq!(STIFFNESS.formulation("Th"), "int2d(Th)( dx(u)*dx(v) + dy(u)*dy(v) )");
        assert_eq!(GRAMMIAN.formulation("Th"), "int2d(Th)( u*v )");
        assert!(GRAMMIAN.boundary_labels().is_empty());
        assert_eq!(STIFFNESS.trial_symbol(), "u");
        assert_eq!(STIFFNESS.test_symbol(), "v");
    }

    #[test]
    fn test_boundary_grammian_embeds_labels() {
        let spec = boundary_grammian(&[1, 2]).unwrap();
        let formulation = spec.formulation("Th");
        assert_eq!(formulation, "int1d(Th, 1, 2)( u*v )");
        assert_ne!(spec.matrix_name(), GRAMMIAN.matrix_name());
        assert_eq!(spec.trial_symbol(), GRAMMIAN.trial_symbol());
        assert_eq!(spec.test_symbol(), GRAMMIAN.test_symbol());
    }

    #[test]
    fn test_boundary_grammian_normalizes_labels() {
        let a = boundary_grammian(&[2, 1, 2]).unwrap();
        let b = boundary_grammian(&[1, 2]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.matrix_name(), "BoundaryGrammian_1_2");
        assert_eq!(a.varf_identifier(), "BoundaryGrammian12Varf");
    }

    #[test]
    fn test_boundary_grammian_rejects_bad_labels() {
        assert!(matches!(boundary_grammian(&[]), Err(BridgeError::Config(_))));
        assert!(matches!(boundary_grammian(&[0, 3]), Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("mass"), Some(&GRAMMIAN));
        assert_eq!(lookup("stiffness"), Some(&STIFFNESS));
        assert_eq!(lookup("laplacian"), None);
        assert_eq!(entries().len(), 2);
    }
}
