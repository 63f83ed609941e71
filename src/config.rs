use json::JsonValue;

use crate::{error::BridgeError, script::is_identifier};

pub const DEFAULT_MESH: &str = "Th";
pub const DEFAULT_FESPACE: &str = "Vh";
pub const DEFAULT_PRECISION: usize = 16;

/// Names of the solver-side objects the generated fragments refer to.
///
/// The fragments never declare these; the script the caller assembles
/// around them must.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptConfig {
    /// The mesh variable (`mesh Th = ...;`).
    pub mesh: String,
    /// The finite-element space the matrices are assembled on.
    pub fespace: String,
    /// Significant digits the solver prints real numbers with.
    pub precision: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        ScriptConfig {
            mesh: DEFAULT_MESH.to_owned(),
            fespace: DEFAULT_FESPACE.to_owned(),
            precision: DEFAULT_PRECISION,
        }
    }
}

impl ScriptConfig {
    pub fn validate(&self) -> Result<(), BridgeError> {
        if !is_identifier(&self.mesh) {
            return Err(BridgeError::Config(format!(
                "mesh name '{}' is not a valid script identifier",
                self.mesh
            )));
        }
        if !is_identifier(&self.fespace) {
            return Err(BridgeError::Config(format!(
                "fespace name '{}' is not a valid script identifier",
                self.fespace
            )));
        }
        if !(1..=17).contains(&self.precision) {
            return Err(BridgeError::Config(format!(
                "precision must be between 1 and 17, got {}",
                self.precision
            )));
        }
        Ok(())
    }
}

/// Reads a config file into a JsonValue object
///
/// # Arguments
/// * `config_file` - The path to the config file
pub fn load_config_file(config_file: &str) -> Result<JsonValue, BridgeError> {
    let file_string = match std::fs::read_to_string(config_file) {
        Ok(f) => f,
        Err(err) => {
            return Err(BridgeError::Config(format!(
                "Unable to open config file {config_file}: {err}"
            )))
        }
    };

    match json::parse(&file_string) {
        Ok(f) => Ok(f),
        Err(err) => Err(BridgeError::Config(format!("Error in config json: {err}"))),
    }
}

/// Builds a ScriptConfig from parsed json. Missing keys keep their defaults.
pub fn parse_config(config_json: &JsonValue) -> Result<ScriptConfig, BridgeError> {
    if !config_json.is_object() {
        return Err(BridgeError::Config(
            "Config json must be an object".to_owned(),
        ));
    }

    let mut config = ScriptConfig::default();

    if config_json.has_key("mesh") {
        config.mesh = match config_json["mesh"].as_str() {
            Some(s) => s.to_owned(),
            None => return Err(BridgeError::Config("Bad value for mesh".to_owned())),
        };
    }
    if config_json.has_key("fespace") {
        config.fespace = match config_json["fespace"].as_str() {
            Some(s) => s.to_owned(),
            None => return Err(BridgeError::Config("Bad value for fespace".to_owned())),
        };
    }
    if config_json.has_key("precision") {
        config.precision = match config_json["precision"].as_usize() {
            Some(p) => p,
            None => return Err(BridgeError::Config("Bad value for precision".to_owned())),
        };
    }

    config.validate()?;
    Ok(config)
}

/// Loads and validates a config file, or returns the defaults when no
/// path is given.
pub fn load(config_file: Option<&str>) -> Result<ScriptConfig, BridgeError> {
    match config_file {
        Some(path) => parse_config(&load_config_file(path)?),
        None => Ok(ScriptConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_config(&json::parse("{}").unwrap()).unwrap();
        assert_eq!(config, ScriptConfig::default());
        assert_eq!(config.mesh, "Th");
        assert_eq!(config.fespace, "Vh");
    }

    #[test]
    fn test_overrides() {
        let config_json = json::parse(r#"{ "mesh": "Mesh2", "fespace": "Wh", "precision": 12 }"#).unwrap();
        let config = parse_config(&config_json).unwrap();
        assert_eq!(config.mesh, "Mesh2");
        assert_eq!(config.fespace, "Wh");
        assert_eq!(config.precision, 12);
    }

    #[test]
    fn test_rejects_bad_values() {
        for text in [
            r#"{ "mesh": "my mesh" }"#,
            r#"{ "fespace": 3 }"#,
            r#"{ "precision": 0 }"#,
            r#"{ "precision": "high" }"#,
            "[1, 2]",
        ] {
            let result = parse_config(&json::parse(text).unwrap());
            assert!(matches!(result, Err(BridgeError::Config(_))), "{text}");
        }
    }

    #[test]
    fn test_load_without_file() {
        assert_eq!(load(None).unwrap(), ScriptConfig::default());
        assert!(matches!(
            load(Some("/nonexistent/ffbridge.json")),
            Err(BridgeError::Config(_))
        ));
    }
}
