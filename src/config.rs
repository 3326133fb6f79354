use crate::types::{Category, Expected, WrapperOverrides};
use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_SCHEMA_IMPORT_PATH: &str =
    "github.com/hashicorp/terraform-plugin-sdk/v2/helper/schema";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Knobs of a lint run, loaded from a `setter-lint.toml`-style file.
#[derive(Clone, Debug, PartialEq)]
pub struct LintConfig {
    pub schema_import_path: String,
    pub operating_functions: Vec<String>,
    /// Schema type name (`TypeString`) -> category it declares.
    pub type_mapping: HashMap<String, Category>,
    pub wrapper_overrides: WrapperOverrides,
}

/// On-disk shape; anything left out falls back to the defaults.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    schema_import_path: Option<String>,
    operating_functions: Option<Vec<String>>,
    type_mapping: Option<HashMap<String, Category>>,
    wrapper_overrides: Option<WrapperOverrides>,
}

/// `<schema package>.Set` behaves as a list.
fn default_wrapper_overrides(schema_import_path: &str) -> WrapperOverrides {
    let mut overrides = WrapperOverrides::new();
    overrides.insert(format!("{schema_import_path}.Set"), Category::Array);
    overrides
}

impl Default for LintConfig {
    fn default() -> Self {
        let type_mapping = [
            ("TypeString", Category::String),
            ("TypeInt", Category::Int),
            ("TypeList", Category::Array),
            ("TypeSet", Category::Array),
            ("TypeMap", Category::Map),
            ("TypeBool", Category::Bool),
            ("TypeFloat", Category::Float),
        ]
        .into_iter()
        .map(|(name, category)| (name.to_string(), category))
        .collect();

        Self {
            schema_import_path: DEFAULT_SCHEMA_IMPORT_PATH.to_string(),
            operating_functions: [
                "CreateContext",
                "Create",
                "ReadContext",
                "Read",
                "UpdateContext",
                "Update",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            type_mapping,
            wrapper_overrides: default_wrapper_overrides(DEFAULT_SCHEMA_IMPORT_PATH),
        }
    }
}

impl From<ConfigFile> for LintConfig {
    fn from(file: ConfigFile) -> Self {
        let defaults = LintConfig::default();
        let schema_import_path = file
            .schema_import_path
            .unwrap_or(defaults.schema_import_path);
        let wrapper_overrides = file
            .wrapper_overrides
            .unwrap_or_else(|| default_wrapper_overrides(&schema_import_path));
        Self {
            schema_import_path,
            operating_functions: file
                .operating_functions
                .unwrap_or(defaults.operating_functions),
            type_mapping: file.type_mapping.unwrap_or(defaults.type_mapping),
            wrapper_overrides,
        }
    }
}

impl LintConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        toml::from_str::<ConfigFile>(&content)
            .map(LintConfig::from)
            .map_err(|error| ConfigError::Parse {
                path: path.to_path_buf(),
                message: error.to_string(),
            })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str::<ConfigFile>(content)
            .map(LintConfig::from)
            .map_err(|error| ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                message: error.to_string(),
            })
    }

    pub fn is_operating_function(&self, key: &str) -> bool {
        self.operating_functions.iter().any(|name| name == key)
    }

    /// What a schema field declared as `schema_type` must be set with.
    /// Names outside the mapping have to match literally.
    pub fn expected_for(&self, schema_type: &str) -> Expected {
        match self.type_mapping.get(schema_type) {
            Some(category) => Expected::Category(*category),
            None => Expected::Named(schema_type.to_string()),
        }
    }
}
