//! Centralized error handling for swot_relabel
//!
//! Two layers: [`SchemaError`] describes a mapping table that cannot be applied
//! (either at load time or against a particular source file), and
//! [`RelabelError`] is what every public operation returns.

use std::path::PathBuf;

/// A configured dimension, field or dependency that cannot be honoured.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Source dimension named by a dimension descriptor is absent
    #[error("source dimension '{dim}' not found")]
    MissingDimension { dim: String },

    /// Source path named by a field descriptor is absent
    #[error("source field '{path}' not found")]
    MissingField { path: String },

    /// Array rank or shape does not fit the declared target dimensions
    #[error("field '{field}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        field: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Field references a dimension its container never declares
    #[error("field '{field}' uses undeclared dimension '{dim}'")]
    UndeclaredDimension { field: String, dim: String },

    /// Field is placed in a group its container never declares
    #[error("field '{field}' uses undeclared group '{group}'")]
    UndeclaredGroup { field: String, group: String },

    #[error("dimension '{dim}' declared twice in container '{role}'")]
    DuplicateDimension { role: String, dim: String },

    #[error("field '{field}' declared twice in container '{role}'")]
    DuplicateField { role: String, field: String },

    #[error("container role '{role}' declared twice")]
    DuplicateRole { role: String },

    /// Derived field depends on a target field that does not exist
    #[error("derived field '{field}' depends on unknown field '{dependency}'")]
    UnknownDependency { field: String, dependency: String },

    /// Derived fields depend on each other in a loop
    #[error("dependency cycle among fields: {}", fields.join(", "))]
    DependencyCycle { fields: Vec<String> },

    /// Reduction axis out of range for the source rank
    #[error("field '{field}' reduces over axis {axis}, source has {rank} axes")]
    InvalidAxis {
        field: String,
        axis: usize,
        rank: usize,
    },

    #[error("unknown schema variant '{name}'")]
    UnknownVariant { name: String },
}

/// Main error type for relabel operations
#[derive(Debug, thiserror::Error)]
pub enum RelabelError {
    /// Schema could not be applied to one input file
    #[error("{}: {source}", file.display())]
    Schema {
        file: PathBuf,
        #[source]
        source: SchemaError,
    },

    /// Schema is inconsistent on its own, before touching any file
    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),

    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Array shape errors
    #[error("Array error: {0}")]
    Array(#[from] ndarray::ShapeError),

    /// Schema file could not be parsed
    #[error("schema file error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input discovery pattern errors
    #[error("invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Naming or other run configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

impl RelabelError {
    /// Attach the offending input file to a schema error.
    pub fn schema(file: impl Into<PathBuf>, source: SchemaError) -> Self {
        Self::Schema {
            file: file.into(),
            source,
        }
    }
}

/// Result type alias for relabel operations
pub type Result<T> = std::result::Result<T, RelabelError>;
