//! Declarative mapping tables
//!
//! A [`Schema`] lists the output containers produced for every input file.
//! Each [`ContainerSchema`] declares its groups, its dimensions (sized from
//! source dimensions) and its fields, either copied from a source path or
//! derived from other data.
//!
//! # Organization
//!
//! - [`variants`]: the built-in named schemas
//!
//! Schemas are plain data and deserialize from JSON with the same shape as
//! the types below, so a run can swap in its own table via `--schema-file`.

pub mod variants;

use crate::errors::{RelabelError, Result, SchemaError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Fill value used by every floating-point data field in the built-in schemas
pub const DEFAULT_FILL: f64 = -999_999_999_999.0;

/// Element type of a target variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// NetCDF `double`
    #[default]
    #[serde(alias = "f8")]
    F64,
    /// NetCDF `float`
    #[serde(alias = "f4")]
    F32,
    /// NetCDF `int`
    #[serde(alias = "i4")]
    I32,
}

/// Metadata attached to every target field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldAttributes {
    pub units: String,
    pub long_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_max: Option<f64>,
}

impl FieldAttributes {
    pub fn new(units: &str, long_name: &str) -> Self {
        Self {
            units: units.to_string(),
            long_name: long_name.to_string(),
            valid_min: None,
            valid_max: None,
        }
    }

    #[must_use]
    pub fn valid_range(mut self, min: f64, max: f64) -> Self {
        self.valid_min = Some(min);
        self.valid_max = Some(max);
        self
    }
}

/// How a target field obtains its values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Copy the source field at `source` (`group/name` or `name`)
    Copy { source: String },
    /// Change in cross-sectional area from two target fields of the same
    /// container: water surface elevation and width
    CrossSectionAreaChange { wse: String, width: String },
    /// Masked mean of a source field, over everything or along one axis
    Mean {
        source: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        axis: Option<usize>,
    },
}

/// One target variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Target path, `group/name` or `name`
    pub target: String,
    /// Ordered target dimension names
    #[serde(default)]
    pub dims: Vec<String>,
    #[serde(default)]
    pub element_type: ElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<f64>,
    pub attributes: FieldAttributes,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Group part of the target path, if any.
    pub fn group(&self) -> Option<&str> {
        split_path(&self.target).0
    }

    /// Variable name part of the target path.
    pub fn name(&self) -> &str {
        split_path(&self.target).1
    }

    /// Target fields of the same container this field is computed from.
    pub fn dependencies(&self) -> Vec<&str> {
        match &self.kind {
            FieldKind::CrossSectionAreaChange { wse, width } => vec![wse.as_str(), width.as_str()],
            FieldKind::Copy { .. } | FieldKind::Mean { .. } => Vec::new(),
        }
    }

    pub fn is_derived(&self) -> bool {
        !matches!(self.kind, FieldKind::Copy { .. })
    }
}

/// Split `group/name` into its group and name.
pub fn split_path(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once('/') {
        Some((group, name)) => (Some(group), name),
        None => (None, path),
    }
}

/// One target dimension sized from a source dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionDescriptor {
    pub name: String,
    /// Source dimension the size is copied from
    pub source: String,
    /// Optional cap on the copied size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl DimensionDescriptor {
    pub fn new(name: &str, source: &str) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            limit: None,
        }
    }

    #[must_use]
    pub fn limited(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Target length given the source dimension's length.
    pub fn target_len(&self, source_len: usize) -> usize {
        match self.limit {
            Some(limit) => source_len.min(limit),
            None => source_len,
        }
    }
}

/// Rename rule built from tokens of the input file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRename {
    pub prefix: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Zero-based token positions appended after the prefix
    pub tokens: Vec<usize>,
}

fn default_delimiter() -> String {
    "_".to_string()
}

/// Where a container's output file goes, relative to the output root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputNaming {
    pub directory: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<TokenRename>,
}

/// One output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSchema {
    /// Role handed to the path resolver (e.g. `reach`, `node`, `sword`)
    pub role: String,
    /// Prepended to the source `title` attribute
    #[serde(default)]
    pub title_prefix: String,
    /// Sub-groups created under the root
    #[serde(default)]
    pub groups: Vec<String>,
    pub dimensions: Vec<DimensionDescriptor>,
    pub fields: Vec<FieldDescriptor>,
    pub output: OutputNaming,
}

impl ContainerSchema {
    /// Check the container on its own: unique names, declared dimensions and
    /// groups, resolvable dependencies.
    pub fn validate(&self) -> std::result::Result<(), SchemaError> {
        let mut dims = HashSet::new();
        for dim in &self.dimensions {
            if !dims.insert(dim.name.as_str()) {
                return Err(SchemaError::DuplicateDimension {
                    role: self.role.clone(),
                    dim: dim.name.clone(),
                });
            }
        }

        let mut targets = HashSet::new();
        for field in &self.fields {
            if !targets.insert(field.target.as_str()) {
                return Err(SchemaError::DuplicateField {
                    role: self.role.clone(),
                    field: field.target.clone(),
                });
            }
            if let Some(dim) = field.dims.iter().find(|d| !dims.contains(d.as_str())) {
                return Err(SchemaError::UndeclaredDimension {
                    field: field.target.clone(),
                    dim: dim.clone(),
                });
            }
            if let Some(group) = field.group() {
                if !self.groups.iter().any(|g| g == group) {
                    return Err(SchemaError::UndeclaredGroup {
                        field: field.target.clone(),
                        group: group.to_string(),
                    });
                }
            }
            if let FieldKind::Mean {
                axis: Some(axis), ..
            } = field.kind
            {
                // The source carries one more axis than the reduced target.
                let rank = field.dims.len() + 1;
                if axis >= rank {
                    return Err(SchemaError::InvalidAxis {
                        field: field.target.clone(),
                        axis,
                        rank,
                    });
                }
            }
        }

        // Nested groups are not created by the writer.
        if let Some(group) = self.groups.iter().find(|g| g.is_empty() || g.contains('/')) {
            return Err(SchemaError::UndeclaredGroup {
                field: String::new(),
                group: group.clone(),
            });
        }

        self.evaluation_order().map(|_| ())
    }

    /// Fields ordered so every derived field follows its dependencies.
    pub fn evaluation_order(&self) -> std::result::Result<Vec<&FieldDescriptor>, SchemaError> {
        let known: HashSet<&str> = self.fields.iter().map(|f| f.target.as_str()).collect();
        for field in &self.fields {
            if let Some(missing) = field.dependencies().into_iter().find(|d| !known.contains(d)) {
                return Err(SchemaError::UnknownDependency {
                    field: field.target.clone(),
                    dependency: missing.to_string(),
                });
            }
        }

        let mut ordered: Vec<&FieldDescriptor> = Vec::with_capacity(self.fields.len());
        let mut placed: HashSet<&str> = HashSet::new();
        let mut pending: Vec<&FieldDescriptor> = self.fields.iter().collect();

        while !pending.is_empty() {
            let before = pending.len();
            pending.retain(|field| {
                if field.dependencies().iter().all(|d| placed.contains(d)) {
                    placed.insert(field.target.as_str());
                    ordered.push(*field);
                    false
                } else {
                    true
                }
            });
            if pending.len() == before {
                return Err(SchemaError::DependencyCycle {
                    fields: pending.iter().map(|f| f.target.clone()).collect(),
                });
            }
        }

        Ok(ordered)
    }
}

/// A named mapping table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub containers: Vec<ContainerSchema>,
}

impl Schema {
    /// Validate every container and check roles are unique.
    pub fn validate(&self) -> std::result::Result<(), SchemaError> {
        let mut roles = HashSet::new();
        for container in &self.containers {
            if !roles.insert(container.role.as_str()) {
                return Err(SchemaError::DuplicateRole {
                    role: container.role.clone(),
                });
            }
            container.validate()?;
        }
        Ok(())
    }

    /// Look up a built-in variant by name and validate it.
    pub fn builtin(name: &str) -> Result<Self> {
        let schema = variants::by_name(name).ok_or_else(|| SchemaError::UnknownVariant {
            name: name.to_string(),
        })?;
        schema.validate()?;
        Ok(schema)
    }

    /// Parse a schema from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Read a schema from a JSON file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            RelabelError::Config(format!("cannot read schema file {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn container(&self, role: &str) -> Option<&ContainerSchema> {
        self.containers.iter().find(|c| c.role == role)
    }
}
