//! Schema mapper
//!
//! Applies a [`Schema`] to one open source file. For every container the
//! mapper first resolves all dimension sizes against the source, then creates
//! the destination file, its groups and dimensions, and finally writes each
//! field in dependency order. The arrays written so far are passed along
//! explicitly so derived fields can read their inputs back.
//!
//! The destination handle closes when it drops, so a container is finalized
//! on every exit path. A failure halfway through leaves a partial file behind.

use crate::derive::{calculate, mean};
use crate::errors::{RelabelError, Result, SchemaError};
use crate::masked::MaskedArray;
use crate::netcdf_io::{
    create_destination, dimension_len, read_masked, stamp_history, title, write_field,
};
use crate::paths::PathResolver;
use crate::schema::{ContainerSchema, FieldDescriptor, FieldKind, Schema};
use netcdf::{File, FileMut};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Target arrays already written to a container, keyed by target path
pub type Materialized = HashMap<String, MaskedArray>;

/// A target dimension with its size resolved against a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDimension {
    pub name: String,
    pub len: usize,
    /// Whether the size was capped below the source size
    pub truncated: bool,
}

/// A container whose dimensions are resolved and ready to be written
#[derive(Debug, Clone)]
pub struct ContainerPlan<'s> {
    pub schema: &'s ContainerSchema,
    pub dimensions: Vec<PlannedDimension>,
}

impl<'s> ContainerPlan<'s> {
    /// Resolve every dimension of `schema` against `source`.
    pub fn resolve(
        source: &File,
        schema: &'s ContainerSchema,
    ) -> std::result::Result<Self, SchemaError> {
        let dimensions = schema
            .dimensions
            .iter()
            .map(|dim| {
                let source_len = dimension_len(source, &dim.source).ok_or_else(|| {
                    SchemaError::MissingDimension {
                        dim: dim.source.clone(),
                    }
                })?;
                let len = dim.target_len(source_len);
                Ok(PlannedDimension {
                    name: dim.name.clone(),
                    len,
                    truncated: len < source_len,
                })
            })
            .collect::<std::result::Result<Vec<_>, SchemaError>>()?;

        Ok(Self { schema, dimensions })
    }

    fn dimension(&self, name: &str) -> Option<&PlannedDimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Target shape of `field`.
    pub fn shape_of(&self, field: &FieldDescriptor) -> Vec<usize> {
        field
            .dims
            .iter()
            .map(|d| self.dimension(d).map_or(0, |p| p.len))
            .collect()
    }

    /// Fit `data` to the target dimensions of `field`.
    ///
    /// A source with extra length-1 axes (a `[Time steps, Reach]` field with a
    /// single reach written to `[nt]`) has them dropped first; otherwise ranks
    /// must agree. Each axis must match its dimension exactly, except that a
    /// truncated dimension keeps the leading block of a longer axis.
    pub fn fit(
        &self,
        field: &FieldDescriptor,
        data: &MaskedArray,
    ) -> std::result::Result<MaskedArray, SchemaError> {
        let expected = self.shape_of(field);
        let mismatch = || SchemaError::ShapeMismatch {
            field: field.target.clone(),
            expected: expected.clone(),
            found: data.shape().to_vec(),
        };

        let squeezed;
        let data_fit = if data.ndim() > expected.len() {
            squeezed = data.squeeze_to(expected.len()).ok_or_else(mismatch)?;
            &squeezed
        } else {
            data
        };

        if data_fit.ndim() != expected.len() {
            return Err(mismatch());
        }
        for ((dim, &want), &have) in field.dims.iter().zip(&expected).zip(data_fit.shape()) {
            let truncated = self.dimension(dim).is_some_and(|p| p.truncated);
            if have < want || (have > want && !truncated) {
                return Err(mismatch());
            }
        }
        data_fit.leading_block(&expected).map_err(|_| mismatch())
    }
}

/// Applies a schema to source files, writing through an injected resolver
pub struct SchemaMapper<'a> {
    schema: &'a Schema,
    resolver: &'a dyn PathResolver,
    history: bool,
}

impl<'a> SchemaMapper<'a> {
    pub fn new(schema: &'a Schema, resolver: &'a dyn PathResolver) -> Self {
        Self {
            schema,
            resolver,
            history: false,
        }
    }

    /// Stamp a `history` attribute on every output container.
    #[must_use]
    pub fn with_history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Write every container of the schema for one source file.
    ///
    /// `source_path` names the file in errors and is what the resolver maps
    /// to output paths. Returns the written output paths in schema order.
    ///
    /// # Errors
    ///
    /// [`RelabelError::Schema`] when a dimension or field is missing from the
    /// source or does not fit its target; NetCDF and I/O errors unchanged.
    pub fn apply(&self, source_path: &Path, source: &File) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.schema.containers.len());

        for container in &self.schema.containers {
            let plan = ContainerPlan::resolve(source, container)
                .map_err(|e| RelabelError::schema(source_path, e))?;
            let output = self.resolver.resolve(source_path, &container.role)?;

            debug!(
                role = %container.role,
                output = %output.display(),
                fields = container.fields.len(),
                "writing container"
            );

            let mut dest = create_destination(&output)?;
            self.write_container(source_path, source, &mut dest, &plan)?;
            drop(dest);

            written.push(output);
        }

        Ok(written)
    }

    fn write_container(
        &self,
        source_path: &Path,
        source: &File,
        dest: &mut FileMut,
        plan: &ContainerPlan<'_>,
    ) -> Result<Materialized> {
        let schema = plan.schema;

        let container_title =
            format!("{}{}", schema.title_prefix, title(source).unwrap_or_default());
        if !container_title.is_empty() {
            dest.add_attribute("title", container_title)?;
        }
        if self.history {
            stamp_history(dest)?;
        }

        for group in &schema.groups {
            dest.add_group(group)?;
        }
        for dim in &plan.dimensions {
            dest.add_dimension(&dim.name, dim.len)?;
        }

        let order = schema
            .evaluation_order()
            .map_err(|e| RelabelError::schema(source_path, e))?;

        let mut materialized = Materialized::new();
        for field in order {
            let data = evaluate_field(source_path, source, plan, field, &materialized)?;

            trace!(
                field = %field.target,
                derived = field.is_derived(),
                shape = ?data.shape(),
                "writing field"
            );
            write_field(dest, field, &data)?;
            materialized.insert(field.target.clone(), data);
        }

        Ok(materialized)
    }
}

/// Produce the values of one field, already fitted to its target shape.
fn evaluate_field(
    source_path: &Path,
    source: &File,
    plan: &ContainerPlan<'_>,
    field: &FieldDescriptor,
    materialized: &Materialized,
) -> Result<MaskedArray> {
    let schema_error = |e| RelabelError::schema(source_path, e);

    let data = match &field.kind {
        FieldKind::Copy { source: path } => read_source(source_path, source, path)?,
        FieldKind::Mean { source: path, axis } => {
            let data = read_source(source_path, source, path)?;
            if let Some(axis) = *axis {
                if axis >= data.ndim() {
                    return Err(schema_error(SchemaError::InvalidAxis {
                        field: field.target.clone(),
                        axis,
                        rank: data.ndim(),
                    }));
                }
            }
            mean(&data, *axis)
        }
        FieldKind::CrossSectionAreaChange { wse, width } => {
            let h = dependency_view(plan.schema, materialized, &field.target, wse)
                .map_err(schema_error)?;
            let w = dependency_view(plan.schema, materialized, &field.target, width)
                .map_err(schema_error)?;
            calculate(&h, &w).map_err(|_| {
                schema_error(SchemaError::ShapeMismatch {
                    field: field.target.clone(),
                    expected: h.shape().to_vec(),
                    found: w.shape().to_vec(),
                })
            })?
        }
    };

    plan.fit(field, &data).map_err(schema_error)
}

fn read_source(source_path: &Path, source: &File, path: &str) -> Result<MaskedArray> {
    read_masked(source, path)?.ok_or_else(|| {
        RelabelError::schema(
            source_path,
            SchemaError::MissingField {
                path: path.to_string(),
            },
        )
    })
}

/// A written field as a reader of the destination sees it: fill values and
/// out-of-range values masked.
fn dependency_view(
    schema: &ContainerSchema,
    materialized: &Materialized,
    field: &str,
    dependency: &str,
) -> std::result::Result<MaskedArray, SchemaError> {
    let unknown = || SchemaError::UnknownDependency {
        field: field.to_string(),
        dependency: dependency.to_string(),
    };
    let descriptor = schema
        .fields
        .iter()
        .find(|f| f.target == dependency)
        .ok_or_else(unknown)?;
    let written = materialized.get(dependency).ok_or_else(unknown)?;

    let mut view = written.clone();
    if let Some(fill) = descriptor.fill_value {
        view = view.mask_where(|v| v == fill);
    }
    Ok(view.mask_outside(
        descriptor.attributes.valid_min,
        descriptor.attributes.valid_max,
    ))
}
