//! NetCDF I/O for source and destination containers
//!
//! Source fields are read whole and masked the way a NetCDF reader masks
//! them: NaN, `_FillValue` (or the type's default fill when the attribute is
//! absent), `missing_value`, and anything outside the valid range. Packed
//! fields are unpacked with `scale_factor` and `add_offset` after masking.
//! Destination files are always created fresh, and fields are written
//! with their configured type, fill value and attributes.

use crate::errors::{RelabelError, Result};
use crate::masked::MaskedArray;
use crate::schema::{split_path, ElementType, FieldDescriptor};
use chrono::Utc;
use ndarray::{ArrayD, ArrayViewD};
use netcdf::types::{IntType, NcVariableType};
use netcdf::{AttributeValue, File, FileMut, Variable, VariableMut};
use std::{fs, path::Path};
use tracing::trace;

/// NetCDF default fill for `int` variables
pub const NC_FILL_INT: i32 = -2_147_483_647;

/// NetCDF default fill for `float` and `double` variables
pub const NC_FILL_DOUBLE: f64 = 9.969_209_968_386_869e36;

/// Open a source container, returning [`std::io::ErrorKind::NotFound`] as an
/// I/O error when the path does not exist.
pub fn open_source(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(RelabelError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    Ok(netcdf::open(path)?)
}

/// Length of a root-level source dimension.
pub fn dimension_len(file: &File, name: &str) -> Option<usize> {
    file.dimension(name).map(|d| d.len())
}

/// The container's `title` attribute, when it is a string.
pub fn title(file: &File) -> Option<String> {
    match file.attribute("title")?.value().ok()? {
        AttributeValue::Str(title) => Some(title),
        _ => None,
    }
}

/// Read the full field at `path` (`group/name` or `name`) as a masked array.
///
/// Returns `Ok(None)` when the group or variable does not exist.
pub fn read_masked(file: &File, path: &str) -> Result<Option<MaskedArray>> {
    match split_path(path) {
        (None, name) => file.variable(name).map(|v| read_variable(&v)).transpose(),
        (Some(group), name) => {
            let Some(group) = file.group(group)? else {
                return Ok(None);
            };
            group.variable(name).map(|v| read_variable(&v)).transpose()
        }
    }
}

fn read_variable(var: &Variable) -> Result<MaskedArray> {
    let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
    let data = var.get_values::<f64, _>(..)?;
    let values = ArrayD::from_shape_vec(shape, data)?;

    // Masks apply to the packed values, before unpacking.
    let (valid_min, valid_max) = valid_range(var);
    let missing = attribute_f64(var, "missing_value");
    let fill = attribute_f64(var, "_FillValue").or_else(|| default_fill(var));
    let mut masked = MaskedArray::with_fill(values, fill)
        .mask_where(|v| missing == Some(v))
        .mask_outside(valid_min, valid_max);

    let scale = attribute_f64(var, "scale_factor");
    let offset = attribute_f64(var, "add_offset");
    if scale.is_some() || offset.is_some() {
        let (scale, offset) = (scale.unwrap_or(1.0), offset.unwrap_or(0.0));
        masked = masked.map(|v| v * scale + offset);
    }

    trace!(
        variable = %var.name(),
        valid = masked.count(),
        total = masked.len(),
        "read source field"
    );
    Ok(masked)
}

/// Default fill of the variable's type. Byte types have none.
fn default_fill(var: &Variable) -> Option<f64> {
    match var.vartype() {
        NcVariableType::Float(_) => Some(NC_FILL_DOUBLE),
        NcVariableType::Int(IntType::I16) => Some(-32_767.0),
        NcVariableType::Int(IntType::U16) => Some(65_535.0),
        NcVariableType::Int(IntType::I32) => Some(f64::from(NC_FILL_INT)),
        NcVariableType::Int(IntType::U32) => Some(4_294_967_295.0),
        NcVariableType::Int(IntType::I64) => Some(-9_223_372_036_854_775_806.0),
        NcVariableType::Int(IntType::U64) => Some(18_446_744_073_709_551_614.0),
        _ => None,
    }
}

fn valid_range(var: &Variable) -> (Option<f64>, Option<f64>) {
    let min = attribute_f64(var, "valid_min");
    let max = attribute_f64(var, "valid_max");
    if min.is_some() || max.is_some() {
        return (min, max);
    }
    match var.attribute("valid_range").and_then(|a| a.value().ok()) {
        Some(AttributeValue::Doubles(v)) if v.len() == 2 => (Some(v[0]), Some(v[1])),
        Some(AttributeValue::Floats(v)) if v.len() == 2 => {
            (Some(f64::from(v[0])), Some(f64::from(v[1])))
        }
        Some(AttributeValue::Ints(v)) if v.len() == 2 => {
            (Some(f64::from(v[0])), Some(f64::from(v[1])))
        }
        _ => (None, None),
    }
}

/// First numeric value of attribute `name`, widened to `f64`.
pub fn attribute_f64(var: &Variable, name: &str) -> Option<f64> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Uint(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        AttributeValue::Ushort(v) => Some(f64::from(v)),
        AttributeValue::Schar(v) => Some(f64::from(v)),
        AttributeValue::Uchar(v) => Some(f64::from(v)),
        AttributeValue::Longlong(v) => Some(v as f64),
        AttributeValue::Ulonglong(v) => Some(v as f64),
        AttributeValue::Doubles(v) => v.first().copied(),
        AttributeValue::Floats(v) => v.first().map(|&x| f64::from(x)),
        AttributeValue::Ints(v) => v.first().map(|&x| f64::from(x)),
        _ => None,
    }
}

/// Create a fresh destination file, replacing whatever sits at `path`.
pub fn create_destination(path: &Path) -> Result<FileMut> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(netcdf::create(path)?)
}

/// Add a `history` attribute naming the tool and the current UTC time.
pub fn stamp_history(dest: &mut FileMut) -> Result<()> {
    dest.add_attribute(
        "history",
        format!("Created by swot_relabel on {}", Utc::now().to_rfc3339()),
    )?;
    Ok(())
}

macro_rules! add_variable {
    ($target:expr, $kind:expr, $name:expr, $dims:expr) => {
        match $kind {
            ElementType::F64 => $target.add_variable::<f64>($name, $dims),
            ElementType::F32 => $target.add_variable::<f32>($name, $dims),
            ElementType::I32 => $target.add_variable::<i32>($name, $dims),
        }
    };
}

/// Define `field` in `dest` (inside its group, if any) and write `data`.
///
/// Masked elements are written as the field's fill value. Without a fill
/// value floats get NaN and ints the NetCDF default int fill.
pub fn write_field(dest: &mut FileMut, field: &FieldDescriptor, data: &MaskedArray) -> Result<()> {
    let dims: Vec<&str> = field.dims.iter().map(String::as_str).collect();

    match field.group() {
        Some(group_name) => {
            let mut group = dest.group_mut(group_name)?.ok_or_else(|| {
                RelabelError::Config(format!("group '{group_name}' was not created"))
            })?;
            let mut var = add_variable!(group, field.element_type, field.name(), &dims)?;
            populate_variable(&mut var, field, data)
        }
        None => {
            let mut var = add_variable!(dest, field.element_type, field.name(), &dims)?;
            populate_variable(&mut var, field, data)
        }
    }
}

fn populate_variable(var: &mut VariableMut, field: &FieldDescriptor, data: &MaskedArray) -> Result<()> {
    match field.element_type {
        ElementType::F64 => {
            if let Some(fill) = field.fill_value {
                var.set_fill_value(fill)?;
            }
            put_attributes(var, field)?;
            let values = data.filled(field.fill_value.unwrap_or(f64::NAN));
            put_f64(var, values.view())
        }
        ElementType::F32 => {
            #[allow(clippy::cast_possible_truncation)]
            let fill = field.fill_value.map(|f| f as f32);
            if let Some(fill) = fill {
                var.set_fill_value(fill)?;
            }
            put_attributes(var, field)?;
            #[allow(clippy::cast_possible_truncation)]
            let values = data
                .filled(f64::NAN)
                .mapv(|v| if v.is_nan() { fill.unwrap_or(f32::NAN) } else { v as f32 });
            put_f32(var, values.view())
        }
        ElementType::I32 => {
            #[allow(clippy::cast_possible_truncation)]
            let fill = field.fill_value.map_or(NC_FILL_INT, |f| f as i32);
            if field.fill_value.is_some() {
                var.set_fill_value(fill)?;
            }
            put_attributes(var, field)?;
            #[allow(clippy::cast_possible_truncation)]
            let values = data
                .filled(f64::NAN)
                .mapv(|v| if v.is_nan() { fill } else { v.round() as i32 });
            put_i32(var, values.view())
        }
    }
}

fn put_attributes(var: &mut VariableMut, field: &FieldDescriptor) -> Result<()> {
    let attrs = &field.attributes;
    var.put_attribute("long_name", attrs.long_name.as_str())?;
    var.put_attribute("units", attrs.units.as_str())?;
    if let Some(min) = attrs.valid_min {
        var.put_attribute("valid_min", min)?;
    }
    if let Some(max) = attrs.valid_max {
        var.put_attribute("valid_max", max)?;
    }
    Ok(())
}

macro_rules! put_array_impl {
    ($($name:ident: $ty:ty),*) => {
        $(
            fn $name(var: &mut VariableMut, values: ArrayViewD<$ty>) -> Result<()> {
                if values.ndim() == 0 {
                    var.put(values, &[] as &[usize])?;
                } else {
                    var.put(values, ..)?;
                }
                Ok(())
            }
        )*
    };
}

put_array_impl!(put_f64: f64, put_f32: f32, put_i32: i32);
