//! Inspection of written containers
//!
//! Lists the dimensions and variables of an output file, including those
//! inside groups, in a structured form and as a printed report.

use crate::errors::Result;
use netcdf::{AttributeValue, Variable};
use std::path::{Path, PathBuf};

/// Information about a dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// Information about one variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    /// `group/name` or `name`
    pub path: String,
    pub dimensions: Vec<String>,
    pub shape: Vec<usize>,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

/// Structure of one container file
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSummary {
    pub path: PathBuf,
    pub title: Option<String>,
    pub dimensions: Vec<DimensionInfo>,
    pub variables: Vec<VariableInfo>,
}

impl ContainerSummary {
    pub fn variable(&self, path: &str) -> Option<&VariableInfo> {
        self.variables.iter().find(|v| v.path == path)
    }
}

/// Summarize the file at `path`.
pub fn summarize_container(path: &Path) -> Result<ContainerSummary> {
    let file = netcdf::open(path)?;

    let mut dimensions: Vec<DimensionInfo> = file
        .dimensions()
        .map(|d| DimensionInfo {
            name: d.name().to_string(),
            length: d.len(),
            is_unlimited: d.is_unlimited(),
        })
        .collect();
    dimensions.sort_by(|a, b| a.name.cmp(&b.name));

    let mut variables: Vec<VariableInfo> = file.variables().map(|v| describe(None, &v)).collect();
    for group in file.groups()? {
        let group_name = group.name();
        variables.extend(group.variables().map(|v| describe(Some(group_name.as_str()), &v)));
    }
    variables.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(ContainerSummary {
        path: path.to_path_buf(),
        title: crate::netcdf_io::title(&file),
        dimensions,
        variables,
    })
}

fn describe(group: Option<&str>, var: &Variable) -> VariableInfo {
    let name = var.name();
    VariableInfo {
        path: match group {
            Some(group) => format!("{group}/{name}"),
            None => name.to_string(),
        },
        dimensions: var.dimensions().iter().map(|d| d.name().to_string()).collect(),
        shape: var.dimensions().iter().map(netcdf::Dimension::len).collect(),
        units: string_attribute(var, "units"),
        long_name: string_attribute(var, "long_name"),
    }
}

fn string_attribute(var: &Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Prints the dimensions and variables of a summarized container.
pub fn print_summary(summary: &ContainerSummary) {
    println!("\n {}", summary.path.display());
    if let Some(title) = &summary.title {
        println!("   title: {title}");
    }

    println!("   Dimensions");
    if summary.dimensions.is_empty() {
        println!("      (none)");
    }
    for dim in &summary.dimensions {
        let unlimited = if dim.is_unlimited { " (unlimited)" } else { "" };
        println!("      {} = {}{}", dim.name, dim.length, unlimited);
    }

    println!("   Variables");
    for var in &summary.variables {
        let shape = if var.shape.is_empty() {
            "scalar".to_string()
        } else {
            format!(
                "[{}] = ({})",
                var.dimensions.join(", "),
                var.shape
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" × ")
            )
        };
        match &var.units {
            Some(units) => println!("      {} {} [{}]", var.path, shape, units),
            None => println!("      {} {}", var.path, shape),
        }
    }
}
