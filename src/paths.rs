//! Input discovery and output path resolution
//!
//! Both are collaborators of the mapper rather than part of it: discovery
//! lists the files to convert, and a [`PathResolver`] decides where each
//! output container of an input file is written.

use crate::errors::{RelabelError, Result};
use crate::schema::{OutputNaming, Schema, TokenRename};
use glob::{glob, Pattern};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Maps an input file and a container role to an output path
pub trait PathResolver: Send + Sync {
    fn resolve(&self, input: &Path, role: &str) -> Result<PathBuf>;
}

impl<F> PathResolver for F
where
    F: Fn(&Path, &str) -> Result<PathBuf> + Send + Sync,
{
    fn resolve(&self, input: &Path, role: &str) -> Result<PathBuf> {
        self(input, role)
    }
}

/// Resolver driven by each container's [`OutputNaming`]
#[derive(Debug, Clone)]
pub struct NamingResolver {
    root: PathBuf,
    naming: HashMap<String, OutputNaming>,
}

impl NamingResolver {
    /// Resolve every role of `schema` relative to `root`.
    pub fn new(root: impl Into<PathBuf>, schema: &Schema) -> Self {
        let naming = schema
            .containers
            .iter()
            .map(|c| (c.role.clone(), c.output.clone()))
            .collect();
        Self {
            root: root.into(),
            naming,
        }
    }
}

impl PathResolver for NamingResolver {
    fn resolve(&self, input: &Path, role: &str) -> Result<PathBuf> {
        let naming = self
            .naming
            .get(role)
            .ok_or_else(|| RelabelError::Config(format!("no output naming for role '{role}'")))?;

        let file_name = input
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                RelabelError::Config(format!("input path {} has no file name", input.display()))
            })?;

        let name = match &naming.rename {
            Some(rename) => rename_from_tokens(file_name, rename)?,
            None => file_name.to_string(),
        };

        Ok(self.root.join(&naming.directory).join(name))
    }
}

/// `prefix` followed by the selected tokens of `file_name`, all joined by the
/// delimiter.
///
/// `SWOT` with tokens `[2, 3]` turns `sim_run_0042_reach7.nc` into
/// `SWOT_0042_reach7.nc`.
pub fn rename_from_tokens(file_name: &str, rename: &TokenRename) -> Result<String> {
    let tokens: Vec<&str> = file_name.split(rename.delimiter.as_str()).collect();
    let mut parts = Vec::with_capacity(rename.tokens.len() + 1);
    parts.push(rename.prefix.as_str());
    for &index in &rename.tokens {
        let token = tokens.get(index).ok_or_else(|| {
            RelabelError::Config(format!(
                "file name '{file_name}' has {} '{}'-separated tokens, token {index} requested",
                tokens.len(),
                rename.delimiter
            ))
        })?;
        parts.push(*token);
    }
    Ok(parts.join(rename.delimiter.as_str()))
}

/// All files `dir/*.{extension}`, sorted.
pub fn discover_inputs(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(extension)
    );
    let mut inputs = Vec::new();
    for entry in glob(&pattern)? {
        let path = entry.map_err(|e| RelabelError::Io(e.into_error()))?;
        if path.is_file() {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}
