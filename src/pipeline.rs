//! Per-file conversion driver
//!
//! Opens each input, hands it to the [`SchemaMapper`] and records the
//! outcome. A failing file is reported and the run moves on to the next one.

use crate::errors::Result;
use crate::mapper::SchemaMapper;
use crate::netcdf_io::open_source;
use crate::parallel::ParallelConfig;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Result of converting one input file
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    /// Output paths written, or why the file was abandoned
    pub result: Result<Vec<PathBuf>>,
}

/// Outcomes of a whole run, in input order
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<FileOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Every output path written during the run.
    pub fn written(&self) -> impl Iterator<Item = &PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
    }
}

/// Convert one input file with `mapper`.
///
/// The source handle is released when this returns, whether or not the
/// mapping succeeded.
pub fn convert_file(mapper: &SchemaMapper<'_>, input: &Path) -> Result<Vec<PathBuf>> {
    info!(path = %input.display(), schema = %mapper.schema().name, "converting");
    let source = open_source(input)?;
    mapper.apply(input, &source)
}

/// Convert every input, sequentially or on a dedicated thread pool.
///
/// # Errors
///
/// Only thread pool construction fails the run as a whole; per-file errors
/// land in the report.
pub fn run(mapper: &SchemaMapper<'_>, inputs: &[PathBuf], parallel: &ParallelConfig) -> Result<RunReport> {
    let convert = |input: &PathBuf| {
        let result = convert_file(mapper, input);
        match &result {
            Ok(outputs) => info!(path = %input.display(), outputs = outputs.len(), "converted"),
            Err(e) => error!(path = %input.display(), error = %e, "conversion failed"),
        }
        FileOutcome {
            input: input.clone(),
            result,
        }
    };

    let outcomes: Vec<FileOutcome> = if parallel.is_sequential() || inputs.len() < 2 {
        inputs.iter().map(convert).collect()
    } else {
        let pool = parallel.build_pool()?;
        info!(threads = pool.current_num_threads(), files = inputs.len(), "converting in parallel");
        pool.install(|| inputs.par_iter().map(convert).collect())
    };

    Ok(RunReport { outcomes })
}
