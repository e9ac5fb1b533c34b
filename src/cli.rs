//! Defines command-line interface options using `clap` for swot_relabel.

use clap::Parser;
use std::path::PathBuf;

/// Relabel hydrology simulation NetCDF files into SWOT and SWORD layouts
#[derive(Parser, Debug)]
#[command(
    name = "swot_relabel",
    version,
    about = "Relabel hydrology simulation NetCDF files into SWOT reach/node and SWORD of Science files"
)]
pub struct Args {
    /// Working directory; inputs are read from <workdir>/input
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,

    /// Directory holding input files. Defaults to <workdir>/input
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Root directory for outputs. Defaults to <workdir>
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Extension of input files
    #[arg(long, default_value = "nc")]
    pub extension: String,

    /// Built-in schema variant to apply
    #[arg(short, long, default_value = "split")]
    pub schema: String,

    /// JSON schema file; takes precedence over --schema
    #[arg(long)]
    pub schema_file: Option<PathBuf>,

    /// Number of files converted concurrently; 0 uses every CPU core
    #[arg(short = 't', long, default_value_t = 1)]
    pub threads: usize,

    /// Stamp a `history` attribute with the conversion time on every output
    #[arg(long)]
    pub history: bool,

    /// Print the dimensions and variables of every written file
    #[arg(long)]
    pub summary: bool,

    /// List the built-in schema variants and exit
    #[arg(long)]
    pub list_schemas: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn input_dir(&self) -> PathBuf {
        self.input_dir
            .clone()
            .unwrap_or_else(|| self.workdir.join("input"))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| self.workdir.clone())
    }
}
