//! swot_relabel: relabel hydrology simulation NetCDF output
//!
//! Converts hydrology simulation NetCDF files into re-structured outputs with
//! renamed dimensions, variables and groups (SWOT reach and node files, a
//! SWORD of Science file) plus derived quantities such as the change in
//! cross-sectional area `d_x_area`.
//!
//! ## Module Organization
//!
//! - [`schema`]: declarative mapping tables and the built-in variants
//! - [`mapper`]: applies a schema to one open source file
//! - [`derive`]: derived field computations
//! - [`masked`]: masked `f64` arrays with median/mean reductions
//! - [`netcdf_io`]: reading masked source fields, writing target fields
//! - [`paths`]: input discovery and output path resolution
//! - [`pipeline`]: per-file driver collecting outcomes
//! - [`parallel`]: thread pool configuration
//! - [`metadata`]: inspection of written containers
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use swot_relabel::prelude::*;
//! use std::path::Path;
//!
//! let schema = Schema::builtin("split").unwrap();
//! let resolver = NamingResolver::new("out", &schema);
//! let mapper = SchemaMapper::new(&schema, &resolver);
//!
//! let written = pipeline::convert_file(&mapper, Path::new("input/sim_run_01_a.nc")).unwrap();
//! println!("{written:?}");
//! ```

pub mod derive;
pub mod errors;
pub mod mapper;
pub mod masked;
pub mod metadata;
pub mod netcdf_io;
pub mod parallel;
pub mod paths;
pub mod pipeline;
pub mod schema;

pub use derive::calculate;
pub use errors::{RelabelError, Result, SchemaError};
pub use masked::MaskedArray;

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::derive::calculate;
    pub use crate::errors::{RelabelError, Result, SchemaError};
    pub use crate::mapper::SchemaMapper;
    pub use crate::masked::MaskedArray;
    pub use crate::parallel::ParallelConfig;
    pub use crate::paths::{discover_inputs, NamingResolver, PathResolver};
    pub use crate::pipeline::{self, RunReport};
    pub use crate::schema::{FieldDescriptor, FieldKind, Schema};
}
