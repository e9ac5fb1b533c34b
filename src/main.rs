//! Entry point for swot_relabel.
//! Handles CLI parsing, schema selection and input discovery, then converts every input file.

use clap::Parser;
use std::process;
use swot_relabel::metadata::{print_summary, summarize_container};
use swot_relabel::prelude::*;
use swot_relabel::schema::variants::VARIANT_NAMES;
use tracing::{info, warn};

mod cli;
mod logging;

use cli::Args;

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(&args) {
        Ok(None) => {}
        Ok(Some(report)) if report.is_success() => println!("Files written."),
        Ok(Some(report)) => {
            eprintln!(
                "{} of {} files failed",
                report.failed(),
                report.outcomes.len()
            );
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<Option<RunReport>> {
    if args.list_schemas {
        for name in VARIANT_NAMES {
            let schema = Schema::builtin(name)?;
            let roles: Vec<&str> = schema.containers.iter().map(|c| c.role.as_str()).collect();
            println!("{name}: {}", roles.join(", "));
        }
        return Ok(None);
    }

    let schema = match &args.schema_file {
        Some(path) => Schema::from_json_file(path)?,
        None => Schema::builtin(&args.schema)?,
    };
    let resolver = NamingResolver::new(args.output_dir(), &schema);
    let mapper = SchemaMapper::new(&schema, &resolver).with_history(args.history);

    let input_dir = args.input_dir();
    let inputs = discover_inputs(&input_dir, &args.extension)?;
    if inputs.is_empty() {
        warn!(dir = %input_dir.display(), extension = %args.extension, "no input files found");
    }
    info!(files = inputs.len(), schema = %schema.name, "starting run");

    let parallel = match args.threads {
        0 => ParallelConfig::all_cores(),
        n => ParallelConfig::with_threads(n),
    };
    let report = pipeline::run(&mapper, &inputs, &parallel)?;

    for outcome in &report.outcomes {
        if let Err(e) = &outcome.result {
            eprintln!("Error: {e}");
        }
    }

    if args.summary {
        for path in report.written() {
            print_summary(&summarize_container(path)?);
        }
    }

    Ok(Some(report))
}
