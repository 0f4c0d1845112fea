
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use env_logger::Env;

use formality_core::kernel::infer;
use formality_core::lang::parser;

/// Check every definition of a module against its declared type.
#[derive(Debug, Parser)]
#[command(name = "fmc", version)]
struct Opt {
    /// Source file to check
    file: PathBuf,

    /// Suppress the success marker
    #[arg(long)]
    quiet: bool,
}

fn run(opt: &Opt) -> Result<usize> {
    let text = std::fs::read_to_string(&opt.file)
        .with_context(|| format!("reading {}", opt.file.display()))?;
    let module = parser::parse_module(&text)
        .with_context(|| format!("parsing {}", opt.file.display()))?;
    log::info!("{} {} ({} definitions)", "checking".dimmed(), opt.file.display(), module.len());

    let failures = infer::check_all(&module);
    for (name, error) in failures.iter() {
        println!("{} {}", "Checking:".red(), name);
        println!("{}", error);
    }
    if failures.is_empty() && !opt.quiet {
        println!("{}", format!("All {} definitions check.", module.len()).green());
    }
    Ok(failures.len())
}

fn main() -> ExitCode {
    // Allow e.g. `LOG=trace fmc test.fm` to expose reduction and
    // conversion traces.
    env_logger::Builder::from_env(Env::default().filter_or("LOG", "warn")).init();

    let opt = Opt::parse();
    match run(&opt) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("{:?}", error);
            ExitCode::FAILURE
        }
    }
}
