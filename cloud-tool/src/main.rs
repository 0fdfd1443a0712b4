mod dump;
mod info;
mod io;
mod opts;
mod to_ecef;
mod to_local;
mod types;
mod utils;

use clap::Parser;
use console::style;
use eyre::Result;
use opts::Opts;
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = color_eyre::install() {
        eprintln!("{err:?}");
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();

    match run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{} {report:?}", style("error:").red().bold());
            ExitCode::from(exit_status(&report))
        }
    }
}

fn run(opts: Opts) -> Result<()> {
    match opts {
        Opts::Info(args) => {
            crate::info::info(args)?;
        }
        Opts::Dump(args) => {
            crate::dump::dump(args)?;
        }
        Opts::ToLocal(args) => {
            crate::to_local::to_local(args)?;
        }
        Opts::ToEcef(args) => {
            crate::to_ecef::to_ecef(args)?;
        }
    }

    Ok(())
}

/// 2 when an output already exists without `--force`, 1 otherwise.
fn exit_status(report: &eyre::Report) -> u8 {
    match report.downcast_ref::<cloud_geo::Error>() {
        Some(cloud_geo::Error::OutputExists(_)) => 2,
        _ => 1,
    }
}
