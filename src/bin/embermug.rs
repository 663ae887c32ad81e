use std::process::ExitCode;
use clap::Parser;
use log::info;
use embermug::cli::Cli;
use embermug::{init_logging, run};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.log_level()) {
        eprintln!("error: {}", err);
        return ExitCode::FAILURE;
    }
    info!(concat!("embermug ", env!("CARGO_PKG_VERSION")));

    match run(cli) {
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        },
        Ok(_) => ExitCode::SUCCESS,
    }
}
