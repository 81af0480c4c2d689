use clap::Parser;
use dirsort::cli::{Cli, init_tracing, log_critical, run_cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run_cli(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log_critical(&cli, &e);
            ExitCode::from(e.exit_code())
        }
    }
}
