use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;
use log::{error, info};
use tapete_brush::{init_logging, run, RunOptions};
use tapete_brush::error::{error_msgbox, fatal_report};

#[derive(Parser, Debug)]
#[command(author, version)]
#[command(about = "Paints on a virtual canvas with a bluetooth gamepad.\n\nWithout arguments the configured (or default) gamepad and canvas are used.", long_about = None)]
struct Args {
    /// Read the configuration from this file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bluetooth address of the gamepad, e.g. E0:E2:E6:63:23:96
    #[arg(long)]
    address: Option<String>,
}

// reports a failure itself, returning Err from main would print it a second time
fn main() -> ExitCode {
    let args = Args::parse();

    init_logging();
    info!(concat!("Tapete Brush ", env!("CARGO_PKG_VERSION")));

    let options = RunOptions {
        config_path: args.config,
        address: args.address,
    };

    match run(options) {
        Err(err) => {
            let report = fatal_report(&err);
            error!("{}", report);
            error_msgbox(&report);
            ExitCode::FAILURE
        },
        Ok(_) => ExitCode::SUCCESS,
    }
}
