use std::process::ExitCode;

use clap::Parser;

use rasterpad::cli::{self, CliArgs};
use rasterpad::logger;
use rasterpad::settings::Settings;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Initialize session log (overwrites previous session log)
    logger::init(args.verbose);

    let settings = Settings::load();
    log::debug!("settings: {:?}", settings);

    cli::run(args, &settings)
}
