//! Check values against a threshold.
//!
//! Usage: `thresh-check <threshold> <values...>`

use clap::Parser;
use std::process;
use tracing::{debug, error};
use vxconfig::SingleThresh;

#[derive(Parser, Debug)]
#[command(name = "thresh-check")]
#[command(about = "Parse a threshold and check each value against it")]
struct Args {
    /// Threshold text, e.g. ">=30&&<45" or "ge30&&le45"
    threshold: String,

    /// Values to check
    #[arg(required = true, allow_negative_numbers = true)]
    values: Vec<f64>,
}

fn main() {
    vxconfig_tools::init_logging();

    let args = Args::parse();

    let thresh: SingleThresh = match args.threshold.parse() {
        Ok(t) => t,
        Err(err) => {
            error!("{err}");
            process::exit(1);
        }
    };
    debug!(
        "Parsed \"{}\" as {} (abbreviated {})",
        args.threshold,
        thresh.get_str(),
        thresh.get_abbr_str()
    );

    for value in &args.values {
        match thresh.check(*value) {
            Ok(pass) => println!("{value}: {pass}"),
            Err(err) => {
                error!("{err}");
                process::exit(1);
            }
        }
    }
}
