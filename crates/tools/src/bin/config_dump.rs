//! Load configuration files and print the merged dictionary.
//!
//! Usage: `config-dump <files...> [--json] [--debug]`

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use vxconfig::Config;

#[derive(Parser, Debug)]
#[command(name = "config-dump")]
#[command(about = "Load vx config files in order and print the merged result")]
struct Args {
    /// Config files; later files override earlier ones
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print as JSON instead of config syntax
    #[arg(long, conflicts_with = "debug")]
    json: bool,

    /// Print the typed entry tree
    #[arg(long)]
    debug: bool,
}

fn run(args: &Args) -> anyhow::Result<String> {
    let mut config = Config::new().with_output(std::io::stderr());
    for file in &args.files {
        config
            .read(file)
            .with_context(|| format!("failed to load {}", file.display()))?;
    }
    info!("Loaded {} file(s), {} entries", args.files.len(), config.dictionary().len());

    let dict = config.dictionary();
    if args.json {
        return Ok(serde_json::to_string_pretty(dict)?);
    }
    if args.debug {
        return Ok(dict.dump());
    }
    Ok(dict.dump_config_format())
}

fn main() {
    vxconfig_tools::init_logging();

    let args = Args::parse();

    match run(&args) {
        Ok(text) => {
            print!("{text}");
            if args.json {
                println!();
            }
        }
        Err(err) => {
            error!("{err:#}");
            process::exit(1);
        }
    }
}
