use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use glxy_api::{API_KEY_ENV, discover_api_key};
use glxy_cli::init_tracing;
use glxy_engine::{CONFIG_TEMPLATE, GalaxyError, HttpGalaxyApi, collect_inputs_from_file, make_path};
use glxy_util::expand_tilde;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let mut cli = build_cli();
    let matches = cli.clone().get_matches();

    match matches.subcommand() {
        Some(("collect_inputs", sub)) => run_collect_inputs(sub).await,
        Some(("collect_inputs_config", _)) => {
            print!("{CONFIG_TEMPLATE}");
            Ok(())
        }
        Some(("make_path", sub)) => run_make_path(sub).await,
        _ => {
            cli.print_help()?;
            std::process::exit(1);
        }
    }
}

fn build_cli() -> Command {
    Command::new("glxy_wf")
        .about("Galaxy workflow automation")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(
            Command::new("collect_inputs")
                .about("Upload sample files and invoke the configured workflow")
                .arg(
                    Arg::new("config")
                        .required(true)
                        .value_parser(|raw: &str| Ok::<PathBuf, String>(expand_tilde(raw)))
                        .help("Config file describing where to find input files"),
                ),
        )
        .subcommand(Command::new("collect_inputs_config").about("Print the config template for collect_inputs"))
        .subcommand(
            Command::new("make_path")
                .about("Create a library and folders in Galaxy, like mkdir -p")
                .arg(Arg::new("url").required(true).help("Galaxy server URL"))
                .arg(Arg::new("path").required(true).help("Library path, e.g. \"library/folder/subfolder\"")),
        )
}

async fn run_collect_inputs(matches: &ArgMatches) -> Result<()> {
    let config = matches
        .get_one::<PathBuf>("config")
        .context("missing config path")?;
    let response = collect_inputs_from_file(config).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn run_make_path(matches: &ArgMatches) -> Result<()> {
    let url = matches.get_one::<String>("url").context("missing url")?;
    let path = matches.get_one::<String>("path").context("missing path")?;
    let api_key = discover_api_key().ok_or_else(|| GalaxyError::MissingCredential {
        variable: API_KEY_ENV.to_string(),
    })?;
    let api = HttpGalaxyApi::connect(url, &api_key)?;
    make_path(&api, path).await?;
    Ok(())
}
