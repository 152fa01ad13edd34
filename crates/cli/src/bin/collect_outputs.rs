use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use glxy_cli::init_tracing;
use glxy_engine::{DEFAULT_API_KEY_FILE, DEFAULT_GALAXY_URL, HttpGalaxyApi, OutputRequest, collect_outputs, resolve_output_api_key};
use glxy_util::expand_tilde;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();

    let api_key = resolve_output_api_key(&PathBuf::from(required(&matches, "api_key")?))?;
    let api = HttpGalaxyApi::connect(required(&matches, "url")?, &api_key)?;
    let request = OutputRequest {
        proj_dir: matches
            .get_one::<PathBuf>("proj_dir")
            .cloned()
            .context("missing --proj_dir")?,
        patient: required(&matches, "patient")?.to_string(),
        workflow: required(&matches, "workflow")?.to_string(),
        history_name: required(&matches, "history_name")?.to_string(),
    };

    let collected = collect_outputs(&api, &request).await?;
    info!(
        "Downloaded {} datasets to {}",
        collected.downloaded.len(),
        collected.directory.display()
    );
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing --{name}"))
}

fn build_cli() -> Command {
    Command::new("glxy_collect_outputs")
        .about("Download the finished datasets of a Galaxy history into a project directory")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("proj_dir")
                .long("proj_dir")
                .required(true)
                .value_parser(|raw: &str| Ok::<PathBuf, String>(expand_tilde(raw)))
                .help("Project directory to process"),
        )
        .arg(
            Arg::new("api_key")
                .long("api_key")
                .default_value(DEFAULT_API_KEY_FILE)
                .help("API key file, relative to the home directory"),
        )
        .arg(Arg::new("patient").long("patient").required(true))
        .arg(Arg::new("workflow").long("workflow").required(true))
        .arg(Arg::new("history_name").long("history_name").required(true))
        .arg(
            Arg::new("url")
                .long("url")
                .default_value(DEFAULT_GALAXY_URL)
                .help("Galaxy server URL"),
        )
}
