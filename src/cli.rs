use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "formfill",
    version,
    about = "Populate form_json for every form that does not have one yet"
)]
pub struct Cli {
    /// Database path
    #[arg(long, env = "FORMFILL_DB")]
    pub db: Option<PathBuf>,

    /// Config file (default: ~/.formfill/config.toml)
    #[arg(long, env = "FORMFILL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub populate: PopulateArgs,
}

#[derive(Parser, Debug, Default, Clone)]
pub struct PopulateArgs {
    /// Dry run: build everything, report counts, roll back instead of committing
    #[arg(long)]
    pub dry_run: bool,
}
