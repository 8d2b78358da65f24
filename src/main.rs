use clap::Parser;
use formfill::cli::Cli;
use formfill::config::{BackfillSettings, load_config, resolve_db_path};
use formfill::populate::handle_populate;
use formfill::FormfillError;
use std::process::ExitCode;

fn run() -> Result<(), FormfillError> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let db_path = resolve_db_path(cli.db, &config);
    let settings = BackfillSettings::from(&config.backfill);

    let db = db_path.display().to_string();
    log::info!(db = db.as_str(); "populating form_json");
    handle_populate(&db_path, &settings, &cli.populate)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("FORMFILL_LOG", "warn"))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Commit failures were already logged by the runner.
            if !matches!(e, FormfillError::Commit(_)) {
                let error = e.to_string();
                log::error!(error = error.as_str(); "Form JSON population failed.");
            }
            eprintln!("formfill: {e}");
            ExitCode::from(1)
        }
    }
}
