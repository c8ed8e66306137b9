//! `menuhub-generate <name> [config.toml]`: writes the next migration
//! script from drift between the store and the schema model.

use std::process::ExitCode;

use menuhub_migrate::{config, generate, init_tracing};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let Some(name) = args.next() else {
        eprintln!("usage: menuhub-generate <name> [config.toml]");
        return ExitCode::FAILURE;
    };
    let config_path = args
        .next()
        .or_else(|| std::env::var("MENUHUB_CONFIG_PATH").ok())
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| "config.toml".to_string());

    let loaded = match config::load_config(Some(&config_path)) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    let config = loaded.config;
    init_tracing(&config.logging);
    if !loaded.file_found {
        tracing::info!(path = %config_path, "config file not found, using defaults");
    }

    match generate(&config, &name) {
        Ok(Some(path)) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "generation failed");
            ExitCode::FAILURE
        }
    }
}
