use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use carevox::{notifier_from_config, App, Cli, Config, Result, Session};

pub fn initialize_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;

    if let Some(path) = cli.appointments_file {
        config.appointments_file = path;
    }
    if cli.quiet {
        config.speech_enabled = false;
    }

    let notifier = notifier_from_config(&config);
    let session = Session::open(&config, notifier)?;

    let app = App::new(session, config, config_path, cli.verbose);
    app.run(cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    info!("Application starting up");

    match run(cli).await {
        Ok(()) => {
            info!("Application shutting down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{} {}", console::style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
