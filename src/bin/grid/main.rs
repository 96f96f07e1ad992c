//! grid: command-line client for the GRiD AOI API.

mod args;
mod handlers;
mod print;

use std::io::IsTerminal;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use gridapi::{Client, CredentialSource, GridError, load_config};
use tracing_subscriber::EnvFilter;

use args::{Cli, Commands};
use handlers::{aoi, configure, export};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("GRID_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("warn,gridapi=info,grid=info"),
        _ => EnvFilter::new("warn,gridapi=debug,grid=debug"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Version => {
            println!("grid {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Configure { base_url, key } => {
            configure::handle(base_url.clone(), key.clone())
        }
        Commands::Add { geoms } => aoi::add(&client(&cli, false)?, geoms),
        Commands::Lookup { geoms } => aoi::lookup(&client(&cli, false)?, geoms),
        Commands::Ls { pks, pk, geom } => {
            aoi::ls(&client(&cli, false)?, pks, pk, geom.as_deref())
        }
        Commands::Export(args) => export::export(&client(&cli, false)?, args),
        Commands::Pull {
            pks,
            dir,
            no_progress,
        } => {
            let progress = !no_progress && std::io::stderr().is_terminal();
            export::pull(&client(&cli, progress)?, pks, dir)
        }
        Commands::Task { ids } => export::task(&client(&cli, false)?, ids),
    }
}

fn client(cli: &Cli, progress: bool) -> anyhow::Result<Client> {
    let source = CredentialSource::from_env()?;
    ensure_configured(&source)?;

    let verify = cli.insecure.then_some(false);
    let config = load_config(cli.url.clone(), verify, source)?
        .with_timeout(Duration::from_secs(cli.timeout));
    Ok(Client::new(config)?.with_progress(progress))
}

/// A missing credentials file starts the interactive configure flow when a
/// person is at the terminal.
fn ensure_configured(source: &CredentialSource) -> anyhow::Result<()> {
    match source.get() {
        Ok(_) => Ok(()),
        Err(GridError::Config(_))
            if std::io::stdin().is_terminal()
                && source.path().is_some_and(|p| !p.exists()) =>
        {
            if let Some(path) = source.path() {
                eprintln!("No GRiD credentials found at {}.", path.display());
                configure::logon(path)?;
            }
            source.get()?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
