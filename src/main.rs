use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use dockerbox::commands;
use dockerbox::output::Output;
use dockerbox::session::Session;
use dockerbox::{Cli, Commands, DockerboxError};

/// Executable name that selects the management CLI.
const SELF_NAME: &str = "dockerbox";

/// Applet selected by the executable's basename, if it is not dockerbox.
fn applet_name(argv0: &str) -> Option<String> {
    let name = Path::new(argv0).file_name()?.to_str()?;
    (name != SELF_NAME).then(|| name.to_string())
}

fn dispatch(cli: Cli, argv: &[String]) -> Result<()> {
    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Schema(args) => commands::schema::run(args),
        Commands::Completions(args) => commands::completions::run(args),
        Commands::List(args) => commands::list::run(args, &Session::from_env()?),
        Commands::Install(args) => commands::install::install(args, &Session::from_env()?),
        Commands::Uninstall(args) => commands::install::uninstall(args, &Session::from_env()?),
        Commands::Registry(args) => commands::registry::run(args, &Session::from_env()?.settings),
        Commands::Update => commands::update::run(&Session::from_env()?.settings),
        Commands::Debug => commands::debug::run(&Session::from_env()?),
        Commands::Plan(args) => {
            commands::run::plan(&args.applet, &args.raw_args(argv), &Session::from_env()?)
        }
        Commands::Run(args) => {
            commands::run::run(&args.applet, &args.raw_args(argv), &Session::from_env()?)
        }
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let argv0 = args.first().map(String::as_str).unwrap_or(SELF_NAME);

    match applet_name(argv0) {
        Some(applet) => {
            let session = Session::from_env()?;
            commands::run::run(&applet, &args[1..], &session)
        }
        None => dispatch(Cli::parse_from(&args), &args),
    }
}

/// Report `err` and pick the process exit code.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
        let _ = clap_err.print();
        return clap_err.exit_code();
    }
    if let Some(code) = err.downcast_ref::<DockerboxError>().and_then(DockerboxError::exit_code) {
        // The child has already reported its own failure.
        tracing::debug!(error = %err, code, "command failed");
        return code;
    }
    Output::error(format!("{err:#}"));
    1
}

fn main() {
    // Logs go to stderr so applet stdout stays clean, e.g. RUST_LOG=dockerbox=debug
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let code = match run() {
        Ok(()) => 0,
        Err(err) => exit_code(&err),
    };
    std::process::exit(code);
}
