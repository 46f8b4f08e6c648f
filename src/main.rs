use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod build;
mod commands;
mod config;

/// Build and serve a template-driven static site
#[derive(Parser)]
#[command(version)]
struct Args {
    /// The project root directory
    #[arg(value_name = "ROOT")]
    root: Option<PathBuf>,

    /// The project root directory (takes precedence over ROOT)
    #[arg(long = "root", value_name = "DIR")]
    root_flag: Option<PathBuf>,

    /// The port to serve on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// The address to bind to
    #[arg(short, long, default_value = "localhost")]
    bind: String,

    /// Do not rebuild when source files change
    #[arg(long)]
    no_watch: bool,

    /// Build the site once and exit without serving
    #[arg(long)]
    build: bool,

    /// Open the site in the default browser
    #[arg(short, long)]
    open: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn root_dir(&self) -> PathBuf {
        self.root_flag
            .clone()
            .or_else(|| self.root.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // No arguments at all: show usage instead of serving the current directory
    if std::env::args_os().len() <= 1 {
        Args::command().print_help()?;
        return Ok(());
    }

    let args = Args::parse();
    init_tracing(args.verbose);

    if args.build {
        commands::build::run(&args)?;
    } else {
        commands::serve::run(&args).await?;
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["ditto", "site"]).unwrap();
        assert_eq!(args.root_dir(), PathBuf::from("site"));
        assert_eq!(args.port, 8080);
        assert_eq!(args.bind, "localhost");
        assert!(!args.no_watch && !args.build && !args.open && !args.verbose);
    }

    #[test]
    fn test_root_flag_wins_over_positional() {
        let args = Args::try_parse_from(["ditto", "site", "--root", "other", "-p", "3000"]).unwrap();
        assert_eq!(args.root_dir(), PathBuf::from("other"));
        assert_eq!(args.port, 3000);
    }

    #[test]
    fn test_root_defaults_to_current_dir() {
        let args = Args::try_parse_from(["ditto", "--no-watch"]).unwrap();
        assert_eq!(args.root_dir(), PathBuf::from("."));
        assert!(args.no_watch);
    }

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }
}
