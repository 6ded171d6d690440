use std::path::PathBuf;

use pippup::app::{Mode, RunOptions};
use tracing_subscriber::EnvFilter;

const HELP: &str = "pippup - Step through the media posted to a subreddit.

  --subreddit, -s <name>   Subreddit to browse (default: gifs)
  --config <path>          Read configuration from <path>
  --list                   Print every item of the first page and exit
  --json                   With --list, print the items as JSON
  --offline                Use the built-in sample feed instead of Reddit
  --version, -V            Show version and exit
  --help,    -h            Show this help message

Set PIPPUP_LOG (e.g. PIPPUP_LOG=debug) to see pipeline decisions on stderr.";

fn main() {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => return,
        Err(message) => {
            eprintln!("error: {message}\n\n{HELP}");
            std::process::exit(2);
        }
    };

    init_tracing();

    if let Err(err) = pippup::run(options) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PIPPUP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<RunOptions>, String> {
    let mut options = RunOptions::default();
    let mut list = false;
    let mut json = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("pippup {}", pippup::VERSION);
                return Ok(None);
            }
            "--help" | "-h" => {
                println!("{HELP}");
                return Ok(None);
            }
            "--subreddit" | "-s" => {
                let name = args.next().ok_or("--subreddit requires a name")?;
                options.subreddit = Some(name);
            }
            "--config" => {
                let path = args.next().ok_or("--config requires a path")?;
                options.config_file = Some(PathBuf::from(path));
            }
            "--list" => list = true,
            "--json" => json = true,
            "--offline" => options.offline = true,
            other => return Err(format!("unknown argument {other:?}")),
        }
    }

    if json && !list {
        return Err("--json only applies to --list".into());
    }
    if list {
        options.mode = Mode::List { json };
    }
    Ok(Some(options))
}
