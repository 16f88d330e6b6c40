use anyhow::{Error, Result};
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use log::error;
use relget::{ErrorKind, Relget, RelgetBuilder, RelgetError};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("{0:}")]
    InvalidArgsError(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cmd = cmd();
    let matches = cmd.get_matches();
    let res = init_logger_from_matches(&matches);
    if let Err(e) = res {
        eprintln!("Error creating logger: {e}");
        std::process::exit(126);
    }

    let status = match make_relget(&matches) {
        Ok(r) => match r.run().await {
            Ok(_) => 0,
            Err(e) => {
                print_err(&e);
                exit_status(&e)
            }
        },
        Err(e) => {
            print_err(&e);
            exit_status(&e)
        }
    };
    std::process::exit(status);
}

const MAX_TERM_WIDTH: usize = 100;

fn cmd() -> Command {
    Command::new("relget")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Download the assets of a repository's latest release")
        .arg(Arg::new("repo").long("repo").short('r').help(concat!(
            "The repo to pull the latest release from, like houseabsolute/precious",
            " or https://github.com/houseabsolute/precious.",
        )))
        .arg(
            Arg::new("regex")
                .long("regex")
                .short('x')
                .default_value(".*")
                .help(concat!(
                    "Only download assets with a name that matches this regex. The regex can",
                    " match anywhere in the name, so use `^` and `$` to anchor it. Defaults to",
                    " all assets.",
                )),
        )
        .arg(
            Arg::new("download-to")
                .long("download-to")
                .short('d')
                .help(concat!(
                    "The directory to download the assets to. It must already exist. Files that",
                    " already exist with the same name as an asset are overwritten. Defaults to",
                    " the current directory.",
                )),
        )
        .arg(
            Arg::new("include-draft")
                .long("include-draft")
                .action(ArgAction::SetTrue)
                .help(concat!(
                    "Include draft releases. This is accepted but currently has no effect, since",
                    " the latest release is never a draft.",
                )),
        )
        .arg(Arg::new("api-base-url").long("api-base-url").help(concat!(
            "The base URL for the release API. This is useful for testing or if you want",
            " to operate against an Enterprise version of GitHub. This should be something like",
            " `https://github.my-corp.example.com/api/v3`.",
        )))
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debugging output."),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppresses all output except errors."),
        )
        .group(ArgGroup::new("log-level").args(["verbose", "quiet"]))
        .max_term_width(MAX_TERM_WIDTH)
}

pub(crate) fn init_logger_from_matches(matches: &ArgMatches) -> Result<(), log::SetLoggerError> {
    let level = if matches.get_flag("verbose") {
        log::LevelFilter::Debug
    } else if matches.get_flag("quiet") {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Info
    };

    relget::init_logger(level)
}

fn make_relget(matches: &ArgMatches) -> Result<Relget> {
    validate_args(matches)?;

    let mut builder = RelgetBuilder::new();
    if let Some(r) = matches.get_one::<String>("repo") {
        builder = builder.repo(r);
    }
    if let Some(x) = matches.get_one::<String>("regex") {
        builder = builder.matching(x);
    }
    if let Some(dir) = matches.get_one::<String>("download-to") {
        builder = builder.download_to(dir);
    }
    if matches.get_flag("include-draft") {
        builder = builder.include_draft(true);
    }
    if let Some(url) = matches.get_one::<String>("api-base-url") {
        builder = builder.api_base_url(url);
    }

    builder.build()
}

fn validate_args(matches: &ArgMatches) -> Result<()> {
    let repo = matches.get_one::<String>("repo");
    if repo.is_none_or(String::is_empty) {
        return Err(CliError::InvalidArgsError("You must pass a --repo.".to_string()).into());
    }

    Ok(())
}

// Errors found before anything was fetched exit with 127, while errors from fetching or
// downloading exit with 1.
fn exit_status(e: &Error) -> i32 {
    if e.downcast_ref::<CliError>().is_some() {
        return 127;
    }
    match e.downcast_ref::<RelgetError>().map(RelgetError::kind) {
        Some(ErrorKind::Configuration | ErrorKind::Pattern) => 127,
        Some(ErrorKind::Fetch | ErrorKind::Download) | None => 1,
    }
}

fn print_err(e: &Error) {
    error!("{e}");
    if let Some(ce) = e.downcast_ref::<CliError>() {
        match ce {
            CliError::InvalidArgsError(_) => {
                println!();
                if let Err(e) = cmd().print_help() {
                    eprintln!("Error printing help: {e}");
                }
            }
        }
    }
}
