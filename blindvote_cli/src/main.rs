use clap::{App, Arg, SubCommand};
use num_enum::TryFromPrimitive;

mod command_keygen;
mod command_run;
mod config;

use command_keygen::command_keygen;
use command_run::command_run;

#[derive(TryFromPrimitive, PartialEq, Copy, Clone, Debug)]
#[repr(u8)]
pub enum Verbosity {
    Silent = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl Verbosity {
    fn filter(self) -> &'static str {
        match self {
            Verbosity::Silent => "off",
            Verbosity::Error => "error",
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }
}

fn main() {
    let matches = App::new("blindvote")
        .version("0.1")
        .about("Runs an RSA blind-signature election")
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .global(true)
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .global(true)
                .help("Only print results"),
        )
        .subcommand(
            SubCommand::with_name("keygen")
                .about("Generate an election authority key")
                .arg(
                    Arg::with_name("bits")
                        .long("bits")
                        .takes_value(true)
                        .default_value("1024")
                        .help("Modulus size in bits"),
                ),
        )
        .subcommand(
            SubCommand::with_name("run")
                .about("Run an election: issue credentials, cast votes, apply revisions")
                .arg(
                    Arg::with_name("CONFIG")
                        .index(1)
                        .required(false)
                        .help("Election config in JSON - can also be set with BLINDVOTE_CONFIG"),
                )
                .arg(
                    Arg::with_name("vote")
                        .long("vote")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1)
                        .value_name("ID:CANDIDATE")
                        .help("Initial vote for a voter"),
                )
                .arg(
                    Arg::with_name("revise")
                        .long("revise")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1)
                        .value_name("ID:CANDIDATE")
                        .help("Revision, applied in order after all initial votes"),
                )
                .arg(
                    Arg::with_name("random")
                        .long("random")
                        .help("Every roster voter without a --vote picks a random candidate"),
                ),
        )
        .get_matches();

    // Global flags given after the subcommand only show up in its matches
    let sub = matches.subcommand().1;
    let quiet = matches.is_present("quiet") || sub.map_or(false, |m| m.is_present("quiet"));
    let count = matches
        .occurrences_of("v")
        .max(sub.map_or(0, |m| m.occurrences_of("v")));

    let verbosity = if quiet {
        Verbosity::Silent
    } else {
        let level = 2 + count.min(2) as u8;
        Verbosity::try_from_primitive(level).unwrap_or(Verbosity::Debug)
    };
    init_tracing(verbosity);

    let config = config::Config::from_env();

    // Subcommands
    if let Some(matches) = matches.subcommand_matches("keygen") {
        command_keygen(matches);
        std::process::exit(0);
    }
    if let Some(matches) = matches.subcommand_matches("run") {
        command_run(matches, &config);
        std::process::exit(0);
    }

    eprintln!("blindvote: no subcommand given, try --help");
    std::process::exit(1);
}

/// RUST_LOG wins over -v when both are given
fn init_tracing(verbosity: Verbosity) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand `~` and environment variables in a path
pub fn expand(input: &str) -> String {
    match shellexpand::full(input) {
        Ok(expanded) => expanded.into_owned(),
        Err(_) => input.to_owned(),
    }
}
