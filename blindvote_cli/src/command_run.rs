use crate::config::Config;
use blindvote::*;
use rand::seq::SliceRandom;
use rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

pub fn command_run(matches: &clap::ArgMatches, config: &Config) {
    let election_config = load_config(matches, config);

    let votes = parse_choices(matches, "vote");
    let revisions = parse_choices(matches, "revise");

    let mut rng = rand::thread_rng();
    let election = Election::new(election_config, &mut rng).unwrap_or_else(|e| {
        eprintln!("blindvote run: unable to set up election: {}", e);
        std::process::exit(1);
    });

    // Initial votes: explicit choices first, then random ones for the rest of the roster
    let mut initial: Vec<(VoterId, CandidateId)> = votes;
    if matches.is_present("random") {
        for id in election.config().voters.clone() {
            if initial.iter().any(|(voter, _)| *voter == id) {
                continue;
            }
            // Candidates are never empty in a validated config
            if let Some(candidate) = election.config().candidates.choose(&mut rng) {
                initial.push((id, *candidate));
            }
        }
    }

    run_votes(&election, initial, revisions, &mut rng);

    let results = election.results();
    match serde_json::to_string_pretty(&results) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("blindvote run: unable to serialize results: {}", e);
            std::process::exit(1);
        }
    }
}

/// Enroll and issue for every initial choice, cast them, then apply revisions in order.
///
/// A voter refused a credential keeps its agent: its revisions are still sent
/// and the ballot box turns them away. Ids that never enrolled are skipped.
fn run_votes<R: RngCore + CryptoRng>(
    election: &Election,
    initial: Vec<(VoterId, CandidateId)>,
    revisions: Vec<(VoterId, CandidateId)>,
    rng: &mut R,
) {
    let mut agents: BTreeMap<VoterId, VoterAgent> = BTreeMap::new();
    for (id, candidate) in initial {
        if agents.contains_key(&id) {
            warn!(voter = id, "voter already has an agent, ignoring extra --vote");
            continue;
        }

        let mut voter = match election.enroll(id, rng) {
            Ok(voter) => voter,
            Err(e) => {
                warn!(voter = id, error = %e, "enrollment failed");
                continue;
            }
        };

        match election.issue(&mut voter) {
            Ok(()) => match election.cast(&voter, candidate, CastMode::Initial, rng) {
                Ok(outcome) => info!(voter = id, ?outcome, "ballot accepted"),
                Err(e) => warn!(voter = id, error = %e, "ballot rejected"),
            },
            Err(e) => warn!(voter = id, error = %e, "credential refused"),
        }
        agents.insert(id, voter);
    }

    for (id, candidate) in revisions {
        let voter = match agents.get(&id) {
            Some(voter) => voter,
            None => {
                warn!(voter = id, "voter never enrolled, skipping revision");
                continue;
            }
        };
        match election.cast(voter, candidate, CastMode::Revision, rng) {
            Ok(outcome) => info!(voter = id, ?outcome, "revision accepted"),
            Err(e) => warn!(voter = id, error = %e, "revision rejected"),
        }
    }
}

fn load_config(matches: &clap::ArgMatches, config: &Config) -> ElectionConfig {
    let explicit = matches.value_of("CONFIG").map(crate::expand);
    let path = explicit.clone().unwrap_or_else(|| config.config_path.clone());

    // Without any config file, run the built-in default election
    if explicit.is_none() && !Path::new(&path).exists() {
        info!(path = %path, "no election config found, using defaults");
        return ElectionConfig::default();
    }

    ElectionConfig::from_file(&path).unwrap_or_else(|e| {
        eprintln!("blindvote run: unable to read {}: {}", path, e);
        std::process::exit(1);
    })
}

fn parse_choices(matches: &clap::ArgMatches, name: &str) -> Vec<(VoterId, CandidateId)> {
    let values = match matches.values_of(name) {
        Some(values) => values,
        None => return vec![],
    };

    values
        .map(|value| {
            parse_choice(value).unwrap_or_else(|| {
                eprintln!(
                    "blindvote run: invalid --{} {}, expected ID:CANDIDATE",
                    name, value
                );
                std::process::exit(1);
            })
        })
        .collect()
}

fn parse_choice(value: &str) -> Option<(VoterId, CandidateId)> {
    let mut parts = value.splitn(2, ':');
    let id = parts.next()?.trim().parse().ok()?;
    let candidate = parts.next()?.trim().parse().ok()?;
    Some((id, candidate))
}
