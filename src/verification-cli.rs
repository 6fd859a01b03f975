//! A simple CLI tool for verifying vote receipts.
//! Recomputes each claimed vote hash from the claimed vote, so it needs
//! neither the database nor the sealing key.

use std::fs::File;
use std::io::BufReader;

use clap::{Arg, ArgAction, ArgMatches, Command};
use rocket::serde::json::serde_json;

use votecast_backend::model::api::receipt::VoteClaim;

const PROGRAM_NAME: &str = "verify-votes";

const ABOUT_TEXT: &str = "Verify that vote receipts match the votes they claim.

EXIT CODES:
     0: Verification succeeded.
   255: Ran successfully, but verification failed.
 Other: Error.";

const CLAIMS_PATH: &str = "CLAIMS_PATH";

const CLAIMS_PATH_HELP: &str = "The path to a JSON array of vote claims, each of the form\n\
{ election_id, candidate_id, voter_id, cast_at (epoch millis), vote_hash }";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME).about(ABOUT_TEXT).arg(
        Arg::new(CLAIMS_PATH)
            .help(CLAIMS_PATH_HELP)
            .action(ArgAction::Set)
            .required(true),
    )
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode the JSON dump.
    Format(String),
    /// These claims (by position in the file) do not match their hashes.
    Verification(Vec<usize>),
}

/// Run verification, returning the number of claims checked.
fn verify(path: &str) -> Result<usize, Error> {
    let file = BufReader::new(File::open(path).map_err(|e| Error::IO(e.to_string()))?);
    let claims: Vec<VoteClaim> =
        serde_json::from_reader(file).map_err(|e| Error::Format(e.to_string()))?;

    let failed: Vec<usize> = claims
        .iter()
        .enumerate()
        .filter(|(_, claim)| !claim.verify())
        .map(|(index, _)| index)
        .collect();

    if failed.is_empty() {
        Ok(claims.len())
    } else {
        Err(Error::Verification(failed))
    }
}

/// Run verification, report the result, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let Some(path) = args.get_one::<String>(CLAIMS_PATH) else {
        println!("No claims file given");
        return 1;
    };
    match verify(path) {
        Ok(count) => {
            println!(
                "Verification succeeded: {count} vote{} match their hashes.",
                if count != 1 { "s" } else { "" }
            );
            0
        }
        Err(Error::IO(msg)) => {
            println!("IO error: {msg}");
            1
        }
        Err(Error::Format(msg)) => {
            println!("Invalid JSON: {msg}");
            1
        }
        Err(Error::Verification(failed)) => {
            for index in failed {
                println!("Claim {index} does not match its vote hash.");
            }
            println!("Verification failed.");
            255
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}
