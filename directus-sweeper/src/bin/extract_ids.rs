//! Extract record ids from SQL or log output for use with `--ids`.
//!
//! Usage:
//!   extract-ids sql-output.txt
//!   extract-ids < sql-output.txt

use directus_sweeper::extract;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

fn read_input(path: Option<PathBuf>) -> std::io::Result<Option<String>> {
    if let Some(path) = path {
        return std::fs::read_to_string(path).map(Some);
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut input = String::new();
    stdin.read_to_string(&mut input)?;
    Ok(Some(input))
}

fn main() -> ExitCode {
    let path = std::env::args_os().nth(1).map(PathBuf::from);

    let input = match read_input(path) {
        Ok(Some(input)) => input,
        Ok(None) => {
            eprintln!("Usage:");
            eprintln!("  extract-ids < sql-output.txt");
            eprintln!("  extract-ids sql-output.txt");
            eprintln!("  cat sql-output.txt | extract-ids");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error reading input: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let ids = extract::extract_ids(&input);
    print!("{}", extract::render(&ids));
    ExitCode::SUCCESS
}
