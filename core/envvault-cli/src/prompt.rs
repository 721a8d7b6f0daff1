//! Interactive prompts: hidden password entry and yes/no confirmations.

use crate::error::CliError;
use std::io::{self, BufRead, Write};

pub fn password(prompt: &str) -> Result<String, CliError> {
    rpassword::prompt_password(prompt).map_err(CliError::Io)
}

/// Prompts for a new password twice and requires the entries to match.
pub fn new_password() -> Result<String, CliError> {
    let first = password("New password: ")?;
    let second = password("Repeat password: ")?;
    if first != second {
        return Err(CliError::Input("passwords do not match".to_string()));
    }
    Ok(first)
}

/// Asks a yes/no question; anything but y/yes declines.
pub fn confirm(question: &str) -> Result<bool, CliError> {
    print!("{question} [y/N] ");
    io::stdout().flush().map_err(CliError::Io)?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer).map_err(CliError::Io)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
