//! Operator interaction: confirmation and pacing prompts.

use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Core, testable implementation that reads from any BufRead and writes to
/// any Write, so tests can exercise it without a terminal.
///
/// Only an explicit "y" or "yes" counts as confirmation; anything else,
/// including an empty line, is a refusal.
pub(crate) fn confirm_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let response = line.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

/// Waits for the operator to press Enter. The input is discarded.
pub(crate) fn pause_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    write!(output, "{} ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}

#[cfg_attr(test, mockall::automock)]
pub trait Console: Send + Sync {
    /// Prompt for confirmation. Returns true only on an explicit y/yes.
    fn confirm(&self, prompt: &str) -> Result<bool>;

    /// Block until the operator acknowledges with Enter.
    fn pause(&self, prompt: &str) -> Result<()>;
}

/// [`Console`] wired to the process stdin/stdout.
pub struct Terminal;

impl Console for Terminal {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut stdin_lock = stdin.lock();
        confirm_with_io(prompt, &mut stdin_lock, &mut stdout)
    }

    fn pause(&self, prompt: &str) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut stdin_lock = stdin.lock();
        pause_with_io(prompt, &mut stdin_lock, &mut stdout)
    }
}
