//! Interactive input on stdin. Prompts go to stderr so stdout stays
//! clean for piping.

use std::io::{self, BufRead, Read, Write};

use anyhow::{bail, Context};

/// Read one trimmed line after printing `label`.
pub fn line(label: &str) -> anyhow::Result<String> {
    eprint!("{label}: ");
    io::stderr().flush().ok();
    let mut input = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut input)
        .context("reading from stdin")?;
    if read == 0 {
        bail!("no input for {label}");
    }
    Ok(input.trim().to_string())
}

/// `given` if present, otherwise ask.
pub fn or_ask(given: Option<String>, label: &str) -> anyhow::Result<String> {
    match given {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => line(label),
    }
}

/// A password given on the command line is used verbatim.
///
/// The terminal still echoes typed input; pass `--password` or pipe the
/// value in when that matters.
pub fn secret(given: Option<String>, label: &str) -> anyhow::Result<String> {
    match given {
        Some(value) => Ok(value),
        None => line(label),
    }
}

/// Yes/no confirmation; anything but `y`/`yes` declines.
pub fn confirm(question: &str) -> anyhow::Result<bool> {
    let answer = line(&format!("{question} [y/N]"))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Everything on stdin, for long dream text.
pub fn all_stdin() -> anyhow::Result<String> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("reading dream text from stdin")?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_answers() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("nope"));
    }

    #[test]
    fn given_value_skips_prompt() {
        assert_eq!(or_ask(Some(" ada ".into()), "Name").unwrap(), "ada");
        assert_eq!(secret(Some(" pw ".into()), "Password").unwrap(), " pw ");
    }
}
