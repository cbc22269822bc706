use std::io::{self, BufRead, Write};
use tracing::warn;

/// Answers yes/no questions before anything destructive happens.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Says yes to everything (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Asks on stdout and reads one line from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        match prompt_confirm(prompt, &mut input, &mut output) {
            Ok(answer) => answer,
            Err(err) => {
                warn!("Could not read confirmation: {}", err);
                false
            }
        }
    }
}

/// Only `y`/`Y` confirms. Empty input, EOF and anything else decline.
pub fn prompt_confirm<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    write!(output, "{} [Y/n]: ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }

    Ok(line.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(text: &str) -> bool {
        let mut output = Vec::new();
        prompt_confirm("Proceed?", &mut Cursor::new(text), &mut output).unwrap()
    }

    #[test]
    fn test_only_y_is_affirmative() {
        assert!(answer("y\n"));
        assert!(answer("Y\n"));
        assert!(answer("  y  \n"));
        assert!(!answer("n\n"));
        assert!(!answer("yes\n"));
        assert!(!answer("\n"));
    }

    #[test]
    fn test_eof_declines() {
        assert!(!answer(""));
    }

    #[test]
    fn test_prompt_is_written() {
        let mut output = Vec::new();
        prompt_confirm("Delete originals?", &mut Cursor::new("n\n"), &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "Delete originals? [Y/n]: ");
    }

    #[test]
    fn test_closures_are_confirm_providers() {
        let mut asked = Vec::new();
        let mut provider = |prompt: &str| {
            asked.push(prompt.to_string());
            false
        };
        assert!(!provider.confirm("first"));
        assert!(AssumeYes.confirm("second"));
        assert_eq!(asked, vec!["first"]);
    }
}
