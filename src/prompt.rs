use std::io::{BufRead, Write};

use anyhow::Context as _;

use crate::foundation::error::{StitchkitError, StitchkitResult};

/// How the stitcher's batch size is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchChoice {
    Automatic,
    Manual,
    /// Anything else; callers warn and fall back to automatic.
    Invalid,
}

impl BatchChoice {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "A" | "a" => Self::Automatic,
            "M" | "m" => Self::Manual,
            _ => Self::Invalid,
        }
    }
}

/// Line-oriented question/answer over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `label`, read one line, trim it. `None` on end of input.
    fn read_answer(&mut self, label: &str) -> StitchkitResult<Option<String>> {
        write!(self.output, "{label}").context("write prompt")?;
        self.output.flush().context("flush prompt")?;

        let mut line = String::new();
        let n = self.input.read_line(&mut line).context("read answer")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask for a value; an empty answer (or end of input) takes `default`.
    pub fn ask(&mut self, label: &str, default: &str) -> StitchkitResult<String> {
        let answer = self.read_answer(&format!("{label} (default: {default}): "))?;
        Ok(answer
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    pub fn ask_number(&mut self, label: &str) -> StitchkitResult<usize> {
        let answer = self
            .read_answer(&format!("{label}: "))?
            .ok_or_else(|| StitchkitError::validation(format!("no answer for '{label}'")))?;
        answer.parse::<usize>().map_err(|_| {
            StitchkitError::validation(format!("expected a non-negative integer, got '{answer}'"))
        })
    }

    /// True only for `y` or `Y`.
    pub fn confirm(&mut self, label: &str) -> StitchkitResult<bool> {
        let answer = self.read_answer(&format!("{label} (Y/N): "))?;
        Ok(matches!(answer.as_deref(), Some("y" | "Y")))
    }

    pub fn ask_batch_choice(&mut self) -> StitchkitResult<BatchChoice> {
        let answer = self.read_answer(
            "Enter 'A' for automatic batch size calculation or 'M' for manual input: ",
        )?;
        Ok(BatchChoice::parse(answer.as_deref().unwrap_or_default()))
    }

    /// Print a line of user-facing output.
    pub fn say(&mut self, msg: &str) -> StitchkitResult<()> {
        writeln!(self.output, "{msg}").context("write output")?;
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
