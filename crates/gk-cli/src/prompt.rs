//! Terminal shell around the pure import wizard.
//!
//! Questions go to stderr so `--format json` output on stdout stays clean.

use std::io::{self, BufRead, Write};

use anyhow::{Context, bail};
use gk_core::Persona;
use gk_core::recommend::RecommendedMapping;
use gk_discovery::{Question, WizardStep, next_step};

/// Drive the wizard over `mapping` on the terminal.
///
/// With `assume_yes` every persona and platform is adopted with its
/// suggested name and account; an account with no suggestion is an error.
pub fn run_wizard(mapping: &RecommendedMapping, assume_yes: bool) -> anyhow::Result<Vec<Persona>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stderr();
    drive(mapping, assume_yes, &mut input, &mut out)
}

fn drive(
    mapping: &RecommendedMapping,
    assume_yes: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<Vec<Persona>> {
    let mut answers = Vec::new();
    loop {
        match next_step(mapping, &answers) {
            WizardStep::Complete(personas) => return Ok(personas),
            WizardStep::Ask(question) => {
                let answer = if assume_yes {
                    auto_answer(&question)?
                } else {
                    ask(&question, input, out)?
                };
                answers.push(answer);
            }
        }
    }
}

fn auto_answer(question: &Question) -> anyhow::Result<String> {
    if question.is_yes_no() {
        return Ok("y".into());
    }
    if question.default.is_some() {
        return Ok(String::new());
    }
    bail!("{} has no suggested value; run without --yes", question.prompt)
}

/// Print one question and read one line. Blank lines are returned as-is;
/// the wizard applies the default.
fn ask(question: &Question, input: &mut impl BufRead, out: &mut impl Write) -> anyhow::Result<String> {
    let hint = match (&question.default, question.is_yes_no()) {
        (_, true) => " [y/N]".to_string(),
        (Some(default), false) => format!(" [{default}]"),
        (None, false) => String::new(),
    };
    write!(out, "{}{hint}: ", question.prompt)?;
    out.flush()?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("failed to read an answer")?;
    if read == 0 {
        bail!("input closed before the wizard finished");
    }
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Read a secret without echo.
pub fn read_secret(label: &str) -> anyhow::Result<String> {
    let value = rpassword::prompt_password(format!("{label}: "))
        .with_context(|| format!("failed to read {label}"))?;
    Ok(value.trim().to_string())
}
