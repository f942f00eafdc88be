//! Prompt wrappers
//!
//! Every helper returns `Ok(None)` when the operator backs out (Esc, Ctrl-C,
//! closed terminal) after printing a short notice. Anything else is an error.

use anyhow::Result;
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};
use std::io::{self, BufRead, ErrorKind};

fn theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

fn is_cancellation(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::Interrupted | ErrorKind::UnexpectedEof | ErrorKind::NotConnected
    )
}

fn answered<T>(result: dialoguer::Result<Option<T>>) -> Result<Option<T>> {
    match result {
        Ok(Some(value)) => Ok(Some(value)),
        Ok(None) => {
            cancelled();
            Ok(None)
        }
        Err(dialoguer::Error::IO(e)) if is_cancellation(&e) => {
            log::debug!("prompt aborted: {e}");
            cancelled();
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn cancelled() {
    println!("{}", style("Operation cancelled.").dim());
}

pub fn select(prompt: &str, items: &[String], default: usize) -> Result<Option<usize>> {
    answered(
        Select::with_theme(&theme())
            .with_prompt(prompt)
            .items(items)
            .default(default.min(items.len().saturating_sub(1)))
            .interact_opt(),
    )
}

pub fn multi_select(prompt: &str, items: &[String], checked: &[bool]) -> Result<Option<Vec<usize>>> {
    answered(
        MultiSelect::with_theme(&theme())
            .with_prompt(prompt)
            .items(items)
            .defaults(checked)
            .interact_opt(),
    )
}

pub fn confirm(prompt: &str, default: bool) -> Result<Option<bool>> {
    answered(
        Confirm::with_theme(&theme())
            .with_prompt(prompt)
            .default(default)
            .interact_opt(),
    )
}

/// Free text; `initial` is pre-filled and editable
pub fn input(prompt: &str, initial: Option<&str>, allow_empty: bool) -> Result<Option<String>> {
    let theme = theme();
    let mut builder = Input::<String>::with_theme(&theme)
        .with_prompt(prompt)
        .allow_empty(allow_empty);
    if let Some(initial) = initial {
        builder = builder.with_initial_text(initial);
    }
    answered(builder.interact_text().map(|s| Some(s.trim().to_string())))
}

/// Required text checked by `validate`
pub fn input_validated<F>(prompt: &str, validate: F) -> Result<Option<String>>
where
    F: Fn(&str) -> std::result::Result<(), String>,
{
    let theme = theme();
    let result = Input::<String>::with_theme(&theme)
        .with_prompt(prompt)
        .validate_with(|s: &String| validate(s.trim()))
        .interact_text();
    answered(result.map(|s| Some(s.trim().to_string())))
}

pub fn secret(prompt: &str) -> Result<Option<String>> {
    let theme = theme();
    let result = Password::with_theme(&theme)
        .with_prompt(prompt)
        .validate_with(|s: &String| -> std::result::Result<(), &str> {
            if s.trim().is_empty() {
                Err("Value cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact();
    answered(result.map(|s| Some(s.trim().to_string())))
}

/// Wait for Enter
pub fn pause() {
    println!("{}", style("Press Enter to continue...").dim());
    wait_for_enter(&mut io::stdin().lock());
}

/// Consume one line; a read error is logged and treated as Enter
fn wait_for_enter(input: &mut impl BufRead) -> bool {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(_) => true,
        Err(e) => {
            log::debug!("could not wait for Enter: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn enter_is_consumed() {
        let mut input = Cursor::new(b"\nnext\n".to_vec());
        assert!(wait_for_enter(&mut input));
        assert_eq!(input.position(), 1);
    }

    #[test]
    fn unreadable_input_does_not_block() {
        let mut input = Cursor::new(vec![0xff, 0xfe, b'\n']);
        assert!(!wait_for_enter(&mut input));
    }

    #[test]
    fn closed_terminal_counts_as_cancellation() {
        assert!(is_cancellation(&io::Error::from(ErrorKind::UnexpectedEof)));
        assert!(!is_cancellation(&io::Error::from(ErrorKind::PermissionDenied)));
    }
}
