//! Command line tokenizer
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! Splits a command line (prefix already stripped) into the command word and a
//! quote-aware argument list. Matching against aliases is case-sensitive, so the
//! command word is kept exactly as typed.

use std::fmt;

/// A command line split into its command word and arguments
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenizedCommand {
    command: String,
    args: Vec<String>,
}

impl TokenizedCommand {
    /// Tokenize a command line
    ///
    /// The command word is everything up to the first space. The remainder is
    /// scanned one character at a time: `"` toggles quoting and is dropped, an
    /// unquoted space ends the current argument, and empty arguments are never
    /// produced. An unterminated quote runs to the end of the line.
    pub fn parse(line: &str) -> Self {
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest),
            None => (line, ""),
        };

        Self {
            command: command.to_string(),
            args: split_arguments(rest),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Arguments joined with single spaces
    pub fn joined_args(&self) -> String {
        self.args.join(" ")
    }
}

impl fmt::Display for TokenizedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

fn split_arguments(rest: &str) -> Vec<String> {
    let mut args = Vec::new();
    if rest.trim().is_empty() {
        return args;
    }

    let mut in_quote = false;
    let mut current = String::new();

    for c in rest.chars() {
        match c {
            '"' => in_quote = !in_quote,
            ' ' if !in_quote => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}
