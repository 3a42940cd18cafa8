//! Redirection extraction.
//!
//! Turns the flat token list produced by [`crate::lexer`] into a [`ParsedCommand`]:
//! the argument vector with every `<`, `>` and `>>` operator (and the filename that
//! follows it) removed, plus the redirection targets those operators named.

use crate::error::{Result, ShellError};
use std::path::PathBuf;

/// Kind of redirection operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `<`: read standard input from a file.
    Input,
    /// `>`: write standard output to a file, truncating it.
    Output,
    /// `>>`: write standard output to a file, appending to it.
    Append,
}

impl RedirectKind {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "<" => Some(RedirectKind::Input),
            ">" => Some(RedirectKind::Output),
            ">>" => Some(RedirectKind::Append),
            _ => None,
        }
    }
}

/// A single command line after redirection operators have been stripped.
///
/// `argv[0]` is the command name; it is never a redirection operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    pub argv: Vec<String>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub append: bool,
}

impl ParsedCommand {
    /// The command name, if there is one.
    pub fn name(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    /// Whether any redirection was requested.
    pub fn redirects(&self) -> bool {
        self.input.is_some() || self.output.is_some()
    }
}

struct Parser {
    tokens: std::vec::IntoIter<String>,
    parsed: ParsedCommand,
}

impl Parser {
    fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            parsed: ParsedCommand::default(),
        }
    }

    fn consume(&mut self) -> Option<String> {
        self.tokens.next()
    }

    fn parse(mut self) -> Result<ParsedCommand> {
        while let Some(token) = self.consume() {
            match RedirectKind::from_token(&token) {
                Some(kind) => self.parse_redirect(kind, &token)?,
                None => self.parsed.argv.push(token),
            }
        }

        if self.parsed.argv.is_empty() && self.parsed.redirects() {
            return Err(ShellError::InvalidSyntax(
                "redirection without a command".to_string(),
            ));
        }
        Ok(self.parsed)
    }

    fn parse_redirect(&mut self, kind: RedirectKind, operator: &str) -> Result<()> {
        let target = match self.consume() {
            Some(t) if RedirectKind::from_token(&t).is_none() => PathBuf::from(t),
            Some(t) => {
                return Err(ShellError::InvalidSyntax(format!(
                    "unexpected `{t}` after `{operator}`"
                )));
            }
            None => {
                return Err(ShellError::InvalidSyntax(format!(
                    "missing file name after `{operator}`"
                )));
            }
        };

        // A later redirection of the same stream replaces an earlier one.
        match kind {
            RedirectKind::Input => self.parsed.input = Some(target),
            RedirectKind::Output | RedirectKind::Append => {
                self.parsed.output = Some(target);
                self.parsed.append = kind == RedirectKind::Append;
            }
        }
        Ok(())
    }
}

/// Strip redirection operators from `tokens` and collect their targets.
///
/// Fails with [`ShellError::InvalidSyntax`] when an operator has no filename after
/// it, when the filename slot holds another operator, or when the line names
/// redirections but no command. An empty token list parses to an empty command.
pub fn extract_redirections(tokens: Vec<String>) -> Result<ParsedCommand> {
    Parser::new(tokens).parse()
}
