//! Diagnostics for the interpreter.
//!
//! All front-end passes (scanner, parser, resolver) report through a shared
//! [`ErrorReporter`] and keep going; the flags it carries decide whether a
//! file run may execute and which exit code the process ends with.  Runtime
//! failures are values of [`RuntimeError`] and unwind to the driver, which
//! hands them back to the reporter.

use thiserror::Error;

use crate::token::{Token, TokenType};

/// Runtime evaluation error, carrying the token that triggered it for
/// source-location reporting.
#[derive(Debug, Clone, Error)]
#[error("{message}\n[line {}]", .token.line)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new<S: Into<String>>(token: Token, message: S) -> Self {
        RuntimeError {
            token,
            message: message.into(),
        }
    }
}

/// Shared diagnostics sink.
///
/// The REPL resets `had_error` between lines but never `had_runtime_error`;
/// file runs read both to pick an exit code.  Every rendered message is also
/// kept in `diagnostics` so tests can assert on exact output.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    pub had_error: bool,
    pub had_runtime_error: bool,
    pub diagnostics: Vec<String>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, line: usize, message: &str) {
        self.report(line, "", message);
    }

    pub fn error_token(&mut self, token: &Token, message: &str) {
        match token.token_type {
            TokenType::EOF => self.report(token.line, " at end", message),
            _ => {
                let location = format!(" at '{}'", token.lexeme);
                self.report(token.line, &location, message);
            }
        }
    }

    pub fn runtime_error(&mut self, error: &RuntimeError) {
        let rendered = error.to_string();
        eprintln!("{}", rendered);
        self.diagnostics.push(rendered);
        self.had_runtime_error = true;
    }

    fn report(&mut self, line: usize, location: &str, message: &str) {
        let rendered = format!("[line {}] Error{}: {}", line, location, message);
        eprintln!("{}", rendered);
        self.diagnostics.push(rendered);
        self.had_error = true;
    }
}
