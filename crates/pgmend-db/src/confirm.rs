//! The confirmation gate for structural schema changes.

use std::io::{self, BufRead, Write};

/// A yes/no decision for a given prompt.
///
/// Every structural or destructive reconciliation action (create,
/// add, drop, alter) passes through this gate; read-only
/// introspection does not.
pub trait Confirm {
    /// Returns whether the prompted action should proceed.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Approves everything. The right gate for unattended or automated
/// runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl Confirm for AutoApprove {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Prompts on stdout and reads the answer from stdin; approves on a
/// leading `y`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleConfirm;

impl Confirm for ConsoleConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} (y/n) ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        answer.trim().to_lowercase().starts_with('y')
    }
}
