//! Hook-tool execution.
//!
//! Hook tools are invoked directly (no shell) so arguments pass through
//! untouched. `command_line` renders an invocation as a shell-quoted string
//! for logs, errors and test assertions.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::Command;

use tracing::trace;

use crate::error::{OperatorError, Result};

pub trait CommandRunner {
    /// Run `program` with `args` and return its stdout.
    fn run(&self, program: &str, args: &[&str]) -> Result<String>;
}

/// Render an invocation as one shell-safe line.
pub fn command_line(program: &str, args: &[&str]) -> String {
    args.iter().fold(program.to_string(), |mut line, arg| {
        line.push(' ');
        line.push_str(&shell_escape::escape(Cow::Borrowed(*arg)));
        line
    })
}

/// Spawns hook tools found on `PATH`.
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let line = command_line(program, args);
        trace!(command = %line, "running hook tool");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| OperatorError::Command {
                command: line.clone(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(OperatorError::Command {
                command: line,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Scripted runner for tests. Replies are consumed front to back; once they
/// run out every call succeeds with empty output.
#[derive(Default)]
pub struct MockRunner {
    replies: RefCell<VecDeque<std::result::Result<String, String>>>,
    calls: RefCell<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(replies: Vec<std::result::Result<String, String>>) -> Self {
        MockRunner {
            replies: RefCell::new(replies.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Every invocation so far, rendered with `command_line`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let line = command_line(program, args);
        self.calls.borrow_mut().push(line.clone());
        match self.replies.borrow_mut().pop_front() {
            None => Ok(String::new()),
            Some(Ok(stdout)) => Ok(stdout),
            Some(Err(message)) => Err(OperatorError::Command {
                command: line,
                message,
            }),
        }
    }
}
