//! External command execution with captured output.
//!
//! The build shells out once: to the bytecode cross-compiler. Commands
//! capture stderr so a failed invocation surfaces the tool's own message
//! instead of a bare exit code.

use crate::error::{BuildError, Result};
use std::path::Path;
use std::process::{Command, Stdio};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
}

/// Builder for configuring command execution.
pub struct Cmd {
    program: String,
    args: Vec<String>,
}

impl Cmd {
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Add multiple path arguments.
    pub fn arg_paths<'a>(mut self, paths: impl IntoIterator<Item = &'a Path>) -> Self {
        for path in paths {
            self.args.push(path.to_string_lossy().into_owned());
        }
        self
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Run the command, failing with `ExternalTool` if it cannot be
    /// spawned or exits non-zero.
    pub fn run(self) -> Result<CommandResult> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| BuildError::ExternalTool {
                command: self.describe(),
                detail: e.to_string(),
            })?;
        let result = CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !output.status.success() {
            let detail = if result.stderr.trim().is_empty() {
                format!("exit code {}", output.status.code().unwrap_or(-1))
            } else {
                result.stderr.trim().to_string()
            };
            return Err(BuildError::ExternalTool {
                command: self.describe(),
                detail,
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let result = Cmd::new("echo").arg("hello").run().unwrap();
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn failure_includes_stderr() {
        let err = Cmd::new("ls").arg("/nonexistent_path_12345").run().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No such file") || msg.contains("cannot access"));
    }

    #[test]
    fn missing_program_is_an_external_tool_error() {
        let err = Cmd::new("nonexistent_program_12345").run().unwrap_err();
        assert!(err.to_string().contains("nonexistent_program_12345"));
    }
}
