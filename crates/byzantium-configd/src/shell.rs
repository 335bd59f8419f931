//! Command executor. The only place the daemon spawns processes.
//!
//! Every configuration tool (`ifconfig`, `iwconfig`, `route`, `arping`,
//! init scripts, companion daemons) is run through a [`CommandRunner`], so
//! components can be exercised against a recording fake in tests.

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::error::ConfigdError;

/// A program invocation with positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Capture stdout and return it as lines.
    pub capture: bool,
    /// Launch without waiting for the process to exit.
    pub background: bool,
    /// Sleep after the command completes.
    pub delay: Option<Duration>,
}

impl ShellCommand {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_string_lossy().into_owned(),
            args: Vec::new(),
            capture: false,
            background: false,
            delay: None,
        }
    }

    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.args.extend(args.into_iter().map(|a| a.to_string()));
        self
    }

    pub fn capture_output(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn background(mut self) -> Self {
        self.background = true;
        self
    }

    /// Pause for `delay` after the command; zero means no pause.
    pub fn delay_after(mut self, delay: Duration) -> Self {
        self.delay = (!delay.is_zero()).then_some(delay);
        self
    }

    /// File name of the program, without its directory.
    pub fn program_name(&self) -> &str {
        Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.program)
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What a finished (or launched) command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Captured stdout, split into lines.
    Lines { success: bool, lines: Vec<String> },
    /// Exit status of a command run without capture.
    Completed { success: bool, code: Option<i32> },
    /// A background process was started.
    Spawned { pid: u32 },
}

impl CommandOutput {
    /// Whether the command exited successfully (a spawn counts as success).
    pub fn success(&self) -> bool {
        match self {
            CommandOutput::Lines { success, .. } | CommandOutput::Completed { success, .. } => {
                *success
            }
            CommandOutput::Spawned { .. } => true,
        }
    }

    pub fn lines(&self) -> &[String] {
        match self {
            CommandOutput::Lines { lines, .. } => lines,
            _ => &[],
        }
    }
}

/// Executes system utilities on behalf of the daemon.
pub trait CommandRunner {
    /// Run `cmd`. Errors only when the process could not be started;
    /// a non-zero exit is reported through [`CommandOutput::success`].
    fn run(&self, cmd: &ShellCommand) -> Result<CommandOutput, ConfigdError>;

    /// Run `cmd` and turn a non-zero exit into an error.
    fn run_checked(&self, cmd: &ShellCommand) -> Result<CommandOutput, ConfigdError> {
        let output = self.run(cmd)?;
        if output.success() {
            Ok(output)
        } else {
            Err(ConfigdError::Command {
                command: cmd.to_string(),
                reason: match &output {
                    CommandOutput::Completed { code: Some(c), .. } => format!("exit status {c}"),
                    _ => "non-zero exit status".into(),
                },
            })
        }
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, cmd: &ShellCommand) -> Result<CommandOutput, ConfigdError> {
        (**self).run(cmd)
    }
}

/// Runs commands on the host with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

impl CommandRunner for SystemShell {
    fn run(&self, cmd: &ShellCommand) -> Result<CommandOutput, ConfigdError> {
        tracing::debug!(command = %cmd, "running");

        let spawn_error = |e: std::io::Error| ConfigdError::Command {
            command: cmd.to_string(),
            reason: e.to_string(),
        };

        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args).stdin(Stdio::null());

        let output = if cmd.background {
            let child = command.spawn().map_err(spawn_error)?;
            CommandOutput::Spawned { pid: child.id() }
        } else if cmd.capture {
            let out = command.stderr(Stdio::inherit()).output().map_err(spawn_error)?;
            CommandOutput::Lines {
                success: out.status.success(),
                lines: String::from_utf8_lossy(&out.stdout)
                    .lines()
                    .map(str::to_string)
                    .collect(),
            }
        } else {
            let status = command.status().map_err(spawn_error)?;
            CommandOutput::Completed {
                success: status.success(),
                code: status.code(),
            }
        };

        if !output.success() {
            tracing::debug!(command = %cmd, ?output, "command exited unsuccessfully");
        }

        if let Some(delay) = cmd.delay {
            std::thread::sleep(delay);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_display() {
        let cmd = ShellCommand::new("/sbin/iwconfig")
            .arg("wlan0")
            .args(["channel", "5"])
            .delay_after(Duration::from_secs(5));
        assert_eq!(cmd.to_string(), "/sbin/iwconfig wlan0 channel 5");
        assert_eq!(cmd.program_name(), "iwconfig");
        assert_eq!(cmd.delay, Some(Duration::from_secs(5)));
        assert!(!cmd.capture);
    }

    #[test]
    fn zero_delay_is_no_delay() {
        let cmd = ShellCommand::new("true").delay_after(Duration::ZERO);
        assert_eq!(cmd.delay, None);
    }

    #[test]
    fn output_success() {
        assert!(CommandOutput::Spawned { pid: 1 }.success());
        assert!(!CommandOutput::Completed { success: false, code: Some(1) }.success());
        let lines = CommandOutput::Lines {
            success: true,
            lines: vec!["a".into()],
        };
        assert_eq!(lines.lines(), ["a".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn system_shell_captures_lines() {
        let out = SystemShell
            .run(&ShellCommand::new("printf").arg("one\\ntwo\\n").capture_output())
            .unwrap();
        assert!(out.success());
        assert_eq!(out.lines(), ["one".to_string(), "two".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn run_checked_reports_exit_status() {
        let err = SystemShell.run_checked(&ShellCommand::new("false")).unwrap_err();
        assert!(matches!(err, ConfigdError::Command { .. }));
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = SystemShell
            .run(&ShellCommand::new("/nonexistent/byzantium-tool"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/byzantium-tool"));
    }
}
