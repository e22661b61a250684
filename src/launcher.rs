//! Runs a selected menu command through the configured shell and waits for it.

use std::process::{Command, ExitStatus};

use anyhow::{bail, Context, Result};

pub const DEFAULT_SHELL: &str = "/bin/bash -c";

/// Something that can run a resolved command line to completion.
pub trait Launcher {
    /// # Errors
    ///
    /// Returns an error if the command could not be started.
    fn launch(&mut self, command: &str) -> Result<ExitStatus>;
}

/// Hands the command line to a shell as one argument (`/bin/bash -c <cmd>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellLauncher {
    argv: Vec<String>,
}

impl ShellLauncher {
    /// Build from a shell invocation such as `"/bin/sh -c"`, split with
    /// POSIX quoting rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the string does not parse or names no program.
    pub fn from_shell(shell: &str) -> Result<Self> {
        let argv = shell_words::split(shell).with_context(|| format!("invalid --shell {shell:?}"))?;
        if argv.is_empty() {
            bail!("--shell must name a program");
        }
        Ok(Self { argv })
    }

    #[must_use]
    pub fn command(&self, line: &str) -> Command {
        let mut command = Command::new(&self.argv[0]);
        command.args(&self.argv[1..]).arg(line);
        command
    }
}

impl Launcher for ShellLauncher {
    fn launch(&mut self, line: &str) -> Result<ExitStatus> {
        tracing::info!(command = %line, "launching menu selection");
        let status = self
            .command(line)
            .status()
            .with_context(|| format!("failed to start {}", self.argv[0]))?;
        tracing::info!(code = ?status.code(), "menu selection finished");
        Ok(status)
    }
}
