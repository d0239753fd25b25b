//! Juju argv construction.
//!
//! Pure functions only: builds the argument vector and environment for a
//! juju invocation. Spawning the process is a `CommandRunner` concern.

use std::env::JoinPathsError;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// A fully built command: program, arguments and environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    /// Variables set on top of the inherited environment.
    pub env: Vec<(String, OsString)>,
}

impl CommandLine {
    /// Split an argv into program and arguments. An empty argv yields an
    /// empty program, which fails to spawn.
    #[must_use]
    pub fn from_argv(argv: Vec<String>) -> Self {
        let mut argv = argv.into_iter();
        let program = argv.next().unwrap_or_default();
        Self {
            program,
            args: argv.collect(),
            env: Vec::new(),
        }
    }

    /// Add an environment override.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program followed by arguments.
    pub fn argv(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv().collect::<Vec<_>>().join(" "))
    }
}

/// One juju subcommand invocation, before it is bound to a tool and an
/// environment.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Subcommand, e.g. `status`.
    pub command: &'a str,
    /// Arguments after the subcommand.
    pub args: &'a [&'a str],
    /// Run under `sudo -E`.
    pub sudo: bool,
    /// Append `-e <environment>` after the subcommand.
    pub include_e: bool,
    /// Wrap in coreutils `timeout`.
    pub timeout: Option<Duration>,
}

impl<'a> Invocation<'a> {
    /// A plain, environment-scoped invocation.
    #[must_use]
    pub fn new(command: &'a str, args: &'a [&'a str]) -> Self {
        Self {
            command,
            args,
            sudo: false,
            include_e: true,
            timeout: None,
        }
    }

    #[must_use]
    pub fn sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    #[must_use]
    pub fn include_e(mut self, include_e: bool) -> Self {
        self.include_e = include_e;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Build the argv for `invocation`:
/// `[sudo -E] [timeout <secs>s] <tool> <--debug|--show-log> <command> [-e <env>] <args>`.
#[must_use]
pub fn full_args(
    tool: &Path,
    environment: Option<&str>,
    debug: bool,
    invocation: &Invocation<'_>,
) -> Vec<String> {
    let mut argv = Vec::with_capacity(invocation.args.len() + 8);
    if invocation.sudo {
        argv.extend(["sudo".to_string(), "-E".to_string()]);
    }
    if let Some(timeout) = invocation.timeout {
        argv.push("timeout".to_string());
        argv.push(format!("{:.2}s", timeout.as_secs_f64()));
    }
    argv.push(tool.to_string_lossy().into_owned());
    argv.push(if debug { "--debug" } else { "--show-log" }.to_string());
    argv.push(invocation.command.to_string());
    if let (true, Some(env)) = (invocation.include_e, environment) {
        argv.push("-e".to_string());
        argv.push(env.to_string());
    }
    argv.extend(invocation.args.iter().map(ToString::to_string));
    argv
}

/// `PATH` with the tool's directory in front, so juju plugins resolve.
///
/// # Errors
///
/// Returns an error if the tool directory contains a path separator.
pub fn tool_search_path(
    tool: &Path,
    current: Option<&OsStr>,
) -> Result<OsString, JoinPathsError> {
    let inherited = current.map(std::env::split_paths).into_iter().flatten();
    match tool.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        Some(dir) => std::env::join_paths(std::iter::once(dir.to_path_buf()).chain(inherited)),
        None => std::env::join_paths(inherited),
    }
}
