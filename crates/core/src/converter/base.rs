//! Shared plumbing for the poppler tool clients.
//!
//! - [`ToolClient`]: a tool name bound to a [`CommandRunner`], with the
//!   version check every client performs at construction.
//! - [`ArgList`]: argv builder used by the option structs.

use std::ffi::{OsStr, OsString};
use std::fmt::Display;

use tracing::debug;

use super::command::{CommandOutput, CommandRunner};
use super::version::{ToolVersion, VersionRange, version_from_banner};
use crate::error::{Error, Result};

/// One poppler binary and the runner used to invoke it.
#[derive(Debug, Clone)]
pub struct ToolClient<R> {
    program: String,
    runner: R,
}

impl<R: CommandRunner> ToolClient<R> {
    /// Bind `program` to `runner` and verify its version lies in `range`.
    pub fn connect(program: &str, runner: R, range: &VersionRange) -> Result<Self> {
        let client = Self {
            program: program.to_string(),
            runner,
        };
        let raw = client
            .version()
            .map_err(|_| Error::VersionUnavailable(client.program.clone()))?;
        let version: ToolVersion = range.check(&raw)?;
        debug!(program, %version, "converter version accepted");
        Ok(client)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Version string reported by `<tool> -v`.
    ///
    /// poppler prints its banner on stderr.
    pub fn version(&self) -> Result<String> {
        let out = self.run(&[OsString::from("-v")])?;
        out.stderr
            .as_deref()
            .and_then(|banner| version_from_banner(&self.program, banner))
            .ok_or_else(|| Error::VersionUnavailable(self.program.clone()))
    }

    pub fn run(&self, args: &[OsString]) -> Result<CommandOutput> {
        self.runner.run(&self.program, args)
    }

    /// Run a conversion. Anything on the diagnostic channel fails the run.
    pub fn convert(&self, args: &[OsString]) -> Result<Option<String>> {
        let out = self.run(args)?;
        if let Some(diag) = out.stderr {
            return Err(Error::Diagnostic(diag));
        }
        Ok(out.stdout)
    }
}

/// Argument vector built flag by flag.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArgList(Vec<OsString>);

impl ArgList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&mut self, name: &str, on: bool) -> &mut Self {
        if on {
            self.0.push(name.into());
        }
        self
    }

    pub fn value<T: Display>(&mut self, name: &str, value: Option<T>) -> &mut Self {
        if let Some(v) = value {
            self.0.push(name.into());
            self.0.push(v.to_string().into());
        }
        self
    }

    /// Floats are rendered with six decimals, e.g. `1.500000`.
    pub fn float(&mut self, name: &str, value: Option<f32>) -> &mut Self {
        self.value(name, value.map(|v| format!("{v:.6}")))
    }

    pub fn push(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.0.push(arg.as_ref().to_os_string());
        self
    }

    pub fn into_vec(self) -> Vec<OsString> {
        self.0
    }

    pub fn as_slice(&self) -> &[OsString] {
        &self.0
    }
}
