//! Verification that external tools can be invoked before a session starts.

use std::process::{Command, Stdio};

use crate::domain::errors::SessionError;

/// Answers whether a program can be run in the current environment.
pub trait CapabilityProbe {
    fn is_invocable(&self, program: &str) -> bool;
}

/// Probes by running `<program> --version`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessProbe;

impl CapabilityProbe for ProcessProbe {
    fn is_invocable(&self, program: &str) -> bool {
        Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

/// Proof that every required tool answered the probe. Only [`CapabilityChecker::verify`] builds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    programs: Vec<String>,
}

impl Verified {
    pub fn programs(&self) -> &[String] {
        &self.programs
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            programs: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CapabilityChecker<P = ProcessProbe> {
    probe: P,
}

impl CapabilityChecker<ProcessProbe> {
    pub fn new() -> Self {
        Self::with_probe(ProcessProbe)
    }
}

impl<P: CapabilityProbe> CapabilityChecker<P> {
    pub fn with_probe(probe: P) -> Self {
        Self { probe }
    }

    /// Probe every program and report all missing ones at once.
    pub fn verify<S: AsRef<str>>(&self, required: &[S]) -> Result<Verified, SessionError> {
        let mut missing = Vec::new();
        let mut programs = Vec::with_capacity(required.len());

        for program in required {
            let program = program.as_ref();
            if self.probe.is_invocable(program) {
                tracing::debug!(program, "capability available");
                programs.push(program.to_owned());
            } else {
                missing.push(program.to_owned());
            }
        }

        if missing.is_empty() {
            Ok(Verified { programs })
        } else {
            Err(SessionError::MissingCapability(missing))
        }
    }
}
