//! Clipboard integration utilities.

use std::cell::RefCell;
use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};

/// Destination for copied text.
pub trait ClipboardSink {
    fn copy(&self, text: &str) -> Result<()>;
}

impl<C: ClipboardSink + ?Sized> ClipboardSink for &C {
    fn copy(&self, text: &str) -> Result<()> {
        (**self).copy(text)
    }
}

/// System clipboard with fallbacks to platform executables for headless environments.
///
/// The native handle is opened lazily on first copy, so sessions that never copy never touch
/// the display server.
#[derive(Default)]
pub struct SystemClipboard {
    primary: RefCell<Option<arboard::Clipboard>>,
    native_failed: RefCell<bool>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn copy_native(&self, text: &str) -> bool {
        if *self.native_failed.borrow() {
            return false;
        }

        let mut primary = self.primary.borrow_mut();
        if primary.is_none() {
            match arboard::Clipboard::new() {
                Ok(clipboard) => *primary = Some(clipboard),
                Err(err) => {
                    tracing::debug!(error = %err, "system clipboard unavailable");
                    *self.native_failed.borrow_mut() = true;
                    return false;
                }
            }
        }

        let copied = primary
            .as_mut()
            .is_some_and(|clipboard| clipboard.set_text(text.to_owned()).is_ok());
        if !copied {
            *primary = None;
            *self.native_failed.borrow_mut() = true;
        }
        copied
    }
}

impl ClipboardSink for SystemClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        if self.copy_native(text) {
            return Ok(());
        }
        fallback_copy(text)
    }
}

fn fallback_copy(text: &str) -> Result<()> {
    for command in fallback_commands() {
        match try_command_copy(command, text) {
            Ok(()) => return Ok(()),
            Err(err) => tracing::debug!(error = %err, "clipboard fallback failed"),
        }
    }

    Err(anyhow!(
        "failed to copy text to clipboard using available backends"
    ))
}

fn try_command_copy(command: &[&str], text: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn clipboard command: {program}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .context("failed to write clipboard contents")?;
    }

    let status = child
        .wait()
        .with_context(|| format!("clipboard command did not exit cleanly: {program}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("clipboard command exited with status {status}"))
    }
}

#[cfg(target_os = "macos")]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    vec![&["pbcopy"] as &[&str]]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    vec![
        &["wl-copy"] as &[&str],
        &["xclip", "-selection", "clipboard"],
        &["xsel", "--clipboard", "--input"],
    ]
}

#[cfg(target_os = "windows")]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    vec![&["powershell.exe", "-NoProfile", "-Command", "Set-Clipboard"] as &[&str]]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    Vec::new()
}
