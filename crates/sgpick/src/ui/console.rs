//! Line-oriented output for the interactive session.

use std::cell::RefCell;
use std::fmt::{self, Display};
use std::io::{self, Write};
use std::rc::Rc;

use crossterm::style::Stylize;

use crate::app::catalog::CatalogEntry;
use crate::domain::model::{ActionChoice, ResultSet, SearchResult};

/// Message severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Writes session messages, menus, and listings. Colour is applied only when enabled.
pub struct Console {
    out: Box<dyn Write>,
    color: bool,
}

impl Console {
    pub fn new(out: Box<dyn Write>, color: bool) -> Self {
        Self { out, color }
    }

    /// Session chatter goes to stderr so stdout stays clean for piped selections.
    pub fn stderr(color: bool) -> Self {
        Self::new(Box::new(io::stderr()), color)
    }

    pub fn color(&self) -> bool {
        self.color
    }

    pub fn status(&mut self, level: StatusLevel, message: impl Display) {
        let text = message.to_string();
        let line = if self.color {
            match level {
                StatusLevel::Info => text.grey().to_string(),
                StatusLevel::Success => text.green().bold().to_string(),
                StatusLevel::Warning => text.yellow().to_string(),
                StatusLevel::Error => text.red().bold().to_string(),
            }
        } else {
            match level {
                StatusLevel::Info | StatusLevel::Success => text,
                StatusLevel::Warning => format!("warning: {text}"),
                StatusLevel::Error => format!("error: {text}"),
            }
        };
        self.write_line(&line);
    }

    pub fn info(&mut self, message: impl Display) {
        self.status(StatusLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Display) {
        self.status(StatusLevel::Success, message);
    }

    pub fn warn(&mut self, message: impl Display) {
        self.status(StatusLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Display) {
        self.status(StatusLevel::Error, message);
    }

    /// Verbatim text, such as matcher diagnostics or a rendered preview.
    pub fn block(&mut self, text: &str) {
        for line in text.lines() {
            self.write_line(line);
        }
    }

    pub fn menu(&mut self, result: &SearchResult) {
        let menu = render_menu(result, self.color);
        self.block(&menu);
    }

    pub fn catalog(&mut self, name: &str, entries: &[CatalogEntry]) {
        let catalog = render_catalog(name, entries, self.color);
        self.block(&catalog);
    }

    pub fn results(&mut self, title: impl Display, results: &ResultSet) {
        let heading = format!("{title} ({} found)", results.len());
        let heading = if self.color {
            heading.bold().to_string()
        } else {
            heading
        };
        self.write_line(&heading);
        for result in results {
            self.write_line(&format!("  {}", result.raw()));
        }
    }

    fn write_line(&mut self, line: &str) {
        if let Err(err) = writeln!(self.out, "{line}") {
            tracing::debug!(error = %err, "console write failed");
        }
    }
}

/// Action menu shown after a result is chosen.
pub fn render_menu(result: &SearchResult, color: bool) -> String {
    let mut menu = String::new();
    let title = format!("Selected {}", result.location());
    push_line(&mut menu, &styled(&title, color, |text| text.cyan().bold().to_string()));
    if let Some(snippet) = result.snippet().map(str::trim).filter(|s| !s.is_empty()) {
        push_line(&mut menu, &format!("  {snippet}"));
    }
    for choice in ActionChoice::ALL {
        let key = format!("[{}/{}]", choice.number(), choice.key());
        let key = styled(&key, color, |text| text.yellow().to_string());
        push_line(&mut menu, &format!("  {key} {}", choice.label()));
    }
    menu
}

/// Example patterns for one language, numbered.
pub fn render_catalog(name: &str, entries: &[CatalogEntry], color: bool) -> String {
    let mut text = String::new();
    let title = format!("Example patterns for {name}");
    push_line(&mut text, &styled(&title, color, |t| t.bold().to_string()));
    let width = entries
        .iter()
        .map(|entry| entry.description.len())
        .max()
        .unwrap_or(0);
    for (index, entry) in entries.iter().enumerate() {
        let template = styled(entry.template, color, |t| t.green().to_string());
        push_line(
            &mut text,
            &format!(
                "  {:>2}. {:<width$}  {template}",
                index + 1,
                entry.description
            ),
        );
    }
    text
}

fn styled(text: &str, color: bool, paint: impl FnOnce(&str) -> String) -> String {
    if color { paint(text) } else { text.to_owned() }
}

fn push_line(buffer: &mut String, line: &str) {
    buffer.push_str(line);
    buffer.push('\n');
}

/// Writer that appends into a shared buffer, so a caller can read back what a [`Console`] wrote.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Display for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.contents())
    }
}
