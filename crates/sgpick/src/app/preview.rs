//! Context windows around a hit, syntax highlighted for the terminal.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use crossterm::style::Stylize;

use crate::infra::config::Presentation;
use crate::infra::highlight::{HighlightResult, Highlighter};

/// Lines surrounding a focus line of one file.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    pub path: PathBuf,
    /// One-based number of the first line in `highlighted`.
    pub start_line: usize,
    /// One-based line the window is centred on.
    pub focus_line: usize,
    pub highlighted: HighlightResult,
    pub notice: Option<String>,
}

impl ContextWindow {
    /// One-based number of the last line shown, or `start_line - 1` for an empty window.
    pub fn end_line(&self) -> usize {
        self.start_line + self.highlighted.lines.len() - 1
    }

    /// Render with a line-number gutter and a `>` marker on the focus line.
    pub fn render(&self, color: bool) -> String {
        let mut out = String::new();
        if let Some(notice) = &self.notice {
            let _ = writeln!(out, "{notice}");
        }

        let width = self.end_line().max(self.focus_line).to_string().len();
        for (offset, line) in self.highlighted.lines.iter().enumerate() {
            let number = self.start_line + offset;
            let focused = number == self.focus_line;
            let marker = if focused { '>' } else { ' ' };
            let gutter = format!("{marker} {number:>width$} │ ");
            if color {
                let gutter = if focused {
                    gutter.yellow().bold().to_string()
                } else {
                    gutter.dark_grey().to_string()
                };
                let _ = writeln!(out, "{gutter}{}", line.to_ansi());
            } else {
                let _ = writeln!(out, "{gutter}{}", line.plain());
            }
        }
        out
    }
}

/// Service responsible for reading and highlighting context windows.
#[derive(Debug, Default)]
pub struct PreviewService {
    highlighter: Highlighter,
    theme: String,
}

impl PreviewService {
    pub fn new(presentation: &Presentation) -> Self {
        Self {
            highlighter: Highlighter::new(),
            theme: presentation.theme.clone(),
        }
    }

    /// Load `radius` lines either side of the one-based `line`, clamped to the file.
    pub fn context(&self, path: &Path, line: usize, radius: usize) -> Result<ContextWindow> {
        if !path.exists() {
            return Err(anyhow!("file not found: {}", path.display()));
        }

        let focus = line.max(1) - 1;
        let start = focus.saturating_sub(radius);
        let limit = (focus - start).saturating_add(radius).saturating_add(1);

        if Self::is_binary(path)? {
            return Ok(ContextWindow {
                path: path.to_path_buf(),
                start_line: start + 1,
                focus_line: line,
                highlighted: HighlightResult::plain(Vec::new(), self.theme.clone()),
                notice: Some(format!("Binary file {} not shown.", path.display())),
            });
        }

        let (lines, lossy) = Self::read_lines(path, start, limit)?;
        let mut notice = None;

        if lines.len() <= focus - start {
            notice = Some(format!(
                "Line {line} is past the end of {}.",
                path.display()
            ));
        }

        let highlighted = if lossy {
            if notice.is_none() {
                notice = Some("Shown without syntax highlighting due to invalid UTF-8.".to_owned());
            }
            HighlightResult::plain(lines, self.theme.clone())
        } else {
            self.highlighter.highlight(path, &lines, &self.theme)
        };

        Ok(ContextWindow {
            path: path.to_path_buf(),
            start_line: start + 1,
            focus_line: line,
            highlighted,
            notice,
        })
    }

    /// Determine if the file should be treated as binary and skipped.
    fn is_binary(path: &Path) -> Result<bool> {
        let mut file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mut buf = [0u8; 1024];
        let read = file.read(&mut buf)?;
        Ok(buf[..read].contains(&0))
    }

    fn read_lines(path: &Path, start: usize, max_lines: usize) -> Result<(Vec<String>, bool)> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mut reader = BufReader::new(file);
        let mut raw = Vec::new();
        let mut lines = Vec::new();
        let mut lossy = false;
        let mut index = 0;

        while lines.len() < max_lines {
            raw.clear();
            let bytes = reader.read_until(b'\n', &mut raw)?;
            if bytes == 0 {
                break;
            }

            if index >= start {
                if raw.ends_with(b"\n") {
                    raw.pop();
                    if raw.ends_with(b"\r") {
                        raw.pop();
                    }
                }
                let text = String::from_utf8_lossy(&raw);
                if matches!(text, Cow::Owned(_)) {
                    lossy = true;
                }
                lines.push(text.into_owned());
            }

            index += 1;
        }

        Ok((lines, lossy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    use crate::infra::highlight::HighlightMode;

    fn service() -> PreviewService {
        PreviewService::new(&Presentation::default())
    }

    fn numbered_file(dir: &Path, name: &str, count: usize) -> PathBuf {
        let path = dir.join(name);
        let content = (1..=count)
            .map(|i| format!("value_{i} = {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn window_is_centred_on_focus_line() -> Result<()> {
        let dir = tempdir()?;
        let file = numbered_file(dir.path(), "values.py", 50);

        let window = service().context(&file, 20, 3)?;
        assert_eq!(window.start_line, 17);
        assert_eq!(window.end_line(), 23);
        assert_eq!(window.highlighted.mode, HighlightMode::Highlighted);
        assert_eq!(window.highlighted.lines[3].plain(), "value_20 = 20");
        assert!(window.notice.is_none());
        Ok(())
    }

    #[test]
    fn window_is_clamped_at_file_edges() -> Result<()> {
        let dir = tempdir()?;
        let file = numbered_file(dir.path(), "values.py", 4);

        let top = service().context(&file, 1, 5)?;
        assert_eq!(top.start_line, 1);
        assert_eq!(top.end_line(), 4);

        let bottom = service().context(&file, 4, 2)?;
        assert_eq!(bottom.start_line, 2);
        assert_eq!(bottom.end_line(), 4);
        Ok(())
    }

    #[test]
    fn huge_radius_covers_whole_file() -> Result<()> {
        let dir = tempdir()?;
        let file = numbered_file(dir.path(), "values.py", 4);

        let window = service().context(&file, 3, usize::MAX)?;
        assert_eq!(window.start_line, 1);
        assert_eq!(window.end_line(), 4);
        Ok(())
    }

    #[test]
    fn render_marks_focus_line() -> Result<()> {
        let dir = tempdir()?;
        let file = numbered_file(dir.path(), "values.txt", 12);

        let rendered = service().context(&file, 10, 1)?.render(false);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "   9 │ value_9 = 9",
                "> 10 │ value_10 = 10",
                "  11 │ value_11 = 11",
            ]
        );
        Ok(())
    }

    #[test]
    fn line_past_end_has_notice() -> Result<()> {
        let dir = tempdir()?;
        let file = numbered_file(dir.path(), "short.py", 3);
        let window = service().context(&file, 40, 2)?;
        assert!(window.highlighted.lines.is_empty());
        assert!(
            window
                .notice
                .as_ref()
                .is_some_and(|n| n.contains("past the end"))
        );
        Ok(())
    }

    #[test]
    fn binary_file_returns_notice() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("data.bin");
        std::fs::write(&file, [0, 159, 146, 150])?;

        let window = service().context(&file, 1, 3)?;
        assert_eq!(window.highlighted.mode, HighlightMode::Plain);
        assert!(window.highlighted.lines.is_empty());
        assert!(
            window
                .notice
                .as_ref()
                .is_some_and(|n| n.contains("Binary file"))
        );
        Ok(())
    }

    #[test]
    fn lossy_content_falls_back_to_plain() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("lossy.py");
        let mut handle = File::create(&file)?;
        handle.write_all(b"hello\xffworld\n")?;
        drop(handle);

        let window = service().context(&file, 1, 0)?;
        assert_eq!(window.highlighted.mode, HighlightMode::Plain);
        assert!(
            window
                .notice
                .as_ref()
                .is_some_and(|n| n.contains("invalid UTF-8"))
        );
        assert_eq!(window.end_line(), 1);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(service().context(Path::new("/no/such/file.py"), 1, 1).is_err());
    }
}
