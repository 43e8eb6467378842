//! Syntax highlighting utilities built on top of syntect.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use crossterm::style::{Attribute, Color, Stylize};
use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style as SyntectStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

const DEFAULT_THEME: &str = "base16-ocean.dark";

static DEFAULT_ASSETS: Lazy<(Arc<SyntaxSet>, Arc<ThemeSet>)> = Lazy::new(|| {
    (
        Arc::new(SyntaxSet::load_defaults_newlines()),
        Arc::new(ThemeSet::load_defaults()),
    )
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighlightAttributes {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighlightStyle {
    pub foreground: Option<RgbColor>,
    pub attributes: HighlightAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub content: String,
    pub style: HighlightStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightLine {
    pub spans: Vec<HighlightSpan>,
}

impl HighlightLine {
    /// Text of the line without styling.
    pub fn plain(&self) -> String {
        self.spans.iter().map(|span| span.content.as_str()).collect()
    }

    /// Text of the line with 24-bit ANSI styling.
    pub fn to_ansi(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            let mut styled = span.content.as_str().stylize();
            if let Some(color) = span.style.foreground {
                styled = styled.with(Color::Rgb {
                    r: color.r,
                    g: color.g,
                    b: color.b,
                });
            }
            if span.style.attributes.bold {
                styled = styled.attribute(Attribute::Bold);
            }
            if span.style.attributes.italic {
                styled = styled.attribute(Attribute::Italic);
            }
            if span.style.attributes.underline {
                styled = styled.attribute(Attribute::Underlined);
            }
            let _ = write!(out, "{styled}");
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightMode {
    Highlighted,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightResult {
    pub lines: Vec<HighlightLine>,
    pub language: Option<String>,
    pub theme: String,
    pub mode: HighlightMode,
}

impl HighlightResult {
    pub fn plain(lines: Vec<String>, theme: String) -> Self {
        HighlightResult {
            lines: lines
                .into_iter()
                .map(|line| HighlightLine {
                    spans: vec![HighlightSpan {
                        content: line,
                        style: HighlightStyle::default(),
                    }],
                })
                .collect(),
            language: None,
            theme,
            mode: HighlightMode::Plain,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Highlighter {
    syntax_set: Arc<SyntaxSet>,
    theme_set: Arc<ThemeSet>,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        let assets = &*DEFAULT_ASSETS;
        Self {
            syntax_set: Arc::clone(&assets.0),
            theme_set: Arc::clone(&assets.1),
        }
    }

    pub fn highlight(&self, path: &Path, lines: &[String], theme: &str) -> HighlightResult {
        let resolved_theme = self.resolve_theme(theme);
        let theme_name = resolved_theme.name.to_string();

        let Some((syntax, language)) = self.syntax_for_path(path) else {
            return HighlightResult::plain(lines.to_vec(), theme_name);
        };

        match self.highlight_with_syntax(lines, resolved_theme.theme, syntax) {
            Ok(highlighted) => HighlightResult {
                lines: highlighted,
                language: Some(language),
                theme: theme_name,
                mode: HighlightMode::Highlighted,
            },
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "highlight failed");
                HighlightResult::plain(lines.to_vec(), theme_name)
            }
        }
    }

    fn highlight_with_syntax(
        &self,
        lines: &[String],
        theme: &Theme,
        syntax: &SyntaxReference,
    ) -> Result<Vec<HighlightLine>> {
        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut result = Vec::with_capacity(lines.len());
        for line in lines {
            // Grammars loaded with newlines expect a terminated line.
            let terminated = format!("{line}\n");
            let segments = highlighter.highlight_line(&terminated, &self.syntax_set)?;
            let spans = segments
                .into_iter()
                .filter_map(|(style, text)| {
                    let text = text.trim_end_matches('\n');
                    (!text.is_empty()).then(|| HighlightSpan {
                        content: text.to_string(),
                        style: convert_style(style),
                    })
                })
                .collect();
            result.push(HighlightLine { spans });
        }
        Ok(result)
    }

    fn syntax_for_path(&self, path: &Path) -> Option<(&SyntaxReference, String)> {
        let by_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.syntax_set.find_syntax_by_extension(ext));
        if let Some(syntax) = by_extension {
            return Some((syntax, syntax.name.clone()));
        }

        match self.syntax_set.find_syntax_for_file(path) {
            Ok(Some(syntax)) => Some((syntax, syntax.name.clone())),
            Ok(None) => None,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "syntax lookup failed");
                None
            }
        }
    }

    fn resolve_theme<'a>(&'a self, requested: &'a str) -> ResolvedTheme<'a> {
        if let Some(theme) = self.theme_set.themes.get(requested) {
            return ResolvedTheme {
                name: Cow::Borrowed(requested),
                theme,
            };
        }

        if let Some((name, theme)) = self
            .theme_set
            .themes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(requested))
        {
            return ResolvedTheme {
                name: Cow::Owned(name.clone()),
                theme,
            };
        }

        let (fallback_name, theme) = self
            .theme_set
            .themes
            .get_key_value(DEFAULT_THEME)
            .or_else(|| self.theme_set.themes.iter().next())
            .expect("syntect ships default themes");

        tracing::warn!(requested, fallback = %fallback_name, "theme not found");

        ResolvedTheme {
            name: Cow::Owned(fallback_name.clone()),
            theme,
        }
    }
}

#[derive(Debug, Clone)]
struct ResolvedTheme<'a> {
    name: Cow<'a, str>,
    theme: &'a Theme,
}

fn convert_style(style: SyntectStyle) -> HighlightStyle {
    let attributes = HighlightAttributes {
        bold: style.font_style.contains(FontStyle::BOLD),
        italic: style.font_style.contains(FontStyle::ITALIC),
        underline: style.font_style.contains(FontStyle::UNDERLINE),
    };

    HighlightStyle {
        foreground: convert_color(style.foreground),
        attributes,
    }
}

fn convert_color(color: syntect::highlighting::Color) -> Option<RgbColor> {
    if color.a == 0 {
        None
    } else {
        Some(RgbColor {
            r: color.r,
            g: color.g,
            b: color.b,
        })
    }
}
