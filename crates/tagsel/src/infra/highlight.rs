//! Syntax colouring for preview windows, backed by syntect's bundled assets.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, FontStyle, Style as SyntectStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

const FALLBACK_THEME: &str = "base16-ocean.dark";

static ASSETS: Lazy<(Arc<SyntaxSet>, Arc<ThemeSet>)> = Lazy::new(|| {
    (
        Arc::new(SyntaxSet::load_defaults_newlines()),
        Arc::new(ThemeSet::load_defaults()),
    )
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpanStyle {
    pub foreground: Option<Rgb>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub content: String,
    pub style: SpanStyle,
}

/// One source line split into coloured spans.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    fn plain(text: &str) -> Self {
        Self {
            spans: vec![StyledSpan {
                content: text.to_string(),
                style: SpanStyle::default(),
            }],
        }
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.content.as_str()).collect()
    }
}

/// Output of [`Highlighter::highlight`]. `language` is `None` when no syntax matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
    pub lines: Vec<StyledLine>,
    pub language: Option<String>,
    pub theme: String,
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
        let (syntaxes, themes) = &*ASSETS;
        Self {
            syntax_set: Arc::clone(syntaxes),
            theme_set: Arc::clone(themes),
        }
    }

    pub fn theme_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.theme_set.themes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Colour `lines` as if they came from `path`. Falls back to plain spans on any failure.
    pub fn highlight(&self, path: &Path, lines: &[String], theme: &str) -> Highlighted {
        let plain = |theme: String| Highlighted {
            lines: lines.iter().map(|line| StyledLine::plain(line)).collect(),
            language: None,
            theme,
        };

        let Some((theme_name, theme)) = self.resolve_theme(theme) else {
            return plain(theme.to_string());
        };
        let Some(syntax) = self.syntax_for(path) else {
            return plain(theme_name);
        };

        match self.colour(lines, theme, syntax) {
            Ok(styled) => Highlighted {
                lines: styled,
                language: Some(syntax.name.clone()),
                theme: theme_name,
            },
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "highlight failed");
                plain(theme_name)
            }
        }
    }

    fn colour(
        &self,
        lines: &[String],
        theme: &Theme,
        syntax: &SyntaxReference,
    ) -> Result<Vec<StyledLine>> {
        let mut state = HighlightLines::new(syntax, theme);
        let mut out = Vec::with_capacity(lines.len());
        for line in lines {
            let spans = state
                .highlight_line(line, &self.syntax_set)?
                .into_iter()
                .map(|(style, text)| StyledSpan {
                    content: text.to_string(),
                    style: span_style(style),
                })
                .collect();
            out.push(StyledLine { spans });
        }
        Ok(out)
    }

    fn syntax_for(&self, path: &Path) -> Option<&SyntaxReference> {
        let by_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.syntax_set.find_syntax_by_extension(ext));
        by_extension.or_else(|| {
            path.file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| self.syntax_set.find_syntax_by_extension(name))
        })
    }

    fn resolve_theme(&self, requested: &str) -> Option<(String, &Theme)> {
        let themes = &self.theme_set.themes;
        if let Some(theme) = themes.get(requested) {
            return Some((requested.to_string(), theme));
        }
        if let Some((name, theme)) = themes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(requested))
        {
            return Some((name.clone(), theme));
        }

        tracing::warn!(requested, fallback = FALLBACK_THEME, "theme not found");
        themes
            .get(FALLBACK_THEME)
            .map(|theme| (FALLBACK_THEME.to_string(), theme))
            .or_else(|| themes.iter().next().map(|(name, theme)| (name.clone(), theme)))
    }
}

fn span_style(style: SyntectStyle) -> SpanStyle {
    SpanStyle {
        foreground: rgb(style.foreground),
        bold: style.font_style.contains(FontStyle::BOLD),
        italic: style.font_style.contains(FontStyle::ITALIC),
        underline: style.font_style.contains(FontStyle::UNDERLINE),
    }
}

fn rgb(color: Color) -> Option<Rgb> {
    (color.a != 0).then_some(Rgb(color.r, color.g, color.b))
}
