use std::sync::OnceLock;

use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Span;
use side_core::config::UiTheme;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Past this many lines the viewport is drawn without highlighting, since
/// every frame re-parses from the top of the buffer.
const HIGHLIGHT_LINE_LIMIT: usize = 5_000;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn get_syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn get_theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

fn syntect_theme_name(theme: UiTheme) -> &'static str {
    match theme {
        UiTheme::Dark => "base16-ocean.dark",
        UiTheme::Light => "base16-ocean.light",
    }
}

/// syntect token for a language id. The bundled syntax set has no grammar
/// for a few of them; those fall back to a close relative or plain text.
fn syntax_token(language: &str) -> Option<&'static str> {
    let token = match language {
        "javascript" | "typescript" => "js",
        "html" => "html",
        "css" | "scss" | "less" => "css",
        "json" => "json",
        "markdown" => "md",
        "python" => "py",
        "ruby" => "rb",
        "java" => "java",
        "c" => "c",
        "cpp" => "cpp",
        "csharp" => "cs",
        "go" => "go",
        "php" => "php",
        "rust" => "rs",
        "sql" => "sql",
        "yaml" => "yaml",
        "xml" => "xml",
        "shell" => "sh",
        _ => return None,
    };
    Some(token)
}

fn syntax_for(language: &str) -> Option<&'static SyntaxReference> {
    syntax_token(language).and_then(|token| get_syntax_set().find_syntax_by_token(token))
}

/// Styled spans for `count` lines starting at zero-based `start`. Lines are
/// returned untouched when the language has no grammar or the buffer is too
/// large; tabs are shown as single spaces so columns match the cursor.
pub fn highlight_viewport(
    content: &str,
    language: &str,
    theme: UiTheme,
    start: usize,
    count: usize,
) -> Vec<Vec<Span<'static>>> {
    let end = start.saturating_add(count);
    let plain = || -> Vec<Vec<Span<'static>>> {
        content
            .split('\n')
            .skip(start)
            .take(count)
            .map(|line| vec![Span::raw(display_text(line))])
            .collect()
    };
    if end > HIGHLIGHT_LINE_LIMIT {
        return plain();
    }
    let Some(syntax) = syntax_for(language) else {
        return plain();
    };
    let Some(theme) = get_theme_set().themes.get(syntect_theme_name(theme)) else {
        return plain();
    };

    let syntaxes = get_syntax_set();
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut out = Vec::with_capacity(count);
    for (idx, line) in LinesWithEndings::from(content).enumerate() {
        if idx >= end {
            break;
        }
        let Ok(ranges) = highlighter.highlight_line(line, syntaxes) else {
            return plain();
        };
        if idx < start {
            continue;
        }
        out.push(
            ranges
                .into_iter()
                .map(|(style, text)| {
                    let fg = style.foreground;
                    Span::styled(
                        display_text(text.trim_end_matches(['\n', '\r'])),
                        Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)),
                    )
                })
                .collect(),
        );
    }
    // A trailing newline leaves an empty last line that syntect never sees.
    let total = content.split('\n').count();
    if content.ends_with('\n') && out.len() < count && total > start + out.len() {
        out.push(vec![Span::raw(String::new())]);
    }
    out
}

fn display_text(text: &str) -> String {
    text.replace('\t', " ")
}

/// Drops the first `skip` chars and keeps at most `width` chars of a styled
/// line.
pub fn clip_spans(spans: Vec<Span<'static>>, skip: usize, width: usize) -> Vec<Span<'static>> {
    let mut to_skip = skip;
    let mut room = width;
    let mut out = Vec::new();
    for span in spans {
        if room == 0 {
            break;
        }
        let len = span.content.chars().count();
        if to_skip >= len {
            to_skip -= len;
            continue;
        }
        let text: String = span.content.chars().skip(to_skip).take(room).collect();
        to_skip = 0;
        room -= text.chars().count();
        out.push(Span::styled(text, span.style));
    }
    out
}
