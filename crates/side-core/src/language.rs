//! File-name helpers shared by the explorer, the status bar and the editor
//! highlighter.

use std::path::Path;

fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Language id for the editor, `plaintext` when the extension is unknown.
pub fn language_for_file_name(file_name: &str) -> &'static str {
    match extension_of(file_name).as_deref() {
        Some("js" | "jsx") => "javascript",
        Some("ts" | "tsx") => "typescript",
        Some("html") => "html",
        Some("css") => "css",
        Some("scss") => "scss",
        Some("less") => "less",
        Some("json") => "json",
        Some("md") => "markdown",
        Some("py") => "python",
        Some("rb") => "ruby",
        Some("java") => "java",
        Some("c") => "c",
        Some("cpp") => "cpp",
        Some("cs") => "csharp",
        Some("go") => "go",
        Some("php") => "php",
        Some("swift") => "swift",
        Some("rs") => "rust",
        Some("sql") => "sql",
        Some("yaml" | "yml") => "yaml",
        Some("xml") => "xml",
        Some("sh" | "bash") => "shell",
        _ => "plaintext",
    }
}

/// Icon category for the explorer.
pub fn icon_for_file_name(file_name: &str) -> &'static str {
    match extension_of(file_name).as_deref() {
        Some("js") => "javascript",
        Some("jsx" | "tsx") => "react",
        Some("ts") => "typescript",
        Some("html") => "html",
        Some("css") => "css",
        Some("scss") => "sass",
        Some("json") => "json",
        Some("md") => "markdown",
        Some("py") => "python",
        Some("rb") => "ruby",
        Some("java") => "java",
        Some("c") => "c",
        Some("cpp") => "cpp",
        Some("cs") => "csharp",
        Some("go") => "go",
        Some("php") => "php",
        Some("swift") => "swift",
        Some("rs") => "rust",
        _ => "document",
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

pub fn is_hidden_file(file_name: &str) -> bool {
    file_name.starts_with('.')
}

/// Last path component, falling back to the whole path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Upper-cased extension for the status bar, empty when there is none.
pub fn extension_label(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_uppercase())
        .unwrap_or_default()
}
