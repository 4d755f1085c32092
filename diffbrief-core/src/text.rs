//! Line splitting and language tagging shared by every stage of the engine.

use std::path::Path;

/// Splits file content into lines.
///
/// Empty content has zero lines. A single trailing `\n` terminates the last
/// line instead of starting a new empty one. Nothing else is normalized: a
/// `\r` before the newline stays part of the line, so CRLF-vs-LF churn shows up
/// as a change.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.strip_suffix('\n').unwrap_or(text).split('\n').collect()
}

/// Returns the lowercase language tag for `path`, derived from its extension.
///
/// The tag selects the structural pattern family and is used as the code-fence
/// info string. Unknown or missing extensions map to `"text"`.
pub fn detect_language(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let Some(ext) = ext else {
        return "text";
    };
    match ext.as_str() {
        "rs" => "rust",
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "py" | "pyi" => "python",
        "go" => "go",
        "md" | "markdown" => "markdown",
        "toml" => "toml",
        "json" => "json",
        "yml" | "yaml" => "yaml",
        "sh" | "bash" | "zsh" => "shell",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "rb" => "ruby",
        "swift" => "swift",
        "css" => "css",
        "html" | "htm" => "html",
        "sql" => "sql",
        _ => "text",
    }
}
